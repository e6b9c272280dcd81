use likeline_core::validate::validate_like;
use likeline_core::{AtUri, LIKE_COLLECTION, PostRecord};
use likeline_util_error::FmtCompact as _;
use likeline_util_fmt::AsFmtOption as _;
use serde::Serialize;
use snafu::ResultExt as _;
use tracing::{debug, instrument};

use crate::LOG_TARGET;
use crate::api::RawRecord;
use crate::client::LikesClient;
use crate::error::{ListRecordsSnafu, PageResult};
use crate::resolver::FetchedPost;
use crate::scope::CancelScope;

/// Outcome of resolving the post behind one like
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LikeResult {
    Resolved {
        uri: AtUri,
        post: PostRecord,
    },
    Failed {
        /// Uri of the like record itself
        uri: String,
        /// Uri of the liked post, if the like could be read
        #[serde(skip_serializing_if = "Option::is_none")]
        subject: Option<AtUri>,
        reason: String,
    },
}

impl LikeResult {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikePage {
    pub items: Vec<LikeResult>,
    /// Absent on the last page
    pub cursor: Option<String>,
}

impl LikesClient {
    /// Fetch one page of `repo`'s likes and resolve every liked post
    ///
    /// Items are returned in listing order, one per listed record. A record
    /// that fails to validate or resolve becomes [`LikeResult::Failed`]; only
    /// a failed listing fails the page.
    #[instrument(target = "likeline::client", skip(self, scope), err(Display))]
    pub async fn fetch_like_page(
        &self,
        repo: &str,
        cursor: Option<&str>,
        scope: &CancelScope,
    ) -> PageResult<LikePage> {
        let listing = scope
            .run(
                self.api
                    .list_records(repo, LIKE_COLLECTION, self.page_size, cursor),
            )
            .await?
            .context(ListRecordsSnafu { repo })?;

        let items = scope
            .run(futures::future::join_all(
                listing
                    .records
                    .iter()
                    .map(|record| self.resolve_like(record, scope)),
            ))
            .await?;

        debug!(
            target: LOG_TARGET,
            %repo,
            count = items.len(),
            failed = items.iter().filter(|item| !item.is_resolved()).count(),
            cursor = %listing.cursor.fmt_option(),
            "Fetched like page"
        );

        Ok(LikePage {
            items,
            cursor: listing.cursor,
        })
    }

    async fn resolve_like(&self, record: &RawRecord, scope: &CancelScope) -> LikeResult {
        let like = match validate_like(&record.uri, &record.value) {
            Ok(like) => like,
            Err(err) => {
                return LikeResult::Failed {
                    uri: record.uri.clone(),
                    subject: None,
                    reason: err.fmt_compact().to_string(),
                };
            }
        };

        match self.resolve_post(&like.subject, scope).await {
            Ok(FetchedPost { uri, post }) => LikeResult::Resolved { uri, post },
            Err(err) => LikeResult::Failed {
                uri: record.uri.clone(),
                subject: Some(like.subject.uri),
                reason: err.fmt_compact().to_string(),
            },
        }
    }
}
