//! Post resolution, with one hop of reply-parent and quoted-post context

use likeline_core::validate::validate_post;
use likeline_core::{AtUri, PostRecord, RecordRef};
use likeline_util_error::FmtCompact as _;
use serde::Serialize;
use snafu::ResultExt as _;
use tracing::{debug, trace};

use crate::LOG_TARGET;
use crate::client::LikesClient;
use crate::error::{PostFetchSnafu, ResolveResult};
use crate::profile_cache::ResolvedProfile;
use crate::scope::{CancelScope, CancelledError};

/// A validated post and the uri it was served under
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedPost {
    pub uri: AtUri,
    pub post: PostRecord,
}

/// A parent or quoted post shown inside another post
///
/// Carries no parent/quote slots of its own, so context never nests deeper
/// than one hop.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddedPost {
    pub uri: AtUri,
    pub post: PostRecord,
    pub author: ResolvedProfile,
}

/// A top-level post with everything needed to display it
#[derive(Debug)]
pub struct ResolvedPost {
    pub uri: AtUri,
    pub post: PostRecord,
    pub author: ResolvedProfile,
    /// `None` if the post is not a reply
    pub parent: Option<ResolveResult<EmbeddedPost>>,
    /// `None` if the post quotes nothing
    pub quote: Option<ResolveResult<EmbeddedPost>>,
}

impl LikesClient {
    /// Fetch and validate the post `reference` points at
    ///
    /// The reference's cid is passed along, so a record that changed since it
    /// was referenced fails to fetch.
    pub async fn resolve_post(
        &self,
        reference: &RecordRef,
        scope: &CancelScope,
    ) -> ResolveResult<FetchedPost> {
        let (repo, collection, rkey) = reference.uri.record_parts()?;
        trace!(target: LOG_TARGET, uri = %reference.uri, "Fetching post");

        let record = scope
            .run(
                self.api
                    .get_record(repo, collection, rkey, reference.cid.as_deref()),
            )
            .await?
            .context(PostFetchSnafu {
                uri: reference.uri.clone(),
            })?;

        let post = validate_post(&record.uri, &record.value)?;
        let uri = record.uri.parse().unwrap_or_else(|_| reference.uri.clone());

        Ok(FetchedPost { uri, post })
    }

    /// [`Self::resolve_post`] followed by [`Self::expand`]
    pub async fn resolve_thread(
        &self,
        reference: &RecordRef,
        scope: &CancelScope,
    ) -> ResolveResult<ResolvedPost> {
        let FetchedPost { uri, post } = self.resolve_post(reference, scope).await?;
        self.expand(uri, post, scope).await
    }

    /// Resolve the author, reply parent and quoted post of a top-level post
    ///
    /// The three lookups run concurrently and fail independently; only
    /// cancellation of `scope` fails the whole call.
    pub async fn expand(
        &self,
        uri: AtUri,
        post: PostRecord,
        scope: &CancelScope,
    ) -> ResolveResult<ResolvedPost> {
        let parent_ref = post.parent_ref();
        let quoted_ref = post.quoted_ref();

        let (author, parent, quote) = futures::join!(
            scope.run(self.resolve_profile(uri.authority())),
            async {
                match parent_ref {
                    Some(parent_ref) => Some(self.resolve_embedded(parent_ref, scope).await),
                    None => None,
                }
            },
            async {
                match quoted_ref {
                    Some(quoted_ref) => Some(self.resolve_embedded(quoted_ref, scope).await),
                    None => None,
                }
            },
        );

        let author = author?;
        let parent = parent.map(|parent| {
            parent.map(|mut parent| {
                // Shown as the head of a thread, not as a reply of its own
                parent.post.reply = None;
                parent
            })
        });
        for (slot, result) in [("parent", &parent), ("quote", &quote)] {
            if let Some(Err(err)) = result {
                if err.is_cancelled() {
                    return Err(CancelledError.into());
                }
                debug!(target: LOG_TARGET, %uri, slot, err = %err.fmt_compact(), "Could not resolve post context");
            }
        }
        scope.check()?;

        Ok(ResolvedPost {
            uri,
            post,
            author,
            parent,
            quote,
        })
    }

    /// Resolve a post for display inside another one, without any further
    /// parent or quote expansion
    pub async fn resolve_embedded(
        &self,
        reference: &RecordRef,
        scope: &CancelScope,
    ) -> ResolveResult<EmbeddedPost> {
        let FetchedPost { uri, post } = self.resolve_post(reference, scope).await?;
        let author = scope.run(self.resolve_profile(uri.authority())).await?;
        Ok(EmbeddedPost { uri, post, author })
    }
}
