//! Incremental loading of a repository's liked posts

use std::sync::{Mutex, MutexGuard, PoisonError};

use likeline_util_error::FmtCompact as _;
use likeline_util_fmt::AsFmtOption as _;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::LOG_TARGET;
use crate::client::LikesClient;
use crate::error::PageResult;
use crate::like_page::{LikePage, LikeResult};
use crate::scope::CancelScope;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadStatus {
    Idle,
    /// Loading the first page
    Loading,
    /// Loading a subsequent page
    Appending,
    /// The last load failed; only [`LikesPaginator::start`] recovers
    Error { reason: String },
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading | Self::Appending)
    }
}

/// Everything loaded so far, in cursor-traversal order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub items: Vec<LikeResult>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and applied
    Loaded { added: usize },
    /// Nothing to do: a load is already in flight, there is no next page or
    /// no target yet
    Ignored,
    /// The load was cancelled or restarted before it completed; its result was
    /// discarded
    Superseded,
}

struct PaginatorState {
    target: Option<String>,
    status: LoadStatus,
    timeline: Timeline,
    scope: CancelScope,
    /// Bumped whenever in-flight results must no longer be applied
    generation: u64,
}

/// Drives page-by-page loading of one repository's likes
///
/// At most one page load is in flight at a time. Results of a load are only
/// applied if neither [`Self::cancel`] nor a new [`Self::start`] happened
/// while it was running.
pub struct LikesPaginator {
    client: LikesClient,
    state: Mutex<PaginatorState>,
}

impl LikesPaginator {
    pub fn new(client: LikesClient) -> Self {
        Self {
            client,
            state: Mutex::new(PaginatorState {
                target: None,
                status: LoadStatus::Idle,
                timeline: Timeline::default(),
                scope: CancelScope::new(),
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PaginatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn client(&self) -> &LikesClient {
        &self.client
    }

    pub fn status(&self) -> LoadStatus {
        self.lock().status.clone()
    }

    pub fn timeline(&self) -> Timeline {
        self.lock().timeline.clone()
    }

    pub fn target(&self) -> Option<String> {
        self.lock().target.clone()
    }

    /// Whether [`Self::load_more`] could fetch another page right now
    pub fn has_more(&self) -> bool {
        let state = self.lock();
        state.status == LoadStatus::Idle && state.timeline.cursor.is_some()
    }

    /// Reset the timeline and load the first page of `repo`'s likes
    ///
    /// Any load still in flight is cancelled. Switching to a different
    /// repository also starts a fresh profile cache.
    pub async fn start(&self, repo: &str) -> PageResult<LoadOutcome> {
        let (generation, scope) = {
            let mut state = self.lock();
            state.scope.cancel();
            state.scope = CancelScope::new();
            state.generation += 1;

            if state.target.as_deref() != Some(repo) {
                self.client.profile_cache().clear();
                state.target = Some(repo.to_owned());
            }
            state.timeline = Timeline::default();
            state.status = LoadStatus::Loading;
            (state.generation, state.scope.clone())
        };
        info!(target: LOG_TARGET, %repo, "Loading likes");

        let res = self.client.fetch_like_page(repo, None, &scope).await;
        self.apply(generation, &scope, res)
    }

    /// Load the next page, if there is one and nothing is loading
    ///
    /// Never queues: calling this while a load is in flight is a no-op.
    pub async fn load_more(&self) -> PageResult<LoadOutcome> {
        let (generation, scope, repo, cursor) = {
            let mut state = self.lock();
            let (Some(repo), Some(cursor)) =
                (state.target.clone(), state.timeline.cursor.clone())
            else {
                return Ok(LoadOutcome::Ignored);
            };
            if state.status != LoadStatus::Idle {
                return Ok(LoadOutcome::Ignored);
            }
            state.status = LoadStatus::Appending;
            (state.generation, state.scope.clone(), repo, cursor)
        };
        debug!(target: LOG_TARGET, %repo, %cursor, "Loading more likes");

        let res = self
            .client
            .fetch_like_page(&repo, Some(&cursor), &scope)
            .await;
        self.apply(generation, &scope, res)
    }

    /// Tear down the current load; its results will never be applied
    pub fn cancel(&self) {
        let mut state = self.lock();
        state.scope.cancel();
        state.scope = CancelScope::new();
        state.generation += 1;
        if state.status.is_loading() {
            state.status = LoadStatus::Idle;
        }
    }

    fn apply(
        &self,
        generation: u64,
        scope: &CancelScope,
        res: PageResult<LikePage>,
    ) -> PageResult<LoadOutcome> {
        let mut state = self.lock();
        if state.generation != generation || scope.is_cancelled() {
            debug!(target: LOG_TARGET, "Discarding superseded page");
            return Ok(LoadOutcome::Superseded);
        }

        match res {
            Ok(page) => {
                let added = page.items.len();
                state.timeline.items.extend(page.items);
                state.timeline.cursor = page.cursor;
                state.status = LoadStatus::Idle;
                debug!(
                    target: LOG_TARGET,
                    added,
                    total = state.timeline.items.len(),
                    cursor = %state.timeline.cursor.fmt_option(),
                    "Applied page"
                );
                Ok(LoadOutcome::Loaded { added })
            }
            Err(err) if err.is_cancelled() => Ok(LoadOutcome::Superseded),
            Err(err) => {
                warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Loading likes failed");
                // A failed page invalidates everything accumulated so far
                state.timeline = Timeline::default();
                state.status = LoadStatus::Error {
                    reason: err.fmt_compact().to_string(),
                };
                Err(err)
            }
        }
    }
}

impl Drop for LikesPaginator {
    fn drop(&mut self) {
        self.lock().scope.cancel();
    }
}
