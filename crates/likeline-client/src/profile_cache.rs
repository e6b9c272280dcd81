use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt as _;
use futures::future::{BoxFuture, Shared};
use likeline_core::validate::validate_profile;
use likeline_core::{AtUri, PROFILE_COLLECTION, PROFILE_SELF_RKEY, ProfileRecord};
use likeline_util_error::FmtCompact as _;
use serde::Serialize;
use tracing::{debug, trace, warn};
use url::Url;

use crate::LOG_TARGET;
use crate::api::RepoApi;

/// Author information needed to display a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedProfile {
    /// Uri of the profile record, or of the bare repository if it has none
    pub uri: AtUri,
    /// Human readable handle; the repository id if it could not be resolved
    pub handle: String,
    pub profile: ProfileRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<Url>,
}

impl ResolvedProfile {
    /// A profile with nothing known beyond the repository id
    fn fallback(repo: &str) -> Self {
        Self {
            uri: AtUri::for_repo(repo),
            handle: repo.to_owned(),
            profile: ProfileRecord::default(),
            avatar_url: None,
        }
    }

    /// The display name, falling back to the handle
    pub fn display_name(&self) -> &str {
        self.profile
            .display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.handle)
    }
}

type SharedProfileFetch = Shared<BoxFuture<'static, ResolvedProfile>>;

/// Memoized profile lookups, keyed by repository id
///
/// The first lookup of a repository spawns its fetch as a separate task and
/// every caller awaits the same shared result. A caller that stops waiting
/// does not abort the fetch, so at most one set of requests is ever made per
/// repository.
#[derive(Clone, Default)]
pub struct ProfileCache {
    profiles: Arc<Mutex<HashMap<String, SharedProfileFetch>>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SharedProfileFetch>> {
        self.profiles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn resolve_profile(&self, api: &Arc<dyn RepoApi>, repo: &str) -> ResolvedProfile {
        let fetch = self
            .lock()
            .entry(repo.to_owned())
            .or_insert_with(|| Self::spawn_fetch(api.clone(), repo.to_owned()))
            .clone();

        fetch.await
    }

    fn spawn_fetch(api: Arc<dyn RepoApi>, repo: String) -> SharedProfileFetch {
        let task = tokio::spawn(Self::fetch_profile(api, repo.clone()));
        async move {
            task.await.unwrap_or_else(|err| {
                warn!(target: LOG_TARGET, %repo, err = %err.fmt_compact(), "Profile fetch task failed");
                ResolvedProfile::fallback(&repo)
            })
        }
        .boxed()
        .shared()
    }

    /// Forget all profiles, e.g. when a new query session starts
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn fetch_profile(api: Arc<dyn RepoApi>, repo: String) -> ResolvedProfile {
        let repo = repo.as_str();
        trace!(target: LOG_TARGET, %repo, "Fetching profile");

        let (record, description) = futures::join!(
            api.get_record(repo, PROFILE_COLLECTION, PROFILE_SELF_RKEY, None),
            api.describe_repo(repo)
        );

        let (uri, profile) = match record {
            Ok(record) => match validate_profile(&record.uri, &record.value) {
                Ok(profile) => (
                    record
                        .uri
                        .parse()
                        .unwrap_or_else(|_| AtUri::for_repo(repo)),
                    profile,
                ),
                Err(err) => {
                    debug!(target: LOG_TARGET, %repo, err = %err.fmt_compact(), "Invalid profile record");
                    (AtUri::for_repo(repo), ProfileRecord::default())
                }
            },
            Err(err) => {
                debug!(target: LOG_TARGET, %repo, err = %err.fmt_compact(), "Could not fetch profile");
                (AtUri::for_repo(repo), ProfileRecord::default())
            }
        };

        let handle = match description {
            Ok(description) => description.handle,
            Err(err) => {
                debug!(target: LOG_TARGET, %repo, err = %err.fmt_compact(), "Could not resolve handle");
                repo.to_owned()
            }
        };

        let avatar_url = profile
            .avatar
            .as_ref()
            .map(|avatar| api.blob_url(uri.authority(), &avatar.cid));

        ResolvedProfile {
            uri,
            handle,
            profile,
            avatar_url,
        }
    }
}
