use std::sync::Arc;

use likeline_core::{AtUri, Image};
use url::Url;

use crate::api::RepoApi;
use crate::profile_cache::{ProfileCache, ResolvedProfile};

/// Number of likes requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Entry point of the resolution pipeline
///
/// Cheap to clone; clones share the [`RepoApi`] and the [`ProfileCache`].
#[derive(Clone)]
pub struct LikesClient {
    pub(crate) api: Arc<dyn RepoApi>,
    pub(crate) profiles: ProfileCache,
    pub(crate) page_size: u32,
}

#[bon::bon]
impl LikesClient {
    #[builder(finish_fn(name = "build"))]
    pub fn new(
        api: Arc<dyn RepoApi>,
        #[builder(default = DEFAULT_PAGE_SIZE)] page_size: u32,
        #[builder(default)] profiles: ProfileCache,
    ) -> Self {
        Self {
            api,
            profiles,
            page_size: page_size.max(1),
        }
    }
}

impl LikesClient {
    pub fn api(&self) -> &dyn RepoApi {
        self.api.as_ref()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn profile_cache(&self) -> &ProfileCache {
        &self.profiles
    }

    /// Look up (or reuse) the profile of `repo`; never fails
    pub async fn resolve_profile(&self, repo: &str) -> ResolvedProfile {
        self.profiles.resolve_profile(&self.api, repo).await
    }

    /// Fetchable addresses of the images attached to the post at `uri`
    pub fn image_urls(&self, uri: &AtUri, images: &[Image]) -> Vec<Url> {
        images
            .iter()
            .map(|image| self.api.blob_url(uri.authority(), &image.image.cid))
            .collect()
    }
}
