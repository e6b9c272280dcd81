//! JSON shapes printed by the CLI

use likeline_client::error::ResolveResult;
use likeline_client::{
    EmbeddedPost, LikeResult, LikesClient, LoadStatus, ResolvedPost, ResolvedProfile,
};
use likeline_core::{AtUri, PostRecord};
use likeline_util_error::FmtCompact as _;
use serde::Serialize;
use url::Url;

#[derive(Debug, Serialize)]
pub struct AuthorView {
    pub repo: String,
    pub handle: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_url: Option<Url>,
}

impl AuthorView {
    pub fn new(profile: &ResolvedProfile, web_app: &Url) -> Self {
        Self {
            repo: profile.uri.authority().to_owned(),
            handle: profile.handle.clone(),
            display_name: profile.display_name().to_owned(),
            avatar_url: profile.avatar_url.clone(),
            web_url: AtUri::profile_web_url(web_app, &profile.handle),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EmbeddedView {
    pub uri: AtUri,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_url: Option<Url>,
    pub author: AuthorView,
    pub post: PostRecord,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<Url>,
}

impl EmbeddedView {
    fn new(embedded: EmbeddedPost, client: &LikesClient, web_app: &Url) -> Self {
        Self {
            web_url: embedded.uri.post_web_url(web_app),
            author: AuthorView::new(&embedded.author, web_app),
            image_urls: client.image_urls(&embedded.uri, embedded.post.images()),
            uri: embedded.uri,
            post: embedded.post,
        }
    }
}

/// A reply parent or quoted post that may have failed to resolve
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContextView {
    Resolved(EmbeddedView),
    Failed { reason: String },
}

impl ContextView {
    fn new(slot: ResolveResult<EmbeddedPost>, client: &LikesClient, web_app: &Url) -> Self {
        match slot {
            Ok(embedded) => Self::Resolved(EmbeddedView::new(embedded, client, web_app)),
            Err(err) => Self::Failed {
                reason: err.fmt_compact().to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: EmbeddedView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ContextView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<ContextView>,
}

impl PostView {
    pub fn new(resolved: ResolvedPost, client: &LikesClient, web_app: &Url) -> Self {
        let ResolvedPost {
            uri,
            post,
            author,
            parent,
            quote,
        } = resolved;
        Self {
            post: EmbeddedView::new(EmbeddedPost { uri, post, author }, client, web_app),
            parent: parent.map(|slot| ContextView::new(slot, client, web_app)),
            quote: quote.map(|slot| ContextView::new(slot, client, web_app)),
        }
    }
}

/// One liked post, with or without its surrounding context
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LikeView {
    Plain(LikeResult),
    Expanded(PostView),
}

#[derive(Debug, Serialize)]
pub struct LikesView {
    pub repo: String,
    pub status: LoadStatus,
    pub items: Vec<LikeView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}
