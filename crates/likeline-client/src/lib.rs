//! Resolution pipeline for a repository's liked posts
//!
//! [`LikesPaginator`] loads pages of likes through [`LikesClient`], which
//! resolves the liked posts, their authors ([`ProfileCache`]) and, on demand,
//! their reply-parent and quoted post. All network access goes through a
//! [`RepoApi`]; [`XrpcClient`] is the HTTP implementation.

pub mod api;
mod client;
pub mod error;
mod like_page;
mod paginator;
mod profile_cache;
mod resolver;
mod scope;
pub mod xrpc;

pub use api::RepoApi;
pub use client::{DEFAULT_PAGE_SIZE, LikesClient};
pub use like_page::{LikePage, LikeResult};
pub use paginator::{LikesPaginator, LoadOutcome, LoadStatus, Timeline};
pub use profile_cache::{ProfileCache, ResolvedProfile};
pub use resolver::{EmbeddedPost, FetchedPost, ResolvedPost};
pub use scope::{CancelScope, CancelledError};
pub use xrpc::XrpcClient;

pub(crate) const LOG_TARGET: &str = "likeline::client";
