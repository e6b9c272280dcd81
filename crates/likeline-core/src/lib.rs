//! Record types of the liked-posts pipeline and their validation
//!
//! Records arrive from the network as untyped JSON. Everything in this crate
//! is pure: turning a `serde_json::Value` into one of the typed records below,
//! or rejecting it.

mod record;
mod timestamp;
mod uri;
pub mod validate;

pub use record::{
    BlobRef, Embed, Facet, FacetKind, Image, LikeRecord, PostRecord, ProfileRecord, ReplyRef,
};
pub use timestamp::Timestamp;
pub use uri::{AtUri, AtUriError, RecordRef};
pub use validate::{InvalidRecordError, RecordKind, ValidatedRecord};

/// Collection holding a repository's likes
pub const LIKE_COLLECTION: &str = "app.bsky.feed.like";
/// Collection holding a repository's posts
pub const POST_COLLECTION: &str = "app.bsky.feed.post";
/// Collection holding a repository's profile
pub const PROFILE_COLLECTION: &str = "app.bsky.actor.profile";
/// Record key of the repository's own profile in [`PROFILE_COLLECTION`]
pub const PROFILE_SELF_RKEY: &str = "self";
