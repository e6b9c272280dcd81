use serde::Serialize;

use crate::{RecordRef, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikeRecord {
    pub subject: RecordRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub text: String,
    pub created_at: Timestamp,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<Facet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed: Option<Embed>,
}

impl PostRecord {
    /// The post this one replies to directly
    pub fn parent_ref(&self) -> Option<&RecordRef> {
        self.reply.as_ref().map(|reply| &reply.parent)
    }

    /// The post quoted by this one, if its embed carries a record
    pub fn quoted_ref(&self) -> Option<&RecordRef> {
        match self.embed.as_ref()? {
            Embed::Record { record } | Embed::RecordWithMedia { record, .. } => Some(record),
            Embed::Images { .. } | Embed::Unknown => None,
        }
    }

    /// Images attached directly or alongside a quoted record
    pub fn images(&self) -> &[Image] {
        match &self.embed {
            Some(Embed::Images { images } | Embed::RecordWithMedia { images, .. }) => images,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyRef {
    pub parent: RecordRef,
    pub root: RecordRef,
}

/// Annotation of the `[byte_start, byte_end)` range of a post's UTF-8 text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Facet {
    pub byte_start: usize,
    pub byte_end: usize,
    pub kind: FacetKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FacetKind {
    Link { uri: String },
    Mention { did: String },
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Embed {
    Images {
        images: Vec<Image>,
    },
    Record {
        record: RecordRef,
    },
    RecordWithMedia {
        record: RecordRef,
        images: Vec<Image>,
    },
    /// Any embed this crate does not interpret (video, external link, ...)
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub image: BlobRef,
    pub alt: String,
}

/// Content-addressed pointer to a blob stored in the author's repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobRef {
    pub cid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<BlobRef>,
}
