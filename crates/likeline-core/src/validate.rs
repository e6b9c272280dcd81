//! Classification of untyped records
//!
//! A record is accepted when its `$type` matches the expected collection and
//! all required fields are present and well-formed. Optional fields are read
//! leniently: a malformed optional field is dropped (or, for embeds, downgraded
//! to [`Embed::Unknown`]) rather than failing the whole record.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use snafu::{OptionExt as _, ResultExt as _, Snafu, ensure};

use crate::{
    AtUri, BlobRef, Embed, Facet, FacetKind, Image, LIKE_COLLECTION, LikeRecord, POST_COLLECTION,
    PROFILE_COLLECTION, PostRecord, ProfileRecord, RecordRef, ReplyRef, Timestamp,
};

#[cfg(test)]
mod tests;

const EMBED_IMAGES: &str = "app.bsky.embed.images";
const EMBED_RECORD: &str = "app.bsky.embed.record";
const EMBED_RECORD_WITH_MEDIA: &str = "app.bsky.embed.recordWithMedia";
const FACET_LINK: &str = "app.bsky.richtext.facet#link";
const FACET_MENTION: &str = "app.bsky.richtext.facet#mention";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Like,
    Post,
    Profile,
}

impl RecordKind {
    /// The `$type` (and collection) of records of this kind
    pub fn nsid(self) -> &'static str {
        match self {
            RecordKind::Like => LIKE_COLLECTION,
            RecordKind::Post => POST_COLLECTION,
            RecordKind::Profile => PROFILE_COLLECTION,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Like => "like",
            RecordKind::Post => "post",
            RecordKind::Profile => "profile",
        })
    }
}

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum RecordFieldError {
    #[snafu(display("Record is not an object"))]
    NotAnObject,
    #[snafu(display("Expected $type {expected}, found {}", found.as_deref().unwrap_or("none")))]
    WrongType {
        expected: &'static str,
        found: Option<String>,
    },
    #[snafu(display("Missing required field {field}"))]
    MissingField { field: &'static str },
    #[snafu(display("Malformed field {field}"))]
    MalformedField { field: &'static str },
}

pub type RecordFieldResult<T> = std::result::Result<T, RecordFieldError>;

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(display("Invalid {kind} record {uri}"))]
pub struct InvalidRecordError {
    pub kind: RecordKind,
    pub uri: String,
    pub source: RecordFieldError,
}

pub type ValidationResult<T> = std::result::Result<T, InvalidRecordError>;

/// A record type that can be recognized in untyped record data
pub trait ValidatedRecord: Sized {
    const KIND: RecordKind;

    /// Extract the record from an object whose `$type` was already checked
    fn from_fields(fields: &Map<String, Value>) -> RecordFieldResult<Self>;
}

/// Validate `value` (fetched from `uri`) as a record of type `T`
pub fn validate<T: ValidatedRecord>(uri: &str, value: &Value) -> ValidationResult<T> {
    validate_fields::<T>(value).context(InvalidRecordSnafu {
        kind: T::KIND,
        uri,
    })
}

fn validate_fields<T: ValidatedRecord>(value: &Value) -> RecordFieldResult<T> {
    let fields = value.as_object().context(NotAnObjectSnafu)?;
    let found = fields.get("$type").and_then(Value::as_str);
    ensure!(
        found == Some(T::KIND.nsid()),
        WrongTypeSnafu {
            expected: T::KIND.nsid(),
            found: found.map(ToOwned::to_owned),
        }
    );
    T::from_fields(fields)
}

pub fn validate_like(uri: &str, value: &Value) -> ValidationResult<LikeRecord> {
    validate(uri, value)
}

pub fn validate_post(uri: &str, value: &Value) -> ValidationResult<PostRecord> {
    validate(uri, value)
}

pub fn validate_profile(uri: &str, value: &Value) -> ValidationResult<ProfileRecord> {
    validate(uri, value)
}

impl ValidatedRecord for LikeRecord {
    const KIND: RecordKind = RecordKind::Like;

    fn from_fields(fields: &Map<String, Value>) -> RecordFieldResult<Self> {
        Ok(Self {
            subject: required_ref(fields, "subject")?,
        })
    }
}

impl ValidatedRecord for PostRecord {
    const KIND: RecordKind = RecordKind::Post;

    fn from_fields(fields: &Map<String, Value>) -> RecordFieldResult<Self> {
        let text = required_str(fields, "text")?.to_owned();
        let created_at: Timestamp = required_str(fields, "createdAt")?
            .parse()
            .ok()
            .context(MalformedFieldSnafu { field: "createdAt" })?;

        let facets = fields
            .get("facets")
            .and_then(Value::as_array)
            .map(|facets| facets.iter().filter_map(parse_facet).collect())
            .unwrap_or_default();

        let reply = fields.get("reply").and_then(|reply| {
            Some(ReplyRef {
                parent: parse_ref(reply.get("parent")?)?,
                root: parse_ref(reply.get("root")?)?,
            })
        });

        let embed = fields.get("embed").map(parse_embed);

        Ok(Self {
            text,
            created_at,
            facets,
            reply,
            embed,
        })
    }
}

impl ValidatedRecord for ProfileRecord {
    const KIND: RecordKind = RecordKind::Profile;

    fn from_fields(fields: &Map<String, Value>) -> RecordFieldResult<Self> {
        Ok(Self {
            display_name: fields
                .get("displayName")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned),
            avatar: fields.get("avatar").and_then(parse_blob),
        })
    }
}

fn required_str<'v>(
    fields: &'v Map<String, Value>,
    field: &'static str,
) -> RecordFieldResult<&'v str> {
    fields
        .get(field)
        .context(MissingFieldSnafu { field })?
        .as_str()
        .context(MalformedFieldSnafu { field })
}

fn required_ref(fields: &Map<String, Value>, field: &'static str) -> RecordFieldResult<RecordRef> {
    let value = fields.get(field).context(MissingFieldSnafu { field })?;
    parse_ref(value).context(MalformedFieldSnafu { field })
}

/// `{ uri, cid? }` strong (or weak) reference
fn parse_ref(value: &Value) -> Option<RecordRef> {
    let uri: AtUri = value.get("uri")?.as_str()?.parse().ok()?;
    let cid = value
        .get("cid")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);
    Some(RecordRef::new(uri, cid))
}

/// Blob reference in either the current `{"ref": {"$link": ..}}` or the legacy
/// `{"cid": ..}` encoding
fn parse_blob(value: &Value) -> Option<BlobRef> {
    let cid = value
        .get("ref")
        .and_then(|r| r.get("$link"))
        .or_else(|| value.get("cid"))
        .and_then(Value::as_str)?;
    Some(BlobRef {
        cid: cid.to_owned(),
        mime_type: value
            .get("mimeType")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned),
    })
}

fn parse_facet(value: &Value) -> Option<Facet> {
    let index = value.get("index")?;
    let byte_start = usize::try_from(index.get("byteStart")?.as_u64()?).ok()?;
    let byte_end = usize::try_from(index.get("byteEnd")?.as_u64()?).ok()?;
    if byte_end < byte_start {
        return None;
    }

    let kind = value
        .get("features")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find_map(parse_facet_feature)
        .unwrap_or(FacetKind::Other);

    Some(Facet {
        byte_start,
        byte_end,
        kind,
    })
}

fn parse_facet_feature(feature: &Value) -> Option<FacetKind> {
    let str_field = |name: &str| {
        feature
            .get(name)
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
    };
    match feature.get("$type")?.as_str()? {
        FACET_LINK => Some(FacetKind::Link {
            uri: str_field("uri")?,
        }),
        FACET_MENTION => Some(FacetKind::Mention {
            did: str_field("did")?,
        }),
        _ => None,
    }
}

fn parse_embed(value: &Value) -> Embed {
    let parse_images = |value: &Value| -> Vec<Image> {
        value
            .get("images")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|image| {
                Some(Image {
                    image: parse_blob(image.get("image")?)?,
                    alt: image
                        .get("alt")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_owned(),
                })
            })
            .collect()
    };

    match value.get("$type").and_then(Value::as_str) {
        Some(EMBED_IMAGES) => Embed::Images {
            images: parse_images(value),
        },
        Some(EMBED_RECORD) => match value.get("record").and_then(parse_ref) {
            Some(record) => Embed::Record { record },
            None => Embed::Unknown,
        },
        Some(EMBED_RECORD_WITH_MEDIA) => {
            let Some(record) = value
                .get("record")
                .and_then(|r| r.get("record"))
                .and_then(parse_ref)
            else {
                return Embed::Unknown;
            };
            let images = match value.get("media") {
                Some(media) if media.get("$type").and_then(Value::as_str) == Some(EMBED_IMAGES) => {
                    parse_images(media)
                }
                _ => vec![],
            };
            Embed::RecordWithMedia { record, images }
        }
        _ => Embed::Unknown,
    }
}
