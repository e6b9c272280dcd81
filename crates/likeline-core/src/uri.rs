use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use snafu::{OptionExt as _, Snafu, ensure};
use url::Url;

const AT_SCHEME: &str = "at://";

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
pub enum AtUriError {
    #[snafu(display("Not an at:// uri: {uri}"))]
    Scheme { uri: String },
    #[snafu(display("Missing repository in uri: {uri}"))]
    MissingAuthority { uri: String },
    #[snafu(display("Uri does not point at a record: {uri}"))]
    NotARecord { uri: String },
}

pub type AtUriResult<T> = std::result::Result<T, AtUriError>;

/// `at://<authority>[/<collection>[/<rkey>]]`
///
/// The authority is the repository identity (a DID, or a handle in
/// user-supplied input).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AtUri {
    authority: String,
    collection: Option<String>,
    rkey: Option<String>,
}

impl AtUri {
    pub fn for_repo(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            collection: None,
            rkey: None,
        }
    }

    pub fn for_record(
        authority: impl Into<String>,
        collection: impl Into<String>,
        rkey: impl Into<String>,
    ) -> Self {
        Self {
            authority: authority.into(),
            collection: Some(collection.into()),
            rkey: Some(rkey.into()),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn rkey(&self) -> Option<&str> {
        self.rkey.as_deref()
    }

    /// `(repository, collection, rkey)` of a uri addressing a single record
    pub fn record_parts(&self) -> AtUriResult<(&str, &str, &str)> {
        match (self.collection.as_deref(), self.rkey.as_deref()) {
            (Some(collection), Some(rkey)) => Ok((&self.authority, collection, rkey)),
            _ => NotARecordSnafu {
                uri: self.to_string(),
            }
            .fail(),
        }
    }

    /// Link to the post in the web app
    pub fn post_web_url(&self, web_app: &Url) -> Option<Url> {
        let rkey = self.rkey.as_deref()?;
        let mut url = web_app.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["profile", &self.authority, "post", rkey]);
        Some(url)
    }

    /// Link to a profile in the web app
    pub fn profile_web_url(web_app: &Url, handle: &str) -> Option<Url> {
        let mut url = web_app.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["profile", handle]);
        Some(url)
    }
}

impl FromStr for AtUri {
    type Err = AtUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix(AT_SCHEME).context(SchemeSnafu { uri: s })?;
        // Query and fragment are not part of record addressing
        let rest = rest.split(['?', '#']).next().unwrap_or_default();

        let mut parts = rest.split('/');
        let authority = parts
            .next()
            .filter(|a| !a.is_empty())
            .context(MissingAuthoritySnafu { uri: s })?;
        let collection = parts.next().filter(|c| !c.is_empty());
        let rkey = parts.next().filter(|r| !r.is_empty());
        ensure!(
            parts.all(|p| p.is_empty()),
            NotARecordSnafu { uri: s.to_string() }
        );

        Ok(Self {
            authority: authority.to_owned(),
            collection: collection.map(ToOwned::to_owned),
            rkey: rkey.map(ToOwned::to_owned),
        })
    }
}

impl fmt::Display for AtUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(AT_SCHEME)?;
        f.write_str(&self.authority)?;
        if let Some(collection) = &self.collection {
            write!(f, "/{collection}")?;
            if let Some(rkey) = &self.rkey {
                write!(f, "/{rkey}")?;
            }
        }
        Ok(())
    }
}

impl Serialize for AtUri {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        s.collect_str(self)
    }
}

/// A (possibly version-pinned) pointer to a record
///
/// `cid`, when present, is the content hash of the exact version expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RecordRef {
    pub uri: AtUri,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
}

impl RecordRef {
    pub fn new(uri: AtUri, cid: Option<String>) -> Self {
        Self { uri, cid }
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.uri.fmt(f)
    }
}
