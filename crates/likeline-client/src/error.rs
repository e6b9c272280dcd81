use likeline_core::{AtUri, AtUriError, InvalidRecordError};
use snafu::Snafu;

use crate::scope::CancelledError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(display("Request failed: {source}"))]
    Http { source: reqwest::Error },
    #[snafu(display("{} ({status}): {}", error.as_deref().unwrap_or("Error"), message.as_deref().unwrap_or("no details")))]
    Status {
        status: u16,
        error: Option<String>,
        message: Option<String>,
    },
    #[snafu(display("Malformed response"))]
    Decode { source: serde_json::Error },
    #[snafu(display("Invalid service url"))]
    Url { source: url::ParseError },
    #[snafu(display("Service url {url} cannot have a path"))]
    NotABase { url: url::Url },
}

impl ApiError {
    /// An error response carrying the XRPC error name and message
    pub fn status(status: u16, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            error: Some(error.into()),
            message: Some(message.into()),
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ResolveError {
    #[snafu(transparent)]
    InvalidRecord { source: InvalidRecordError },
    #[snafu(display("Failed to fetch post {uri}"))]
    PostFetch { uri: AtUri, source: ApiError },
    #[snafu(transparent)]
    InvalidUri { source: AtUriError },
    #[snafu(transparent)]
    Cancelled { source: CancelledError },
}

impl ResolveError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PageError {
    #[snafu(display("Failed to list likes of {repo}"))]
    ListRecords { repo: String, source: ApiError },
    #[snafu(transparent)]
    Cancelled { source: CancelledError },
}

impl PageError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

pub type PageResult<T> = std::result::Result<T, PageError>;
