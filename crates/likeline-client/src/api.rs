//! Repository-record API consumed by the resolution pipeline
//!
//! [`crate::xrpc::XrpcClient`] implements it over HTTP; tests substitute an
//! in-memory fake.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::ApiResult;

/// A record as returned by the service, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub uri: String,
    #[serde(default)]
    pub cid: Option<String>,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListRecordsOutput {
    pub records: Vec<RawRecord>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoDescription {
    pub did: String,
    pub handle: String,
}

#[async_trait]
pub trait RepoApi: Send + Sync {
    async fn list_records(
        &self,
        repo: &str,
        collection: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> ApiResult<ListRecordsOutput>;

    /// Fetch a single record
    ///
    /// With `cid` set, fails unless the live record has exactly that content
    /// hash.
    async fn get_record(
        &self,
        repo: &str,
        collection: &str,
        rkey: &str,
        cid: Option<&str>,
    ) -> ApiResult<RawRecord>;

    async fn describe_repo(&self, repo: &str) -> ApiResult<RepoDescription>;

    /// Address under which the blob `cid` of repository `did` can be fetched
    fn blob_url(&self, did: &str, cid: &str) -> Url;
}
