use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use snafu::{OptionExt as _, ResultExt as _};
use tracing::{debug, trace};
use url::Url;

use crate::LOG_TARGET;
use crate::api::{ListRecordsOutput, RawRecord, RepoApi, RepoDescription};
use crate::error::{ApiError, ApiResult, DecodeSnafu, HttpSnafu, NotABaseSnafu, UrlSnafu};

pub const DEFAULT_SERVICE: &str = "https://bsky.social";
const USER_AGENT: &str = concat!("likeline/", env!("CARGO_PKG_VERSION"));

/// Error body of a failed XRPC call
#[derive(Debug, Deserialize)]
struct XrpcErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// [`RepoApi`] over the `com.atproto.repo.*` XRPC endpoints of a service
#[derive(Debug, Clone)]
pub struct XrpcClient {
    service: Url,
    client: Client,
}

impl XrpcClient {
    pub fn new(service: Url) -> ApiResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context(HttpSnafu)?;
        Ok(Self { service, client })
    }

    pub fn from_service_str(service: &str) -> ApiResult<Self> {
        Self::new(Url::parse(service).context(UrlSnafu)?)
    }

    pub fn service(&self) -> &Url {
        &self.service
    }

    fn method_url(&self, nsid: &str) -> ApiResult<Url> {
        let mut url = self.service.clone();
        url.path_segments_mut()
            .ok()
            .context(NotABaseSnafu {
                url: self.service.clone(),
            })?
            .pop_if_empty()
            .extend(["xrpc", nsid]);
        Ok(url)
    }

    async fn query<T>(&self, nsid: &str, params: &[(&str, &str)]) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.method_url(nsid)?;
        trace!(target: LOG_TARGET, %url, ?params, "XRPC query");

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .context(HttpSnafu)?;

        let status = response.status();
        let body = response.bytes().await.context(HttpSnafu)?;

        if !status.is_success() {
            let XrpcErrorBody { error, message } =
                serde_json::from_slice(&body).unwrap_or(XrpcErrorBody {
                    error: None,
                    message: None,
                });
            debug!(
                target: LOG_TARGET,
                nsid,
                status = status.as_u16(),
                error = error.as_deref().unwrap_or("-"),
                "XRPC call failed"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                error,
                message,
            });
        }

        serde_json::from_slice(&body).context(DecodeSnafu)
    }
}

#[async_trait]
impl RepoApi for XrpcClient {
    async fn list_records(
        &self,
        repo: &str,
        collection: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> ApiResult<ListRecordsOutput> {
        let limit = limit.to_string();
        let mut params = vec![
            ("repo", repo),
            ("collection", collection),
            ("limit", limit.as_str()),
        ];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor));
        }
        self.query("com.atproto.repo.listRecords", &params).await
    }

    async fn get_record(
        &self,
        repo: &str,
        collection: &str,
        rkey: &str,
        cid: Option<&str>,
    ) -> ApiResult<RawRecord> {
        let mut params = vec![("repo", repo), ("collection", collection), ("rkey", rkey)];
        if let Some(cid) = cid {
            params.push(("cid", cid));
        }
        self.query("com.atproto.repo.getRecord", &params).await
    }

    async fn describe_repo(&self, repo: &str) -> ApiResult<RepoDescription> {
        self.query("com.atproto.repo.describeRepo", &[("repo", repo)])
            .await
    }

    fn blob_url(&self, did: &str, cid: &str) -> Url {
        let mut url = self.service.clone();
        url.path_segments_mut()
            .map(|mut segments| {
                segments
                    .pop_if_empty()
                    .extend(["xrpc", "com.atproto.sync.getBlob"]);
            })
            .ok();
        url.query_pairs_mut()
            .clear()
            .append_pair("did", did)
            .append_pair("cid", cid);
        url
    }
}
