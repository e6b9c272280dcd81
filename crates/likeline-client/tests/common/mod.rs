#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use likeline_client::api::{ListRecordsOutput, RawRecord, RepoApi, RepoDescription};
use likeline_client::error::{ApiError, ApiResult};
use likeline_client::LikesClient;
use serde_json::{Value, json};
use tokio::sync::Semaphore;
use url::Url;

pub const ALICE: &str = "did:plc:alice";
pub const BOB: &str = "did:plc:bob";
pub const CAROL: &str = "did:plc:carol";

/// A request made against [`FakeRepo`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List {
        repo: String,
        cursor: Option<String>,
    },
    Get {
        uri: String,
        cid: Option<String>,
    },
    Describe {
        repo: String,
    },
}

#[derive(Default)]
struct FakeState {
    /// uri -> (cid, value)
    records: BTreeMap<String, (String, Value)>,
    /// repo -> like records, in listing order
    likes: BTreeMap<String, Vec<(String, Value)>>,
    handles: BTreeMap<String, String>,
    delays: BTreeMap<String, Duration>,
    gates: BTreeMap<String, Arc<Semaphore>>,
    failing: BTreeSet<String>,
    calls: Vec<Call>,
}

/// In-memory repository service
///
/// Delays, gates and failures are keyed by record uri for `get_record`, and
/// by `list:<repo>` for `list_records`.
#[derive(Default)]
pub struct FakeRepo {
    state: Mutex<FakeState>,
}

impl FakeRepo {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn client(self: &Arc<Self>) -> LikesClient {
        LikesClient::builder().api(self.clone()).build()
    }

    pub fn client_with_page_size(self: &Arc<Self>, page_size: u32) -> LikesClient {
        LikesClient::builder()
            .api(self.clone())
            .page_size(page_size)
            .build()
    }

    pub fn add_record(&self, uri: &str, cid: &str, value: Value) {
        self.state
            .lock()
            .unwrap()
            .records
            .insert(uri.to_owned(), (cid.to_owned(), value));
    }

    /// Add a post, returning its uri
    pub fn add_post(&self, repo: &str, rkey: &str, value: Value) -> String {
        let uri = post_uri(repo, rkey);
        self.add_record(&uri, &cid_of(&uri), value);
        uri
    }

    pub fn add_profile(&self, repo: &str, display_name: &str) {
        self.add_record(
            &format!("at://{repo}/app.bsky.actor.profile/self"),
            "bafyprofile",
            json!({
                "$type": "app.bsky.actor.profile",
                "displayName": display_name,
                "avatar": { "$type": "blob", "ref": { "$link": "bafkavatar" }, "mimeType": "image/png", "size": 1 },
            }),
        );
    }

    pub fn add_handle(&self, repo: &str, handle: &str) {
        self.state
            .lock()
            .unwrap()
            .handles
            .insert(repo.to_owned(), handle.to_owned());
    }

    /// Append a like of `subject_uri` by `repo`, returning the like's uri
    pub fn add_like(&self, repo: &str, subject_uri: &str) -> String {
        self.add_like_value(
            repo,
            json!({
                "$type": "app.bsky.feed.like",
                "subject": { "uri": subject_uri, "cid": cid_of(subject_uri) },
                "createdAt": "2023-05-01T00:00:00Z",
            }),
        )
    }

    pub fn add_like_value(&self, repo: &str, value: Value) -> String {
        let mut state = self.state.lock().unwrap();
        let likes = state.likes.entry(repo.to_owned()).or_default();
        let uri = format!("at://{repo}/app.bsky.feed.like/{}", likes.len());
        likes.push((uri.clone(), value));
        uri
    }

    pub fn set_delay(&self, key: &str, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .delays
            .insert(key.to_owned(), delay);
    }

    /// Make requests for `key` wait until a permit is added to the returned
    /// semaphore
    pub fn gate(&self, key: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.state
            .lock()
            .unwrap()
            .gates
            .insert(key.to_owned(), gate.clone());
        gate
    }

    pub fn set_failing(&self, key: &str, failing: bool) {
        let mut state = self.state.lock().unwrap();
        if failing {
            state.failing.insert(key.to_owned());
        } else {
            state.failing.remove(key);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Get { uri, .. } => Some(uri),
                _ => None,
            })
            .collect()
    }

    pub fn count_gets(&self, uri: &str) -> usize {
        self.get_calls().iter().filter(|u| *u == uri).count()
    }

    pub fn count_describes(&self, repo: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Describe { repo: r } if r == repo))
            .count()
    }

    pub fn count_lists(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::List { .. }))
            .count()
    }

    async fn intercept(&self, key: &str) -> ApiResult<()> {
        let (delay, gate, failing) = {
            let state = self.state.lock().unwrap();
            (
                state.delays.get(key).copied(),
                state.gates.get(key).cloned(),
                state.failing.contains(key),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate never closed").forget();
        }
        if failing {
            return Err(ApiError::status(500, "InternalServerError", "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl RepoApi for FakeRepo {
    async fn list_records(
        &self,
        repo: &str,
        _collection: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> ApiResult<ListRecordsOutput> {
        self.state.lock().unwrap().calls.push(Call::List {
            repo: repo.to_owned(),
            cursor: cursor.map(ToOwned::to_owned),
        });
        self.intercept(&format!("list:{repo}")).await?;

        let state = self.state.lock().unwrap();
        let Some(likes) = state.likes.get(repo) else {
            return Err(ApiError::status(
                400,
                "InvalidRequest",
                format!("Could not find repo: {repo}"),
            ));
        };
        let start: usize = cursor.map(|c| c.parse().expect("fake cursor")).unwrap_or(0);
        let end = (start + limit as usize).min(likes.len());
        let records = likes[start..end]
            .iter()
            .map(|(uri, value)| RawRecord {
                uri: uri.clone(),
                cid: Some(cid_of(uri)),
                value: value.clone(),
            })
            .collect();
        Ok(ListRecordsOutput {
            records,
            cursor: (end < likes.len()).then(|| end.to_string()),
        })
    }

    async fn get_record(
        &self,
        repo: &str,
        collection: &str,
        rkey: &str,
        cid: Option<&str>,
    ) -> ApiResult<RawRecord> {
        let uri = format!("at://{repo}/{collection}/{rkey}");
        self.state.lock().unwrap().calls.push(Call::Get {
            uri: uri.clone(),
            cid: cid.map(ToOwned::to_owned),
        });
        self.intercept(&uri).await?;

        let state = self.state.lock().unwrap();
        match state.records.get(&uri) {
            Some((record_cid, _)) if cid.is_some_and(|cid| cid != record_cid.as_str()) => Err(
                ApiError::status(400, "RecordNotFound", format!("Could not locate record: {uri}")),
            ),
            Some((record_cid, value)) => Ok(RawRecord {
                uri,
                cid: Some(record_cid.clone()),
                value: value.clone(),
            }),
            None => Err(ApiError::status(
                400,
                "RecordNotFound",
                format!("Could not locate record: {uri}"),
            )),
        }
    }

    async fn describe_repo(&self, repo: &str) -> ApiResult<RepoDescription> {
        self.state.lock().unwrap().calls.push(Call::Describe {
            repo: repo.to_owned(),
        });
        self.intercept(&format!("describe:{repo}")).await?;

        let state = self.state.lock().unwrap();
        match state.handles.get(repo) {
            Some(handle) => Ok(RepoDescription {
                did: repo.to_owned(),
                handle: handle.clone(),
            }),
            None => Err(ApiError::status(
                400,
                "RepoNotFound",
                format!("Could not find repo: {repo}"),
            )),
        }
    }

    fn blob_url(&self, did: &str, cid: &str) -> Url {
        Url::parse(&format!("https://blobs.test/{did}/{cid}")).expect("valid url")
    }
}

pub fn post_uri(repo: &str, rkey: &str) -> String {
    format!("at://{repo}/app.bsky.feed.post/{rkey}")
}

pub fn cid_of(uri: &str) -> String {
    format!("cid-{}", uri.rsplit('/').next().unwrap_or_default())
}

pub fn post(text: &str) -> Value {
    json!({
        "$type": "app.bsky.feed.post",
        "text": text,
        "createdAt": "2023-04-01T10:00:00Z",
    })
}

pub fn reply_post(text: &str, parent_uri: &str) -> Value {
    let mut value = post(text);
    value["reply"] = json!({
        "parent": { "uri": parent_uri, "cid": cid_of(parent_uri) },
        "root": { "uri": parent_uri, "cid": cid_of(parent_uri) },
    });
    value
}

pub fn quote_post(text: &str, quoted_uri: &str) -> Value {
    let mut value = post(text);
    value["embed"] = json!({
        "$type": "app.bsky.embed.record",
        "record": { "uri": quoted_uri, "cid": cid_of(quoted_uri) },
    });
    value
}

pub fn reply_quote_post(text: &str, parent_uri: &str, quoted_uri: &str) -> Value {
    let mut value = reply_post(text, parent_uri);
    value["embed"] = quote_post("", quoted_uri)["embed"].clone();
    value
}
