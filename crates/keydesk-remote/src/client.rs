//! HTTP record store client.
//!
//! Speaks the REST dialect of the backing document store: every collection
//! and record is addressed as a `.json` path, with the auth token passed
//! as a query parameter. A `GET` of a collection returns a key → document
//! object (or JSON `null` when empty).

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::error;
use uuid::Uuid;

use keydesk_core::config::remote::RemoteStoreConfig;
use keydesk_core::error::AppError;
use keydesk_core::result::AppResult;
use keydesk_core::traits::RecordStore;
use keydesk_core::types::{ChangeOp, Collection, RecordChange};

/// Capacity of the change broadcast channel. Lagging subscribers drop old
/// notifications and refetch, so a small buffer is enough.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Record store backed by the remote HTTP document store.
pub struct HttpRecordStore {
    /// Shared HTTP client.
    client: reqwest::Client,
    /// Parsed base URL of the store.
    base_url: Url,
    /// Auth token appended to every request.
    auth_token: String,
    /// Change notification channel.
    changes: broadcast::Sender<RecordChange>,
}

impl HttpRecordStore {
    /// Creates a client from the remote-store configuration.
    pub fn new(config: &RemoteStoreConfig) -> AppResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AppError::configuration(format!("Invalid remote base URL: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Ok(Self {
            client,
            base_url,
            auth_token: config.auth_token.clone(),
            changes,
        })
    }

    /// Builds the endpoint URL for a collection or a single record.
    ///
    /// Record keys are pushed as path segments, so keys containing
    /// reserved characters are percent-encoded.
    fn endpoint(&self, collection: Collection, key: Option<&str>) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AppError::configuration("Remote base URL cannot be a base"))?;
            segments.pop_if_empty();
            match key {
                Some(key) => {
                    segments.push(collection.as_str());
                    segments.push(&format!("{key}.json"));
                }
                None => {
                    segments.push(&format!("{}.json", collection.as_str()));
                }
            }
        }
        if !self.auth_token.is_empty() {
            url.query_pairs_mut().append_pair("auth", &self.auth_token);
        }
        Ok(url)
    }

    /// Sends a request and returns the parsed JSON body.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        context: &str,
    ) -> AppResult<Value> {
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!(context, error = %e, "Record store request failed");
            AppError::with_source(
                keydesk_core::error::ErrorKind::Remote,
                format!("Record store unreachable: {context}"),
                e,
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(context, status = %status, "Record store rejected request");
            return Err(AppError::remote(format!(
                "Record store returned {status}: {context}"
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::remote(format!("Invalid record store response: {e}")))
    }

    /// Publishes a change notification. Send errors only mean there are no
    /// subscribers.
    fn notify(&self, collection: Collection, key: &str, op: ChangeOp) {
        let _ = self.changes.send(RecordChange {
            collection,
            key: key.to_string(),
            op,
        });
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn list(&self, collection: Collection) -> AppResult<BTreeMap<String, Value>> {
        let url = self.endpoint(collection, None)?;
        let body = self
            .send(Method::GET, url, None, &format!("list {collection}"))
            .await?;
        match body {
            Value::Null => Ok(BTreeMap::new()),
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(AppError::remote(format!(
                "Expected object listing {collection}, got {other}"
            ))),
        }
    }

    async fn get(&self, collection: Collection, key: &str) -> AppResult<Option<Value>> {
        let url = self.endpoint(collection, Some(key))?;
        let body = self
            .send(Method::GET, url, None, &format!("get {collection}/{key}"))
            .await?;
        match body {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    async fn put(&self, collection: Collection, key: &str, value: &Value) -> AppResult<()> {
        let url = self.endpoint(collection, Some(key))?;
        self.send(
            Method::PUT,
            url,
            Some(value),
            &format!("put {collection}/{key}"),
        )
        .await?;
        self.notify(collection, key, ChangeOp::Put);
        Ok(())
    }

    async fn insert(&self, collection: Collection, value: &Value) -> AppResult<String> {
        let key = Uuid::new_v4().to_string();
        self.put(collection, &key, value).await?;
        Ok(key)
    }

    async fn patch(&self, collection: Collection, key: &str, fields: &Value) -> AppResult<()> {
        let url = self.endpoint(collection, Some(key))?;
        self.send(
            Method::PATCH,
            url,
            Some(fields),
            &format!("patch {collection}/{key}"),
        )
        .await?;
        self.notify(collection, key, ChangeOp::Patch);
        Ok(())
    }

    async fn remove(&self, collection: Collection, key: &str) -> AppResult<()> {
        let url = self.endpoint(collection, Some(key))?;
        self.send(
            Method::DELETE,
            url,
            None,
            &format!("delete {collection}/{key}"),
        )
        .await?;
        self.notify(collection, key, ChangeOp::Remove);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<RecordChange> {
        self.changes.subscribe()
    }
}
