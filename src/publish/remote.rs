use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{Map, Value};

use super::error::RemoteStoreError;
use super::record::RemoteLocationRecord;

/// Remote document store holding each worker's latest position.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Creates the document for `key` if needed and replaces only `field` on it.
    async fn upsert(
        &self,
        key: &str,
        field: &str,
        record: &RemoteLocationRecord,
    ) -> Result<(), RemoteStoreError>;
}

/// Document store reachable over HTTP, one `PATCH` per upsert.
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: Url,
    collection: String,
}

impl HttpRemoteStore {
    pub fn new(base_url: &str, collection: &str) -> Result<Self, RemoteStoreError> {
        let base_url =
            Url::parse(base_url).map_err(|e| RemoteStoreError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteStoreError::InvalidUrl(format!(
                "{} cannot carry a path",
                base_url
            )));
        }
        Ok(HttpRemoteStore {
            client: reqwest::Client::new(),
            base_url,
            collection: collection.to_string(),
        })
    }

    fn record_url(&self, key: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.collection).push(key);
        }
        url
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn upsert(
        &self,
        key: &str,
        field: &str,
        record: &RemoteLocationRecord,
    ) -> Result<(), RemoteStoreError> {
        let mut body = Map::new();
        body.insert(field.to_string(), serde_json::to_value(record)?);

        let response = self
            .client
            .patch(self.record_url(key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteStoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// In-process document store, used for dry runs.
#[derive(Default)]
pub struct MemoryRemoteStore {
    documents: Mutex<HashMap<String, Map<String, Value>>>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn document(&self, key: &str) -> Option<Value> {
        self.documents
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .map(Value::Object)
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn upsert(
        &self,
        key: &str,
        field: &str,
        record: &RemoteLocationRecord,
    ) -> Result<(), RemoteStoreError> {
        let value = serde_json::to_value(record)?;
        self.documents
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value);
        Ok(())
    }
}
