//! # Record Server Provider
//!
//! Collection-based REST API of a self-hosted record server
//! (PocketBase-style).
//!
//! ```text
//! POST   {base}/api/collections/{key}/records                 one record
//! GET    {base}/api/collections/{key}/records?perPage=N&sort=-created
//!                                                             → { "items": [...] }
//! DELETE {base}/api/collections/{key}/records/{id}
//! ```
//!
//! ## Replace-all push
//! ```text
//!  local: [s3, s2, s1]           (newest first)
//!
//!  1. list + delete every remote record
//!  2. POST s1, POST s2, POST s3  (last element first)
//!
//!  pull (sort=-created) → [s3, s2, s1]   same order as local
//! ```

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use medflow_core::ProviderKind;

use crate::config::RecordPushMode;
use crate::error::{SyncError, SyncResult};
use crate::provider::{check_status, RemoteProvider};

/// Address used when the configured one is blank.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8090";

/// Normalizes a user-entered server address.
///
/// Trims whitespace, prefixes `http://` when no scheme is given and drops a
/// trailing `/`.
///
/// ```rust
/// use medflow_sync::provider::normalize_base_url;
///
/// assert_eq!(normalize_base_url(" 10.0.0.2:8090/ "), "http://10.0.0.2:8090");
/// assert_eq!(normalize_base_url("https://pb.example.com"), "https://pb.example.com");
/// ```
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DEFAULT_BASE_URL.to_string();
    }

    let mut url = if trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    if url.ends_with('/') {
        url.pop();
    }
    url
}

pub struct RecordServerProvider {
    base_url: String,
    mode: RecordPushMode,
    page_size: u32,
    client: reqwest::Client,
}

impl RecordServerProvider {
    pub fn new(base_url: &str, mode: RecordPushMode, page_size: u32, client: reqwest::Client) -> Self {
        RecordServerProvider {
            base_url: normalize_base_url(base_url),
            mode,
            page_size,
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn mode(&self) -> RecordPushMode {
        self.mode
    }

    fn records_url(&self, collection: &str) -> String {
        format!("{}/api/collections/{}/records", self.base_url, collection)
    }

    /// A non-array payload is a one-element collection.
    fn as_records(payload: &Value) -> Vec<&Value> {
        match payload {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    async fn create(&self, collection: &str, record: &Value) -> SyncResult<()> {
        let response = self
            .client
            .post(self.records_url(collection))
            .json(record)
            .send()
            .await?;
        check_status(response)?;
        Ok(())
    }

    async fn list(&self, collection: &str, sort: Option<&str>) -> SyncResult<Vec<Value>> {
        let per_page = self.page_size.to_string();
        let mut query = vec![("perPage", per_page.as_str())];
        if let Some(sort) = sort {
            query.push(("sort", sort));
        }

        let response = self
            .client
            .get(self.records_url(collection))
            .query(&query)
            .send()
            .await?;
        let body: Value = check_status(response)?.json().await?;

        match body.get("items") {
            Some(Value::Array(items)) => Ok(items.clone()),
            _ => Err(SyncError::DeserializationFailed(format!(
                "list of '{}' has no items array",
                collection
            ))),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> SyncResult<()> {
        let url = format!("{}/{}", self.records_url(collection), id);
        let response = self.client.delete(url).send().await?;
        check_status(response)?;
        Ok(())
    }

    async fn clear(&self, collection: &str) -> SyncResult<usize> {
        let mut deleted = 0;
        loop {
            let existing = self.list(collection, None).await?;
            let ids: Vec<&str> = existing
                .iter()
                .filter_map(|r| r.get("id").and_then(Value::as_str))
                .collect();

            if ids.is_empty() {
                break;
            }
            for id in &ids {
                self.delete(collection, id).await?;
            }
            deleted += ids.len();

            if existing.len() < self.page_size as usize {
                break;
            }
        }
        Ok(deleted)
    }

    async fn try_push(&self, collection: &str, payload: &Value) -> SyncResult<()> {
        let records = Self::as_records(payload);

        match self.mode {
            RecordPushMode::AppendLatest => {
                let Some(latest) = records.last() else {
                    debug!(collection, "Nothing to append");
                    return Ok(());
                };
                self.create(collection, latest).await
            }
            RecordPushMode::ReplaceAll => {
                let deleted = self.clear(collection).await?;
                for record in records.iter().rev() {
                    self.create(collection, record).await?;
                }
                debug!(
                    collection,
                    deleted,
                    created = records.len(),
                    "Replaced remote collection"
                );
                Ok(())
            }
        }
    }
}

#[async_trait]
impl RemoteProvider for RecordServerProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::RecordServer
    }

    async fn push(&self, collection: &str, payload: &Value) -> bool {
        match self.try_push(collection, payload).await {
            Ok(()) => true,
            Err(e) => {
                warn!(collection, base_url = %self.base_url, error = %e, "Record server push failed");
                false
            }
        }
    }

    async fn pull(&self, collection: &str) -> Option<Value> {
        match self.list(collection, Some("-created")).await {
            Ok(items) => Some(Value::Array(items)),
            Err(e) => {
                warn!(collection, base_url = %self.base_url, error = %e, "Record server pull failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("localhost:8090"), "http://localhost:8090");
        assert_eq!(normalize_base_url("http://localhost:8090/"), "http://localhost:8090");
        assert_eq!(normalize_base_url("  https://pb.example.com  "), "https://pb.example.com");
        assert_eq!(normalize_base_url(""), DEFAULT_BASE_URL);
        // only one trailing slash is removed
        assert_eq!(normalize_base_url("http://h//"), "http://h/");
    }

    #[test]
    fn test_records_url() {
        let p = RecordServerProvider::new(
            "pb.local/",
            RecordPushMode::ReplaceAll,
            500,
            reqwest::Client::new(),
        );
        assert_eq!(p.records_url("sales"), "http://pb.local/api/collections/sales/records");
    }

    #[test]
    fn test_non_array_payload_is_one_record() {
        let single = json!({"id": "S-1"});
        assert_eq!(RecordServerProvider::as_records(&single), vec![&single]);

        let many = json!([1, 2, 3]);
        assert_eq!(RecordServerProvider::as_records(&many).len(), 3);
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_failure() {
        // port 9 (discard) on loopback is not listening in test environments
        let p = RecordServerProvider::new(
            "127.0.0.1:9",
            RecordPushMode::AppendLatest,
            500,
            reqwest::Client::new(),
        );
        assert!(!p.push("products", &json!([{"id": "1"}])).await);
        assert!(p.pull("products").await.is_none());
    }

    #[tokio::test]
    async fn test_append_latest_empty_is_noop_success() {
        let p = RecordServerProvider::new(
            "127.0.0.1:9",
            RecordPushMode::AppendLatest,
            500,
            reqwest::Client::new(),
        );
        assert!(p.push("sales", &json!([])).await);
    }
}
