//! # Document Store Provider
//!
//! Realtime hierarchical document store addressed by URL path, with the
//! access token inline as the `auth` query parameter.
//!
//! ```text
//! PUT {root}{key}.json?auth={token}    full replace (idempotent)
//! GET {root}{key}.json?auth={token}    stored JSON, or null
//! ```

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use medflow_core::ProviderKind;

use crate::error::{SyncError, SyncResult};
use crate::provider::{check_status, RemoteProvider};

pub struct DocumentStoreProvider {
    /// Document root, always ending in `/`. Empty when not configured.
    root: String,
    access_token: String,
    client: reqwest::Client,
}

impl DocumentStoreProvider {
    pub fn new(root: &str, access_token: &str, client: reqwest::Client) -> Self {
        let trimmed = root.trim();
        let root = if trimmed.is_empty() || trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{}/", trimmed)
        };

        DocumentStoreProvider {
            root,
            access_token: access_token.to_string(),
            client,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// `{root}{collection}.json?auth={token}`
    fn document_url(&self, collection: &str) -> SyncResult<Url> {
        if self.root.is_empty() {
            return Err(SyncError::InvalidConfig("document root not configured".into()));
        }
        let mut url = Url::parse(&self.root)?.join(&format!("{}.json", collection))?;
        url.query_pairs_mut().append_pair("auth", &self.access_token);
        Ok(url)
    }

    async fn try_push(&self, collection: &str, payload: &Value) -> SyncResult<()> {
        let url = self.document_url(collection)?;
        let response = self.client.put(url).json(payload).send().await?;
        check_status(response)?;
        Ok(())
    }

    async fn try_pull(&self, collection: &str) -> SyncResult<Option<Value>> {
        let url = self.document_url(collection)?;
        let response = self.client.get(url).send().await?;
        let body: Value = check_status(response)?.json().await?;
        Ok(match body {
            Value::Null => None,
            value => Some(value),
        })
    }
}

#[async_trait]
impl RemoteProvider for DocumentStoreProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DocumentStore
    }

    async fn push(&self, collection: &str, payload: &Value) -> bool {
        match self.try_push(collection, payload).await {
            Ok(()) => true,
            Err(e) => {
                warn!(collection, error = %e, "Document store push failed");
                false
            }
        }
    }

    async fn pull(&self, collection: &str) -> Option<Value> {
        match self.try_pull(collection).await {
            Ok(Some(value)) => Some(value),
            Ok(None) => {
                debug!(collection, "Document store has no value");
                None
            }
            Err(e) => {
                warn!(collection, error = %e, "Document store pull failed");
                None
            }
        }
    }
}
