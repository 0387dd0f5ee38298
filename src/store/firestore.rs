// SPDX-License-Identifier: MIT

//! Minimal REST client for the remote document store.
//!
//! Reads are GET, creates and partial updates are PATCH with an optional
//! field mask restricting the write to named top-level fields. Every
//! call carries the caller's bearer token; this module never touches the
//! Token Store itself.

use crate::config::Config;
use crate::store::codec::TaggedValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A document as exchanged with the store.
///
/// Server responses also carry `createTime`/`updateTime`; we ignore them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, TaggedValue>,
}

/// Errors from store requests.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store rejected the bearer token (401/403).
    #[error("authorization rejected by the document store")]
    Unauthorized,

    /// The requested document does not exist.
    #[error("document not found")]
    NotFound,

    /// The request never produced a response (network error, timeout).
    #[error("transport failure: {0}")]
    Transport(String),

    /// Any other non-success response.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be interpreted.
    #[error("malformed store response: {0}")]
    Decode(String),
}

/// Document store REST client.
#[derive(Clone)]
pub struct FirestoreClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
}

impl FirestoreClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.firestore_url.clone(),
            project_id: config.project_id.clone(),
        }
    }

    /// Full resource URL for a document.
    fn document_url(&self, collection: &str, document_id: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}/{}",
            self.base_url,
            self.project_id,
            collection,
            urlencoding::encode(document_id)
        )
    }

    /// Fetch a document.
    pub async fn get_document(
        &self,
        access_token: &str,
        collection: &str,
        document_id: &str,
    ) -> Result<Document, StoreError> {
        let url = self.document_url(collection, document_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Self::parse_document(response).await
    }

    /// Create or partially update a document.
    ///
    /// With a non-empty `mask`, only the named top-level fields are
    /// written and every other field is left untouched — this is the
    /// merge semantics both the lazy create and the per-category update
    /// rely on.
    pub async fn patch_document(
        &self,
        access_token: &str,
        collection: &str,
        document_id: &str,
        fields: &BTreeMap<String, TaggedValue>,
        mask: &[&str],
    ) -> Result<Document, StoreError> {
        let url = self.document_url(collection, document_id);

        let query: Vec<(&str, &str)> = mask
            .iter()
            .map(|path| ("updateMask.fieldPaths", *path))
            .collect();

        let body = Document {
            name: None,
            fields: fields.clone(),
        };

        let response = self
            .http
            .patch(&url)
            .bearer_auth(access_token)
            .query(&query)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Self::parse_document(response).await
    }

    /// Map a response to a document or the matching error.
    async fn parse_document(response: reqwest::Response) -> Result<Document, StoreError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json::<Document>()
                .await
                .map_err(|e| StoreError::Decode(e.to_string()));
        }

        match status.as_u16() {
            401 | 403 => Err(StoreError::Unauthorized),
            404 => Err(StoreError::NotFound),
            code => {
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::Http { status: code, body })
            }
        }
    }
}
