// SPDX-License-Identifier: MIT

//! Client configuration loaded from environment variables.
//!
//! Endpoint base URLs default to the production Google endpoints and are
//! overridable so tests (and emulators) can point at a local backend.

use std::env;

/// Sync client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cloud project that owns the document store
    pub project_id: String,
    /// Public API key passed to the identity endpoints
    pub api_key: String,
    /// Document store base URL (".../v1")
    pub firestore_url: String,
    /// Identity toolkit base URL (".../v1")
    pub identity_url: String,
    /// Secure-token service base URL (".../v1")
    pub token_url: String,
}

const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `FOCUS_SYNC_PROJECT_ID` and `FOCUS_SYNC_API_KEY` are required; the
    /// endpoint URLs fall back to the production defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            project_id: env::var("FOCUS_SYNC_PROJECT_ID")
                .map_err(|_| ConfigError::Missing("FOCUS_SYNC_PROJECT_ID"))?,
            api_key: env::var("FOCUS_SYNC_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FOCUS_SYNC_API_KEY"))?,
            firestore_url: env::var("FOCUS_SYNC_FIRESTORE_URL")
                .unwrap_or_else(|_| DEFAULT_FIRESTORE_URL.to_string()),
            identity_url: env::var("FOCUS_SYNC_IDENTITY_URL")
                .unwrap_or_else(|_| DEFAULT_IDENTITY_URL.to_string()),
            token_url: env::var("FOCUS_SYNC_TOKEN_URL")
                .unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_string()),
        })
    }

    /// Build a configuration for a project with the default endpoints.
    pub fn for_project(project_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: api_key.into(),
            firestore_url: DEFAULT_FIRESTORE_URL.to_string(),
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
