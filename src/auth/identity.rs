// SPDX-License-Identifier: MIT

//! Identity endpoint client: credential exchange, token verification,
//! and token refresh.
//!
//! The provider credential produced by the external sign-in flow is
//! treated as opaque write-only input; this module never inspects it.

use crate::config::Config;
use serde::Deserialize;

/// Errors from identity requests.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The endpoint rejected the credential or token.
    #[error("identity endpoint rejected the request: {0}")]
    Rejected(String),

    /// The request never produced a response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response body could not be interpreted.
    #[error("malformed identity response: {0}")]
    Decode(String),
}

/// Identity endpoint client.
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    identity_url: String,
    token_url: String,
    api_key: String,
}

/// Credential exchange response: store-access token, refresh token, and
/// the user profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub id_token: String,
    pub refresh_token: String,
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Token refresh response. This endpoint uses snake_case field names.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub id_token: String,
    pub refresh_token: String,
    pub user_id: String,
}

/// One verified user from the lookup endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupUser {
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

impl IdentityClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            identity_url: config.identity_url.clone(),
            token_url: config.token_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Exchange an opaque provider credential for a store-access token,
    /// refresh token, and user profile.
    pub async fn sign_in_with_credential(
        &self,
        provider_credential: &str,
    ) -> Result<SignInResponse, IdentityError> {
        let url = format!(
            "{}/accounts:signInWithIdp?key={}",
            self.identity_url, self.api_key
        );

        let body = serde_json::json!({
            "postBody": provider_credential,
            "requestUri": "http://localhost",
            "returnSecureToken": true,
            "returnIdpCredential": true,
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        Self::check_response_json(response).await
    }

    /// Verify an access token, returning the profile it belongs to.
    pub async fn lookup(&self, access_token: &str) -> Result<LookupUser, IdentityError> {
        let url = format!("{}/accounts:lookup?key={}", self.identity_url, self.api_key);

        let body = serde_json::json!({ "idToken": access_token });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let parsed: LookupResponse = Self::check_response_json(response).await?;
        parsed
            .users
            .into_iter()
            .next()
            .ok_or_else(|| IdentityError::Rejected("token matched no user".to_string()))
    }

    /// Exchange a refresh token for a new token pair.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshResponse, IdentityError> {
        let url = format!("{}/token?key={}", self.token_url, self.api_key);

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        Self::check_response_json(response).await
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, IdentityError> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Rejected(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| IdentityError::Decode(e.to_string()))
    }
}
