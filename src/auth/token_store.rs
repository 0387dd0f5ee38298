// SPDX-License-Identifier: MIT

//! Session-scoped holder of the current credential set.
//!
//! The only mutable shared state in the crate: written by the
//! Authenticator, read by Document Sync. The set is mirrored into the
//! session-scoped storage area so a restored browser session can resume,
//! and never into any longer-lived area.

use crate::models::UserProfile;
use crate::storage::KeyValueStorage;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Storage key for the mirrored credential set.
const CREDENTIALS_KEY: &str = "focus-sync/credentials";

/// The bundle of tokens and identifiers for one authenticated session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialSet {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl CredentialSet {
    /// The profile view of this session.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            photo_url: self.photo_url.clone(),
        }
    }
}

/// Holds the credential set for the lifetime of the session.
pub struct TokenStore {
    session: Arc<dyn KeyValueStorage>,
    current: RwLock<Option<CredentialSet>>,
}

impl TokenStore {
    /// Create a store backed by the session-scoped storage area,
    /// restoring a previously mirrored credential set if one exists.
    ///
    /// A restored set is unverified; the Authenticator must confirm it
    /// against the identity endpoint before declaring the session
    /// signed in.
    pub fn new(session: Arc<dyn KeyValueStorage>) -> Self {
        let restored = session
            .get(CREDENTIALS_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok());

        Self {
            session,
            current: RwLock::new(restored),
        }
    }

    pub fn set_credentials(&self, set: CredentialSet) {
        match serde_json::to_string(&set) {
            Ok(raw) => self.session.set(CREDENTIALS_KEY, &raw),
            Err(e) => tracing::warn!(error = %e, "Failed to mirror credentials to session storage"),
        }
        *self.current.write() = Some(set);
    }

    pub fn credentials(&self) -> Option<CredentialSet> {
        self.current.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.current.read().as_ref().map(|c| c.access_token.clone())
    }

    pub fn user_id(&self) -> Option<String> {
        self.current.read().as_ref().map(|c| c.user_id.clone())
    }

    pub fn clear(&self) {
        self.session.remove(CREDENTIALS_KEY);
        *self.current.write() = None;
    }
}
