// SPDX-License-Identifier: MIT

//! focus-sync: client-side data synchronization for the focus games.
//!
//! This crate persists per-user game statistics (personal bests and a
//! bounded session history) to a remote document store, authenticates
//! the user against a third-party identity provider, and migrates
//! legacy locally-stored records into the remote document on first
//! sign-in. Game logic and UI live elsewhere and call in through the
//! small surface on [`SyncClient`].

pub mod auth;
pub mod config;
pub mod error;
pub mod migrate;
pub mod models;
pub mod storage;
pub mod store;
pub mod sync;

use auth::{Authenticator, IdentityClient, TokenStore};
use config::Config;
use migrate::{LegacyRecordRef, MigrationRunner};
use models::{GameCategory, MetricValue, SessionEntry, UserProfile, UserRecord};
use std::collections::BTreeMap;
use std::sync::Arc;
use storage::{KeyValueStorage, MemoryStorage};
use store::FirestoreClient;
use sync::DocumentSync;
use tokio::sync::watch;

pub use error::{Result, SyncError};

/// The sync surface handed to the game UIs.
///
/// Wires the Authenticator, Document Sync, and Migration Runner around
/// one shared Token Store with a session lifecycle: credentials exist
/// from successful sign-in until sign-out or an unrecoverable refresh
/// failure.
pub struct SyncClient {
    auth: Arc<Authenticator>,
    sync: DocumentSync,
    migration: MigrationRunner,
}

impl SyncClient {
    /// Build a client with in-memory storage areas.
    pub fn new(config: Config) -> Self {
        Self::with_storage(
            config,
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
        )
    }

    /// Build a client over caller-supplied storage areas: a
    /// session-scoped area for credentials and a local area holding any
    /// legacy game records.
    pub fn with_storage(
        config: Config,
        session: Arc<dyn KeyValueStorage>,
        local: Arc<dyn KeyValueStorage>,
    ) -> Self {
        let tokens = Arc::new(TokenStore::new(session));
        let auth = Arc::new(Authenticator::new(IdentityClient::new(&config), tokens));
        let sync = DocumentSync::new(FirestoreClient::new(&config), auth.clone());
        let migration = MigrationRunner::new(sync.clone(), local);

        Self {
            auth,
            sync,
            migration,
        }
    }

    // ─── Auth Surface ────────────────────────────────────────────

    pub fn is_signed_in(&self) -> bool {
        self.auth.is_signed_in()
    }

    pub fn current_user_profile(&self) -> Option<UserProfile> {
        self.auth.current_profile()
    }

    /// Auth-state notifications: the profile on every sign-in, `None`
    /// on every sign-out.
    pub fn subscribe_auth_state(&self) -> watch::Receiver<Option<UserProfile>> {
        self.auth.subscribe()
    }

    /// Exchange the opaque credential produced by the external identity
    /// handshake for a signed-in session.
    pub async fn sign_in_with_credential(&self, provider_credential: &str) -> Result<UserProfile> {
        self.auth.sign_in_with_credential(provider_credential).await
    }

    /// Verify a session restored from session storage, if any.
    pub async fn resume_session(&self) -> Result<Option<UserProfile>> {
        self.auth.resume_session().await
    }

    pub fn sign_out(&self) {
        self.auth.sign_out()
    }

    // ─── Document Surface ────────────────────────────────────────

    /// Read the signed-in user's full record, creating it on first
    /// access.
    pub async fn read_user_record(&self) -> Result<UserRecord> {
        self.sync.read_user_record().await
    }

    /// Record a completed session for one game category.
    pub async fn update_game_record(
        &self,
        category: GameCategory,
        entry: SessionEntry,
        bests: BTreeMap<String, MetricValue>,
    ) -> Result<()> {
        self.sync.update_game_record(category, entry, bests).await
    }

    // ─── Migration Surface ───────────────────────────────────────

    /// Legacy records still present in local storage.
    pub fn detect_legacy_records(&self) -> Vec<LegacyRecordRef> {
        self.migration.detect_legacy_records().collect()
    }

    /// Migrate one legacy record; `false` on any failure, leaving the
    /// legacy record intact.
    pub async fn migrate_one(&self, category: GameCategory, source_key: &str) -> bool {
        self.migration.migrate_one(category, source_key).await
    }

    /// Migrate every detected legacy record, returning the success count.
    pub async fn migrate_all(&self) -> usize {
        self.migration.migrate_all().await
    }
}
