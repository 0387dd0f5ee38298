// SPDX-License-Identifier: MIT

//! Read-modify-write protocol against the remote document store.
//!
//! Every operation performs at most one refresh-and-retry cycle when
//! the store rejects the access token; there are no retries for generic
//! transport failures. Writes to a category are field-masked partial
//! updates — other categories and the profile are never touched by an
//! `update_game_record` call. Last write wins per category across
//! concurrent devices.

use crate::auth::Authenticator;
use crate::error::{Result, SyncError};
use crate::models::{GameCategory, MetricValue, ProfileRecord, SessionEntry, UserRecord};
use crate::store::{collections, Document, FirestoreClient, StoreError};
use crate::store::codec::TaggedValue;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Document sync service.
#[derive(Clone)]
pub struct DocumentSync {
    store: FirestoreClient,
    auth: Arc<Authenticator>,
}

impl DocumentSync {
    pub fn new(store: FirestoreClient, auth: Arc<Authenticator>) -> Self {
        Self { store, auth }
    }

    // ─── Read Path ───────────────────────────────────────────────

    /// Read the signed-in user's full record, creating it on first
    /// access.
    pub async fn read_user_record(&self) -> Result<UserRecord> {
        let user_id = self.auth.user_id()?;
        let document = self.fetch_with_retry(&user_id).await?;
        UserRecord::from_document(&user_id, &document).map_err(Into::into)
    }

    /// Fetch the user document, creating it if the store has none, with
    /// a single refresh-and-retry on an authorization rejection.
    async fn fetch_with_retry(&self, user_id: &str) -> Result<Document> {
        let token = self.auth.access_token()?;

        match self.fetch_or_create(&token, user_id).await {
            Ok(document) => Ok(document),
            Err(StoreError::Unauthorized) => {
                self.refresh_for_retry(&token).await?;
                let token = self.auth.access_token()?;
                self.fetch_or_create(&token, user_id)
                    .await
                    .map_err(store_failure)
            }
            Err(e) => Err(store_failure(e)),
        }
    }

    async fn fetch_or_create(
        &self,
        token: &str,
        user_id: &str,
    ) -> std::result::Result<Document, StoreError> {
        match self
            .store
            .get_document(token, collections::USERS, user_id)
            .await
        {
            Err(StoreError::NotFound) => {
                tracing::info!(user_id, "No user record yet, creating");
                self.create_user_record(token, user_id).await
            }
            result => result,
        }
    }

    /// Write a fresh record: the signed-in profile plus one empty
    /// sub-record per known category.
    ///
    /// A field-masked patch, so a concurrent create from another tab
    /// merges instead of destroying — last writer wins field by field
    /// and the profile is never lost.
    async fn create_user_record(
        &self,
        token: &str,
        user_id: &str,
    ) -> std::result::Result<Document, StoreError> {
        let profile = self.auth.current_profile();
        let record = UserRecord::new(
            user_id.to_string(),
            ProfileRecord {
                email: profile.as_ref().and_then(|p| p.email.clone()),
                display_name: profile.as_ref().and_then(|p| p.display_name.clone()),
                photo_url: profile.as_ref().and_then(|p| p.photo_url.clone()),
                created_at: Some(Utc::now()),
            },
        );

        let fields = record
            .to_fields()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let mask: Vec<&str> = fields.keys().map(String::as_str).collect();

        self.store
            .patch_document(token, collections::USERS, user_id, &fields, &mask)
            .await
    }

    // ─── Write Path ──────────────────────────────────────────────

    /// Record a completed session for one category.
    ///
    /// Reads the current record, prepends the entry to that category's
    /// history (bounded, newest first), replaces the personal bests
    /// wholesale with `bests`, and writes back only that category's
    /// field.
    pub async fn update_game_record(
        &self,
        category: GameCategory,
        entry: SessionEntry,
        bests: BTreeMap<String, MetricValue>,
    ) -> Result<()> {
        let user_id = self.auth.user_id()?;

        let record = self.read_user_record().await?;
        let mut game = record.game(category);
        game.record_session(entry, bests);

        let fields = BTreeMap::from([(category.field_name().to_string(), game.to_tagged()?)]);
        let mask = [category.field_name()];

        self.patch_with_retry(&user_id, &fields, &mask).await?;

        tracing::debug!(user_id = %user_id, category = %category, "Game record updated");
        Ok(())
    }

    /// Field-masked patch with a single refresh-and-retry on an
    /// authorization rejection.
    async fn patch_with_retry(
        &self,
        user_id: &str,
        fields: &BTreeMap<String, TaggedValue>,
        mask: &[&str],
    ) -> Result<Document> {
        let token = self.auth.access_token()?;

        match self
            .store
            .patch_document(&token, collections::USERS, user_id, fields, mask)
            .await
        {
            Ok(document) => Ok(document),
            Err(StoreError::Unauthorized) => {
                self.refresh_for_retry(&token).await?;
                let token = self.auth.access_token()?;
                self.store
                    .patch_document(&token, collections::USERS, user_id, fields, mask)
                    .await
                    .map_err(store_failure)
            }
            Err(e) => Err(store_failure(e)),
        }
    }

    /// Run one Authenticator refresh for a rejected store call.
    ///
    /// A failed refresh has already signed the session out; the caller
    /// sees `Unauthenticated` and the SignedOut notification carries
    /// the explanation.
    async fn refresh_for_retry(&self, rejected_token: &str) -> Result<()> {
        tracing::info!("Store rejected access token, refreshing");
        self.auth
            .refresh(rejected_token)
            .await
            .map_err(|_| SyncError::Unauthenticated)
    }
}

fn store_failure(e: StoreError) -> SyncError {
    match e {
        StoreError::Unauthorized => {
            // Second rejection after a successful refresh: the single
            // retry is exhausted.
            SyncError::SyncFailed("authorization rejected after token refresh".to_string())
        }
        other => SyncError::SyncFailed(other.to_string()),
    }
}
