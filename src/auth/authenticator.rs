// SPDX-License-Identifier: MIT

//! Sign-in state machine.
//!
//! Phases: SignedOut → SigningIn → SignedIn, with SignedIn → Refreshing
//! → SignedIn on a token refresh. Any refresh failure is terminal for
//! the session: the Token Store is cleared and the machine returns to
//! SignedOut. Auth-state notifications fire on every transition into
//! SignedIn or SignedOut, never on the intermediate phases.

use crate::auth::identity::{IdentityClient, IdentityError};
use crate::auth::token_store::{CredentialSet, TokenStore};
use crate::error::{Result, SyncError};
use crate::models::UserProfile;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Authenticator state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    SignedOut,
    SigningIn,
    SignedIn,
    Refreshing,
}

/// Drives the identity handshake and owns all writes to the Token Store.
pub struct Authenticator {
    identity: IdentityClient,
    tokens: Arc<TokenStore>,
    phase: RwLock<AuthPhase>,
    /// Serializes refresh attempts; `refresh` re-checks the Token Store
    /// after acquiring it, so concurrent rejected calls trigger one
    /// refresh, not several.
    refresh_lock: Mutex<()>,
    notify: watch::Sender<Option<UserProfile>>,
}

impl Authenticator {
    pub fn new(identity: IdentityClient, tokens: Arc<TokenStore>) -> Self {
        let (notify, _) = watch::channel(None);

        // A credential set restored from session storage is unverified,
        // so the machine starts SignedOut until resume_session confirms it.
        Self {
            identity,
            tokens,
            phase: RwLock::new(AuthPhase::SignedOut),
            refresh_lock: Mutex::new(()),
            notify,
        }
    }

    // ─── State Queries ───────────────────────────────────────────

    pub fn phase(&self) -> AuthPhase {
        *self.phase.read()
    }

    pub fn is_signed_in(&self) -> bool {
        self.phase() == AuthPhase::SignedIn
    }

    /// Profile of the current session, if signed in.
    pub fn current_profile(&self) -> Option<UserProfile> {
        if !matches!(self.phase(), AuthPhase::SignedIn | AuthPhase::Refreshing) {
            return None;
        }
        self.tokens.credentials().map(|c| c.profile())
    }

    /// Watch channel carrying the profile on sign-in and `None` on
    /// sign-out. Every subscriber observes the latest state.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> {
        self.notify.subscribe()
    }

    /// Current access token, for dependent store calls.
    pub fn access_token(&self) -> Result<String> {
        self.tokens.access_token().ok_or(SyncError::Unauthenticated)
    }

    /// Current user id, for dependent store calls.
    pub fn user_id(&self) -> Result<String> {
        self.tokens.user_id().ok_or(SyncError::Unauthenticated)
    }

    // ─── Transitions ─────────────────────────────────────────────

    /// Exchange the provider credential for a session.
    ///
    /// SignedOut → SigningIn → SignedIn on success; back to SignedOut
    /// with `AuthenticationFailed` otherwise.
    pub async fn sign_in_with_credential(&self, provider_credential: &str) -> Result<UserProfile> {
        *self.phase.write() = AuthPhase::SigningIn;

        match self.identity.sign_in_with_credential(provider_credential).await {
            Ok(response) => {
                let set = CredentialSet {
                    access_token: response.id_token,
                    refresh_token: response.refresh_token,
                    user_id: response.local_id,
                    email: response.email,
                    display_name: response.display_name,
                    photo_url: response.photo_url,
                };
                let profile = set.profile();

                self.tokens.set_credentials(set);
                *self.phase.write() = AuthPhase::SignedIn;
                self.notify.send_replace(Some(profile.clone()));

                tracing::info!(user_id = %profile.user_id, "Signed in");
                Ok(profile)
            }
            Err(e) => {
                *self.phase.write() = AuthPhase::SignedOut;
                self.notify.send_replace(None);

                tracing::warn!(error = %e, "Sign-in failed");
                Err(SyncError::AuthenticationFailed(e.to_string()))
            }
        }
    }

    /// Verify a credential set restored from session storage.
    ///
    /// Returns the profile if the stored token is still good; any
    /// verification failure takes the same clear-and-SignedOut path as
    /// a failed refresh and yields `None` rather than an error.
    pub async fn resume_session(&self) -> Result<Option<UserProfile>> {
        let Some(set) = self.tokens.credentials() else {
            return Ok(None);
        };

        match self.identity.lookup(&set.access_token).await {
            Ok(user) => {
                // Refresh the profile fields from the verified lookup.
                let updated = CredentialSet {
                    email: user.email,
                    display_name: user.display_name,
                    photo_url: user.photo_url,
                    ..set
                };
                let profile = updated.profile();

                self.tokens.set_credentials(updated);
                *self.phase.write() = AuthPhase::SignedIn;
                self.notify.send_replace(Some(profile.clone()));

                tracing::info!(user_id = %profile.user_id, "Session resumed");
                Ok(Some(profile))
            }
            Err(e) => {
                tracing::info!(error = %e, "Stored token failed verification, signing out");
                self.force_sign_out();
                Ok(None)
            }
        }
    }

    /// Exchange the refresh token for a new token pair.
    ///
    /// `rejected_access_token` is the token the caller saw rejected.
    /// Waiters queue on the refresh lock; whoever holds a rejection for
    /// an already-replaced token finds the new pair in the Token Store
    /// and returns without a second identity call.
    ///
    /// SignedIn → Refreshing → SignedIn on success. Replaying the call
    /// that saw the rejection is the caller's responsibility. Any
    /// failure clears the Token Store, signs out, and returns
    /// `TokenRefreshFailed` — terminal for the session.
    pub async fn refresh(&self, rejected_access_token: &str) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;

        let Some(set) = self.tokens.credentials() else {
            return Err(SyncError::Unauthenticated);
        };

        if set.access_token != rejected_access_token {
            tracing::debug!("Token already refreshed by a concurrent caller");
            return Ok(());
        }

        *self.phase.write() = AuthPhase::Refreshing;

        match self.identity.refresh_token(&set.refresh_token).await {
            Ok(response) => {
                let updated = CredentialSet {
                    access_token: response.id_token,
                    refresh_token: response.refresh_token,
                    ..set
                };
                let profile = updated.profile();

                self.tokens.set_credentials(updated);
                *self.phase.write() = AuthPhase::SignedIn;
                self.notify.send_replace(Some(profile));

                tracing::info!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                match e {
                    IdentityError::Rejected(ref msg) => {
                        tracing::warn!(reason = %msg, "Refresh token rejected, signing out")
                    }
                    _ => tracing::warn!(error = %e, "Token refresh failed, signing out"),
                }
                self.force_sign_out();
                Err(SyncError::TokenRefreshFailed)
            }
        }
    }

    /// Clear the session unconditionally. No network call is required
    /// to succeed.
    pub fn sign_out(&self) {
        tracing::info!("Signed out");
        self.force_sign_out();
    }

    fn force_sign_out(&self) {
        self.tokens.clear();
        *self.phase.write() = AuthPhase::SignedOut;
        self.notify.send_replace(None);
    }
}
