// SPDX-License-Identifier: MIT

//! Crate-level error taxonomy.
//!
//! Module-local error types (`StoreError`, `IdentityError`, `CodecError`)
//! cover the seams; everything a caller of the sync surface sees is a
//! `SyncError`.

use crate::store::codec::CodecError;

/// Errors surfaced by the sync surface.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The identity endpoint rejected the provider credential during sign-in.
    /// The user must retry the sign-in flow.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// An operation was attempted with no credential present, or the
    /// session was signed out while the operation was in flight.
    #[error("No credential present")]
    Unauthenticated,

    /// The refresh token was rejected. Terminal for the session: the
    /// Authenticator has already cleared the Token Store and signed out.
    #[error("Refresh token rejected by the identity service")]
    TokenRefreshFailed,

    /// A remote read or write failed after the single refresh-and-retry
    /// was exhausted. The underlying cause is attached.
    #[error("Remote sync failed: {0}")]
    SyncFailed(String),

    /// The codec was handed a value it cannot represent on the wire.
    /// A programming error, not a user-facing condition.
    #[error("Unsupported value type: {0}")]
    UnsupportedType(String),
}

impl From<CodecError> for SyncError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::UnsupportedType(msg) => SyncError::UnsupportedType(msg),
            CodecError::Malformed(msg) => SyncError::SyncFailed(msg),
        }
    }
}

/// Result type alias for the sync surface.
pub type Result<T> = std::result::Result<T, SyncError>;
