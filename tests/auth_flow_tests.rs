// SPDX-License-Identifier: MIT

//! Authenticator state machine tests: sign-in, sign-out, notifications,
//! and session resume against the fake identity backend.

mod common;

use common::{spawn_backend, TEST_DISPLAY_NAME, TEST_USER_ID};
use focus_sync::storage::{KeyValueStorage, MemoryStorage};
use focus_sync::{SyncClient, SyncError};
use std::sync::Arc;

#[tokio::test]
async fn test_sign_in_populates_state_and_notifies() {
    let backend = spawn_backend().await;
    let client = SyncClient::new(backend.config.clone());

    let rx = client.subscribe_auth_state();
    assert!(rx.borrow().is_none());
    assert!(!client.is_signed_in());

    let profile = client
        .sign_in_with_credential("provider-credential")
        .await
        .expect("sign-in");

    assert_eq!(profile.user_id, TEST_USER_ID);
    assert_eq!(profile.display_name.as_deref(), Some(TEST_DISPLAY_NAME));
    assert!(client.is_signed_in());
    assert_eq!(client.current_user_profile(), Some(profile.clone()));

    // The subscriber sees the sign-in notification.
    assert_eq!(rx.borrow().as_ref(), Some(&profile));
}

#[tokio::test]
async fn test_sign_in_failure_returns_to_signed_out() {
    let backend = spawn_backend().await;
    let client = SyncClient::new(backend.config.clone());

    let err = client
        .sign_in_with_credential("bad-credential")
        .await
        .expect_err("rejected credential");

    assert!(matches!(err, SyncError::AuthenticationFailed(_)));
    assert!(!client.is_signed_in());
    assert!(client.current_user_profile().is_none());
}

#[tokio::test]
async fn test_sign_out_clears_session_and_notifies() {
    let backend = spawn_backend().await;
    let client = SyncClient::new(backend.config.clone());

    client
        .sign_in_with_credential("provider-credential")
        .await
        .expect("sign-in");

    let rx = client.subscribe_auth_state();
    assert!(rx.borrow().is_some());

    client.sign_out();

    assert!(!client.is_signed_in());
    assert!(client.current_user_profile().is_none());
    assert!(rx.borrow().is_none());
}

#[tokio::test]
async fn test_resume_session_with_valid_token() {
    let backend = spawn_backend().await;
    let session: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());

    // First process: sign in, mirroring credentials into the session area.
    let first = SyncClient::with_storage(
        backend.config.clone(),
        session.clone(),
        Arc::new(MemoryStorage::new()),
    );
    first
        .sign_in_with_credential("provider-credential")
        .await
        .expect("sign-in");
    drop(first);

    // Second process over the same session area: verified resume.
    let second = SyncClient::with_storage(
        backend.config.clone(),
        session.clone(),
        Arc::new(MemoryStorage::new()),
    );
    assert!(!second.is_signed_in());

    let profile = second.resume_session().await.expect("resume");
    let profile = profile.expect("verified session");

    assert_eq!(profile.user_id, TEST_USER_ID);
    assert!(second.is_signed_in());
}

#[tokio::test]
async fn test_resume_session_with_rejected_token_signs_out() {
    let backend = spawn_backend().await;
    let session: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());

    let first = SyncClient::with_storage(
        backend.config.clone(),
        session.clone(),
        Arc::new(MemoryStorage::new()),
    );
    first
        .sign_in_with_credential("provider-credential")
        .await
        .expect("sign-in");
    drop(first);

    backend.invalidate_access_tokens();

    let second = SyncClient::with_storage(
        backend.config.clone(),
        session.clone(),
        Arc::new(MemoryStorage::new()),
    );
    let resumed = second.resume_session().await.expect("resume is not an error");

    assert!(resumed.is_none());
    assert!(!second.is_signed_in());

    // The stored credentials were cleared: a third client has nothing
    // to resume and makes no identity call for it.
    let lookups_before = backend
        .state
        .counts
        .lookup
        .load(std::sync::atomic::Ordering::SeqCst);
    let third = SyncClient::with_storage(
        backend.config.clone(),
        session,
        Arc::new(MemoryStorage::new()),
    );
    assert!(third.resume_session().await.expect("resume").is_none());
    assert_eq!(
        backend
            .state
            .counts
            .lookup
            .load(std::sync::atomic::Ordering::SeqCst),
        lookups_before
    );
}

#[tokio::test]
async fn test_resume_without_stored_credentials() {
    let backend = spawn_backend().await;
    let client = SyncClient::new(backend.config.clone());

    let resumed = client.resume_session().await.expect("resume");
    assert!(resumed.is_none());
    assert!(!client.is_signed_in());
}
