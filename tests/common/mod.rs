// SPDX-License-Identifier: MIT

//! In-process fake backend for integration tests: the identity
//! endpoints, the secure-token endpoint, and the document store REST
//! surface, with request counters and controllable token validity.

use axum::extract::{Form, Json, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use focus_sync::config::Config;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[allow(dead_code)]
pub const TEST_USER_ID: &str = "user-1";
#[allow(dead_code)]
pub const TEST_EMAIL: &str = "player@example.com";
#[allow(dead_code)]
pub const TEST_DISPLAY_NAME: &str = "Player One";

/// Per-route request counters.
#[derive(Default)]
pub struct RequestCounts {
    pub sign_in: AtomicUsize,
    pub lookup: AtomicUsize,
    pub refresh: AtomicUsize,
    pub get_doc: AtomicUsize,
    pub patch_doc: AtomicUsize,
}

/// Shared state of the fake backend.
#[derive(Default)]
pub struct BackendState {
    /// Document fields per user id, as raw wire JSON.
    pub docs: Mutex<HashMap<String, serde_json::Value>>,
    pub valid_access_tokens: Mutex<HashSet<String>>,
    pub valid_refresh_tokens: Mutex<HashSet<String>>,
    token_seq: AtomicUsize,
    pub counts: RequestCounts,
}

impl BackendState {
    fn mint_tokens(&self) -> (String, String) {
        let n = self.token_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let access = format!("access-{}", n);
        let refresh = format!("refresh-{}", n);
        self.valid_access_tokens.lock().insert(access.clone());
        self.valid_refresh_tokens.lock().insert(refresh.clone());
        (access, refresh)
    }
}

/// A running fake backend plus a client config pointed at it.
pub struct TestBackend {
    pub state: Arc<BackendState>,
    pub config: Config,
}

impl TestBackend {
    /// Make every outstanding access token invalid (refresh tokens stay
    /// good), so the next store call sees a 401.
    pub fn invalidate_access_tokens(&self) {
        self.state.valid_access_tokens.lock().clear();
    }

    /// Make refresh impossible: the next refresh attempt is rejected.
    #[allow(dead_code)]
    pub fn invalidate_refresh_tokens(&self) {
        self.state.valid_refresh_tokens.lock().clear();
    }

    /// Raw stored document fields for a user, if any.
    #[allow(dead_code)]
    pub fn doc_fields(&self, user_id: &str) -> Option<serde_json::Value> {
        self.state.docs.lock().get(user_id).cloned()
    }

    #[allow(dead_code)]
    pub fn store_request_count(&self) -> usize {
        self.state.counts.get_doc.load(Ordering::SeqCst)
            + self.state.counts.patch_doc.load(Ordering::SeqCst)
    }
}

/// Spawn the fake backend on an ephemeral port.
pub async fn spawn_backend() -> TestBackend {
    // Best-effort: only the first test in the process wins the init.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let state = Arc::new(BackendState::default());

    let app = Router::new()
        .route("/identity/accounts:signInWithIdp", post(sign_in))
        .route("/identity/accounts:lookup", post(lookup))
        .route("/securetoken/token", post(refresh))
        .route(
            "/firestore/projects/{project}/databases/{db}/documents/{collection}/{doc}",
            get(get_document).patch(patch_document),
        )
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr: SocketAddr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve fake backend");
    });

    let mut config = Config::for_project("test-project", "test-key");
    config.identity_url = format!("http://{}/identity", addr);
    config.token_url = format!("http://{}/securetoken", addr);
    config.firestore_url = format!("http://{}/firestore", addr);

    TestBackend { state, config }
}

// ─── Identity Endpoints ──────────────────────────────────────────

async fn sign_in(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.counts.sign_in.fetch_add(1, Ordering::SeqCst);

    if body["postBody"] == json!("bad-credential") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"message": "INVALID_IDP_RESPONSE"}})),
        );
    }

    let (access, refresh) = state.mint_tokens();
    (
        StatusCode::OK,
        Json(json!({
            "idToken": access,
            "refreshToken": refresh,
            "localId": TEST_USER_ID,
            "email": TEST_EMAIL,
            "displayName": TEST_DISPLAY_NAME,
        })),
    )
}

async fn lookup(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.counts.lookup.fetch_add(1, Ordering::SeqCst);

    let token = body["idToken"].as_str().unwrap_or_default();
    if !state.valid_access_tokens.lock().contains(token) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"message": "INVALID_ID_TOKEN"}})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "users": [{
                "localId": TEST_USER_ID,
                "email": TEST_EMAIL,
                "displayName": TEST_DISPLAY_NAME,
            }]
        })),
    )
}

#[derive(Deserialize)]
struct RefreshForm {
    grant_type: String,
    refresh_token: String,
}

async fn refresh(
    State(state): State<Arc<BackendState>>,
    Form(form): Form<RefreshForm>,
) -> impl IntoResponse {
    state.counts.refresh.fetch_add(1, Ordering::SeqCst);

    let known = state
        .valid_refresh_tokens
        .lock()
        .contains(&form.refresh_token);
    if form.grant_type != "refresh_token" || !known {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant"})),
        );
    }

    let (access, refresh) = state.mint_tokens();
    (
        StatusCode::OK,
        Json(json!({
            "id_token": access,
            "refresh_token": refresh,
            "user_id": TEST_USER_ID,
        })),
    )
}

// ─── Document Store Endpoints ────────────────────────────────────

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn authorized(state: &BackendState, headers: &HeaderMap) -> bool {
    bearer_token(headers)
        .map(|token| state.valid_access_tokens.lock().contains(token))
        .unwrap_or(false)
}

fn document_name(project: &str, collection: &str, doc: &str) -> String {
    format!(
        "projects/{}/databases/(default)/documents/{}/{}",
        project, collection, doc
    )
}

async fn get_document(
    State(state): State<Arc<BackendState>>,
    Path((project, _db, collection, doc)): Path<(String, String, String, String)>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.counts.get_doc.fetch_add(1, Ordering::SeqCst);

    if !authorized(&state, &headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"code": 401, "status": "UNAUTHENTICATED"}})),
        );
    }

    match state.docs.lock().get(&doc) {
        Some(fields) => (
            StatusCode::OK,
            Json(json!({
                "name": document_name(&project, &collection, &doc),
                "fields": fields,
            })),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": {"code": 404, "status": "NOT_FOUND"}})),
        ),
    }
}

async fn patch_document(
    State(state): State<Arc<BackendState>>,
    Path((project, _db, collection, doc)): Path<(String, String, String, String)>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.counts.patch_doc.fetch_add(1, Ordering::SeqCst);

    if !authorized(&state, &headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"code": 401, "status": "UNAUTHENTICATED"}})),
        );
    }

    let incoming = body
        .get("fields")
        .cloned()
        .unwrap_or_else(|| json!({}));

    let mask: Vec<&str> = params
        .iter()
        .filter(|(key, _)| key == "updateMask.fieldPaths")
        .map(|(_, path)| path.as_str())
        .collect();

    let mut docs = state.docs.lock();
    let stored = docs.entry(doc.clone()).or_insert_with(|| json!({}));

    if mask.is_empty() {
        // No mask: full replacement.
        *stored = incoming;
    } else {
        let stored = stored.as_object_mut().expect("stored fields object");
        for path in mask {
            match incoming.get(path) {
                Some(value) => {
                    stored.insert(path.to_string(), value.clone());
                }
                None => {
                    stored.remove(path);
                }
            }
        }
    }

    (
        StatusCode::OK,
        Json(json!({
            "name": document_name(&project, &collection, &doc),
            "fields": docs.get(&doc).cloned().unwrap_or_else(|| json!({})),
        })),
    )
}
