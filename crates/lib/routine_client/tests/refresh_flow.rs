//! Interceptor tests against a local stub of the Routine API.
//!
//! The stub tracks which access/refresh tokens it honors and counts
//! refresh calls, so the tests can pin down the exact retry behavior:
//! at most one refresh per original request, retries carry the new
//! token, and forced logout fires exactly once.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};

use routine_client::{ApiClient, AuthUser, ClientError, LogoutReason, SessionEvent, SessionStore};

#[derive(Default)]
struct Stub {
    valid_access: Mutex<HashSet<String>>,
    valid_refresh: Mutex<HashSet<String>>,
    refresh_calls: AtomicUsize,
    issued: AtomicUsize,
    /// Artificial latency for the refresh endpoint, in milliseconds.
    refresh_delay_ms: AtomicU64,
}

impl Stub {
    fn grant_access(&self, token: &str) {
        self.valid_access.lock().unwrap().insert(token.into());
    }

    fn grant_refresh(&self, token: &str) {
        self.valid_refresh.lock().unwrap().insert(token.into());
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(String::from)
}

fn stub_user() -> serde_json::Value {
    serde_json::json!({ "id": "u1", "email": "a@b.com", "name": "A" })
}

async fn tasks_handler(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
) -> (StatusCode, Json<serde_json::Value>) {
    let ok = bearer(&headers)
        .map(|t| stub.valid_access.lock().unwrap().contains(&t))
        .unwrap_or(false);
    if ok {
        (StatusCode::OK, Json(serde_json::json!([])))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "unauthorized", "message": "Invalid or expired token" })),
        )
    }
}

async fn refresh_handler(
    State(stub): State<Arc<Stub>>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    stub.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let delay = stub.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let presented = body["refreshToken"].as_str().unwrap_or_default().to_string();
    let accepted = stub.valid_refresh.lock().unwrap().remove(&presented);
    if !accepted {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "unauthorized", "message": "Invalid refresh token" })),
        );
    }

    // Rotate: the presented token is spent, a fresh pair takes over.
    let n = stub.issued.fetch_add(1, Ordering::SeqCst);
    let access = format!("access-{n}");
    let refresh = format!("refresh-{n}");
    stub.grant_access(&access);
    stub.grant_refresh(&refresh);

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "access_token": access,
            "refresh_token": refresh,
            "expires_in": 86400,
            "token_type": "Bearer",
            "user": stub_user(),
        })),
    )
}

async fn boom_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "internal_error", "message": "Internal server error" })),
    )
}

/// Start the stub API on an ephemeral port, returning its state + base URL.
async fn start_stub() -> (Arc<Stub>, String) {
    let stub = Arc::new(Stub::default());
    let app = Router::new()
        .route("/api/tasks", get(tasks_handler))
        .route("/api/auth/refresh", post(refresh_handler))
        .route("/api/boom", get(boom_handler))
        .with_state(Arc::clone(&stub));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (stub, format!("http://{addr}"))
}

fn seeded_store(dir: &std::path::Path, token: &str, refresh: Option<&str>) -> SessionStore {
    let mut store = SessionStore::open(dir);
    store.apply(SessionEvent::LoginSucceeded {
        user: AuthUser {
            id: "u1".into(),
            email: "a@b.com".into(),
            name: "A".into(),
        },
        token: token.into(),
    });
    store.set_refresh_token(refresh.map(String::from));
    store
}

fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<LogoutReason>) -> Vec<LogoutReason> {
    let mut events = Vec::new();
    while let Ok(reason) = rx.try_recv() {
        events.push(reason);
    }
    events
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn retries_once_with_refreshed_token() {
    let (stub, base_url) = start_stub().await;
    stub.grant_refresh("refresh-seed");

    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(base_url.as_str(), seeded_store(dir.path(), "stale", Some("refresh-seed")));
    let mut rx = client.subscribe_logout();

    // Stale token -> 401 -> one refresh -> retry succeeds.
    let tasks: serde_json::Value = client.get_json("/api/tasks").await.expect("retried request");
    assert_eq!(tasks, serde_json::json!([]));
    assert_eq!(stub.refresh_calls.load(Ordering::SeqCst), 1);

    // The session holds the refreshed pair, durably.
    assert_eq!(client.session().token.as_deref(), Some("access-0"));
    assert!(client.session().is_authenticated);
    let persisted = SessionStore::open(dir.path());
    assert_eq!(persisted.state().token.as_deref(), Some("access-0"));
    assert_eq!(persisted.refresh_token(), Some("refresh-0"));

    // No logout happened.
    assert!(drain_events(&mut rx).is_empty());

    // A follow-up request with the fresh token needs no further refresh.
    let _: serde_json::Value = client.get_json("/api/tasks").await.unwrap();
    assert_eq!(stub.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn refresh_failure_forces_exactly_one_logout() {
    let (stub, base_url) = start_stub().await;
    // "dead-refresh" was never granted, so the refresh attempt 401s.

    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(base_url.as_str(), seeded_store(dir.path(), "stale", Some("dead-refresh")));
    let mut rx = client.subscribe_logout();

    let err = client
        .get_json::<serde_json::Value>("/api/tasks")
        .await
        .expect_err("refresh cannot succeed");
    assert!(matches!(err, ClientError::SessionExpired));
    assert_eq!(stub.refresh_calls.load(Ordering::SeqCst), 1);

    // Session cleared, both durable entries gone, one logout event.
    assert!(!client.session().is_authenticated);
    assert!(client.session().token.is_none());
    let persisted = SessionStore::open(dir.path());
    assert!(persisted.state().user.is_none());
    assert!(persisted.refresh_token().is_none());
    assert_eq!(drain_events(&mut rx), vec![LogoutReason::SessionExpired]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_refresh_token_forces_logout() {
    let (stub, base_url) = start_stub().await;

    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(base_url.as_str(), seeded_store(dir.path(), "stale", None));
    let mut rx = client.subscribe_logout();

    let err = client
        .get_json::<serde_json::Value>("/api/tasks")
        .await
        .expect_err("nothing to refresh with");
    assert!(matches!(err, ClientError::Unauthorized));

    // No refresh call was even attempted.
    assert_eq!(stub.refresh_calls.load(Ordering::SeqCst), 0);
    assert!(!client.session().is_authenticated);
    assert_eq!(drain_events(&mut rx), vec![LogoutReason::Unauthorized]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_share_one_refresh() {
    let (stub, base_url) = start_stub().await;
    stub.grant_refresh("refresh-seed");
    stub.refresh_delay_ms.store(100, Ordering::SeqCst);

    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(ApiClient::new(
        &base_url,
        seeded_store(dir.path(), "stale", Some("refresh-seed")),
    ));
    let mut rx = client.subscribe_logout();

    // Both requests 401 on the stale token; the refresh gate must
    // coalesce them into a single refresh call, and neither may trigger
    // a logout.
    let a = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.get_json::<serde_json::Value>("/api/tasks").await }
    });
    let b = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.get_json::<serde_json::Value>("/api/tasks").await }
    });

    a.await.unwrap().expect("first concurrent request");
    b.await.unwrap().expect("second concurrent request");

    assert_eq!(stub.refresh_calls.load(Ordering::SeqCst), 1);
    assert!(client.session().is_authenticated);
    assert!(drain_events(&mut rx).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn network_failure_keeps_authenticated_session() {
    // Reserve a port, then close it so connections are refused.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(dead_url.as_str(), seeded_store(dir.path(), "tok", Some("refresh-1")));
    let mut rx = client.subscribe_logout();

    let err = client
        .get_json::<serde_json::Value>("/api/tasks")
        .await
        .expect_err("server is down");
    assert!(matches!(err, ClientError::ServerUnavailable));

    // A transient infrastructure failure is not an invalid session.
    assert!(client.session().is_authenticated);
    assert_eq!(SessionStore::open(dir.path()).refresh_token(), Some("refresh-1"));
    assert!(drain_events(&mut rx).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn network_failure_without_authentication_redirects_to_login() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    // A token but no user: not authenticated, and the backend that could
    // sort it out is unreachable.
    let dir = tempfile::tempdir().unwrap();
    let mut store = SessionStore::open(dir.path());
    store.apply(SessionEvent::TokenRefreshed { token: "orphan".into() });
    let client = ApiClient::new(dead_url.as_str(), store);
    let mut rx = client.subscribe_logout();

    let err = client
        .get_json::<serde_json::Value>("/api/tasks")
        .await
        .expect_err("server is down");
    assert!(matches!(err, ClientError::ServerUnavailable));

    assert!(client.session().token.is_none());
    assert_eq!(drain_events(&mut rx), vec![LogoutReason::ServerUnreachable]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_error_passes_through_untouched() {
    let (stub, base_url) = start_stub().await;
    stub.grant_access("tok");

    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(base_url.as_str(), seeded_store(dir.path(), "tok", Some("refresh-1")));
    let mut rx = client.subscribe_logout();

    let err = client
        .get_json::<serde_json::Value>("/api/boom")
        .await
        .expect_err("stub always 500s here");
    assert!(matches!(err, ClientError::ServerError(500)));

    // 5xx is not an auth failure: no refresh, no logout, session intact.
    assert_eq!(stub.refresh_calls.load(Ordering::SeqCst), 0);
    assert!(client.session().is_authenticated);
    assert!(drain_events(&mut rx).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn logout_is_idempotent() {
    let (_stub, base_url) = start_stub().await;

    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(base_url.as_str(), seeded_store(dir.path(), "tok", Some("refresh-1")));
    let mut rx = client.subscribe_logout();

    client.logout().await;
    assert!(!client.session().is_authenticated);
    let persisted = SessionStore::open(dir.path());
    assert!(persisted.state().token.is_none());
    assert!(persisted.refresh_token().is_none());

    // Second logout finds nothing to clear and emits nothing.
    client.logout().await;
    assert_eq!(drain_events(&mut rx), vec![LogoutReason::UserInitiated]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn late_refresh_cannot_resurrect_session_after_logout() {
    let (stub, base_url) = start_stub().await;
    stub.grant_refresh("refresh-seed");
    stub.refresh_delay_ms.store(300, Ordering::SeqCst);

    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(ApiClient::new(
        &base_url,
        seeded_store(dir.path(), "stale", Some("refresh-seed")),
    ));
    let mut rx = client.subscribe_logout();

    // Kick off a request whose refresh will still be in flight...
    let pending = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.get_json::<serde_json::Value>("/api/tasks").await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    // ...when the user logs out.
    client.logout().await;

    // The refresh completes against a bumped generation and stands down.
    let result = pending.await.unwrap();
    assert!(result.is_err());
    assert!(!client.session().is_authenticated);
    assert!(client.session().token.is_none());
    assert!(SessionStore::open(dir.path()).refresh_token().is_none());

    // Only the user-initiated logout is broadcast.
    assert_eq!(drain_events(&mut rx), vec![LogoutReason::UserInitiated]);
}
