//! End-to-end session behavior against an in-process fake backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use admin_console::config::ConsoleConfig;
use admin_console::net::http::ApiError;
use admin_console::net::types::Credentials;
use admin_console::router::LOGIN_PATH;
use admin_console::state::auth::{AuthError, InitOutcome};
use admin_console::state::storage::{DurableStore, MemoryStore, USER_KEY};
use admin_console::Console;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{Value, json};

const SESSION_COOKIE: &str = "sessionid";
const SESSION_VALUE: &str = "s3ss10n";

// =========================================================================
// Fake backend
// =========================================================================

#[derive(Default)]
struct Backend {
    live_session: Mutex<Option<String>>,
    current_user_calls: AtomicUsize,
}

impl Backend {
    fn expire(&self) {
        *self.live_session.lock() = None;
    }

    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let Some(live) = self.live_session.lock().clone() else {
            return false;
        };
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .any(|pair| pair.trim() == format!("{SESSION_COOKIE}={live}"))
    }
}

fn admin_json() -> Value {
    json!({ "id": 1, "username": "admin", "email": "admin@example.com", "is_staff": true })
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Authentication credentials were not provided." }))).into_response()
}

async fn login(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    if body["password"] == "revoked" {
        return unauthorized();
    }
    if body["username"] != "admin" || body["password"] != "secret" {
        return (StatusCode::BAD_REQUEST, Json(json!({ "status": "error", "message": "invalid credentials" })))
            .into_response();
    }
    *backend.live_session.lock() = Some(SESSION_VALUE.to_owned());
    let cookie = format!("{SESSION_COOKIE}={SESSION_VALUE}; Path=/; HttpOnly");
    (StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(json!({ "status": "success", "user": admin_json() })))
        .into_response()
}

async fn logout(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    if !backend.is_authorized(&headers) {
        return unauthorized();
    }
    backend.expire();
    Json(json!({ "status": "success", "message": "logged out" })).into_response()
}

async fn current_user(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.current_user_calls.fetch_add(1, Ordering::SeqCst);
    if !backend.is_authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "status": "success", "user": admin_json() })).into_response()
}

async fn models(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    if !backend.is_authorized(&headers) {
        return unauthorized();
    }
    Json(json!([{ "id": 4, "name": "qwen", "model_path": "/models/qwen", "is_active": true }])).into_response()
}

async fn spawn_backend() -> (Arc<Backend>, String) {
    let backend = Arc::new(Backend::default());
    let app = Router::new()
        .route("/api/auth/login/", post(login))
        .route("/api/auth/logout/", post(logout))
        .route("/api/auth/user/", get(current_user))
        .route("/api/v1/models/", get(models))
        .with_state(Arc::clone(&backend));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (backend, format!("http://{addr}/api"))
}

fn console_with(api_url: &str, store: Arc<dyn DurableStore>) -> Console {
    let config = ConsoleConfig::new(api_url, std::env::temp_dir());
    Console::with_store(&config, store).unwrap()
}

async fn signed_in_console(api_url: &str, store: Arc<dyn DurableStore>) -> Console {
    let console = console_with(api_url, store);
    console
        .sessions()
        .login(&Credentials::new("admin", "secret"))
        .await
        .unwrap();
    console
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn login_cookie_authorizes_later_calls() {
    let (backend, api_url) = spawn_backend().await;
    let console = signed_in_console(&api_url, Arc::new(MemoryStore::new())).await;

    assert!(console.sessions().is_authenticated());
    assert!(console.http().cookie_header().is_some());
    assert_eq!(console.sessions().init_auth().await, InitOutcome::Verified);
    assert_eq!(backend.current_user_calls.load(Ordering::SeqCst), 1);

    let models = console.models().list().await.unwrap();
    assert_eq!(models[0].name, "qwen");
}

#[tokio::test]
async fn bad_credentials_fail_without_touching_session() {
    let (_backend, api_url) = spawn_backend().await;
    let store = Arc::new(MemoryStore::new());
    let console = console_with(&api_url, store.clone());

    let err = console
        .sessions()
        .login(&Credentials::new("admin", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::AuthenticationFailed("invalid credentials".into()));
    assert!(!console.sessions().is_authenticated());
    assert!(!store.contains(USER_KEY));
}

#[tokio::test]
async fn rejected_relogin_keeps_current_session() {
    let (backend, api_url) = spawn_backend().await;
    let store = Arc::new(MemoryStore::new());
    let console = signed_in_console(&api_url, store.clone()).await;
    console.navigator().push("/models").unwrap();

    let err = console
        .sessions()
        .login(&Credentials::new("admin", "revoked"))
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::AuthenticationFailed("invalid credentials".into()));
    assert!(console.sessions().is_authenticated());
    assert!(store.contains(USER_KEY));
    assert_eq!(console.navigator().current().map(|l| l.path), Some("/models".to_owned()));
    assert!(console.models().list().await.is_ok());
    assert!(backend.live_session.lock().is_some());
}

#[tokio::test]
async fn any_unauthorized_reply_clears_session_and_lands_on_login() {
    let (backend, api_url) = spawn_backend().await;
    let store = Arc::new(MemoryStore::new());
    let console = signed_in_console(&api_url, store.clone()).await;
    console.navigator().push("/models").unwrap();

    backend.expire();
    let err = console.models().list().await.unwrap_err();

    assert_eq!(err, ApiError::Unauthorized);
    assert!(!console.sessions().is_authenticated());
    assert!(!store.contains(USER_KEY));
    assert_eq!(console.navigator().current().map(|l| l.path), Some(LOGIN_PATH.to_owned()));
}

#[tokio::test]
async fn session_survives_restart_through_durable_store() {
    let (backend, api_url) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let config = ConsoleConfig::new(&api_url, dir.path().to_path_buf());

    let first = Console::new(&config).unwrap();
    first
        .sessions()
        .login(&Credentials::new("admin", "secret"))
        .await
        .unwrap();
    first.persist_cookies();
    drop(first);

    let second = Console::new(&config).unwrap();
    let location = second.navigator().push("/users").unwrap();

    assert_eq!(location.path, "/users");
    assert_eq!(second.navigator().settle().await, Some(InitOutcome::Verified));
    assert_eq!(backend.current_user_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stale_snapshot_is_signed_out_on_verification() {
    let (backend, api_url) = spawn_backend().await;
    let store: Arc<dyn DurableStore> = Arc::new(MemoryStore::new());
    let first = signed_in_console(&api_url, Arc::clone(&store)).await;
    drop(first);
    backend.expire();

    let second = console_with(&api_url, Arc::clone(&store));
    let outcome = second.sessions().init_auth().await;

    assert_eq!(outcome, InitOutcome::SignedOut);
    assert!(!second.sessions().is_authenticated());
    assert_eq!(store.load(USER_KEY).unwrap(), None);
}

#[tokio::test]
async fn logout_invalidates_backend_session() {
    let (backend, api_url) = spawn_backend().await;
    let console = signed_in_console(&api_url, Arc::new(MemoryStore::new())).await;

    console.sessions().logout().await.unwrap();

    assert!(!console.sessions().is_authenticated());
    assert!(backend.live_session.lock().is_none());
    assert_eq!(console.sessions().init_auth().await, InitOutcome::NoSnapshot);
}

#[tokio::test]
async fn logout_with_dead_backend_still_clears_locally() {
    let (backend, api_url) = spawn_backend().await;
    let console = signed_in_console(&api_url, Arc::new(MemoryStore::new())).await;
    backend.expire();

    let err = console.sessions().logout().await.unwrap_err();

    assert_eq!(err, AuthError::Unauthorized);
    assert!(!console.sessions().is_authenticated());
}
