// Common test utilities and helper structs.
// Shared across all integration test files to avoid duplication.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response, StatusCode},
    Router,
};
use notesync_core::{
    app::AppState,
    app_config::AppConfig,
    db::{create_pool, DatabaseConfig},
    handlers::{auth_routes, health, notes_routes, protected_auth_routes, sync_routes, todos_routes},
    services::{JwtService, RateLimitConfig, RateLimitService},
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

/// Test application wrapper: owns its own tempdir-backed SQLite file and
/// RSA key so tests never share state with each other.
pub struct TestApp {
    pub app: Router,
    _dir: tempfile::TempDir,
}

impl TestApp {
    pub fn post(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "POST", uri)
    }

    pub fn get(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "GET", uri)
    }

    pub fn put(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "PUT", uri)
    }

    pub fn delete(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "DELETE", uri)
    }
}

/// Test request builder.
pub struct TestRequest<'a> {
    app: &'a TestApp,
    request: Request<Body>,
    ip: SocketAddr,
}

impl<'a> TestRequest<'a> {
    fn new(app: &'a TestApp, method: &str, uri: &str) -> Self {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        Self {
            app,
            request,
            ip: "127.0.0.1:12345".parse().unwrap(),
        }
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.request
            .headers_mut()
            .insert("authorization", format!("Bearer {token}").parse().unwrap());
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        let body_bytes = serde_json::to_vec(body).unwrap();
        let (mut parts, _) = self.request.into_parts();
        parts
            .headers
            .insert("content-type", "application/json".parse().unwrap());
        self.request = Request::from_parts(parts, Body::from(body_bytes));
        self
    }

    /// Gives this request its own source IP, for rate-limiter tests that
    /// need several distinct clients.
    pub fn from_ip(mut self, ip: &str) -> Self {
        self.ip = format!("{ip}:12345").parse().unwrap();
        self
    }

    pub async fn send(self) -> TestResponse {
        let mut request = self.request;
        request.extensions_mut().insert(ConnectInfo(self.ip));

        let response = self.app.app.clone().oneshot(request).await.unwrap();
        TestResponse { response }
    }
}

pub struct TestResponse {
    response: Response<Body>,
}

impl TestResponse {
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub async fn json<T: serde::de::DeserializeOwned>(self) -> T {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    pub async fn value(self) -> serde_json::Value {
        self.json().await
    }
}

/// Boots a fresh instance of the full router against a tempfile-backed
/// SQLite database and a freshly generated signing key. Every call is
/// fully isolated from every other.
pub async fn setup_test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let key_path = dir.path().join("test.key");

    let db_config = DatabaseConfig {
        path: db_path.to_string_lossy().to_string(),
        max_connections: 5,
        connection_timeout: Duration::from_secs(5),
    };
    let pool = create_pool(&db_config).unwrap();

    {
        let mut conn = pool.get().unwrap();
        diesel::connection::SimpleConnection::batch_execute(
            &mut conn,
            &std::fs::read_to_string(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/migrations/2026-01-01-000000_initial_schema/up.sql"
            ))
            .unwrap(),
        )
        .unwrap();
    }

    let jwt_service = Arc::new(JwtService::from_key_file(key_path.to_str().unwrap(), 900, 2_592_000).unwrap());
    let rate_limiter = Arc::new(RateLimitService::new(RateLimitConfig {
        max_requests: 1000,
        window_seconds: 60,
    }));

    let config = AppConfig::from_env().unwrap();

    let app_state = AppState {
        config: Arc::new(config),
        pool,
        jwt_service,
        rate_limiter,
    };

    let api_routes = Router::new()
        .route("/health", axum::routing::get(health::health))
        .merge(auth_routes(app_state.clone()))
        .merge(protected_auth_routes(app_state.clone()))
        .merge(notes_routes(app_state.clone()))
        .merge(todos_routes(app_state.clone()))
        .merge(sync_routes(app_state.clone()));

    let app = Router::new()
        .nest("/api/v1", api_routes)
        .with_state(app_state);

    TestApp { app, _dir: dir }
}
