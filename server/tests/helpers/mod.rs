//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum
//! router backed by a fresh in-memory store, plus utilities for signing up
//! users and creating communities.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, header, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use agora_server::api::{create_router, AppState};
use agora_server::config::{Config, GrantPolicy};
use agora_server::db::{MemoryStore, Store};
use agora_server::permissions::{ensure_builtin_roles, BuiltinRoles};

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
    pub roles: BuiltinRoles,
}

/// A signed-up user and its access token.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

impl TestApp {
    /// Create a test app with the default (permissive) configuration.
    pub async fn new() -> Self {
        Self::with_config(Config::default_for_test()).await
    }

    /// Create a test app with the hierarchical grant policy.
    pub async fn hierarchical() -> Self {
        let mut config = Config::default_for_test();
        config.grant_policy = GrantPolicy::Hierarchical;
        Self::with_config(config).await
    }

    /// Create a test app with a custom config.
    pub async fn with_config(config: Config) -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let roles = ensure_builtin_roles(store.as_ref())
            .await
            .expect("Failed to create built-in roles");

        let state = AppState::new(store.clone(), config.clone());
        let router = create_router(state);

        Self {
            router,
            store,
            config: Arc::new(config),
            roles,
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// Send a request and return its status and parsed JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Self::request(method, uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self.oneshot(request).await;
        let status = response.status();
        (status, body_to_json(response).await)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Sign up a user named `name` with email `{name}@x.com` and password
    /// `secret1`.
    pub async fn signup(&self, name: &str) -> TestUser {
        let (status, body) = self
            .post(
                "/v1/auth/signup",
                None,
                json!({
                    "name": name,
                    "email": format!("{}@x.com", name.to_lowercase()),
                    "password": "secret1",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");

        TestUser {
            id: uuid_at(&body, "/content/data/id"),
            token: body["content"]["meta"]["access_token"]
                .as_str()
                .expect("missing access token")
                .to_string(),
        }
    }

    /// Create a community owned by `owner` and return its ID.
    pub async fn create_community(&self, owner: &TestUser, name: &str) -> Uuid {
        let (status, body) = self
            .post(
                "/v1/community",
                Some(&owner.token),
                json!({ "name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create community failed: {body}");
        uuid_at(&body, "/content/data/id")
    }

    /// Add `user` to `community` under `role` acting as `actor`.
    pub async fn add_member(
        &self,
        actor: &TestUser,
        community: Uuid,
        user: Uuid,
        role: Uuid,
    ) -> (StatusCode, Value) {
        self.post(
            "/v1/member",
            Some(&actor.token),
            json!({ "community": community, "user": user, "role": role }),
        )
        .await
    }
}

/// Collect a response body and parse it as JSON.
pub async fn body_to_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}

/// Read a UUID out of a JSON document by pointer.
pub fn uuid_at(body: &Value, pointer: &str) -> Uuid {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("no uuid at {pointer} in {body}"))
}

/// First error code of a failure envelope.
pub fn error_code(body: &Value) -> &str {
    assert_eq!(body["status"], json!(false), "expected failure: {body}");
    body["errors"][0]["code"].as_str().expect("missing error code")
}
