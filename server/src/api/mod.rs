//! API Router and Application State
//!
//! Central routing configuration and shared state.

pub mod response;

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{auth, auth::TokenIssuer, community, config::Config, db::Store, member, roles};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend
    pub store: Arc<dyn Store>,
    /// Server configuration
    pub config: Arc<Config>,
    /// Access token signer/verifier
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let tokens = TokenIssuer::from_config(&config);
        Self {
            store,
            config: Arc::new(config),
            tokens: Arc::new(tokens),
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .nest("/v1/auth", auth::router(state.clone()))
        .nest("/v1/community", community::router(state.clone()))
        .nest("/v1/role", roles::router())
        .nest("/v1/member", member::router(state.clone()))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Whether a database backs the store
    database: bool,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        database: state.config.has_database(),
    })
}
