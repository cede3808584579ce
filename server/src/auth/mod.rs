//! Authentication Service
//!
//! Credential storage (Argon2 hashes), token issuance and the bearer-token
//! middleware every protected route sits behind.

mod error;
mod handlers;
pub mod jwt;
mod middleware;
pub mod password;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};

use crate::api::AppState;

pub use error::{AuthError, AuthResult};
pub use handlers::UserProfile;
pub use jwt::TokenIssuer;
pub use middleware::{require_auth, AuthUser};

/// Create authentication router.
///
/// Public routes:
/// - POST /signup - Register a new user
/// - POST /signin - Sign in with email/password
///
/// Protected routes:
/// - GET /me - Current user profile
pub fn router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/signup", post(handlers::register))
        .route("/signin", post(handlers::login));

    let protected_routes = Router::new()
        .route("/me", get(handlers::get_profile))
        .layer(axum_middleware::from_fn_with_state(state, require_auth));

    public_routes.merge(protected_routes)
}
