//! Community Registry
//!
//! Community creation (with the owner's admin membership), listings and
//! deletion.

mod error;
mod handlers;
pub mod slug;
pub mod types;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};

use crate::api::AppState;
use crate::auth::require_auth;

pub use error::CommunityError;

/// Create the community router.
///
/// Public routes:
/// - GET / - List communities
/// - GET /{id}/members - List a community's members
///
/// Protected routes:
/// - POST / - Create a community
/// - GET /me/owner - Communities the caller owns
/// - GET /me/member - Communities the caller belongs to
/// - DELETE /{id} - Delete a community
pub fn router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/", get(handlers::list_communities))
        .route("/{id}/members", get(handlers::list_members));

    let protected_routes = Router::new()
        .route("/", post(handlers::create_community))
        .route("/me/owner", get(handlers::list_owned))
        .route("/me/member", get(handlers::list_joined))
        .route("/{id}", delete(handlers::delete_community))
        .layer(from_fn_with_state(state, require_auth));

    public_routes.merge(protected_routes)
}
