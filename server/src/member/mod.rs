//! Membership Ledger
//!
//! Adding and removing community members, gated by the caller's built-in
//! role in that community.

mod error;
mod handlers;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, post},
    Router,
};

use crate::api::AppState;
use crate::auth::require_auth;

pub use error::MemberError;
pub use handlers::{AddMemberRequest, MemberResponse};

/// Create the member router. Every route requires authentication.
///
/// - POST / - Add a member
/// - DELETE /{id} - Remove a member
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::add_member))
        .route("/{id}", delete(handlers::remove_member))
        .layer(from_fn_with_state(state, require_auth))
}
