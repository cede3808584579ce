//! Role Catalog
//!
//! Named labels that memberships point at. The catalog is open: anyone may
//! add a role, and names are unique.

mod handlers;

use axum::routing::get;
use axum::Router;

use crate::api::AppState;

pub use handlers::{CreateRoleRequest, RoleError};

/// Create the role router.
///
/// - GET / - List roles
/// - POST / - Create a role
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(handlers::list_roles).post(handlers::create_role))
}
