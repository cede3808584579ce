//! Role HTTP Handlers

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use thiserror::Error;
use validator::Validate;

use crate::api::response::{self, validation_errors, ApiResponse, ErrorCode, FieldError};
use crate::api::AppState;
use crate::db::{Role, StoreError};
use crate::pagination::{PageMeta, PageQuery};

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum RoleError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Role name taken")]
    AlreadyExists,

    #[error("Store error")]
    Store(#[from] StoreError),
}

impl From<JsonRejection> for RoleError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(response::json_rejection_errors(&rejection))
    }
}

impl IntoResponse for RoleError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => response::failure(StatusCode::BAD_REQUEST, &errors),
            Self::AlreadyExists => response::failure(
                StatusCode::CONFLICT,
                &[FieldError::on(
                    "name",
                    ErrorCode::ResourceExists,
                    "Role with this name already exists.",
                )],
            ),
            Self::Store(err) => {
                tracing::error!(error = ?err, "Role endpoint store error");
                response::server_error()
            }
        }
    }
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[serde(default)]
    #[validate(length(min = 2, message = "Name should be at least 2 characters."))]
    pub name: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a role.
///
/// POST /v1/role
#[tracing::instrument(skip_all)]
pub async fn create_role(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<CreateRoleRequest>, RoleError>,
) -> Result<ApiResponse<Role>, RoleError> {
    body.validate()
        .map_err(|e| RoleError::Validation(validation_errors(&e)))?;

    let role = state.store.create_role(&body.name).await.map_err(|e| match e {
        StoreError::UniqueViolation(_) => RoleError::AlreadyExists,
        other => RoleError::Store(other),
    })?;

    tracing::info!(role_id = %role.id, "Role created");

    Ok(ApiResponse::created(role))
}

/// List roles.
///
/// GET /v1/role?page=&limit=
#[tracing::instrument(skip_all)]
pub async fn list_roles(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<ApiResponse<Vec<Role>, PageMeta>, RoleError> {
    let request = query.to_request();
    let page = state.store.list_roles(request).await?;
    Ok(ApiResponse::page(page, request))
}
