//! Member Error Types

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::response::{self, ErrorCode, FieldError};
use crate::db::StoreError;
use crate::permissions::PermissionError;

#[derive(Debug, Error)]
pub enum MemberError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Community not found")]
    CommunityNotFound,

    #[error("Role not found")]
    RoleNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Member not found")]
    NotFound,

    #[error("User is already a member")]
    AlreadyMember,

    #[error("Cannot remove the last admin")]
    LastAdmin,

    #[error("{0}")]
    Permission(#[from] PermissionError),

    #[error("Store error")]
    Store(#[from] StoreError),
}

impl From<JsonRejection> for MemberError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(response::json_rejection_errors(&rejection))
    }
}

impl From<PathRejection> for MemberError {
    fn from(_: PathRejection) -> Self {
        Self::Validation(vec![FieldError::on(
            "id",
            ErrorCode::InvalidInput,
            "Please provide a valid id.",
        )])
    }
}

impl IntoResponse for MemberError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::Validation(errors) => return response::failure(StatusCode::BAD_REQUEST, &errors),
            Self::CommunityNotFound => not_found("community", "Community not found."),
            Self::RoleNotFound => not_found("role", "Role not found."),
            Self::UserNotFound => not_found("user", "User not found."),
            Self::NotFound => not_found("id", "Member not found."),
            Self::AlreadyMember => (
                StatusCode::CONFLICT,
                FieldError::on(
                    "user",
                    ErrorCode::ResourceExists,
                    "User is already added in the community.",
                ),
            ),
            Self::LastAdmin => (
                StatusCode::FORBIDDEN,
                FieldError::new(
                    ErrorCode::NotAllowedAccess,
                    "Cannot remove the last admin of a community.",
                ),
            ),
            Self::Permission(err) => return err.into_response(),
            Self::Store(err) => {
                tracing::error!(error = ?err, "Member endpoint store error");
                return response::server_error();
            }
        };

        response::failure(status, &[error])
    }
}

fn not_found(param: &str, message: &str) -> (StatusCode, FieldError) {
    (
        StatusCode::NOT_FOUND,
        FieldError::on(param, ErrorCode::ResourceNotFound, message),
    )
}
