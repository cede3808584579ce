//! Community Error Types

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
pub enum CommunityError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Community name taken")]
    AlreadyExists,

    #[error("Community not found")]
    NotFound,

    #[error("{0}")]
    Permission(#[from] PermissionError),

    #[error("Store error")]
    Store(#[from] StoreError),
}

impl From<JsonRejection> for CommunityError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(response::json_rejection_errors(&rejection))
    }
}

impl From<PathRejection> for CommunityError {
    fn from(_: PathRejection) -> Self {
        Self::Validation(vec![FieldError::on(
            "id",
            ErrorCode::InvalidInput,
            "Please provide a valid id.",
        )])
    }
}

impl IntoResponse for CommunityError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::Validation(errors) => return response::failure(StatusCode::BAD_REQUEST, &errors),
            Self::AlreadyExists => (
                StatusCode::CONFLICT,
                FieldError::on(
                    "name",
                    ErrorCode::ResourceExists,
                    "Community with this name already exists.",
                ),
            ),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                FieldError::on("id", ErrorCode::ResourceNotFound, "Community not found."),
            ),
            Self::Permission(err) => return err.into_response(),
            Self::Store(err) => {
                tracing::error!(error = ?err, "Community endpoint store error");
                return response::server_error();
            }
        };

        response::failure(status, &[error])
    }
}
