//! Authentication Error Types

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::response::{self, ErrorCode, FieldError};
use crate::db::StoreError;

const CREDENTIALS_INVALID: &str = "The credentials you provided are invalid.";
const SIGN_IN_REQUIRED: &str = "You need to sign in to proceed.";

/// Authentication error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Request body failed validation.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Sign-in email has no "@".
    #[error("Malformed email address")]
    MalformedEmail,

    /// No user with the given email.
    #[error("Unknown email")]
    UnknownEmail,

    /// Wrong password for an existing user.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Email already registered.
    #[error("Email already taken")]
    UserAlreadyExists,

    /// Missing Authorization header.
    #[error("Missing authorization header")]
    MissingAuthHeader,

    /// Invalid authorization header format.
    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    /// Invalid token (bad signature, malformed, wrong subject).
    #[error("Invalid token")]
    InvalidToken,

    /// Token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// Token subject no longer exists.
    #[error("User not found")]
    UserNotFound,

    /// Password hashing error.
    #[error("Password processing failed")]
    PasswordHash,

    /// Store error.
    #[error("Store error")]
    Store(#[from] StoreError),

    /// JWT encoding error.
    #[error("Token error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(response::json_rejection_errors(&rejection))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::Validation(errors) => return response::failure(StatusCode::BAD_REQUEST, &errors),
            Self::MalformedEmail => (
                StatusCode::UNAUTHORIZED,
                FieldError::on(
                    "email",
                    ErrorCode::InvalidInput,
                    "Please provide a valid email address.",
                ),
            ),
            Self::UnknownEmail => (
                StatusCode::UNAUTHORIZED,
                FieldError::on("email", ErrorCode::InvalidInput, CREDENTIALS_INVALID),
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                FieldError::on("password", ErrorCode::InvalidCredentials, CREDENTIALS_INVALID),
            ),
            Self::UserAlreadyExists => (
                StatusCode::CONFLICT,
                FieldError::on(
                    "email",
                    ErrorCode::ResourceExists,
                    "User with this email address already exists.",
                ),
            ),
            Self::MissingAuthHeader
            | Self::InvalidAuthHeader
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::UserNotFound => (
                StatusCode::UNAUTHORIZED,
                FieldError::new(ErrorCode::NotSignedin, SIGN_IN_REQUIRED),
            ),
            err @ (Self::PasswordHash | Self::Store(_) | Self::Jwt(_) | Self::Internal(_)) => {
                tracing::error!(error = ?err, "Auth endpoint failed");
                return response::server_error();
            }
        };

        response::failure(status, &[error])
    }
}

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
