//! Authentication HTTP Handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::error::{AuthError, AuthResult};
use super::middleware::AuthUser;
use super::password;
use crate::api::response::{validation_errors, ApiResponse};
use crate::api::AppState;
use crate::db::{NewUser, StoreError, User};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Sign-up request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 2, message = "Name should be at least 2 characters."))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password should be at least 6 characters."))]
    pub password: String,
}

/// Sign-in request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Public user profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

impl From<AuthUser> for UserProfile {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// `meta` block carrying the access token.
#[derive(Debug, Serialize)]
pub struct TokenMeta {
    pub access_token: String,
}

type AuthResponse = ApiResponse<UserProfile, TokenMeta>;

// ============================================================================
// Handlers
// ============================================================================

/// Register a new user.
///
/// POST /v1/auth/signup
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<RegisterRequest>, AuthError>,
) -> AuthResult<AuthResponse> {
    body.validate()
        .map_err(|e| AuthError::Validation(validation_errors(&e)))?;

    // Fast path; the unique index on users.email settles races below.
    if state.store.find_user_by_email(&body.email).await?.is_some() {
        return Err(AuthError::UserAlreadyExists);
    }

    let password_hash = password::hash(body.password).await?;

    let user = state
        .store
        .create_user(NewUser {
            name: body.name,
            email: body.email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(_) => AuthError::UserAlreadyExists,
            other => AuthError::Store(other),
        })?;

    let token = state.tokens.issue(user.id, &user.email)?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(ApiResponse::created(UserProfile::from(user)).meta(TokenMeta {
        access_token: token.token,
    }))
}

/// Sign in with email and password.
///
/// POST /v1/auth/signin
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, AuthError>,
) -> AuthResult<AuthResponse> {
    if !body.email.contains('@') {
        return Err(AuthError::MalformedEmail);
    }

    let user = state
        .store
        .find_user_by_email(&body.email)
        .await?
        .ok_or(AuthError::UnknownEmail)?;

    if !password::verify(body.password, user.password_hash.clone()).await? {
        tracing::info!(user_id = %user.id, "Sign-in rejected: wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    let token = state.tokens.issue(user.id, &user.email)?;

    tracing::info!(user_id = %user.id, "User signed in");

    Ok(ApiResponse::ok(UserProfile::from(user)).meta(TokenMeta {
        access_token: token.token,
    }))
}

/// Get the current user's profile.
///
/// Answers 201 rather than 200; existing clients depend on it.
///
/// GET /v1/auth/me
#[tracing::instrument(skip_all, fields(user_id = %auth.id))]
pub async fn get_profile(auth: AuthUser) -> ApiResponse<UserProfile> {
    ApiResponse::with_status(StatusCode::CREATED, UserProfile::from(auth))
}
