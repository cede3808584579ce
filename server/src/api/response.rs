//! Response envelope shared by every endpoint.
//!
//! Success: `{"status": true, "content": {"data": ..., "meta": ...}}`
//! Failure: `{"status": false, "errors": [{"param": ..., "message": ..., "code": ...}]}`

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

use crate::pagination::{Page, PageMeta, PageRequest};

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    InvalidCredentials,
    ResourceExists,
    ResourceNotFound,
    NotAllowedAccess,
    NotSignedin,
    ServerError,
}

/// One entry of the `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    pub message: String,
    pub code: ErrorCode,
}

impl FieldError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            param: None,
            message: message.into(),
            code,
        }
    }

    pub fn on(param: impl Into<String>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            param: Some(param.into()),
            message: message.into(),
            code,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    status: bool,
    errors: &'a [FieldError],
}

/// Render an error list with the given status.
pub fn failure(status: StatusCode, errors: &[FieldError]) -> Response {
    (
        status,
        Json(ErrorBody {
            status: false,
            errors,
        }),
    )
        .into_response()
}

/// Generic 500 body; never carries internal detail.
pub fn server_error() -> Response {
    failure(
        StatusCode::INTERNAL_SERVER_ERROR,
        &[FieldError::new(ErrorCode::ServerError, "Something went wrong.")],
    )
}

/// Flatten `validator` output into `INVALID_INPUT` field errors, one per field,
/// ordered by field name.
#[must_use]
pub fn validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map_or_else(|| format!("{field} is invalid."), ToString::to_string);
            FieldError::on(field.to_string(), ErrorCode::InvalidInput, message)
        })
        .collect();
    out.sort_by(|a, b| a.param.cmp(&b.param));
    out
}

/// Error list for a body that could not be parsed as JSON.
#[must_use]
pub fn json_rejection_errors(rejection: &JsonRejection) -> Vec<FieldError> {
    vec![FieldError::new(
        ErrorCode::InvalidInput,
        format!("Invalid request body: {}", rejection.body_text()),
    )]
}

#[derive(Debug, Serialize)]
struct Content<T, M> {
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<M>,
}

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T, M = ()> {
    #[serde(skip)]
    code: StatusCode,
    status: bool,
    content: Content<T, M>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with `data`.
    pub const fn ok(data: T) -> Self {
        Self::with_status(StatusCode::OK, data)
    }

    /// 201 with `data`.
    pub const fn created(data: T) -> Self {
        Self::with_status(StatusCode::CREATED, data)
    }

    pub const fn with_status(code: StatusCode, data: T) -> Self {
        Self {
            code,
            status: true,
            content: Content { data, meta: None },
        }
    }
}

impl<T: Serialize, M: Serialize> ApiResponse<T, M> {
    /// Attach a `meta` block.
    pub fn meta<N: Serialize>(self, meta: N) -> ApiResponse<T, N> {
        ApiResponse {
            code: self.code,
            status: self.status,
            content: Content {
                data: self.content.data,
                meta: Some(meta),
            },
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>, PageMeta> {
    /// 200 with one page of records and its `{total, pages, page}` meta.
    pub fn page(page: Page<T>, request: PageRequest) -> Self {
        let meta = PageMeta::new(page.total, request);
        ApiResponse::ok(page.items).meta(meta)
    }
}

impl<T: Serialize, M: Serialize> IntoResponse for ApiResponse<T, M> {
    fn into_response(self) -> Response {
        (self.code, Json(self)).into_response()
    }
}

/// Bare `{"status": true}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct Ack {
    status: bool,
}

impl Ack {
    pub const fn new() -> Self {
        Self { status: true }
    }
}

impl Default for Ack {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoResponse for Ack {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use validator::Validate;

    #[derive(Validate)]
    struct SignupForm {
        #[validate(length(min = 2, message = "Name should be at least 2 characters."))]
        name: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_error_code_wire_names() {
        assert_eq!(
            serde_json::to_value(ErrorCode::NotAllowedAccess).unwrap(),
            json!("NOT_ALLOWED_ACCESS")
        );
        assert_eq!(
            serde_json::to_value(ErrorCode::NotSignedin).unwrap(),
            json!("NOT_SIGNEDIN")
        );
    }

    #[test]
    fn test_field_error_omits_missing_param() {
        let value = serde_json::to_value(FieldError::new(ErrorCode::ServerError, "x")).unwrap();
        assert_eq!(value, json!({"message": "x", "code": "SERVER_ERROR"}));
    }

    #[test]
    fn test_validation_errors_are_per_field_and_sorted() {
        let form = SignupForm {
            name: "A".into(),
            email: "nope".into(),
        };
        let errors = validation_errors(&form.validate().unwrap_err());

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].param.as_deref(), Some("email"));
        assert_eq!(errors[0].message, "email is invalid.");
        assert_eq!(errors[1].param.as_deref(), Some("name"));
        assert_eq!(errors[1].message, "Name should be at least 2 characters.");
        assert!(errors.iter().all(|e| e.code == ErrorCode::InvalidInput));
    }

    #[test]
    fn test_envelope_shape() {
        let response = ApiResponse::created(json!({"id": 1})).meta(json!({"access_token": "t"}));
        assert_eq!(response.code, StatusCode::CREATED);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": true, "content": {"data": {"id": 1}, "meta": {"access_token": "t"}}})
        );

        let bare = ApiResponse::ok(json!([]));
        assert_eq!(
            serde_json::to_value(&bare).unwrap(),
            json!({"status": true, "content": {"data": []}})
        );
    }
}
