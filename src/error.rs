//! HTTP error envelope.
//!
//! DESIGN
//! ======
//! Service modules define their own `thiserror` enums and implement
//! `ErrorCode` for them. Route handlers return `Result<_, ApiError>` and rely
//! on the blanket `From` to turn any service error into a JSON body:
//!
//! ```json
//! {"code": "E_LEDGER_SAME_ACCOUNT", "message": "...", "fields": [...]}
//! ```
//!
//! `fields` is omitted when empty. Server-side failures are logged in full
//! and replaced by a generic message so SQL details never reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use crate::validate::{FieldError, ValidationError};

pub const MSG_INTERNAL: &str = "Erro ao processar a solicitação. Tente novamente.";

/// Grepable code and HTTP status for a service error.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn status(&self) -> StatusCode;

    fn fields(&self) -> &[FieldError] {
        &[]
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub fields: Vec<FieldError>,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into(), fields: Vec::new() }
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "E_UNAUTHORIZED", "Sessão inválida ou expirada")
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "E_FORBIDDEN", message)
    }

    #[must_use]
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "E_INTERNAL", MSG_INTERNAL)
    }
}

impl<E: ErrorCode> From<E> for ApiError {
    fn from(err: E) -> Self {
        let status = err.status();
        let code = err.error_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err, code, "request failed");
            return Self { code, ..Self::internal() };
        }
        Self { status, code, message: err.to_string(), fields: err.fields().to_vec() }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "<[FieldError]>::is_empty")]
    fields: &'a [FieldError],
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { code: self.code, message: &self.message, fields: &self.fields };
        (self.status, Json(body)).into_response()
    }
}

impl ErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        "E_VALIDATION"
    }

    fn status(&self) -> StatusCode {
        StatusCode::UNPROCESSABLE_ENTITY
    }

    fn fields(&self) -> &[FieldError] {
        &self.fields
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
