//! JSON error responses for the session API.
//!
//! Core errors become `{code?, message, details?}` bodies. The HTTP status
//! follows the error code unless a handler picked one explicitly.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Error code (e.g., "E001" for an empty handoff slot)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// What went wrong
    pub message: String,
    /// How to fix it, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip)]
    status: Option<StatusCode>,
}

impl ApiError {
    /// Error without a code; answered with 500.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            details: None,
            status: None,
        }
    }

    /// Error carrying a core error code.
    #[must_use]
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::new(message)
        }
    }

    /// Attach a hint.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Status the error is answered with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        if let Some(status) = self.status {
            return status;
        }
        match self.code.as_deref() {
            Some("E001") => StatusCode::NOT_FOUND,
            Some("E002") => StatusCode::CONFLICT,
            Some("E003") => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The request itself was malformed (400).
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: Some(StatusCode::BAD_REQUEST),
            ..Self::new(message)
        }
    }

    /// Something failed on our side (500).
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.message);
        }
        (status, Json(self)).into_response()
    }
}

impl From<crate::error::Error> for ApiError {
    fn from(err: crate::error::Error) -> Self {
        Self {
            code: err.code().map(String::from),
            message: err.to_string(),
            details: err.suggestion().map(String::from),
            status: None,
        }
    }
}

/// Handler result.
pub type ApiResult<T> = Result<T, ApiError>;
