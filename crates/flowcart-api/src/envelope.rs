//! JSON response envelope and error mapping.
//!
//! Every endpoint answers `{success, data}` or
//! `{success, error: {code, message}}`; storage errors are never leaked
//! verbatim to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use flowcart_commerce::{CommerceError, ErrorKind};
use serde::Serialize;

/// Standard response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error payload inside the envelope.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying data.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    /// Successful response carrying data and a human-readable note.
    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    /// Failure envelope.
    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
            message: None,
        }
    }
}

/// Handler result alias; errors render through the envelope.
pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), AppError>;

/// Transport-level error wrapper.
#[derive(Debug)]
pub enum AppError {
    /// Request arrived without a validated identity.
    Unauthorized,
    /// A domain operation failed.
    Commerce(CommerceError),
}

impl From<CommerceError> for AppError {
    fn from(err: CommerceError) -> Self {
        AppError::Commerce(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED".to_string(),
                "Authentication required".to_string(),
            ),
            AppError::Commerce(err) => {
                let status = match err.kind() {
                    ErrorKind::Validation => StatusCode::BAD_REQUEST,
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                    ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                    ErrorKind::Conflict => StatusCode::CONFLICT,
                    ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                };
                // Internal failure details stay in the logs.
                let message = if err.kind() == ErrorKind::Internal {
                    tracing::error!(error = %err, "internal error");
                    "Internal server error".to_string()
                } else {
                    err.to_string()
                };
                (status, err.code().to_string(), message)
            }
        };

        (status, Json(ApiResponse::failure(code, message))).into_response()
    }
}
