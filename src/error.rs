//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::store::StoreError;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Storage Errors**: Anything the account store reports
/// - **Validation Errors**: Invalid request data or undecodable payloads
/// - **Runtime Errors**: The task running a mutation panicked or was aborted
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// `GET /account` found nothing to list.
    #[error("No accounts found")]
    NoAccounts,

    #[error("Request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        AppError::InvalidRequest("Invalid account id".to_string())
    }
}

impl AppError {
    /// HTTP status and machine-readable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Store(StoreError::NotFound) => (StatusCode::NOT_FOUND, "account_not_found"),
            AppError::NoAccounts => (StatusCode::NOT_FOUND, "no_accounts"),
            AppError::Store(StoreError::InvalidArgument(_)) | AppError::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, "invalid_request")
            }
            AppError::Store(StoreError::InsufficientFunds) => {
                (StatusCode::CONFLICT, "insufficient_funds")
            }
            AppError::Store(StoreError::Conflict(_)) => (StatusCode::CONFLICT, "conflict"),
            AppError::Store(StoreError::Unavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
            }
            AppError::Store(StoreError::Database(_)) | AppError::Task(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `NotFound`, `NoAccounts` → 404 Not Found
/// - `InvalidArgument`, `InvalidRequest` → 400 Bad Request
/// - `InsufficientFunds`, `Conflict` → 409 Conflict
/// - `Unavailable` → 503 Service Unavailable (retryable)
/// - `Database`, `Task` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::InvalidRequest(msg) | AppError::Store(StoreError::InvalidArgument(msg)) => {
                msg.clone()
            }
            AppError::Store(StoreError::Unavailable(_)) => {
                tracing::warn!(error = %self, "Storage unavailable");
                "Storage is temporarily unavailable, retry later".to_string()
            }
            _ if status.is_server_error() => {
                tracing::error!(error = %self, "Request failed");
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
