use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::payments::PaymentError;
use crate::storage::StorageError;
use crate::store::StoreError;
use crate::synthesis::SynthesisError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("{0}")]
    Validation(String),

    #[error("Invalid document type")]
    InvalidDocumentType,

    #[error("Invalid file type. Please upload a PDF or image file.")]
    UnsupportedFileType,

    #[error("Invalid letter type")]
    InvalidLetterType,

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    DocumentNotFound(String),

    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Letter generation failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Payment initialization failed: {0}")]
    PaymentInit(PaymentError),

    #[error("Payment verification failed: {0}")]
    PaymentVerify(PaymentError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Maps the error to its HTTP status, user-facing message and optional
    /// upstream details. Server-side failures keep a stable message; the
    /// underlying cause travels in `details`.
    pub fn response_parts(&self) -> (StatusCode, String, Option<String>) {
        match self {
            AppError::MissingFields
            | AppError::Validation(_)
            | AppError::InvalidDocumentType
            | AppError::UnsupportedFileType
            | AppError::InvalidLetterType => (StatusCode::BAD_REQUEST, self.to_string(), None),

            AppError::UserNotFound | AppError::DocumentNotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string(), None)
            }

            AppError::Store(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                Some(e.to_string()),
            ),
            AppError::Storage(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Storage error".to_string(),
                Some(e.to_string()),
            ),
            AppError::Synthesis(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate letter".to_string(),
                Some(e.to_string()),
            ),
            AppError::PaymentInit(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to initialize payment".to_string(),
                Some(e.to_string()),
            ),
            AppError::PaymentVerify(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to verify payment".to_string(),
                Some(e.to_string()),
            ),
            AppError::Internal(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(format!("{e:#}")),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = self.response_parts();

        if status.is_server_error() {
            tracing::error!("{self}");
        }

        let mut body = json!({ "error": error });
        if let Some(details) = details {
            body["details"] = json!(details);
        }

        (status, Json(body)).into_response()
    }
}
