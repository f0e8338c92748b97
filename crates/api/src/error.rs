use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use golfrun_cloud::CloudError;
use golfrun_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for validation and configuration failures and
/// [`CloudError`] for anything that went wrong while triggering the job.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `golfrun_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The outbound run call failed.
    #[error("Downstream error: {0}")]
    Downstream(#[from] CloudError),

    /// The request outlived `REQUEST_TIMEOUT_SECS`.
    #[error("Request timed out after {0}s")]
    RequestTimeout(u64),

    /// A handler panicked. The payload is logged, never returned.
    #[error("Internal server error")]
    Internal(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(CoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Core(CoreError::Configuration(msg)) => {
                tracing::error!(error = %msg, "Deployment is misconfigured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIGURATION_ERROR",
                    msg.clone(),
                )
            }
            // Downstream text is passed through unsanitized.
            AppError::Downstream(err) => {
                tracing::error!(error = %err, "Job trigger failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DOWNSTREAM_ERROR",
                    err.to_string(),
                )
            }
            AppError::RequestTimeout(_) => {
                tracing::warn!(error = %self, "Request cancelled by timeout");
                (
                    StatusCode::REQUEST_TIMEOUT,
                    "REQUEST_TIMEOUT",
                    self.to_string(),
                )
            }
            AppError::Internal(detail) => {
                tracing::error!(panic = %detail, "Handler panicked");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    self.to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
