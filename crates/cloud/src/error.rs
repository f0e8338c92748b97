use std::time::Duration;

/// Errors from the outbound job execution layer.
///
/// The HTTP layer reports every variant as an opaque downstream failure
/// carrying the [`Display`](std::fmt::Display) text.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("Cloud Run API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The long-running operation finished with an error status.
    #[error("Operation {operation} failed (code {code}): {message}")]
    Operation {
        operation: String,
        code: i32,
        message: String,
    },

    /// No access token could be obtained.
    #[error("Access token unavailable: {0}")]
    Token(String),

    /// The call did not complete within the configured bound.
    #[error("Timed out after {0:?} waiting for the job execution")]
    Timeout(Duration),

    /// The API answered with something that is not an operation.
    #[error("Malformed API response: {0}")]
    MalformedResponse(String),
}
