/*
[INPUT]:  Error sources (validation, ownership, HTTP, backend, serialization)
[OUTPUT]: Structured error types shared by the adapter and the workflow crate
[POS]:    Error handling layer - unified error types for the whole workspace
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for Cardloom operations
#[derive(Error, Debug)]
pub enum CardloomError {
    /// Malformed or missing input; never retried
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unknown resource id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller does not own the resource
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// The generation backend or BaaS failed; the task is expected to end in `failed`
    #[error("Backend failure: {0}")]
    TransientBackend(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an unexpected error response
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Response body did not decode into the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Operation exceeded its deadline
    #[error("Timed out after {duration}s")]
    Timeout { duration: u64 },

    /// Caller cancelled the operation
    #[error("Cancelled: {0}")]
    Cancelled(String),
}

impl CardloomError {
    /// Failures that may clear up on their own, so a poller reads again on
    /// the next tick instead of giving up.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CardloomError::TransientBackend(_)
                | CardloomError::Http(_)
                | CardloomError::Timeout { .. }
        )
    }

    /// Caller-side mistakes that polling again cannot fix.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CardloomError::Validation(_)
                | CardloomError::NotFound(_)
                | CardloomError::Authorization(_)
        )
    }

    /// HTTP status shown at the outer boundary.
    ///
    /// Ownership failures render as 404 so foreign task ids are
    /// indistinguishable from unknown ones.
    pub fn boundary_status(&self) -> StatusCode {
        match self {
            CardloomError::Validation(_) => StatusCode::BAD_REQUEST,
            CardloomError::NotFound(_) | CardloomError::Authorization(_) => StatusCode::NOT_FOUND,
            CardloomError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            CardloomError::TransientBackend(_) | CardloomError::Http(_) => StatusCode::BAD_GATEWAY,
            CardloomError::Api { code, .. } => u16::try_from(*code)
                .ok()
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Create an error from a non-2xx status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                CardloomError::Validation(message)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                CardloomError::Authorization(message)
            }
            StatusCode::NOT_FOUND => CardloomError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => CardloomError::TransientBackend(message),
            status if status.is_server_error() => CardloomError::TransientBackend(message),
            status => CardloomError::Api {
                code: status.as_u16() as i32,
                message,
            },
        }
    }
}

/// Result type alias for Cardloom operations
pub type Result<T> = std::result::Result<T, CardloomError>;
