use std::time::Duration;

use thiserror::Error;

/// Errors from talking to the worker over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Connection refused, reset or aborted before a response arrived.
    #[error("Cannot reach worker: {0}")]
    Connect(String),

    /// The per-call timeout elapsed.
    #[error("Worker did not answer within {0:?}")]
    Timeout(Duration),

    /// The worker answered with a non-2xx status.
    #[error("Worker returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("Invalid worker response: {0}")]
    Decode(String),

    /// The connection broke while reading a response. The worker may
    /// already have acted on the request, so this is never retried.
    #[error("Worker response was cut off: {0}")]
    Interrupted(String),

    /// The worker answered `{ "success": false }`.
    #[error("Worker rejected the request: {0}")]
    Rejected(String),

    /// The HTTP client itself could not be built.
    #[error("HTTP client setup failed: {0}")]
    Setup(String),
}

impl ClientError {
    /// Only connection-level failures are worth another attempt. Any HTTP
    /// response means the worker is reachable and made a decision.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Timeout(_))
    }
}

impl ClientError {
    /// Map a failure while reading the body of a response that already
    /// started arriving. JSON decoding happens separately, so any error here
    /// is a broken transfer.
    pub fn from_response_error(e: &reqwest::Error) -> Self {
        Self::Interrupted(e.to_string())
    }
}

/// Conversion for client setup and request sending. Body reads go through
/// [`ClientError::from_response_error`] instead.
impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else if e.is_builder() {
            Self::Setup(e.to_string())
        } else if e.is_body() {
            Self::Interrupted(e.to_string())
        } else {
            // Connect and request-send failures: no response was seen
            Self::Connect(e.to_string())
        }
    }
}
