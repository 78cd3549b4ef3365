//! Error taxonomy for request settlement.
//!
//! Nothing is retried or recovered internally; every failure surfaces to the
//! caller once, carrying a [`Response`] whenever one was constructed.

use crate::response::Response;
use std::fmt;
use thiserror::Error;

/// Boxed error produced by user-supplied hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Terminal transport faults raised before any response exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFault {
    /// The transfer was aborted through a cancellation signal.
    Aborted,
    /// The transport failed below the HTTP layer (DNS, TCP, TLS, I/O).
    Failed(String),
    /// The transport-enforced timeout elapsed.
    TimedOut,
}

impl fmt::Display for TransportFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted => write!(f, "aborted"),
            Self::Failed(message) => write!(f, "{message}"),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Per-request errors.
#[derive(Error, Debug)]
pub enum HttpError {
    /// Abort, error, or timeout from the transport; no response was
    /// constructed.
    #[error("transport failure: {0}")]
    Transport(TransportFault),

    /// The transfer completed without a valid HTTP status (below 100). The
    /// response is carried for diagnostics.
    #[error("invalid status {}", .0.status)]
    InvalidStatus(Box<Response>),

    /// The post-response hook failed; its error text is attached to the
    /// carried response so callers keep status and header context.
    #[error("response hook failed: {}", .0.error.as_deref().unwrap_or("unknown error"))]
    ResponseHook(Box<Response>),

    /// The pre-request hook failed before any transfer was attempted.
    #[error("request hook failed: {0}")]
    RequestHook(#[source] BoxError),

    /// The resolved URL could not be parsed.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(String),

    /// The response body could not be decoded as requested.
    #[error("response decode failed: {0}")]
    Decode(String),
}

/// Result type for request operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorCategory {
    /// Transport-level failures (DNS, TCP, TLS, I/O).
    Connection,
    /// Transport-enforced timeout.
    Timeout,
    /// Caller-initiated cancellation.
    Cancelled,
    /// Completion without a usable HTTP status.
    Status,
    /// Failure inside a user-supplied hook.
    Hook,
    /// Invalid request construction.
    Request,
    /// Response body decoding failures.
    Response,
}

impl HttpError {
    /// Categorize the error for reporting.
    pub fn category(&self) -> HttpErrorCategory {
        match self {
            Self::Transport(TransportFault::Aborted) => HttpErrorCategory::Cancelled,
            Self::Transport(TransportFault::TimedOut) => HttpErrorCategory::Timeout,
            Self::Transport(TransportFault::Failed(_)) => HttpErrorCategory::Connection,
            Self::InvalidStatus(_) => HttpErrorCategory::Status,
            Self::ResponseHook(_) | Self::RequestHook(_) => HttpErrorCategory::Hook,
            Self::Url(_) | Self::Json(_) => HttpErrorCategory::Request,
            Self::Decode(_) => HttpErrorCategory::Response,
        }
    }

    /// The response this error carries, if one was constructed.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::InvalidStatus(response) | Self::ResponseHook(response) => Some(response),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_fault_display() {
        assert_eq!(TransportFault::Aborted.to_string(), "aborted");
        assert_eq!(TransportFault::TimedOut.to_string(), "timed out");
        assert_eq!(
            TransportFault::Failed("connection reset".into()).to_string(),
            "connection reset"
        );
    }

    #[test]
    fn test_category_classification() {
        assert_eq!(
            HttpError::Transport(TransportFault::Aborted).category(),
            HttpErrorCategory::Cancelled
        );
        assert_eq!(
            HttpError::Transport(TransportFault::TimedOut).category(),
            HttpErrorCategory::Timeout
        );
        assert_eq!(
            HttpError::Transport(TransportFault::Failed("x".into())).category(),
            HttpErrorCategory::Connection
        );
        assert_eq!(
            HttpError::Json("bad".into()).category(),
            HttpErrorCategory::Request
        );
        assert_eq!(
            HttpError::Decode("bad utf-8".into()).category(),
            HttpErrorCategory::Response
        );
    }

    #[test]
    fn test_response_accessor_absent_for_transport_faults() {
        let error = HttpError::Transport(TransportFault::TimedOut);
        assert!(error.response().is_none());
    }
}
