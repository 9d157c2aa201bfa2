//! Error model shared by every downstream call.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors from calling a downstream HTTP JSON endpoint.
///
/// None of these are retried; the caller decides what a failure means.
#[derive(Debug, Error)]
pub enum CallError {
    /// Connection failure, reset, or error while reading the body.
    #[error("transport error calling {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with something other than 200 OK.
    #[error("{endpoint} returned status {status}")]
    Upstream { endpoint: String, status: StatusCode },

    /// 200 OK, but the body did not match the expected shape.
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// The request context was cancelled while the call was in flight.
    #[error("call to {endpoint} cancelled")]
    Cancelled { endpoint: String },

    /// The request context deadline passed while the call was in flight.
    #[error("deadline exceeded calling {endpoint}")]
    DeadlineExceeded { endpoint: String },

    /// No request could be built for the endpoint.
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl CallError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CallError::Transport { .. } => "transport",
            CallError::Upstream { .. } => "upstream",
            CallError::Decode { .. } => "decode",
            CallError::Cancelled { .. } => "cancelled",
            CallError::DeadlineExceeded { .. } => "deadline_exceeded",
            CallError::InvalidEndpoint { .. } => "invalid_endpoint",
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            CallError::Transport { endpoint, .. }
            | CallError::Upstream { endpoint, .. }
            | CallError::Decode { endpoint, .. }
            | CallError::Cancelled { endpoint }
            | CallError::DeadlineExceeded { endpoint }
            | CallError::InvalidEndpoint { endpoint, .. } => endpoint,
        }
    }

    /// Upstream status code, if the endpoint answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CallError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}
