//! Orchestration failures.

use std::fmt;

use thiserror::Error;

use crate::orchestration::types::InvalidPayment;
use crate::upstream::CallError;

/// The step of the call chain that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Decoding and validating the inbound request.
    Boundary,
    /// Looking up the route.
    Resolution,
    /// Submitting to the provider.
    Dispatch,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Boundary => "boundary",
            Stage::Resolution => "resolution",
            Stage::Dispatch => "dispatch",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a payment did not complete.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// The inbound payload was unreadable, malformed or invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The routing lookup failed; no provider was called.
    #[error("routing resolution failed: {0}")]
    Resolution(#[source] CallError),

    /// The provider call failed.
    #[error("provider dispatch failed: {0}")]
    Dispatch(#[source] CallError),
}

impl OrchestrationError {
    pub fn stage(&self) -> Stage {
        match self {
            OrchestrationError::InvalidRequest(_) => Stage::Boundary,
            OrchestrationError::Resolution(_) => Stage::Resolution,
            OrchestrationError::Dispatch(_) => Stage::Dispatch,
        }
    }

    /// Message safe to return to the caller. Causes stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            OrchestrationError::InvalidRequest(_) => "Invalid request",
            OrchestrationError::Resolution(_) => "Failed to call routing service",
            OrchestrationError::Dispatch(_) => "Failed to call payment provider service",
        }
    }

    /// The downstream error, if a downstream call caused the failure.
    pub fn call_error(&self) -> Option<&CallError> {
        match self {
            OrchestrationError::InvalidRequest(_) => None,
            OrchestrationError::Resolution(e) | OrchestrationError::Dispatch(e) => Some(e),
        }
    }
}

impl From<InvalidPayment> for OrchestrationError {
    fn from(err: InvalidPayment) -> Self {
        OrchestrationError::InvalidRequest(err.to_string())
    }
}
