//! Inbound request handling.
//!
//! # Responsibilities
//! - Read the body under the configured size limit
//! - Decode and validate the payment payload
//! - Extract the request id set by the request-id layer
//!
//! Every failure here maps to the same [`OrchestrationError::InvalidRequest`],
//! so callers cannot tell a missing field from an oversized body.

use axum::body::{Body, Bytes};
use axum::http::HeaderMap;

use crate::orchestration::types::PaymentRequest;
use crate::orchestration::OrchestrationError;

/// Header carrying the request id, inbound and on every downstream call.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Read at most `limit` bytes of `body`.
pub async fn read_body(body: Body, limit: usize) -> Result<Bytes, OrchestrationError> {
    axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| OrchestrationError::InvalidRequest(format!("unreadable body: {e}")))
}

/// Decode a JSON payment request and check its field constraints.
pub fn parse_payment_request(body: &[u8]) -> Result<PaymentRequest, OrchestrationError> {
    let request: PaymentRequest = serde_json::from_slice(body)
        .map_err(|e| OrchestrationError::InvalidRequest(format!("malformed payload: {e}")))?;
    request.validate()?;
    Ok(request)
}

/// The request id, or `"unknown"` if the header is missing or not ASCII.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
