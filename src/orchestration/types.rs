//! Payment orchestration types.
//!
//! Wire names follow the JSON contracts of the inbound API, the routing
//! service and the payment providers (camelCase).

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Inbound payment request, as accepted at the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Caller-supplied order identifier.
    pub order_id: String,
    /// Key into the routing service.
    pub route_id: String,
    /// Amount to charge, kept at the precision the caller sent.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    /// Three-letter currency code (e.g., "USD").
    pub currency: String,
}

/// Why a syntactically valid payment request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidPayment {
    #[error("orderId must not be empty")]
    EmptyOrderId,

    #[error("routeId must not be empty")]
    EmptyRouteId,

    #[error("routeId '{0}' is not a usable route id")]
    DotSegmentRouteId(String),

    #[error("amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("currency '{0}' is not a three-letter uppercase code")]
    InvalidCurrency(String),
}

impl PaymentRequest {
    /// Check the semantic constraints serde cannot express.
    pub fn validate(&self) -> Result<(), InvalidPayment> {
        if self.order_id.trim().is_empty() {
            return Err(InvalidPayment::EmptyOrderId);
        }
        if self.route_id.trim().is_empty() {
            return Err(InvalidPayment::EmptyRouteId);
        }
        if matches!(self.route_id.as_str(), "." | "..") {
            return Err(InvalidPayment::DotSegmentRouteId(self.route_id.clone()));
        }
        if self.amount <= Decimal::ZERO {
            return Err(InvalidPayment::NonPositiveAmount(self.amount));
        }
        let currency_ok =
            self.currency.len() == 3 && self.currency.bytes().all(|b| b.is_ascii_uppercase());
        if !currency_ok {
            return Err(InvalidPayment::InvalidCurrency(self.currency.clone()));
        }
        Ok(())
    }
}

/// Routing service answer: which provider handles the route, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteResolution {
    #[serde(rename = "paymentProvider")]
    pub provider_name: String,
    #[serde(rename = "url")]
    pub provider_endpoint: Url,
}

/// Payload sent to the payment provider. The route id stays behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPaymentRequest {
    pub order_id: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    pub currency: String,
}

impl From<&PaymentRequest> for ProviderPaymentRequest {
    fn from(request: &PaymentRequest) -> Self {
        Self {
            order_id: request.order_id.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
        }
    }
}

/// Payment status as reported by a provider.
///
/// Statuses this service does not know are carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    Failed,
    #[serde(untagged)]
    Other(String),
}

impl PaymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider answer for a submitted payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPaymentResult {
    pub payment_id: String,
    pub status: PaymentStatus,
}

/// Result of a completed orchestration, returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub order_id: String,
    pub payment_id: String,
    pub status: PaymentStatus,
}
