//! Downstream service clients.
//!
//! # Data Flow
//! ```text
//! Coordinator
//!     → routing.rs   GET  <routing-base>/routings/{routeId}  → RouteResolution
//!     → provider.rs  POST <resolved url>                     → ProviderPaymentResult
//!
//! Both go through outbound.rs (span, traceparent, cancellation, decode).
//! ```
//!
//! The coordinator depends on the [`RouteResolver`] and [`PaymentDispatcher`]
//! traits, not on the HTTP clients, so either side can be replaced in tests.

pub mod error;
pub mod outbound;
pub mod provider;
pub mod routing;

use async_trait::async_trait;
use url::Url;

use crate::orchestration::types::{ProviderPaymentRequest, ProviderPaymentResult, RouteResolution};
use crate::orchestration::RequestContext;

pub use error::CallError;
pub use outbound::OutboundClient;
pub use provider::ProviderClient;
pub use routing::RoutingClient;

/// Resolves a route identifier to the provider that should take the payment.
#[async_trait]
pub trait RouteResolver: Send + Sync {
    async fn resolve(&self, ctx: &RequestContext, route_id: &str) -> Result<RouteResolution, CallError>;
}

/// Submits a payment to a resolved provider endpoint.
#[async_trait]
pub trait PaymentDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        ctx: &RequestContext,
        endpoint: &Url,
        request: &ProviderPaymentRequest,
    ) -> Result<ProviderPaymentResult, CallError>;
}
