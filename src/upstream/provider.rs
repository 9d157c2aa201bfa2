//! Payment provider client.
//!
//! Providers are not configured; the endpoint comes from the routing service
//! for every payment.

use async_trait::async_trait;
use url::Url;

use crate::orchestration::types::{ProviderPaymentRequest, ProviderPaymentResult};
use crate::orchestration::RequestContext;
use crate::upstream::{CallError, OutboundClient, PaymentDispatcher};

/// Span and metric name for provider submissions.
pub const PROVIDER_CALL: &str = "paymentProviderServiceCall";

#[derive(Debug, Clone)]
pub struct ProviderClient {
    outbound: OutboundClient,
}

impl ProviderClient {
    pub fn new(outbound: OutboundClient) -> Self {
        Self { outbound }
    }
}

#[async_trait]
impl PaymentDispatcher for ProviderClient {
    async fn dispatch(
        &self,
        ctx: &RequestContext,
        endpoint: &Url,
        request: &ProviderPaymentRequest,
    ) -> Result<ProviderPaymentResult, CallError> {
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(CallError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: format!("unsupported scheme '{}'", endpoint.scheme()),
            });
        }

        tracing::info!(
            order_id = %request.order_id,
            endpoint = %endpoint,
            "Submitting payment to provider"
        );
        self.outbound
            .post_json(ctx, PROVIDER_CALL, endpoint.clone(), request)
            .await
    }
}
