//! Routing service client.

use async_trait::async_trait;
use url::Url;

use crate::orchestration::types::RouteResolution;
use crate::orchestration::RequestContext;
use crate::upstream::{CallError, OutboundClient, RouteResolver};

/// Span and metric name for routing lookups.
pub const ROUTING_CALL: &str = "routingServiceCall";

#[derive(Debug, Clone)]
pub struct RoutingClient {
    outbound: OutboundClient,
    base_url: Url,
}

impl RoutingClient {
    pub fn new(outbound: OutboundClient, base_url: Url) -> Self {
        Self { outbound, base_url }
    }

    /// `<base>/routings/{route_id}`, with `route_id` encoded as one segment.
    ///
    /// `.` and `..` are refused: URL normalization would resolve them against
    /// the path instead of keeping them as an id.
    pub fn route_url(&self, route_id: &str) -> Result<Url, CallError> {
        if is_dot_segment(route_id) {
            return Err(CallError::InvalidEndpoint {
                endpoint: self.base_url.to_string(),
                reason: format!("route id '{route_id}' is a dot segment"),
            });
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CallError::InvalidEndpoint {
                endpoint: self.base_url.to_string(),
                reason: "routing base URL cannot have path segments".to_string(),
            })?
            .pop_if_empty()
            .push("routings")
            .push(route_id);
        Ok(url)
    }
}

/// `.` and `..` cannot be pushed as path segments. Other spellings such as
/// `%2e` are safe because `%` is itself encoded.
pub fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

#[async_trait]
impl RouteResolver for RoutingClient {
    async fn resolve(&self, ctx: &RequestContext, route_id: &str) -> Result<RouteResolution, CallError> {
        let url = self.route_url(route_id)?;
        self.outbound.get_json(ctx, ROUTING_CALL, url).await
    }
}
