//! `POST /payments`.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use opentelemetry::trace::SpanKind;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::http::request::{parse_payment_request, read_body, request_id};
use crate::http::server::AppState;
use crate::observability::TraceContext;
use crate::orchestration::{OrchestrationError, RequestContext};

/// Server span name for one payment request.
pub const PAYMENT_SPAN: &str = "payment";

pub async fn create_payment(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers);

    let inbound = TraceContext::extract(&parts.headers);
    let mut span = state.tracer.start(PAYMENT_SPAN, SpanKind::Server, inbound.as_ref());

    // Dropping the handler future (client gone, server shutting down) cancels
    // any downstream call still in flight.
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let ctx = RequestContext::new(request_id, span.context().clone())
        .with_cancellation(cancel)
        .with_timeout(state.request_timeout);

    let result = async {
        let bytes = read_body(body, state.max_body_size).await?;
        let payment = parse_payment_request(&bytes)?;
        state.coordinator.process(&ctx, payment).await
    }
    .instrument(span.span().clone())
    .await;

    let response = match result {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => {
            span.record_error(err.public_message());
            if let OrchestrationError::InvalidRequest(reason) = &err {
                let _entered = span.span().enter();
                tracing::warn!(request_id = %ctx.request_id(), reason = %reason, "Rejected payment request");
                state.meter.record_payment("failed", err.stage().as_str());
            }
            err.into_response()
        }
    };
    span.end();
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use crate::http::HttpServer;
    use crate::observability::Telemetry;
    use crate::orchestration::types::{ProviderPaymentRequest, ProviderPaymentResult, RouteResolution};
    use crate::orchestration::Coordinator;
    use crate::upstream::{CallError, PaymentDispatcher, RouteResolver};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tower::ServiceExt;
    use url::Url;

    struct FixedRoute;

    #[async_trait]
    impl RouteResolver for FixedRoute {
        async fn resolve(&self, _ctx: &RequestContext, _route_id: &str) -> Result<RouteResolution, CallError> {
            Ok(RouteResolution {
                provider_name: "pay-x".into(),
                provider_endpoint: Url::parse("http://x/pay").unwrap(),
            })
        }
    }

    /// Keeps the request's cancellation token and never answers.
    #[derive(Default)]
    struct HangingDispatcher {
        token: Mutex<Option<CancellationToken>>,
    }

    #[async_trait]
    impl PaymentDispatcher for HangingDispatcher {
        async fn dispatch(
            &self,
            ctx: &RequestContext,
            _endpoint: &Url,
            _request: &ProviderPaymentRequest,
        ) -> Result<ProviderPaymentResult, CallError> {
            *self.token.lock().unwrap() = Some(ctx.cancellation().clone());
            ctx.cancellation().cancelled().await;
            Err(CallError::Cancelled {
                endpoint: "http://x/pay".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_dropped_request_cancels_dispatch() {
        let dispatcher = Arc::new(HangingDispatcher::default());
        let telemetry = Telemetry::new("test");
        let coordinator = Coordinator::new(Arc::new(FixedRoute), dispatcher.clone(), telemetry.meter.clone());
        let server = HttpServer::with_coordinator(&OrchestratorConfig::default(), Arc::new(coordinator), telemetry);

        let request = Request::post("/payments")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"orderId":"o1","routeId":"r1","amount":10.0,"currency":"USD"}"#,
            ))
            .unwrap();
        let outcome = tokio::time::timeout(Duration::from_millis(200), server.router().oneshot(request)).await;
        assert!(outcome.is_err(), "request should still be pending");

        let token = dispatcher.token.lock().unwrap().clone().expect("dispatcher was reached");
        assert!(token.is_cancelled());
    }
}
