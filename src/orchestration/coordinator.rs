//! Payment orchestration: resolve the route, then dispatch to the provider.
//!
//! # State Transitions
//! ```text
//! Received → Resolving → Resolved → Dispatching → Dispatched → Completed
//!                 │                       │
//!                 └──→ Failed ←───────────┘
//! ```
//!
//! Each request is an independent run. The coordinator only holds immutable
//! handles to the two downstream clients and the meter.

use std::fmt;
use std::sync::Arc;

use crate::observability::Meter;
use crate::orchestration::error::OrchestrationError;
use crate::orchestration::types::{PaymentOutcome, PaymentRequest, ProviderPaymentRequest};
use crate::orchestration::RequestContext;
use crate::upstream::{PaymentDispatcher, RouteResolver};

/// Where one orchestration run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestrationState {
    Received,
    Resolving,
    Resolved,
    Dispatching,
    Dispatched,
    Completed,
    Failed,
}

impl OrchestrationState {
    /// Whether `next` is a legal transition from `self`.
    pub fn can_advance_to(self, next: OrchestrationState) -> bool {
        use OrchestrationState::*;
        matches!(
            (self, next),
            (Received, Resolving)
                | (Resolving, Resolved)
                | (Resolving, Failed)
                | (Resolved, Dispatching)
                | (Dispatching, Dispatched)
                | (Dispatching, Failed)
                | (Dispatched, Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrchestrationState::Completed | OrchestrationState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrchestrationState::Received => "received",
            OrchestrationState::Resolving => "resolving",
            OrchestrationState::Resolved => "resolved",
            OrchestrationState::Dispatching => "dispatching",
            OrchestrationState::Dispatched => "dispatched",
            OrchestrationState::Completed => "completed",
            OrchestrationState::Failed => "failed",
        }
    }
}

impl fmt::Display for OrchestrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State tracking for a single run.
struct Run {
    state: OrchestrationState,
}

impl Run {
    fn start(order_id: &str) -> Self {
        tracing::debug!(order_id = %order_id, state = %OrchestrationState::Received, "Payment received");
        Self {
            state: OrchestrationState::Received,
        }
    }

    fn advance(&mut self, next: OrchestrationState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "State transition");
        self.state = next;
    }
}

/// Sequences routing resolution and provider dispatch for one payment.
pub struct Coordinator {
    resolver: Arc<dyn RouteResolver>,
    dispatcher: Arc<dyn PaymentDispatcher>,
    meter: Meter,
}

impl Coordinator {
    pub fn new(
        resolver: Arc<dyn RouteResolver>,
        dispatcher: Arc<dyn PaymentDispatcher>,
        meter: Meter,
    ) -> Self {
        Self {
            resolver,
            dispatcher,
            meter,
        }
    }

    /// Run the payment through resolution and dispatch.
    ///
    /// The dispatcher is only called after a successful resolution. Errors
    /// from either call are returned unchanged, tagged with their stage.
    pub async fn process(
        &self,
        ctx: &RequestContext,
        request: PaymentRequest,
    ) -> Result<PaymentOutcome, OrchestrationError> {
        let mut run = Run::start(&request.order_id);

        run.advance(OrchestrationState::Resolving);
        let resolution = match self.resolver.resolve(ctx, &request.route_id).await {
            Ok(resolution) => resolution,
            Err(e) => return Err(self.fail(&mut run, OrchestrationError::Resolution(e))),
        };
        run.advance(OrchestrationState::Resolved);
        tracing::info!(
            route_id = %request.route_id,
            provider = %resolution.provider_name,
            endpoint = %resolution.provider_endpoint,
            "Route resolved"
        );

        run.advance(OrchestrationState::Dispatching);
        let provider_request = ProviderPaymentRequest::from(&request);
        let result = match self
            .dispatcher
            .dispatch(ctx, &resolution.provider_endpoint, &provider_request)
            .await
        {
            Ok(result) => result,
            Err(e) => return Err(self.fail(&mut run, OrchestrationError::Dispatch(e))),
        };
        run.advance(OrchestrationState::Dispatched);

        let outcome = PaymentOutcome {
            order_id: request.order_id,
            payment_id: result.payment_id,
            status: result.status,
        };
        run.advance(OrchestrationState::Completed);

        self.meter.record_payment("completed", "none");
        tracing::info!(
            order_id = %outcome.order_id,
            payment_id = %outcome.payment_id,
            status = %outcome.status,
            "Payment completed"
        );
        Ok(outcome)
    }

    fn fail(&self, run: &mut Run, err: OrchestrationError) -> OrchestrationError {
        run.advance(OrchestrationState::Failed);
        let stage = err.stage();
        self.meter.record_payment("failed", stage.as_str());
        tracing::error!(
            stage = %stage,
            kind = err.call_error().map(|e| e.kind()).unwrap_or("invalid_request"),
            error = %err,
            "{}",
            err.public_message()
        );
        err
    }
}
