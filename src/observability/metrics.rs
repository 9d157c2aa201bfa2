//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define orchestrator metrics (payments, outbound calls, latency)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `orchestrator_payments_total` (counter): payments by outcome and failing stage
//! - `orchestrator_outbound_calls_total` (counter): downstream calls by call and outcome
//! - `orchestrator_outbound_call_duration_seconds` (histogram): downstream latency
//!
//! # Design Decisions
//! - Components record through a [`Meter`] handle they receive at construction
//! - Without an installed recorder every update is a no-op

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

const PAYMENTS_TOTAL: &str = "orchestrator_payments_total";
const OUTBOUND_CALLS_TOTAL: &str = "orchestrator_outbound_calls_total";
const OUTBOUND_CALL_DURATION: &str = "orchestrator_outbound_call_duration_seconds";

/// Initialize the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!(PAYMENTS_TOTAL, "Payment requests by outcome and failing stage");
    describe_counter!(OUTBOUND_CALLS_TOTAL, "Downstream calls by call name and outcome");
    describe_histogram!(
        OUTBOUND_CALL_DURATION,
        metrics::Unit::Seconds,
        "Downstream call latency"
    );

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Handle for recording orchestrator metrics.
#[derive(Debug, Clone)]
pub struct Meter {
    service: Arc<str>,
}

impl Meter {
    pub fn new(service: impl Into<Arc<str>>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Record one downstream call.
    pub fn record_outbound(&self, call: &'static str, outcome: &'static str, elapsed: Duration) {
        counter!(
            OUTBOUND_CALLS_TOTAL,
            "service" => self.service.to_string(),
            "call" => call,
            "outcome" => outcome
        )
        .increment(1);
        histogram!(
            OUTBOUND_CALL_DURATION,
            "service" => self.service.to_string(),
            "call" => call
        )
        .record(elapsed.as_secs_f64());
    }

    /// Record a finished payment. `stage` is `"none"` for completed payments.
    pub fn record_payment(&self, outcome: &'static str, stage: &'static str) {
        counter!(
            PAYMENTS_TOTAL,
            "service" => self.service.to_string(),
            "outcome" => outcome,
            "stage" => stage
        )
        .increment(1);
    }
}
