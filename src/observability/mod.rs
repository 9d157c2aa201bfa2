//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestration and outbound calls produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (OpenTelemetry spans, W3C propagation)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Trace collector (otel.rs, OTLP/HTTP)
//!     → Downstream services (traceparent header)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Trace id flows through all log lines of a request
//! - Tracer and meter are handed to components, never looked up globally

pub mod logging;
pub mod metrics;
pub mod otel;
pub mod tracing;

pub use self::metrics::Meter;
pub use self::tracing::{ActiveSpan, TraceContext, Tracer};

use opentelemetry_sdk::trace::TracerProvider;

/// Tracer and meter for one service, passed to every component that
/// emits telemetry.
#[derive(Debug, Clone)]
pub struct Telemetry {
    pub tracer: Tracer,
    pub meter: Meter,
}

impl Telemetry {
    /// Telemetry whose spans are not exported.
    pub fn new(service_name: &str) -> Self {
        Self {
            tracer: Tracer::new(service_name),
            meter: Meter::new(service_name),
        }
    }

    /// Telemetry exporting spans through `provider`.
    pub fn with_provider(service_name: &str, provider: &TracerProvider) -> Self {
        Self {
            tracer: Tracer::with_provider(service_name, provider),
            meter: Meter::new(service_name),
        }
    }
}
