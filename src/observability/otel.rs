//! OpenTelemetry trace export.
//!
//! # Responsibilities
//! - Describe this service to the collector (`service.name` resource)
//! - Build the tracer provider, with an OTLP/HTTP exporter when an endpoint
//!   is configured
//!
//! # Design Decisions
//! - Without an endpoint spans are still created (ids for propagation and
//!   logs) but never leave the process
//! - The provider is owned by `main` and shut down after the server drains,
//!   flushing pending batches

use opentelemetry::KeyValue;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::{runtime, Resource};
use thiserror::Error;

use crate::config::ObservabilityConfig;

/// Instrumentation scope reported on every span.
pub const INSTRUMENTATION_SCOPE: &str = "payment-orchestrator";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to build OTLP exporter for '{endpoint}': {reason}")]
    Exporter { endpoint: String, reason: String },
}

pub fn resource(service_name: &str) -> Resource {
    Resource::new([KeyValue::new("service.name", service_name.to_string())])
}

/// Build the tracer provider for `config`. Must run inside the Tokio runtime
/// when an endpoint is set.
pub fn tracer_provider(config: &ObservabilityConfig) -> Result<TracerProvider, ExportError> {
    let builder = TracerProvider::builder().with_resource(resource(&config.service_name));

    let Some(endpoint) = config.otlp_endpoint.as_deref() else {
        return Ok(builder.build());
    };

    let exporter = SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| ExportError::Exporter {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

    tracing::info!(endpoint = %endpoint, "OTLP trace export enabled");
    Ok(builder.with_batch_exporter(exporter, runtime::Tokio).build())
}

/// Flush and stop the provider. Blocks until the exporter drains, so call it
/// off the async worker threads.
pub fn shutdown(provider: &TracerProvider) {
    if let Err(e) = provider.shutdown() {
        tracing::warn!(error = %e, "Trace provider shutdown failed");
    }
}
