//! Distributed tracing support.
//!
//! # Responsibilities
//! - Extract trace context from incoming requests
//! - Propagate trace context to downstream requests
//! - Create spans for orchestration operations and hand them to the
//!   OpenTelemetry SDK for export
//!
//! # Design Decisions
//! - W3C Trace Context (`traceparent`, `tracestate`) through the SDK's
//!   `TraceContextPropagator`
//! - Every span exists twice: as an OpenTelemetry span (exported when an OTLP
//!   endpoint is configured) and as a `tracing` span carrying the same ids, so
//!   every log line inside a span is correlated with the distributed trace
//! - The tracer is an explicit handle; nothing here touches global state

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::{
    Span as _, SpanBuilder, SpanContext, SpanId, SpanKind, Status, TraceContextExt, TraceFlags,
    TraceId, TraceState, Tracer as _, TracerProvider as _,
};
use opentelemetry::{Context, KeyValue};
use opentelemetry_http::{HeaderExtractor, HeaderInjector};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{IdGenerator, RandomIdGenerator, TracerProvider};

use crate::observability::otel;

/// W3C trace parent header.
pub const TRACEPARENT: &str = "traceparent";
/// W3C vendor trace state header.
pub const TRACESTATE: &str = "tracestate";

/// The propagated part of a span: what travels in `traceparent`.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceContext {
    span_context: SpanContext,
}

impl TraceContext {
    /// Start a new, sampled trace that is not attached to any span.
    pub fn root() -> Self {
        let ids = RandomIdGenerator::default();
        Self {
            span_context: SpanContext::new(
                ids.new_trace_id(),
                ids.new_span_id(),
                TraceFlags::SAMPLED,
                false,
                TraceState::default(),
            ),
        }
    }

    pub fn trace_id(&self) -> TraceId {
        self.span_context.trace_id()
    }

    pub fn span_id(&self) -> SpanId {
        self.span_context.span_id()
    }

    pub fn is_sampled(&self) -> bool {
        self.span_context.is_sampled()
    }

    pub fn trace_state(&self) -> &TraceState {
        self.span_context.trace_state()
    }

    /// Read the inbound trace context, if the caller sent a valid one.
    pub fn extract(headers: &HeaderMap) -> Option<Self> {
        let cx = TraceContextPropagator::new().extract(&HeaderExtractor(headers));
        let span_context = cx.span().span_context().clone();
        span_context.is_valid().then_some(Self { span_context })
    }

    /// Write this context into outbound headers.
    pub fn inject(&self, headers: &mut HeaderMap) {
        TraceContextPropagator::new().inject_context(&self.as_parent(), &mut HeaderInjector(headers));
    }

    fn as_parent(&self) -> Context {
        Context::new().with_remote_span_context(self.span_context.clone())
    }
}

/// Produces spans for one service.
#[derive(Clone)]
pub struct Tracer {
    service_name: Arc<str>,
    inner: opentelemetry_sdk::trace::Tracer,
}

impl Tracer {
    /// A tracer whose spans are not exported.
    pub fn new(service_name: impl Into<Arc<str>>) -> Self {
        let service_name = service_name.into();
        let provider = TracerProvider::builder()
            .with_resource(otel::resource(&service_name))
            .build();
        Self::with_provider(service_name, &provider)
    }

    /// A tracer exporting through `provider`.
    pub fn with_provider(service_name: impl Into<Arc<str>>, provider: &TracerProvider) -> Self {
        Self {
            service_name: service_name.into(),
            inner: provider.tracer(otel::INSTRUMENTATION_SCOPE),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Start a span named `name`, as a child of `parent` or as a new root.
    pub fn start(&self, name: &'static str, kind: SpanKind, parent: Option<&TraceContext>) -> ActiveSpan {
        let parent_cx = parent.map(TraceContext::as_parent).unwrap_or_default();
        let otel_span = self.inner.build_with_context(
            SpanBuilder::from_name(name).with_kind(kind),
            &parent_cx,
        );
        let context = TraceContext {
            span_context: otel_span.span_context().clone(),
        };

        let span = tracing::info_span!(
            "span",
            otel.name = name,
            service = %self.service_name,
            trace_id = %context.trace_id(),
            span_id = %context.span_id(),
            parent_span_id = tracing::field::Empty,
        );
        if let Some(parent) = parent {
            span.record("parent_span_id", tracing::field::display(parent.span_id()));
        }

        ActiveSpan {
            name,
            context,
            span,
            otel: Some(otel_span),
            started: Instant::now(),
        }
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("service_name", &self.service_name)
            .finish_non_exhaustive()
    }
}

/// A started span. Ends when [`ActiveSpan::end`] is called or it is dropped;
/// a dropped span is marked as an error.
pub struct ActiveSpan {
    name: &'static str,
    context: TraceContext,
    span: tracing::Span,
    otel: Option<opentelemetry_sdk::trace::Span>,
    started: Instant,
}

impl ActiveSpan {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn context(&self) -> &TraceContext {
        &self.context
    }

    /// The `tracing` span to instrument work with.
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn set_attribute(&mut self, key: &'static str, value: impl Into<opentelemetry::Value>) {
        if let Some(otel) = self.otel.as_mut() {
            otel.set_attribute(KeyValue::new(key, value));
        }
    }

    /// Mark the span as failed.
    pub fn record_error(&mut self, description: impl Into<Cow<'static, str>>) {
        if let Some(otel) = self.otel.as_mut() {
            otel.set_status(Status::error(description));
        }
    }

    /// End the span, logging its duration.
    pub fn end(mut self) {
        self.finish("Span ended");
    }

    fn finish(&mut self, message: &'static str) {
        let Some(mut otel) = self.otel.take() else {
            return;
        };
        let elapsed = self.elapsed();
        let _entered = self.span.enter();
        tracing::debug!(
            span = self.name,
            elapsed_ms = elapsed.as_millis() as u64,
            "{}",
            message
        );
        otel.end();
    }
}

impl Drop for ActiveSpan {
    fn drop(&mut self) {
        if self.otel.is_some() {
            self.record_error("dropped before completion");
            self.finish("Span dropped");
        }
    }
}

impl fmt::Debug for ActiveSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSpan")
            .field("name", &self.name)
            .field("context", &self.context)
            .field("ended", &self.otel.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use opentelemetry_sdk::testing::trace::InMemorySpanExporter;

    const SAMPLE: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    fn headers(traceparent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TRACEPARENT, HeaderValue::from_str(traceparent).unwrap());
        headers
    }

    fn recording_tracer() -> (Tracer, InMemorySpanExporter) {
        let exporter = InMemorySpanExporter::default();
        let provider = TracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        (Tracer::with_provider("test", &provider), exporter)
    }

    #[test]
    fn test_extract_valid_traceparent() {
        let ctx = TraceContext::extract(&headers(SAMPLE)).unwrap();
        assert_eq!(ctx.trace_id().to_string(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(ctx.span_id().to_string(), "00f067aa0ba902b7");
        assert!(ctx.is_sampled());
    }

    #[test]
    fn test_rejects_malformed_traceparent() {
        let bad = [
            "",
            "garbage",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7",
            "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01",
            "ff-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01-extra",
        ];
        for value in bad {
            assert!(TraceContext::extract(&headers(value)).is_none(), "accepted {value:?}");
        }
    }

    #[test]
    fn test_extract_missing_header() {
        assert!(TraceContext::extract(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_child_span_is_injected_with_trace_state() {
        let mut inbound = headers(SAMPLE);
        inbound.insert(TRACESTATE, HeaderValue::from_static("vendor=abc"));
        let parent = TraceContext::extract(&inbound).unwrap();

        let span = Tracer::new("test").start("routingServiceCall", SpanKind::Client, Some(&parent));
        let mut outbound = HeaderMap::new();
        span.context().inject(&mut outbound);
        span.end();

        let sent = outbound.get(TRACEPARENT).unwrap().to_str().unwrap();
        assert!(sent.starts_with("00-4bf92f3577b34da6a3ce929d0e0e4736-"));
        assert!(sent.ends_with("-01"));
        assert!(!sent.contains("00f067aa0ba902b7"));
        assert_eq!(outbound.get(TRACESTATE).unwrap(), "vendor=abc");
    }

    #[test]
    fn test_root_without_parent_starts_new_trace() {
        let tracer = Tracer::new("payment-orchestrator");
        let parent = TraceContext::root();

        let child = tracer.start("routingServiceCall", SpanKind::Client, Some(&parent));
        assert_eq!(child.name(), "routingServiceCall");
        assert_eq!(child.context().trace_id(), parent.trace_id());
        assert_ne!(child.context().span_id(), parent.span_id());
        child.end();

        let root = tracer.start("payment", SpanKind::Server, None);
        assert_ne!(root.context().trace_id(), parent.trace_id());
        root.end();
    }

    #[test]
    fn test_ended_span_is_exported_with_parent() {
        let (tracer, exporter) = recording_tracer();
        let parent = TraceContext::extract(&headers(SAMPLE)).unwrap();

        let mut span = tracer.start("paymentProviderServiceCall", SpanKind::Client, Some(&parent));
        span.set_attribute("http.url", "http://x/pay");
        span.end();

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "paymentProviderServiceCall");
        assert_eq!(spans[0].span_kind, SpanKind::Client);
        assert_eq!(spans[0].parent_span_id, parent.span_id());
        assert_eq!(spans[0].span_context.trace_id(), parent.trace_id());
        assert_eq!(spans[0].status, Status::Unset);
    }

    #[test]
    fn test_dropped_span_is_exported_as_error() {
        let (tracer, exporter) = recording_tracer();
        drop(tracer.start("payment", SpanKind::Server, None));

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 1);
        assert!(matches!(spans[0].status, Status::Error { .. }));
    }
}
