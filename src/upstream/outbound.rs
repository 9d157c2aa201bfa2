//! Outbound HTTP JSON calls.
//!
//! # Responsibilities
//! - Start a child span per call and propagate it via `traceparent`
//! - Forward the request id
//! - Abort the call when the request context is cancelled or its deadline passes
//! - Accept only 200 OK and decode the JSON body
//! - Record call outcome and latency
//!
//! Every downstream client goes through [`OutboundClient`]; none of them touch
//! `reqwest` directly.

use std::future::Future;

use axum::http::{HeaderMap, HeaderValue};
use opentelemetry::trace::SpanKind;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;
use tracing::Instrument;
use url::Url;

use crate::http::request::X_REQUEST_ID;
use crate::observability::Telemetry;
use crate::orchestration::RequestContext;
use crate::upstream::error::CallError;

/// Shared, cheaply clonable client for downstream calls.
#[derive(Debug, Clone)]
pub struct OutboundClient {
    http: reqwest::Client,
    telemetry: Telemetry,
}

impl OutboundClient {
    pub fn new(http: reqwest::Client, telemetry: Telemetry) -> Self {
        Self { http, telemetry }
    }

    /// `GET url`, decoding a JSON response.
    pub async fn get_json<T>(
        &self,
        ctx: &RequestContext,
        call: &'static str,
        url: Url,
    ) -> Result<T, CallError>
    where
        T: DeserializeOwned + Send,
    {
        let endpoint = url.to_string();
        let builder = self.http.get(url);
        self.execute(ctx, call, endpoint, builder).await
    }

    /// `POST url` with a JSON body, decoding a JSON response.
    pub async fn post_json<B, T>(
        &self,
        ctx: &RequestContext,
        call: &'static str,
        url: Url,
        body: &B,
    ) -> Result<T, CallError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned + Send,
    {
        let endpoint = url.to_string();
        let builder = self.http.post(url).json(body);
        self.execute(ctx, call, endpoint, builder).await
    }

    async fn execute<T>(
        &self,
        ctx: &RequestContext,
        call: &'static str,
        endpoint: String,
        builder: RequestBuilder,
    ) -> Result<T, CallError>
    where
        T: DeserializeOwned + Send,
    {
        let mut span = self.telemetry.tracer.start(call, SpanKind::Client, Some(ctx.trace()));
        span.set_attribute("http.url", endpoint.clone());

        let mut headers = HeaderMap::new();
        span.context().inject(&mut headers);
        if let Ok(value) = HeaderValue::from_str(ctx.request_id()) {
            headers.insert(X_REQUEST_ID, value);
        }
        let builder = builder.headers(headers);

        let work = async {
            tracing::debug!(endpoint = %endpoint, "Outbound call started");
            let result = bounded(ctx, &endpoint, exchange(&endpoint, builder)).await;
            match &result {
                Ok(_) => tracing::debug!(endpoint = %endpoint, "Outbound call completed"),
                Err(e) => tracing::warn!(
                    endpoint = %endpoint,
                    kind = e.kind(),
                    error = %e,
                    "Outbound call failed"
                ),
            }
            result
        };
        let result = work.instrument(span.span().clone()).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => {
                span.record_error(e.to_string());
                e.kind()
            }
        };
        self.telemetry.meter.record_outbound(call, outcome, span.elapsed());
        span.end();

        result
    }
}

/// Send the request, check the status and decode the body.
async fn exchange<T>(endpoint: &str, builder: RequestBuilder) -> Result<T, CallError>
where
    T: DeserializeOwned,
{
    let transport = |source| CallError::Transport {
        endpoint: endpoint.to_string(),
        source,
    };

    let response = builder.send().await.map_err(transport)?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(CallError::Upstream {
            endpoint: endpoint.to_string(),
            status,
        });
    }

    let body = response.bytes().await.map_err(transport)?;
    serde_json::from_slice(&body).map_err(|source| CallError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Run `call` until it finishes, the context is cancelled, or the deadline
/// passes. Losing the race drops `call`, aborting the in-flight request.
async fn bounded<T, F>(ctx: &RequestContext, endpoint: &str, call: F) -> Result<T, CallError>
where
    F: Future<Output = Result<T, CallError>>,
{
    tokio::select! {
        biased;
        _ = ctx.cancellation().cancelled() => Err(CallError::Cancelled {
            endpoint: endpoint.to_string(),
        }),
        _ = sleep_until(ctx.deadline()) => Err(CallError::DeadlineExceeded {
            endpoint: endpoint.to_string(),
        }),
        result = call => result,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
