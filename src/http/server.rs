//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the downstream clients and the coordinator from config
//! - Create the Axum router with the payment handler
//! - Wire up middleware (request id, request tracing)
//! - Serve until shutdown is signalled, then drain

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::routing::post;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use url::Url;

use crate::config::OrchestratorConfig;
use crate::http::payments::create_payment;
use crate::http::request::request_id;
use crate::observability::{Meter, Telemetry, Tracer};
use crate::orchestration::Coordinator;
use crate::upstream::{OutboundClient, ProviderClient, RoutingClient};

/// Failure to assemble the server from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid routing base URL '{url}': {source}")]
    RoutingUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub tracer: Tracer,
    pub meter: Meter,
    pub request_timeout: Duration,
    pub max_body_size: usize,
}

/// HTTP server for the payment orchestrator.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Build the server and its downstream clients from `config`. Spans are
    /// not exported.
    pub fn new(config: &OrchestratorConfig) -> Result<Self, BuildError> {
        Self::with_telemetry(config, Telemetry::new(&config.observability.service_name))
    }

    /// Like [`HttpServer::new`], reporting through `telemetry`.
    pub fn with_telemetry(config: &OrchestratorConfig, telemetry: Telemetry) -> Result<Self, BuildError> {
        let base_url = Url::parse(&config.upstreams.routing_base_url).map_err(|source| {
            BuildError::RoutingUrl {
                url: config.upstreams.routing_base_url.clone(),
                source,
            }
        })?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()?;

        let outbound = OutboundClient::new(http, telemetry.clone());
        let coordinator = Coordinator::new(
            Arc::new(RoutingClient::new(outbound.clone(), base_url)),
            Arc::new(ProviderClient::new(outbound)),
            telemetry.meter.clone(),
        );

        Ok(Self::with_coordinator(config, Arc::new(coordinator), telemetry))
    }

    /// Build the server around an existing coordinator.
    pub fn with_coordinator(
        config: &OrchestratorConfig,
        coordinator: Arc<Coordinator>,
        telemetry: Telemetry,
    ) -> Self {
        let state = AppState {
            coordinator,
            tracer: telemetry.tracer,
            meter: telemetry.meter,
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
            max_body_size: config.security.max_body_size,
        };
        Self {
            router: build_router(state),
        }
    }

    /// The router, for driving requests without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
///
/// The request id is set before the trace layer runs so the request span
/// carries it, and is copied back onto the response.
fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/payments", post(create_payment))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id(request.headers()),
                        )
                    }),
                )
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}
