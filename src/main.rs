//! Payment orchestrator.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │               PAYMENT ORCHESTRATOR                │
//!                        │                                                   │
//!   POST /payments       │  ┌─────────┐    ┌─────────────┐                   │
//!   ─────────────────────┼─▶│  http   │───▶│orchestration│                   │
//!                        │  │boundary │    │ coordinator │                   │
//!                        │  └─────────┘    └──────┬──────┘                   │
//!                        │                        │                          │
//!                        │          ┌─────────────┴─────────────┐            │
//!                        │          ▼                           ▼            │
//!                        │  ┌──────────────┐           ┌──────────────┐      │
//!                        │  │   upstream   │           │   upstream   │      │
//!                        │  │   routing    │           │   provider   │      │
//!                        │  └──────┬───────┘           └──────┬───────┘      │
//!                        │         │     outbound (span,      │              │
//!                        │         │     traceparent, cancel) │              │
//!                        └─────────┼──────────────────────────┼──────────────┘
//!                                  ▼                          ▼
//!                           Routing service           Payment provider
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use payment_orchestrator::config::load_config;
use payment_orchestrator::http::HttpServer;
use payment_orchestrator::lifecycle::{shutdown_signal, Shutdown};
use payment_orchestrator::observability::{logging, metrics, otel, Telemetry};

#[derive(Parser, Debug)]
#[command(name = "payment-orchestrator", version, about = "Payment orchestration service")]
struct Args {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind.to_string();
    }

    logging::init(&config.observability)?;

    tracing::info!(
        service = %config.observability.service_name,
        version = env!("CARGO_PKG_VERSION"),
        "payment-orchestrator starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routing_base_url = %config.upstreams.routing_base_url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let provider = otel::tracer_provider(&config.observability)?;
    let telemetry = Telemetry::with_provider(&config.observability.service_name, &provider);
    let server = HttpServer::with_telemetry(&config, telemetry)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        _ = shutdown_signal() => {
            shutdown.trigger();
            server_task.await??;
        }
        result = &mut server_task => result??,
    }

    tokio::task::spawn_blocking(move || otel::shutdown(&provider)).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
