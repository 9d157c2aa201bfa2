//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use payment_orchestrator::config::OrchestratorConfig;
use payment_orchestrator::http::HttpServer;
use payment_orchestrator::lifecycle::Shutdown;
use serde_json::json;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// An orchestrator running on an ephemeral port.
pub struct TestOrchestrator {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestOrchestrator {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn payments_url(&self) -> String {
        format!("{}/payments", self.url())
    }
}

impl Drop for TestOrchestrator {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Defaults pointed at `routing`, bound to an ephemeral local port.
pub fn config_for(routing: &MockServer) -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstreams.routing_base_url = routing.uri();
    config
}

pub async fn spawn_orchestrator(config: OrchestratorConfig) -> TestOrchestrator {
    let server = HttpServer::new(&config).unwrap();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestOrchestrator { addr, shutdown }
}

/// Mount `GET /routings/{route_id}` answering with `provider`'s `/pay`.
pub async fn mount_route(routing: &MockServer, route_id: &str, provider: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/routings/{route_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": route_id,
            "paymentProvider": "pay-x",
            "url": format!("{}/pay", provider.uri()),
        })))
        .expect(1)
        .mount(routing)
        .await;
}

pub fn payment_body(order_id: &str, route_id: &str) -> serde_json::Value {
    json!({
        "orderId": order_id,
        "routeId": route_id,
        "amount": 10.0,
        "currency": "USD",
    })
}
