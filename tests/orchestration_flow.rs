//! End-to-end payment flow against mocked routing and provider services.

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{any, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

use common::{config_for, mount_route, payment_body, spawn_orchestrator};

async fn post_payment(url: &str, body: &Value) -> (StatusCode, Value) {
    let res = reqwest::Client::new().post(url).json(body).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

fn error_body(message: &str) -> Value {
    json!({ "status": "error", "message": message })
}

#[tokio::test]
async fn test_successful_payment_returns_provider_outcome() {
    let routing = MockServer::start().await;
    let provider = MockServer::start().await;
    mount_route(&routing, "r1", &provider).await;

    Mock::given(method("POST"))
        .and(path("/pay"))
        .and(body_json(json!({ "orderId": "o1", "amount": 10.0, "currency": "USD" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "paymentId": "p1", "status": "success" })),
        )
        .expect(1)
        .mount(&provider)
        .await;

    let orchestrator = spawn_orchestrator(config_for(&routing)).await;
    let (status, body) = post_payment(&orchestrator.payments_url(), &payment_body("o1", "r1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "orderId": "o1", "paymentId": "p1", "status": "success" }));
}

#[tokio::test]
async fn test_routing_failure_never_reaches_provider() {
    let routing = MockServer::start().await;
    let provider = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/routings/r1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&routing)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&provider)
        .await;

    let orchestrator = spawn_orchestrator(config_for(&routing)).await;
    let (status, body) = post_payment(&orchestrator.payments_url(), &payment_body("o1", "r1")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, error_body("Failed to call routing service"));
}

#[tokio::test]
async fn test_unknown_route_is_a_routing_failure() {
    let routing = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/routings/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("route not found"))
        .expect(1)
        .mount(&routing)
        .await;

    let orchestrator = spawn_orchestrator(config_for(&routing)).await;
    let (status, body) =
        post_payment(&orchestrator.payments_url(), &payment_body("o1", "missing")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, error_body("Failed to call routing service"));
}

#[tokio::test]
async fn test_provider_failures_share_one_response_shape() {
    let failures = [
        ResponseTemplate::new(500).set_body_string("boom"),
        ResponseTemplate::new(200).set_body_string("not json"),
        ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })),
        ResponseTemplate::new(201).set_body_json(json!({ "paymentId": "p1", "status": "success" })),
    ];

    for failure in failures {
        let routing = MockServer::start().await;
        let provider = MockServer::start().await;
        mount_route(&routing, "r1", &provider).await;
        Mock::given(method("POST"))
            .and(path("/pay"))
            .respond_with(failure)
            .expect(1)
            .mount(&provider)
            .await;

        let orchestrator = spawn_orchestrator(config_for(&routing)).await;
        let (status, body) =
            post_payment(&orchestrator.payments_url(), &payment_body("o1", "r1")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, error_body("Failed to call payment provider service"));
    }
}

#[tokio::test]
async fn test_invalid_payload_never_calls_routing() {
    let routing = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&routing)
        .await;

    let orchestrator = spawn_orchestrator(config_for(&routing)).await;
    let payloads = [
        json!({ "orderId": "o1", "amount": 10.0, "currency": "USD" }),
        json!({ "orderId": "o1", "routeId": "r1", "amount": 0, "currency": "USD" }),
        json!({ "orderId": "o1", "routeId": "r1", "amount": 10.0, "currency": "dollars" }),
        json!([1, 2, 3]),
    ];
    for payload in payloads {
        let (status, body) = post_payment(&orchestrator.payments_url(), &payload).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, error_body("Invalid request"));
    }
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let routing = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&routing)
        .await;

    let mut config = config_for(&routing);
    config.security.max_body_size = 64;
    let orchestrator = spawn_orchestrator(config).await;

    let mut body = payment_body("o1", "r1");
    body["orderId"] = json!("o".repeat(256));
    let (status, body) = post_payment(&orchestrator.payments_url(), &body).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, error_body("Invalid request"));
}

#[tokio::test]
async fn test_slow_provider_fails_at_deadline() {
    let routing = MockServer::start().await;
    let provider = MockServer::start().await;
    mount_route(&routing, "r1", &provider).await;
    Mock::given(method("POST"))
        .and(path("/pay"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "paymentId": "p1", "status": "success" }))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&provider)
        .await;

    let mut config = config_for(&routing);
    config.timeouts.request_secs = 1;
    let orchestrator = spawn_orchestrator(config).await;

    let started = Instant::now();
    let (status, body) = post_payment(&orchestrator.payments_url(), &payment_body("o1", "r1")).await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, error_body("Failed to call payment provider service"));
}

#[tokio::test]
async fn test_outbound_calls_join_inbound_trace() {
    let trace_id = "4bf92f3577b34da6a3ce929d0e0e4736";
    let inbound_span = "00f067aa0ba902b7";

    let routing = MockServer::start().await;
    let provider = MockServer::start().await;
    mount_route(&routing, "r1", &provider).await;
    Mock::given(method("POST"))
        .and(path("/pay"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "paymentId": "p1", "status": "success" })),
        )
        .expect(1)
        .mount(&provider)
        .await;

    let orchestrator = spawn_orchestrator(config_for(&routing)).await;
    let res = reqwest::Client::new()
        .post(orchestrator.payments_url())
        .header("traceparent", format!("00-{trace_id}-{inbound_span}-01"))
        .header("tracestate", "vendor=abc")
        .header("x-request-id", "req-trace-1")
        .json(&payment_body("o1", "r1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-request-id"], "req-trace-1");

    let mut outbound = routing.received_requests().await.unwrap();
    outbound.extend(provider.received_requests().await.unwrap());
    assert_eq!(outbound.len(), 2);

    let mut span_ids = Vec::new();
    for request in &outbound {
        let traceparent = request.headers["traceparent"].to_str().unwrap();
        let fields: Vec<&str> = traceparent.split('-').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], "00");
        assert_eq!(fields[1], trace_id);
        assert_ne!(fields[2], inbound_span);
        assert_eq!(fields[3], "01");
        span_ids.push(fields[2].to_string());

        assert_eq!(request.headers["tracestate"], "vendor=abc");
        assert_eq!(request.headers["x-request-id"], "req-trace-1");
    }
    assert_ne!(span_ids[0], span_ids[1]);
}
