//! The orchestrator seen through the client SDK.

use sdk_rust::{ClientError, CreatePayment, OrchestratorClient, PaymentReceipt};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

use common::{config_for, mount_route, spawn_orchestrator};

fn payment(order_id: &str, route_id: &str) -> CreatePayment {
    CreatePayment {
        order_id: order_id.into(),
        route_id: route_id.into(),
        amount: 42.5,
        currency: "EUR".into(),
    }
}

#[tokio::test]
async fn test_sdk_receives_receipt() {
    let routing = MockServer::start().await;
    let provider = MockServer::start().await;
    mount_route(&routing, "eu-card", &provider).await;
    Mock::given(method("POST"))
        .and(path("/pay"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "paymentId": "pay-77", "status": "pending_review" })),
        )
        .expect(1)
        .mount(&provider)
        .await;

    let orchestrator = spawn_orchestrator(config_for(&routing)).await;
    let client = OrchestratorClient::new(&orchestrator.url());

    let receipt = client.create_payment(&payment("order-9", "eu-card")).await.unwrap();
    assert_eq!(
        receipt,
        PaymentReceipt {
            order_id: "order-9".into(),
            payment_id: "pay-77".into(),
            status: "pending_review".into(),
        }
    );
}

#[tokio::test]
async fn test_sdk_surfaces_rejection_message() {
    let routing = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/routings/eu-card"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&routing)
        .await;

    let orchestrator = spawn_orchestrator(config_for(&routing)).await;
    let client = OrchestratorClient::new(&orchestrator.url());

    match client.create_payment(&payment("order-9", "eu-card")).await {
        Err(ClientError::Rejected { status, message }) => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(message, "Failed to call routing service");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_routing_service() {
    // Bind and drop to get a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let routing = MockServer::start().await;
    let mut config = config_for(&routing);
    config.upstreams.routing_base_url = format!("http://127.0.0.1:{port}");

    let orchestrator = spawn_orchestrator(config).await;
    let client = OrchestratorClient::new(&orchestrator.url());

    let err = client.create_payment(&payment("order-9", "eu-card")).await.unwrap_err();
    assert!(
        matches!(&err, ClientError::Rejected { message, .. } if message == "Failed to call routing service"),
        "got {err:?}"
    );
}
