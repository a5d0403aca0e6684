mod common;

use common::{cart_line, place_request, TestApp};
use proptest::prelude::*;
use rust_decimal_macros::dec;
use salesline_api::errors::ServiceError;
use salesline_api::services::checkout::PaymentMethod;
use salesline_api::services::commission::{
    CommissionClient, CommissionLineResult, CommissionSummary, DistributeRequest,
    DistributionStatus, ProductRef,
};
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sample_request(order_ref: &str) -> DistributeRequest {
    DistributeRequest {
        seller_id: "agent-42".to_string(),
        amount: dec!(200),
        product: ProductRef {
            id: Uuid::new_v4(),
            name: "Herbal Tonic".to_string(),
        },
        order_ref: order_ref.to_string(),
        idempotency_key: format!("{}_1733740000000", order_ref),
    }
}

#[tokio::test]
async fn client_posts_the_ledger_contract() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/distribute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "payouts": [
                { "uid": "agent-up-1", "amount": "20.00", "rate": "0.10", "role": "sponsor" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CommissionClient::new(server.uri(), Duration::from_secs(2)).unwrap();
    let request = sample_request("ORD-X_p1");

    let payouts = client.distribute(&request).await.unwrap();
    assert_eq!(payouts.len(), 1);
    assert_eq!(payouts[0].uid, "agent-up-1");
    assert_eq!(payouts[0].amount, dec!(20));

    // The wire body carries the full contract.
    let received = &server.received_requests().await.unwrap()[0];
    let body: serde_json::Value = serde_json::from_slice(&received.body).unwrap();
    assert_eq!(body["seller_id"], "agent-42");
    assert_eq!(body["order_ref"], "ORD-X_p1");
    assert!(body["idempotency_key"].as_str().unwrap().starts_with("ORD-X_p1"));
    assert!(body["product"]["id"].is_string());
    assert_eq!(body["product"]["name"], "Herbal Tonic");
    assert!(body["amount"].is_string() || body["amount"].is_number());
}

#[tokio::test]
async fn non_2xx_and_malformed_bodies_are_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/distribute"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = CommissionClient::new(server.uri(), Duration::from_secs(2)).unwrap();
    let err = client.distribute(&sample_request("ORD-A_p1")).await.unwrap_err();
    match err {
        ServiceError::ExternalServiceError(msg) => assert!(msg.contains("503")),
        other => panic!("expected external service error, got {:?}", other),
    }

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/distribute"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.distribute(&sample_request("ORD-B_p1")).await.unwrap_err();
    assert!(matches!(err, ServiceError::ExternalServiceError(_)));
}

#[tokio::test]
async fn ok_false_is_a_failure_with_the_ledger_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/distribute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "error": "seller has no active genealogy"
        })))
        .mount(&server)
        .await;

    let client = CommissionClient::new(server.uri(), Duration::from_secs(2)).unwrap();
    let err = client.distribute(&sample_request("ORD-C_p1")).await.unwrap_err();
    match err {
        ServiceError::ExternalServiceError(msg) => {
            assert!(msg.contains("no active genealogy"))
        }
        other => panic!("expected external service error, got {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_ledger_is_isolated_per_line_item() {
    // No mock server at all: every call fails, the order still settles.
    let app = TestApp::new().await;
    let product_a = app.seed_product("Herbal Tonic", dec!(100), 5).await;
    let product_b = app.seed_product("Protein Mix", dec!(50), 5).await;

    let response = app
        .services
        .checkout
        .place_order(place_request(
            None,
            "agent-1",
            vec![cart_line(&product_a, 1), cart_line(&product_b, 1)],
            PaymentMethod::Cash,
        ))
        .await
        .expect("checkout must survive an unreachable ledger");

    let summary = response.commission.unwrap();
    assert_eq!(summary.distribution_status, DistributionStatus::Failed);
    assert_eq!(summary.distributed, 0);
    assert_eq!(summary.total_items, 2);

    // Both line items were attempted and recorded despite the outage.
    let records = app
        .services
        .commission
        .list_for_order(&response.order_id)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| !r.commission_distributed));
    assert!(records.iter().all(|r| r.error.is_some()));
}

proptest! {
    // Aggregate classification: distributed iff K == N, failed iff
    // K == 0, partially_distributed otherwise.
    #[test]
    fn classification_matches_success_count(outcomes in proptest::collection::vec(any::<bool>(), 1..12)) {
        let results: Vec<CommissionLineResult> = outcomes
            .iter()
            .map(|&ok| CommissionLineResult {
                product_id: Uuid::new_v4(),
                ok,
                paid_to: Vec::new(),
                error: if ok { None } else { Some("ledger error".to_string()) },
            })
            .collect();

        let total = results.len();
        let ok_count = outcomes.iter().filter(|&&ok| ok).count();
        let summary = CommissionSummary::from_results(results);

        prop_assert_eq!(summary.total_items as usize, total);
        prop_assert_eq!(summary.distributed as usize, ok_count);

        let expected = if ok_count == total {
            DistributionStatus::Distributed
        } else if ok_count == 0 {
            DistributionStatus::Failed
        } else {
            DistributionStatus::PartiallyDistributed
        };
        prop_assert_eq!(summary.distribution_status, expected);
    }
}
