mod common;

use common::{cart_line, place_request, TestApp};
use rust_decimal_macros::dec;
use salesline_api::errors::ServiceError;
use salesline_api::services::checkout::PaymentMethod;
use salesline_api::services::commission::DistributionStatus;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn place_cheque_order(app: &TestApp, seller: &str, quantity: i32) -> String {
    let product = app.seed_product("Wellness Kit", dec!(400), 10).await;
    let response = app
        .services
        .checkout
        .place_order(place_request(
            None,
            seller,
            vec![cart_line(&product, quantity)],
            PaymentMethod::Cheque {
                cheque_number: "007781".to_string(),
                cheque_image_url: "https://cdn.example/cheques/007781.jpg".to_string(),
            },
        ))
        .await
        .expect("cheque checkout should succeed");
    response.order_id
}

#[tokio::test]
async fn approval_runs_distribution_and_confirms() {
    let ledger = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/distribute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "payouts": [
                { "uid": "agent-up-1", "amount": "40.00", "rate": "0.10", "role": "sponsor" }
            ]
        })))
        .expect(1)
        .mount(&ledger)
        .await;

    let app = TestApp::with_commission_url(&ledger.uri()).await;
    let order_id = place_cheque_order(&app, "agent-11", 1).await;

    let outcome = app
        .services
        .cheque_review
        .approve(&order_id)
        .await
        .expect("approval should succeed");

    assert_eq!(outcome.order.status, "confirmed");
    assert_eq!(outcome.order.payment_status, "verified");
    assert_eq!(
        outcome.summary.distribution_status,
        DistributionStatus::Distributed
    );

    let records = app.services.commission.list_for_order(&order_id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].commission_distributed);
    assert!(records[0].commissions.contains("agent-up-1"));
}

#[tokio::test]
async fn second_approval_is_rejected_without_duplicate_payout() {
    let ledger = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/distribute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "payouts": []
        })))
        .expect(1)
        .mount(&ledger)
        .await;

    let app = TestApp::with_commission_url(&ledger.uri()).await;
    let order_id = place_cheque_order(&app, "agent-11", 2).await;

    app.services
        .cheque_review
        .approve(&order_id)
        .await
        .expect("first approval should succeed");

    // The retried UI action must not distribute again.
    let second = app.services.cheque_review.approve(&order_id).await;
    match second {
        Err(ServiceError::InvalidStatus(_)) | Err(ServiceError::Conflict(_)) => {}
        other => panic!("expected rejection of re-approval, got {:?}", other.map(|_| ())),
    }

    let records = app.services.commission.list_for_order(&order_id).await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn approval_with_ledger_failure_still_confirms_the_order() {
    let ledger = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/distribute"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&ledger)
        .await;

    let app = TestApp::with_commission_url(&ledger.uri()).await;
    let order_id = place_cheque_order(&app, "agent-11", 1).await;

    let outcome = app
        .services
        .cheque_review
        .approve(&order_id)
        .await
        .expect("approval itself should succeed");

    // The cheque is good; only the payout needs reconciliation.
    assert_eq!(outcome.order.status, "confirmed");
    assert_eq!(outcome.order.payment_status, "verified");
    assert_eq!(outcome.summary.distribution_status, DistributionStatus::Failed);
    assert_eq!(
        outcome.order.commission_status.as_deref(),
        Some("failed")
    );

    let records = app.services.commission.list_for_order(&order_id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(!records[0].commission_distributed);
    assert!(records[0].error.as_deref().unwrap().contains("HTTP 502"));
}

#[tokio::test]
async fn rejection_is_terminal_and_never_distributes() {
    let ledger = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/distribute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "payouts": []})))
        .expect(0)
        .mount(&ledger)
        .await;

    let app = TestApp::with_commission_url(&ledger.uri()).await;
    let order_id = place_cheque_order(&app, "agent-11", 1).await;

    // A reason is mandatory.
    let missing_reason = app.services.cheque_review.reject(&order_id, "   ").await;
    assert!(matches!(
        missing_reason,
        Err(ServiceError::ValidationError(_))
    ));

    let order = app
        .services
        .cheque_review
        .reject(&order_id, "signature does not match the cheque")
        .await
        .expect("rejection should succeed");

    assert_eq!(order.status, "cancelled");
    assert_eq!(order.payment_status, "rejected");
    assert_eq!(
        order.review_note.as_deref(),
        Some("signature does not match the cheque")
    );

    // A rejected order never carries a commission summary.
    assert!(order.commission_summary.is_none());
    assert!(order.commission_status.is_none());
    let records = app.services.commission.list_for_order(&order_id).await.unwrap();
    assert!(records.is_empty());

    // The terminal state cannot be re-reviewed.
    assert!(app.services.cheque_review.approve(&order_id).await.is_err());
    assert!(app
        .services
        .cheque_review
        .reject(&order_id, "again")
        .await
        .is_err());
}

#[tokio::test]
async fn review_actions_only_apply_to_cheque_orders() {
    let app = TestApp::new().await;
    let product = app.seed_product("Herbal Tonic", dec!(100), 5).await;
    app.fund_wallet("agent-2", dec!(500)).await;

    // A wallet order (commission ledger unreachable -> failed summary,
    // but the order exists and is settled).
    let response = app
        .services
        .checkout
        .place_order(place_request(
            None,
            "agent-2",
            vec![cart_line(&product, 1)],
            PaymentMethod::Wallet,
        ))
        .await
        .unwrap();

    let approve = app.services.cheque_review.approve(&response.order_id).await;
    assert!(matches!(approve, Err(ServiceError::Conflict(_)) | Err(ServiceError::InvalidOperation(_))));

    let reject = app
        .services
        .cheque_review
        .reject(&response.order_id, "not a cheque")
        .await;
    assert!(matches!(reject, Err(ServiceError::InvalidOperation(_))));
}
