mod common;

use common::{cart_line, place_request, TestApp};
use rust_decimal_macros::dec;
use salesline_api::entities::invoice;
use salesline_api::errors::ServiceError;
use salesline_api::services::checkout::PaymentMethod;
use salesline_api::services::commission::DistributionStatus;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ok_ledger_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "ok": true,
        "payouts": [
            { "uid": "agent-up-1", "amount": "10.00", "rate": "0.05", "role": "sponsor" },
            { "uid": "agent-up-2", "amount": "4.00", "rate": "0.02", "role": "upline" }
        ]
    }))
}

#[tokio::test]
async fn wallet_checkout_settles_and_distributes() {
    let ledger = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/distribute"))
        .respond_with(ok_ledger_response())
        .expect(2)
        .mount(&ledger)
        .await;

    let app = TestApp::with_commission_url(&ledger.uri()).await;
    let product_a = app.seed_product("Herbal Tonic", dec!(100), 10).await;
    let product_b = app.seed_product("Protein Mix", dec!(50), 5).await;
    app.fund_wallet("agent-42", dec!(500)).await;

    let response = app
        .services
        .checkout
        .place_order(place_request(
            None,
            "agent-42",
            vec![cart_line(&product_a, 2), cart_line(&product_b, 1)],
            PaymentMethod::Wallet,
        ))
        .await
        .expect("wallet checkout should succeed");

    assert_eq!(response.status, "paid");
    assert_eq!(response.payment_status, "paid");
    assert_eq!(response.total_amount, dec!(250));

    let summary = response.commission.expect("summary expected");
    assert_eq!(summary.distribution_status, DistributionStatus::Distributed);
    assert_eq!(summary.distributed, 2);
    assert_eq!(summary.total_items, 2);
    assert!(response.invoice_warning.is_none());

    // Stock decremented per line, wallet debited by the total.
    assert_eq!(
        app.services.inventory.get_stock(product_a.id).await.unwrap(),
        8
    );
    assert_eq!(
        app.services.inventory.get_stock(product_b.id).await.unwrap(),
        4
    );
    assert_eq!(
        app.services.wallet.get_balance("agent-42").await.unwrap(),
        dec!(250)
    );

    // One sale record per line item, all distributed.
    let records = app
        .services
        .commission
        .list_for_order(&response.order_id)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.commission_distributed));
    assert!(records
        .iter()
        .any(|r| r.id == format!("{}_{}", response.order_id, product_a.id)));

    // Invoice emitted as terminal side effect.
    let invoices = invoice::Entity::find()
        .filter(invoice::Column::OrderId.eq(response.order_id.clone()))
        .count(&*app.db)
        .await
        .unwrap();
    assert_eq!(invoices, 1);
}

#[tokio::test]
async fn wallet_insufficiency_aborts_without_order_but_keeps_reservation() {
    let app = TestApp::new().await;
    let product_a = app.seed_product("Herbal Tonic", dec!(100), 10).await;
    let product_b = app.seed_product("Protein Mix", dec!(50), 5).await;
    app.fund_wallet("agent-7", dec!(100)).await;

    let result = app
        .services
        .checkout
        .place_order(place_request(
            Some("ORD-1733740000000-t1"),
            "agent-7",
            vec![cart_line(&product_a, 2), cart_line(&product_b, 1)],
            PaymentMethod::Wallet,
        ))
        .await;

    match result {
        Err(ServiceError::InsufficientFunds(_)) => {}
        other => panic!("expected insufficient funds, got {:?}", other.map(|_| ())),
    }

    // No order was written.
    assert!(app
        .services
        .orders
        .get_order("ORD-1733740000000-t1")
        .await
        .unwrap()
        .is_none());

    // The stock reservation is not compensated on settlement failure.
    assert_eq!(
        app.services.inventory.get_stock(product_a.id).await.unwrap(),
        8
    );
    assert_eq!(
        app.services.inventory.get_stock(product_b.id).await.unwrap(),
        4
    );
    // Wallet untouched.
    assert_eq!(
        app.services.wallet.get_balance("agent-7").await.unwrap(),
        dec!(100)
    );
}

#[tokio::test]
async fn insufficient_stock_rejects_before_any_mutation() {
    let app = TestApp::new().await;
    let product_a = app.seed_product("Herbal Tonic", dec!(100), 1).await;
    let product_b = app.seed_product("Protein Mix", dec!(50), 5).await;
    app.fund_wallet("agent-7", dec!(500)).await;

    let result = app
        .services
        .checkout
        .place_order(place_request(
            None,
            "agent-7",
            vec![cart_line(&product_b, 1), cart_line(&product_a, 2)],
            PaymentMethod::Wallet,
        ))
        .await;

    match result {
        Err(ServiceError::InsufficientStock(_)) => {}
        other => panic!("expected insufficient stock, got {:?}", other.map(|_| ())),
    }

    // The advisory check aborts the whole cart before any decrement.
    assert_eq!(
        app.services.inventory.get_stock(product_a.id).await.unwrap(),
        1
    );
    assert_eq!(
        app.services.inventory.get_stock(product_b.id).await.unwrap(),
        5
    );
    assert_eq!(
        app.services.wallet.get_balance("agent-7").await.unwrap(),
        dec!(500)
    );
}

#[tokio::test]
async fn cheque_checkout_stops_before_distribution() {
    let ledger = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/distribute"))
        .respond_with(ok_ledger_response())
        .expect(0)
        .mount(&ledger)
        .await;

    let app = TestApp::with_commission_url(&ledger.uri()).await;
    let product = app.seed_product("Wellness Kit", dec!(300), 4).await;

    let response = app
        .services
        .checkout
        .place_order(place_request(
            None,
            "agent-9",
            vec![cart_line(&product, 1)],
            PaymentMethod::Cheque {
                cheque_number: "004521".to_string(),
                cheque_image_url: "https://cdn.example/cheques/004521.jpg".to_string(),
            },
        ))
        .await
        .expect("cheque checkout should succeed");

    assert_eq!(response.status, "waiting_confirmation");
    assert_eq!(response.payment_status, "awaiting_verification");
    assert!(response.commission.is_none());

    // Stock is reserved up front even though settlement is deferred.
    assert_eq!(
        app.services.inventory.get_stock(product.id).await.unwrap(),
        3
    );

    // No sale records until a reviewer approves.
    let records = app
        .services
        .commission
        .list_for_order(&response.order_id)
        .await
        .unwrap();
    assert!(records.is_empty());

    let order = app
        .services
        .orders
        .get_order_required(&response.order_id)
        .await
        .unwrap();
    assert_eq!(order.cheque_number.as_deref(), Some("004521"));
    assert!(order.commission_summary.is_none());
}

#[tokio::test]
async fn cash_checkout_with_partial_failure_enters_reconciliation() {
    let ledger = MockServer::start().await;
    let app = TestApp::with_commission_url(&ledger.uri()).await;
    let product_a = app.seed_product("Herbal Tonic", dec!(100), 10).await;
    let product_b = app.seed_product("Protein Mix", dec!(50), 5).await;

    // Product A distributes fine; everything else errors.
    Mock::given(method("POST"))
        .and(path("/distribute"))
        .and(body_partial_json(json!({ "product": { "id": product_a.id } })))
        .respond_with(ok_ledger_response())
        .mount(&ledger)
        .await;
    Mock::given(method("POST"))
        .and(path("/distribute"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&ledger)
        .await;

    let response = app
        .services
        .checkout
        .place_order(place_request(
            None,
            "agent-3",
            vec![cart_line(&product_a, 1), cart_line(&product_b, 2)],
            PaymentMethod::Cash,
        ))
        .await
        .expect("cash checkout should succeed");

    // The sale stands; the order is parked for manual reconciliation.
    assert_eq!(response.status, "pending");
    let summary = response.commission.expect("summary expected");
    assert_eq!(
        summary.distribution_status,
        DistributionStatus::PartiallyDistributed
    );
    assert_eq!(summary.distributed, 1);
    assert_eq!(summary.total_items, 2);
    assert!(summary.message.contains("1 of 2"));

    let records = app
        .services
        .commission
        .list_for_order(&response.order_id)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    let failed = records
        .iter()
        .find(|r| !r.commission_distributed)
        .expect("one failed record");
    assert!(failed.error.as_deref().unwrap().contains("HTTP 500"));
}

#[tokio::test]
async fn online_checkout_defers_to_gateway_then_confirms() {
    let ledger = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/distribute"))
        .respond_with(ok_ledger_response())
        .expect(1)
        .mount(&ledger)
        .await;

    let app = TestApp::with_commission_url(&ledger.uri()).await;
    let product = app.seed_product("Wellness Kit", dec!(250), 3).await;

    let response = app
        .services
        .checkout
        .place_order(place_request(
            None,
            "agent-5",
            vec![cart_line(&product, 1)],
            PaymentMethod::Online,
        ))
        .await
        .expect("online checkout should succeed");

    assert_eq!(response.status, "awaiting_payment");
    let gateway = response.gateway.expect("gateway payload expected");
    assert_eq!(gateway.amount_minor, 25000);
    assert_eq!(gateway.currency, "INR");
    assert!(response.commission.is_none());

    // Gateway reports success; the orchestration resumes.
    let order = app
        .services
        .checkout
        .confirm_gateway_payment(&response.order_id, "pay_9f3k2m")
        .await
        .expect("confirmation should succeed");

    assert_eq!(order.payment_reference.as_deref(), Some("pay_9f3k2m"));
    assert_eq!(order.payment_status, "paid");
    assert_eq!(order.commission_status.as_deref(), Some("distributed"));

    let records = app
        .services
        .commission
        .list_for_order(&response.order_id)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);

    // A replayed success callback must not settle twice.
    let replay = app
        .services
        .checkout
        .confirm_gateway_payment(&response.order_id, "pay_9f3k2m")
        .await;
    assert!(replay.is_err());
}

#[tokio::test]
async fn gateway_failure_is_terminal_and_keeps_reservation() {
    let ledger = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/distribute"))
        .respond_with(ok_ledger_response())
        .expect(0)
        .mount(&ledger)
        .await;

    let app = TestApp::with_commission_url(&ledger.uri()).await;
    let product = app.seed_product("Wellness Kit", dec!(250), 3).await;

    let response = app
        .services
        .checkout
        .place_order(place_request(
            None,
            "agent-5",
            vec![cart_line(&product, 2)],
            PaymentMethod::Online,
        ))
        .await
        .unwrap();

    let order = app
        .services
        .checkout
        .fail_gateway_payment(
            &response.order_id,
            "payment_cancelled",
            Some("buyer dismissed the widget"),
        )
        .await
        .expect("failure callback should record");

    assert_eq!(order.status, "payment_failed");
    assert_eq!(order.payment_status, "failed");
    let error = order.payment_error.expect("gateway error persisted");
    assert!(error.contains("payment_cancelled"));
    assert!(error.contains("buyer dismissed the widget"));

    // Reserved stock is not released on gateway failure.
    assert_eq!(
        app.services.inventory.get_stock(product.id).await.unwrap(),
        1
    );

    // No commission for an unpaid order.
    let records = app
        .services
        .commission
        .list_for_order(&response.order_id)
        .await
        .unwrap();
    assert!(records.is_empty());

    // A success callback after failure is rejected.
    assert!(app
        .services
        .checkout
        .confirm_gateway_payment(&response.order_id, "pay_late")
        .await
        .is_err());
}

#[tokio::test]
async fn cart_validation_rejects_bad_input() {
    let app = TestApp::new().await;
    let product = app.seed_product("Herbal Tonic", dec!(100), 10).await;

    // Empty cart.
    let empty = app
        .services
        .checkout
        .place_order(place_request(None, "agent-1", vec![], PaymentMethod::Cash))
        .await;
    assert!(matches!(empty, Err(ServiceError::ValidationError(_))));

    // Duplicate product lines would collide on the sale record key.
    let duplicate = app
        .services
        .checkout
        .place_order(place_request(
            None,
            "agent-1",
            vec![cart_line(&product, 1), cart_line(&product, 2)],
            PaymentMethod::Cash,
        ))
        .await;
    assert!(matches!(duplicate, Err(ServiceError::ValidationError(_))));

    // Cheque without its artifacts.
    let cheque = app
        .services
        .checkout
        .place_order(place_request(
            None,
            "agent-1",
            vec![cart_line(&product, 1)],
            PaymentMethod::Cheque {
                cheque_number: "  ".to_string(),
                cheque_image_url: String::new(),
            },
        ))
        .await;
    assert!(matches!(cheque, Err(ServiceError::ValidationError(_))));

    // Nothing was reserved along the way.
    assert_eq!(
        app.services.inventory.get_stock(product.id).await.unwrap(),
        10
    );
}
