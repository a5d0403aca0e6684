#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
};
use rust_decimal::Decimal;
use salesline_api::{
    config::AppConfig,
    db::{self, DbPool},
    entities::product,
    events::{self, EventSender},
    handlers::AppServices,
    services::checkout::{CartLineInput, CustomerProfile, PaymentMethod, PlaceOrderRequest},
    AppState,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Test harness: fresh SQLite database, migrations applied, the full
/// service container wired against a configurable commission ledger
/// URL (usually a wiremock server).
pub struct TestApp {
    pub services: AppServices,
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub event_sender: EventSender,
    _event_task: tokio::task::JoinHandle<()>,
    _db_file: tempfile::NamedTempFile,
}

impl TestApp {
    /// Harness with an unreachable commission ledger; fine for flows
    /// that never distribute (or should fail when they try).
    pub async fn new() -> Self {
        Self::with_commission_url("http://127.0.0.1:1").await
    }

    pub async fn with_commission_url(url: &str) -> Self {
        Self::build(url, None).await
    }

    /// Harness that additionally requires signed gateway callbacks.
    pub async fn with_gateway_secret(url: &str, secret: &str) -> Self {
        Self::build(url, Some(secret)).await
    }

    async fn build(commission_url: &str, gateway_secret: Option<&str>) -> Self {
        let db_file = tempfile::NamedTempFile::new().expect("failed to create temp db file");
        let db_url = format!("sqlite://{}?mode=rwc", db_file.path().display());

        let mut cfg = AppConfig::new(
            db_url,
            "127.0.0.1".to_string(),
            18080,
            "test".to_string(),
        );
        cfg.commission_service_url = commission_url.to_string();
        cfg.commission_timeout_secs = 2;
        cfg.db_max_connections = 5;
        cfg.db_min_connections = 1;
        cfg.gateway_webhook_secret = gateway_secret.map(|s| s.to_string());

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool).await.expect("migrations failed");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), event_sender.clone(), &cfg)
            .expect("failed to build services");

        Self {
            services,
            db: db_arc,
            config: cfg,
            event_sender,
            _event_task: event_task,
            _db_file: db_file,
        }
    }

    /// The application router, as served in production.
    pub fn router(&self) -> axum::Router {
        salesline_api::build_router(AppState {
            db: self.db.clone(),
            config: self.config.clone(),
            event_sender: self.event_sender.clone(),
            services: self.services.clone(),
        })
    }

    /// Send a JSON request against the router.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request_with_headers(method, uri, body, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn seed_product(&self, name: &str, unit_price: Decimal, stock: i32) -> product::Model {
        self.services
            .catalog
            .create_product(salesline_api::services::catalog::CreateProductInput {
                name: name.to_string(),
                unit_price,
                stock_quantity: stock,
            })
            .await
            .expect("failed to seed product")
    }

    pub async fn fund_wallet(&self, user_id: &str, amount: Decimal) {
        self.services
            .wallet
            .credit(user_id, amount)
            .await
            .expect("failed to fund wallet");
    }
}

pub fn customer() -> CustomerProfile {
    CustomerProfile {
        name: "Asha Verma".to_string(),
        email: "asha.verma@example.com".to_string(),
        phone: "+91-98100-12345".to_string(),
        address: "14 MG Road, Pune 411001".to_string(),
    }
}

pub fn cart_line(product: &product::Model, quantity: i32) -> CartLineInput {
    CartLineInput {
        product_id: product.id,
        unit_price: product.unit_price,
        quantity,
    }
}

pub fn place_request(
    order_id: Option<&str>,
    seller_id: &str,
    items: Vec<CartLineInput>,
    payment: PaymentMethod,
) -> PlaceOrderRequest {
    PlaceOrderRequest {
        order_id: order_id.map(|s| s.to_string()),
        seller_id: seller_id.to_string(),
        customer: customer(),
        items,
        payment,
    }
}
