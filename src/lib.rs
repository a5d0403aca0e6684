//! Salesline API Library
//!
//! Order fulfillment and commission distribution core for a
//! direct-sales commerce platform: stock reservation, multi-path
//! payment settlement, per-line-item commission distribution against
//! an external ledger, and the cheque verification workflow.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::Router;
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Some(Utc::now().to_rfc3339()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            timestamp: Some(Utc::now().to_rfc3339()),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// Assembles the full application router: versioned API, health
/// endpoint and Swagger UI.
pub fn build_router(state: AppState) -> Router {
    let api_v1 = Router::new()
        .nest("/checkout", handlers::checkout::checkout_routes())
        .nest(
            "/orders",
            handlers::orders::order_routes().merge(handlers::cheques::cheque_routes()),
        )
        .nest(
            "/payments/gateway",
            handlers::payment_webhooks::gateway_webhook_routes(),
        )
        .nest("/products", handlers::products::product_routes())
        .nest("/wallet", handlers::wallet::wallet_routes())
        .nest("/withdrawals", handlers::wallet::withdrawal_routes());

    Router::new()
        .merge(handlers::health::health_routes())
        .nest("/api/v1", api_v1)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_success_wraps_data() {
        let response = ApiResponse::success(42);
        assert!(response.success);
        assert_eq!(response.data, Some(42));
        assert!(response.message.is_none());
    }

    #[test]
    fn api_response_error_carries_message() {
        let response: ApiResponse<()> = ApiResponse::error("boom".to_string());
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("boom"));
    }
}
