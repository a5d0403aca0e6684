use crate::entities::{order_item, sale_record};
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::orders::{model_to_response, OrderListResponse, OrderResponse};
use crate::ApiResponse;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Filter by lifecycle status, e.g. `pending` for the
    /// reconciliation queue.
    pub status: Option<String>,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemView {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

impl From<order_item::Model> for OrderItemView {
    fn from(model: order_item::Model) -> Self {
        Self {
            product_id: model.product_id,
            product_name: model.product_name,
            unit_price: model.unit_price,
            quantity: model.quantity,
            line_total: model.line_total,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaleRecordView {
    pub id: String,
    pub product_id: Uuid,
    pub seller_id: String,
    pub amount: Decimal,
    /// Map of recipient id to their share.
    pub commissions: serde_json::Value,
    pub commission_distributed: bool,
    pub error: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<sale_record::Model> for SaleRecordView {
    fn from(model: sale_record::Model) -> Self {
        let commissions = serde_json::from_str(&model.commissions)
            .unwrap_or(serde_json::Value::Object(Default::default()));
        Self {
            id: model.id,
            product_id: model.product_id,
            seller_id: model.seller_id,
            amount: model.amount,
            commissions,
            commission_distributed: model.commission_distributed,
            error: model.error,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub items: Vec<OrderItemView>,
    pub sale_records: Vec<SaleRecordView>,
}

/// List orders
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders listed", body = crate::ApiResponse<crate::services::orders::OrderListResponse>),
        (status = 400, description = "Invalid pagination", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<ApiResponse<OrderListResponse>>, ServiceError> {
    let response = state
        .services
        .orders
        .list_orders(query.page, query.limit, query.status.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Get one order with its line items and sale records
#[utoipa::path(
    get,
    path = "/api/v1/orders/{order_id}",
    params(("order_id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order detail", body = crate::ApiResponse<OrderDetailResponse>),
        (status = 404, description = "Unknown order", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<ApiResponse<OrderDetailResponse>>, ServiceError> {
    let order = state.services.orders.get_order_required(&order_id).await?;
    let items = state.services.orders.get_order_items(&order_id).await?;
    let sale_records = state.services.commission.list_for_order(&order_id).await?;

    let detail = OrderDetailResponse {
        order: model_to_response(order),
        items: items.into_iter().map(OrderItemView::from).collect(),
        sale_records: sale_records.into_iter().map(SaleRecordView::from).collect(),
    };

    Ok(Json(ApiResponse::success(detail)))
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/:order_id", get(get_order))
}
