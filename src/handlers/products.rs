use crate::entities::product;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::catalog::CreateProductInput;
use crate::{ApiResponse, PaginatedResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub stock_quantity: i32,
}

impl From<product::Model> for ProductView {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            unit_price: model.unit_price,
            stock_quantity: model.stock_quantity,
        }
    }
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductInput,
    responses(
        (status = 201, description = "Product created", body = crate::ApiResponse<ProductView>),
        (status = 400, description = "Validation error", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<CreateProductInput>,
) -> Result<(StatusCode, Json<ApiResponse<ProductView>>), ServiceError> {
    let product = state.services.catalog.create_product(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ProductView::from(product))),
    ))
}

/// List products
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Products listed", body = crate::ApiResponse<crate::PaginatedResponse<ProductView>>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<ProductView>>>, ServiceError> {
    let (products, total) = state
        .services
        .catalog
        .list_products(query.page, query.limit)
        .await?;

    let total_pages = if query.limit == 0 {
        0
    } else {
        (total + query.limit - 1) / query.limit
    };

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: products.into_iter().map(ProductView::from).collect(),
        total,
        page: query.page,
        limit: query.limit,
        total_pages,
    })))
}

/// Get a product
#[utoipa::path(
    get,
    path = "/api/v1/products/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = crate::ApiResponse<ProductView>),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProductView>>, ServiceError> {
    let product = state.services.catalog.get_product(product_id).await?;
    Ok(Json(ApiResponse::success(ProductView::from(product))))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/:product_id", get(get_product))
}
