use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::checkout::{PlaceOrderRequest, PlaceOrderResponse};
use crate::ApiResponse;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::post,
    Router,
};

/// Place an order
///
/// Runs the full checkout orchestration: stock reservation, payment
/// settlement for the chosen method, commission distribution and
/// invoice emission. Cheque orders stop after the order is stored and
/// wait for review; online orders return a gateway payload and wait
/// for the gateway callback.
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = crate::ApiResponse<PlaceOrderResponse>),
        (status = 400, description = "Validation error", body = crate::errors::ErrorResponse),
        (status = 402, description = "Insufficient wallet balance", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate order id", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn place_order(
    State(state): State<AppState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PlaceOrderResponse>>), ServiceError> {
    let response = state.services.checkout.place_order(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

pub fn checkout_routes() -> Router<AppState> {
    Router::new().route("/", post(place_order))
}
