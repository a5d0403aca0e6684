use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::commission::CommissionSummary;
use crate::services::orders::{model_to_response, OrderResponse};
use crate::ApiResponse;
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectChequeRequest {
    /// Human-readable reason shown to the agent; mandatory.
    #[validate(length(min = 1, message = "A rejection reason is required"))]
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChequeApprovalResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub commission: CommissionSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_warning: Option<String>,
}

/// Approve a cheque order
///
/// First (and only) commission distribution run for the order. A
/// repeated approval returns a conflict instead of a duplicate payout.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{order_id}/cheque/approve",
    params(("order_id" = String, Path, description = "Cheque order to approve")),
    responses(
        (status = 200, description = "Cheque approved", body = crate::ApiResponse<ChequeApprovalResponse>),
        (status = 400, description = "Order is not awaiting verification", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown order", body = crate::errors::ErrorResponse),
        (status = 409, description = "Already approved", body = crate::errors::ErrorResponse)
    ),
    tag = "Cheque review"
)]
pub async fn approve_cheque(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<ApiResponse<ChequeApprovalResponse>>, ServiceError> {
    let outcome = state.services.cheque_review.approve(&order_id).await?;

    Ok(Json(ApiResponse::success(ChequeApprovalResponse {
        order: model_to_response(outcome.order),
        commission: outcome.summary,
        invoice_warning: outcome.invoice_warning,
    })))
}

/// Reject a cheque order
#[utoipa::path(
    post,
    path = "/api/v1/orders/{order_id}/cheque/reject",
    params(("order_id" = String, Path, description = "Cheque order to reject")),
    request_body = RejectChequeRequest,
    responses(
        (status = 200, description = "Cheque rejected", body = crate::ApiResponse<crate::services::orders::OrderResponse>),
        (status = 400, description = "Missing reason or wrong state", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown order", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrently reviewed", body = crate::errors::ErrorResponse)
    ),
    tag = "Cheque review"
)]
pub async fn reject_cheque(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(request): Json<RejectChequeRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    request.validate()?;

    let order = state
        .services
        .cheque_review
        .reject(&order_id, &request.reason)
        .await?;

    Ok(Json(ApiResponse::success(model_to_response(order))))
}

pub fn cheque_routes() -> Router<AppState> {
    Router::new()
        .route("/:order_id/cheque/approve", post(approve_cheque))
        .route("/:order_id/cheque/reject", post(reject_cheque))
}
