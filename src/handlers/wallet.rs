use crate::entities::withdraw_request;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::withdrawals::CreateWithdrawInput;
use crate::ApiResponse;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct WalletBalanceResponse {
    pub user_id: String,
    pub balance: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreditWalletRequest {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectWithdrawRequest {
    #[validate(length(min = 1, message = "A rejection note is required"))]
    pub note: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WithdrawRequestView {
    pub id: Uuid,
    pub user_id: String,
    pub amount: Decimal,
    pub status: String,
    pub admin_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<withdraw_request::Model> for WithdrawRequestView {
    fn from(model: withdraw_request::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            amount: model.amount,
            status: model.status,
            admin_note: model.admin_note,
            created_at: model.created_at,
        }
    }
}

/// Get a wallet balance
#[utoipa::path(
    get,
    path = "/api/v1/wallet/{user_id}",
    params(("user_id" = String, Path, description = "Wallet owner")),
    responses(
        (status = 200, description = "Balance", body = crate::ApiResponse<WalletBalanceResponse>)
    ),
    tag = "Wallet"
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<WalletBalanceResponse>>, ServiceError> {
    let balance = state.services.wallet.get_balance(&user_id).await?;
    Ok(Json(ApiResponse::success(WalletBalanceResponse {
        user_id,
        balance,
    })))
}

/// Credit a wallet (top-up)
#[utoipa::path(
    post,
    path = "/api/v1/wallet/{user_id}/credit",
    params(("user_id" = String, Path, description = "Wallet owner")),
    request_body = CreditWalletRequest,
    responses(
        (status = 200, description = "Wallet credited", body = crate::ApiResponse<WalletBalanceResponse>),
        (status = 400, description = "Invalid amount", body = crate::errors::ErrorResponse)
    ),
    tag = "Wallet"
)]
pub async fn credit_wallet(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<CreditWalletRequest>,
) -> Result<Json<ApiResponse<WalletBalanceResponse>>, ServiceError> {
    let balance = state
        .services
        .wallet
        .credit(&user_id, request.amount)
        .await?;
    Ok(Json(ApiResponse::success(WalletBalanceResponse {
        user_id,
        balance,
    })))
}

/// Request a withdrawal
#[utoipa::path(
    post,
    path = "/api/v1/withdrawals",
    request_body = CreateWithdrawInput,
    responses(
        (status = 201, description = "Withdrawal requested", body = crate::ApiResponse<WithdrawRequestView>),
        (status = 400, description = "Validation error", body = crate::errors::ErrorResponse),
        (status = 402, description = "Insufficient balance", body = crate::errors::ErrorResponse)
    ),
    tag = "Wallet"
)]
pub async fn create_withdrawal(
    State(state): State<AppState>,
    Json(input): Json<CreateWithdrawInput>,
) -> Result<(StatusCode, Json<ApiResponse<WithdrawRequestView>>), ServiceError> {
    let request = state.services.withdrawals.create_request(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(WithdrawRequestView::from(request))),
    ))
}

/// List a user's withdrawal requests
#[utoipa::path(
    get,
    path = "/api/v1/withdrawals/user/{user_id}",
    params(("user_id" = String, Path, description = "Wallet owner")),
    responses(
        (status = 200, description = "Requests listed", body = crate::ApiResponse<Vec<WithdrawRequestView>>)
    ),
    tag = "Wallet"
)]
pub async fn list_withdrawals(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<WithdrawRequestView>>>, ServiceError> {
    let requests = state.services.withdrawals.list_for_user(&user_id).await?;
    Ok(Json(ApiResponse::success(
        requests.into_iter().map(WithdrawRequestView::from).collect(),
    )))
}

/// Approve a withdrawal (debits the wallet)
#[utoipa::path(
    post,
    path = "/api/v1/withdrawals/{request_id}/approve",
    params(("request_id" = Uuid, Path, description = "Withdrawal request")),
    responses(
        (status = 200, description = "Withdrawal approved", body = crate::ApiResponse<WithdrawRequestView>),
        (status = 402, description = "Insufficient balance", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrently reviewed", body = crate::errors::ErrorResponse)
    ),
    tag = "Wallet"
)]
pub async fn approve_withdrawal(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<ApiResponse<WithdrawRequestView>>, ServiceError> {
    let request = state.services.withdrawals.approve(request_id).await?;
    Ok(Json(ApiResponse::success(WithdrawRequestView::from(
        request,
    ))))
}

/// Reject a withdrawal
#[utoipa::path(
    post,
    path = "/api/v1/withdrawals/{request_id}/reject",
    params(("request_id" = Uuid, Path, description = "Withdrawal request")),
    request_body = RejectWithdrawRequest,
    responses(
        (status = 200, description = "Withdrawal rejected", body = crate::ApiResponse<WithdrawRequestView>),
        (status = 400, description = "Missing note", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrently reviewed", body = crate::errors::ErrorResponse)
    ),
    tag = "Wallet"
)]
pub async fn reject_withdrawal(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(request): Json<RejectWithdrawRequest>,
) -> Result<Json<ApiResponse<WithdrawRequestView>>, ServiceError> {
    request.validate()?;
    let updated = state
        .services
        .withdrawals
        .reject(request_id, &request.note)
        .await?;
    Ok(Json(ApiResponse::success(WithdrawRequestView::from(
        updated,
    ))))
}

pub fn wallet_routes() -> Router<AppState> {
    Router::new()
        .route("/:user_id", get(get_balance))
        .route("/:user_id/credit", post(credit_wallet))
}

pub fn withdrawal_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_withdrawal))
        .route("/user/:user_id", get(list_withdrawals))
        .route("/:request_id/approve", post(approve_withdrawal))
        .route("/:request_id/reject", post(reject_withdrawal))
}
