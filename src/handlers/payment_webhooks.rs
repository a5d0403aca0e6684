use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::orders::{model_to_response, OrderResponse};
use crate::ApiResponse;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::warn;
use utoipa::ToSchema;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize, ToSchema)]
pub struct GatewaySuccessPayload {
    /// Payment identifier assigned by the gateway, persisted verbatim.
    pub payment_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GatewayFailurePayload {
    /// Gateway error code (or "cancelled" for a dismissed widget).
    pub error_code: String,
    pub description: Option<String>,
}

/// Gateway success callback
///
/// Resumes the checkout orchestration for an online order: the order
/// moves to paid exactly once and commission distribution runs.
#[utoipa::path(
    post,
    path = "/api/v1/payments/gateway/{order_id}/success",
    params(("order_id" = String, Path, description = "Order the callback settles")),
    request_body = GatewaySuccessPayload,
    responses(
        (status = 200, description = "Payment recorded", body = crate::ApiResponse<crate::services::orders::OrderResponse>),
        (status = 400, description = "Invalid payload or order state", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid signature", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown order", body = crate::errors::ErrorResponse),
        (status = 409, description = "Callback already processed", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn gateway_success(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    verify_gateway_signature(&state, &headers, &body)?;

    let payload: GatewaySuccessPayload = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::InvalidInput(format!("invalid callback payload: {}", e)))?;

    let order = state
        .services
        .checkout
        .confirm_gateway_payment(&order_id, &payload.payment_id)
        .await?;

    Ok(Json(ApiResponse::success(model_to_response(order))))
}

/// Gateway failure callback
///
/// Terminates the checkout in the unpaid state. The error code is
/// persisted verbatim; no commission distribution occurs.
#[utoipa::path(
    post,
    path = "/api/v1/payments/gateway/{order_id}/failure",
    params(("order_id" = String, Path, description = "Order the callback settles")),
    request_body = GatewayFailurePayload,
    responses(
        (status = 200, description = "Failure recorded", body = crate::ApiResponse<crate::services::orders::OrderResponse>),
        (status = 400, description = "Invalid payload or order state", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid signature", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown order", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn gateway_failure(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    verify_gateway_signature(&state, &headers, &body)?;

    let payload: GatewayFailurePayload = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::InvalidInput(format!("invalid callback payload: {}", e)))?;

    let order = state
        .services
        .checkout
        .fail_gateway_payment(&order_id, &payload.error_code, payload.description.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(model_to_response(order))))
}

/// Verifies the `x-timestamp`/`x-signature` HMAC-SHA256 headers when a
/// webhook secret is configured. Unsigned callbacks pass only when the
/// secret is unset.
fn verify_gateway_signature(
    state: &AppState,
    headers: &HeaderMap,
    payload: &Bytes,
) -> Result<(), ServiceError> {
    let Some(secret) = state.config.gateway_webhook_secret.as_deref() else {
        return Ok(());
    };

    let ok = check_signature(
        headers,
        payload,
        secret,
        state.config.gateway_webhook_tolerance_secs,
    );
    if !ok {
        warn!("Gateway callback signature verification failed");
        return Err(ServiceError::Unauthorized(
            "invalid webhook signature".to_string(),
        ));
    }
    Ok(())
}

fn check_signature(
    headers: &HeaderMap,
    payload: &Bytes,
    secret: &str,
    tolerance_secs: u64,
) -> bool {
    let (Some(ts), Some(sig)) = (headers.get("x-timestamp"), headers.get("x-signature")) else {
        return false;
    };
    let (Ok(ts), Ok(sig)) = (ts.to_str(), sig.to_str()) else {
        return false;
    };

    if let Ok(ts_i) = ts.parse::<i64>() {
        let now = chrono::Utc::now().timestamp();
        if (now - ts_i).unsigned_abs() > tolerance_secs {
            return false;
        }
    } else {
        return false;
    }

    let signed = format!("{}.{}", ts, std::str::from_utf8(payload).unwrap_or(""));
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(signed.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());
    constant_time_eq(&expected, sig)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}

pub fn gateway_webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/:order_id/success", post(gateway_success))
        .route("/:order_id/failure", post(gateway_failure))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, ts: i64, body: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.{}", ts, body).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature_passes() {
        let secret = "gw-secret";
        let body = Bytes::from_static(b"{\"payment_id\":\"pay_1\"}");
        let ts = chrono::Utc::now().timestamp();

        let mut headers = HeaderMap::new();
        headers.insert("x-timestamp", ts.to_string().parse().unwrap());
        headers.insert(
            "x-signature",
            sign(secret, ts, std::str::from_utf8(&body).unwrap())
                .parse()
                .unwrap(),
        );

        assert!(check_signature(&headers, &body, secret, 300));
    }

    #[test]
    fn stale_timestamp_fails() {
        let secret = "gw-secret";
        let body = Bytes::from_static(b"{}");
        let ts = chrono::Utc::now().timestamp() - 3600;

        let mut headers = HeaderMap::new();
        headers.insert("x-timestamp", ts.to_string().parse().unwrap());
        headers.insert(
            "x-signature",
            sign(secret, ts, "{}").parse().unwrap(),
        );

        assert!(!check_signature(&headers, &body, secret, 300));
    }

    #[test]
    fn tampered_body_fails() {
        let secret = "gw-secret";
        let ts = chrono::Utc::now().timestamp();

        let mut headers = HeaderMap::new();
        headers.insert("x-timestamp", ts.to_string().parse().unwrap());
        headers.insert(
            "x-signature",
            sign(secret, ts, "{\"payment_id\":\"pay_1\"}").parse().unwrap(),
        );

        let tampered = Bytes::from_static(b"{\"payment_id\":\"pay_2\"}");
        assert!(!check_signature(&headers, &tampered, secret, 300));
    }
}
