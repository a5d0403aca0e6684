use utoipa::OpenApi;

/// OpenAPI documentation for the Salesline API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Salesline API",
        description = "Direct-sales order fulfillment and commission distribution"
    ),
    paths(
        crate::handlers::checkout::place_order,
        crate::handlers::payment_webhooks::gateway_success,
        crate::handlers::payment_webhooks::gateway_failure,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::cheques::approve_cheque,
        crate::handlers::cheques::reject_cheque,
        crate::handlers::products::create_product,
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::wallet::get_balance,
        crate::handlers::wallet::credit_wallet,
        crate::handlers::wallet::create_withdrawal,
        crate::handlers::wallet::list_withdrawals,
        crate::handlers::wallet::approve_withdrawal,
        crate::handlers::wallet::reject_withdrawal,
        crate::handlers::health::health,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::services::checkout::PlaceOrderRequest,
        crate::services::checkout::PlaceOrderResponse,
        crate::services::checkout::PaymentMethod,
        crate::services::checkout::CustomerProfile,
        crate::services::checkout::CartLineInput,
        crate::services::checkout::GatewayCheckout,
        crate::services::commission::CommissionSummary,
        crate::services::commission::CommissionLineResult,
        crate::services::commission::CommissionPayout,
        crate::services::commission::DistributionStatus,
        crate::services::orders::OrderResponse,
        crate::services::orders::OrderListResponse,
        crate::services::catalog::CreateProductInput,
        crate::services::withdrawals::CreateWithdrawInput,
        crate::handlers::orders::OrderDetailResponse,
        crate::handlers::orders::OrderItemView,
        crate::handlers::orders::SaleRecordView,
        crate::handlers::cheques::RejectChequeRequest,
        crate::handlers::cheques::ChequeApprovalResponse,
        crate::handlers::payment_webhooks::GatewaySuccessPayload,
        crate::handlers::payment_webhooks::GatewayFailurePayload,
        crate::handlers::products::ProductView,
        crate::handlers::wallet::WalletBalanceResponse,
        crate::handlers::wallet::CreditWalletRequest,
        crate::handlers::wallet::RejectWithdrawRequest,
        crate::handlers::wallet::WithdrawRequestView,
        crate::handlers::health::HealthResponse,
    )),
    tags(
        (name = "Checkout", description = "Order placement"),
        (name = "Payments", description = "Gateway settlement callbacks"),
        (name = "Orders", description = "Order queries and reconciliation"),
        (name = "Cheque review", description = "Cheque verification workflow"),
        (name = "Products", description = "Catalog surface"),
        (name = "Wallet", description = "Wallet ledger and withdrawals"),
        (name = "Health", description = "Service health"),
    )
)]
pub struct ApiDoc;
