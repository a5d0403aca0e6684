use crate::{
    entities::order::{self, OrderStatus, PaymentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        commission::{CommissionService, CommissionSummary, DistributionStatus},
        inventory::InventoryService,
        invoicing::InvoiceService,
        orders::{CreateOrderInput, OrderItemInput, OrderService, PaymentUpdate},
        wallet::WalletService,
    },
};
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Payment method selected at checkout. Method-specific artifacts are
/// part of the variant, not optional fields on the request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Debit the buyer's wallet balance.
    Wallet,
    /// External payment gateway; settlement is reported via callback.
    Online,
    /// Cash on collection; no external settlement.
    Cash,
    /// Cheque pending human verification.
    Cheque {
        cheque_number: String,
        cheque_image_url: String,
    },
}

impl PaymentMethod {
    pub fn tag(&self) -> &'static str {
        match self {
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Online => "online",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Cheque { .. } => "cheque",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CustomerProfile {
    #[validate(length(min = 1, max = 255, message = "Customer name is required"))]
    pub name: String,
    #[validate(email(message = "Customer email must be valid"))]
    pub email: String,
    #[validate(length(min = 1, max = 32, message = "Customer phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, max = 1024, message = "Customer address is required"))]
    pub address: String,
}

/// One cart line as submitted by the client. The price is the
/// client-held snapshot; quantity is re-validated against live stock
/// at reservation time.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CartLineInput {
    pub product_id: Uuid,
    pub unit_price: Decimal,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PlaceOrderRequest {
    /// Client-generated order token; generated server-side when absent.
    pub order_id: Option<String>,
    #[validate(length(min = 1, message = "Seller id is required"))]
    pub seller_id: String,
    #[validate]
    pub customer: CustomerProfile,
    #[validate(length(min = 1, message = "Cart must not be empty"))]
    pub items: Vec<CartLineInput>,
    pub payment: PaymentMethod,
}

/// What the storefront needs to open the gateway widget.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GatewayCheckout {
    /// Amount in minor currency units (paise for INR).
    pub amount_minor: i64,
    pub currency: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlaceOrderResponse {
    pub order_id: String,
    pub status: String,
    pub payment_status: String,
    pub total_amount: Decimal,
    pub currency: String,
    /// Present only for online orders awaiting the gateway.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewayCheckout>,
    /// Present once commission distribution has run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission: Option<CommissionSummary>,
    /// Non-fatal invoice generation warning, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_warning: Option<String>,
}

/// The checkout orchestrator.
///
/// Drives a checkout attempt through stock reservation, payment
/// settlement, commission distribution and invoice emission. The
/// ordering within one order is fixed: an unpaid order never pays out
/// commission. There is no cross-order synchronization; correctness
/// under concurrent checkouts comes from the ledger services'
/// conditional updates.
#[derive(Clone)]
pub struct CheckoutService {
    inventory: Arc<InventoryService>,
    wallet: Arc<WalletService>,
    orders: Arc<OrderService>,
    commission: Arc<CommissionService>,
    invoicing: Arc<InvoiceService>,
    event_sender: EventSender,
    currency: String,
}

impl CheckoutService {
    pub fn new(
        inventory: Arc<InventoryService>,
        wallet: Arc<WalletService>,
        orders: Arc<OrderService>,
        commission: Arc<CommissionService>,
        invoicing: Arc<InvoiceService>,
        event_sender: EventSender,
        currency: String,
    ) -> Self {
        Self {
            inventory,
            wallet,
            orders,
            commission,
            invoicing,
            event_sender,
            currency,
        }
    }

    /// Runs a checkout attempt end to end.
    #[instrument(skip(self, request), fields(seller_id = %request.seller_id, method = request.payment.tag()))]
    pub async fn place_order(
        &self,
        request: PlaceOrderRequest,
    ) -> Result<PlaceOrderResponse, ServiceError> {
        request.validate()?;
        self.validate_items(&request.items)?;
        if let PaymentMethod::Cheque {
            cheque_number,
            cheque_image_url,
        } = &request.payment
        {
            if cheque_number.trim().is_empty() || cheque_image_url.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Cheque payment requires a cheque number and image".to_string(),
                ));
            }
        }

        let order_id = match &request.order_id {
            Some(id) if !id.trim().is_empty() => id.clone(),
            _ => generate_order_token(),
        };
        if self.orders.get_order(&order_id).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Order {} already exists",
                order_id
            )));
        }

        let total_amount: Decimal = request
            .items
            .iter()
            .map(|item| item.unit_price * Decimal::from(item.quantity))
            .sum();

        // Step 1a: advisory stock check across the whole cart. Abort
        // before any mutation when any line cannot be satisfied. Also
        // snapshots product names for the order items.
        let mut item_inputs = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let product = self
                .inventory
                .check_available(item.product_id, item.quantity)
                .await?;
            item_inputs.push(OrderItemInput {
                product_id: item.product_id,
                product_name: product.name,
                unit_price: item.unit_price,
                quantity: item.quantity,
                line_total: item.unit_price * Decimal::from(item.quantity),
            });
        }

        // Step 1b: reserve per product. The conditional decrement
        // re-validates against live stock; the window between check and
        // reserve is an accepted race.
        for item in &request.items {
            self.inventory
                .reserve_stock(item.product_id, item.quantity, &order_id)
                .await?;
        }

        // Step 2: settlement branch.
        match &request.payment {
            PaymentMethod::Wallet => {
                // Insufficient balance aborts here; the stock reserved
                // above is not compensated (known gap, manual
                // correction via release_stock).
                self.wallet.debit(&request.seller_id, total_amount).await?;

                let (order_model, items) = self
                    .orders
                    .create_order(self.order_input(
                        &request,
                        &order_id,
                        total_amount,
                        item_inputs,
                        OrderStatus::Paid,
                        PaymentStatus::Paid,
                        Some("wallet".to_string()),
                    ))
                    .await?;

                self.notify_paid(&order_id, "wallet").await;

                let (summary, updated, invoice_warning) =
                    self.settle_commissions(&order_model, &items).await?;

                Ok(PlaceOrderResponse {
                    order_id,
                    status: updated.status,
                    payment_status: updated.payment_status,
                    total_amount,
                    currency: self.currency.clone(),
                    gateway: None,
                    commission: Some(summary),
                    invoice_warning,
                })
            }
            PaymentMethod::Online => {
                let (order_model, _items) = self
                    .orders
                    .create_order(self.order_input(
                        &request,
                        &order_id,
                        total_amount,
                        item_inputs,
                        OrderStatus::AwaitingPayment,
                        PaymentStatus::Pending,
                        None,
                    ))
                    .await?;

                let amount_minor = to_minor_units(total_amount)?;

                Ok(PlaceOrderResponse {
                    order_id: order_model.id.clone(),
                    status: order_model.status,
                    payment_status: order_model.payment_status,
                    total_amount,
                    currency: self.currency.clone(),
                    gateway: Some(GatewayCheckout {
                        amount_minor,
                        currency: self.currency.clone(),
                        description: format!("Order {}", order_model.id),
                    }),
                    commission: None,
                    invoice_warning: None,
                })
            }
            PaymentMethod::Cash => {
                let (order_model, items) = self
                    .orders
                    .create_order(self.order_input(
                        &request,
                        &order_id,
                        total_amount,
                        item_inputs,
                        OrderStatus::CashPendingCollection,
                        PaymentStatus::Pending,
                        None,
                    ))
                    .await?;

                let (summary, updated, invoice_warning) =
                    self.settle_commissions(&order_model, &items).await?;

                Ok(PlaceOrderResponse {
                    order_id,
                    status: updated.status,
                    payment_status: updated.payment_status,
                    total_amount,
                    currency: self.currency.clone(),
                    gateway: None,
                    commission: Some(summary),
                    invoice_warning,
                })
            }
            PaymentMethod::Cheque { .. } => {
                // Distribution is deferred until a human verifies the
                // cheque; no sale records exist until then.
                let (order_model, _items) = self
                    .orders
                    .create_order(self.order_input(
                        &request,
                        &order_id,
                        total_amount,
                        item_inputs,
                        OrderStatus::WaitingConfirmation,
                        PaymentStatus::AwaitingVerification,
                        None,
                    ))
                    .await?;

                if let Err(e) = self
                    .event_sender
                    .send(Event::ChequeSubmitted(order_model.id.clone()))
                    .await
                {
                    warn!(error = %e, order_id = %order_model.id, "Failed to send cheque submitted event");
                }

                Ok(PlaceOrderResponse {
                    order_id: order_model.id,
                    status: order_model.status,
                    payment_status: order_model.payment_status,
                    total_amount,
                    currency: self.currency.clone(),
                    gateway: None,
                    commission: None,
                    invoice_warning: None,
                })
            }
        }
    }

    /// Gateway success callback: claims the awaiting→paid transition
    /// exactly once, then resumes the orchestration (distribution,
    /// summary, invoice). The payment identifier is persisted verbatim.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn confirm_gateway_payment(
        &self,
        order_id: &str,
        payment_id: &str,
    ) -> Result<order::Model, ServiceError> {
        let order_model = self
            .orders
            .claim_transition(
                order_id,
                OrderStatus::AwaitingPayment,
                OrderStatus::Paid,
                PaymentUpdate {
                    payment_status: Some(PaymentStatus::Paid),
                    payment_reference: Some(payment_id.to_string()),
                    payment_error: None,
                },
            )
            .await?;

        self.notify_paid(order_id, "online").await;

        let items = self.orders.get_order_items(order_id).await?;
        let (_summary, updated, _invoice_warning) =
            self.settle_commissions(&order_model, &items).await?;

        Ok(updated)
    }

    /// Gateway failure callback (declined payment or a dismissed
    /// widget): terminal unpaid state, no distribution, stock kept
    /// (known gap). The error code is persisted verbatim.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn fail_gateway_payment(
        &self,
        order_id: &str,
        error_code: &str,
        description: Option<&str>,
    ) -> Result<order::Model, ServiceError> {
        let error = match description {
            Some(desc) => format!("{}: {}", error_code, desc),
            None => error_code.to_string(),
        };

        let order_model = self
            .orders
            .claim_transition(
                order_id,
                OrderStatus::AwaitingPayment,
                OrderStatus::PaymentFailed,
                PaymentUpdate {
                    payment_status: Some(PaymentStatus::Failed),
                    payment_reference: None,
                    payment_error: Some(error.clone()),
                },
            )
            .await?;

        if let Err(e) = self
            .event_sender
            .send(Event::PaymentFailed {
                order_id: order_id.to_string(),
                error_code: error,
            })
            .await
        {
            warn!(error = %e, order_id = %order_id, "Failed to send payment failed event");
        }

        Ok(order_model)
    }

    /// Steps 3-6 for a settled order: distribute, aggregate, persist
    /// the rollup (falling back to the reconciliation queue on partial
    /// or full commission failure) and emit the invoice best-effort.
    async fn settle_commissions(
        &self,
        order_model: &order::Model,
        items: &[crate::entities::order_item::Model],
    ) -> Result<(CommissionSummary, order::Model, Option<String>), ServiceError> {
        let summary = self
            .commission
            .distribute_for_order(order_model, items)
            .await?;

        let new_status = match summary.distribution_status {
            DistributionStatus::Distributed => None,
            _ => Some(OrderStatus::Pending),
        };

        let updated = self
            .orders
            .set_commission_outcome(&order_model.id, &summary, new_status)
            .await?;

        let invoice_warning = self.invoicing.generate_for_order(&updated).await;

        Ok((summary, updated, invoice_warning))
    }

    fn order_input(
        &self,
        request: &PlaceOrderRequest,
        order_id: &str,
        total_amount: Decimal,
        items: Vec<OrderItemInput>,
        status: OrderStatus,
        payment_status: PaymentStatus,
        payment_reference: Option<String>,
    ) -> CreateOrderInput {
        let (cheque_number, cheque_image_url) = match &request.payment {
            PaymentMethod::Cheque {
                cheque_number,
                cheque_image_url,
            } => (Some(cheque_number.clone()), Some(cheque_image_url.clone())),
            _ => (None, None),
        };

        CreateOrderInput {
            order_id: order_id.to_string(),
            seller_id: request.seller_id.clone(),
            customer_name: request.customer.name.clone(),
            customer_email: request.customer.email.clone(),
            customer_phone: request.customer.phone.clone(),
            customer_address: request.customer.address.clone(),
            total_amount,
            currency: self.currency.clone(),
            payment_method: request.payment.tag().to_string(),
            status,
            payment_status,
            payment_reference,
            cheque_number,
            cheque_image_url,
            items,
        }
    }

    fn validate_items(&self, items: &[CartLineInput]) -> Result<(), ServiceError> {
        let mut seen = HashSet::new();
        for item in items {
            item.validate()?;
            if item.unit_price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Unit price for product {} must be positive",
                    item.product_id
                )));
            }
            if !seen.insert(item.product_id) {
                return Err(ServiceError::ValidationError(format!(
                    "Product {} appears more than once in the cart",
                    item.product_id
                )));
            }
        }
        Ok(())
    }

    async fn notify_paid(&self, order_id: &str, method: &str) {
        if let Err(e) = self
            .event_sender
            .send(Event::OrderPaid {
                order_id: order_id.to_string(),
                payment_method: method.to_string(),
            })
            .await
        {
            warn!(error = %e, order_id = %order_id, "Failed to send order paid event");
        }
    }
}

/// Order token in the client-side format: millisecond timestamp plus a
/// short random suffix.
pub fn generate_order_token() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();
    format!("ORD-{}-{}", Utc::now().timestamp_millis(), token)
}

/// Converts a major-unit amount to gateway minor units (paise).
fn to_minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    (amount * Decimal::from(100))
        .round_dp(0)
        .to_i64()
        .ok_or_else(|| {
            ServiceError::InternalError(format!("Amount {} out of range for gateway", amount))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn order_tokens_are_unique_and_prefixed() {
        let a = generate_order_token();
        let b = generate_order_token();
        assert!(a.starts_with("ORD-"));
        assert_ne!(a, b);
    }

    #[test]
    fn minor_units_round_to_paise() {
        assert_eq!(to_minor_units(dec!(250)).unwrap(), 25000);
        assert_eq!(to_minor_units(dec!(99.99)).unwrap(), 9999);
        assert_eq!(to_minor_units(dec!(1.5)).unwrap(), 150);
    }

    #[test]
    fn payment_method_deserializes_with_variant_artifacts() {
        let raw = r#"{"type":"cheque","cheque_number":"001234","cheque_image_url":"https://cdn.example/cheques/1.jpg"}"#;
        let method: PaymentMethod = serde_json::from_str(raw).unwrap();
        match method {
            PaymentMethod::Cheque { cheque_number, .. } => assert_eq!(cheque_number, "001234"),
            other => panic!("unexpected method: {:?}", other),
        }

        let wallet: PaymentMethod = serde_json::from_str(r#"{"type":"wallet"}"#).unwrap();
        assert_eq!(wallet.tag(), "wallet");
    }
}
