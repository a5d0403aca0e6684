use crate::{
    entities::{
        order::{self, Entity as OrderEntity, OrderStatus, PaymentStatus},
        order_item::{self, Entity as OrderItemEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::commission::CommissionSummary,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Line item captured at order creation.
#[derive(Debug, Clone)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// Everything needed to write an order row and its items.
#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub order_id: String,
    pub seller_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub total_amount: Decimal,
    pub currency: String,
    pub payment_method: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub cheque_number: Option<String>,
    pub cheque_image_url: Option<String>,
    pub items: Vec<OrderItemInput>,
}

/// Settlement fields written alongside a status transition.
#[derive(Debug, Clone, Default)]
pub struct PaymentUpdate {
    pub payment_status: Option<PaymentStatus>,
    pub payment_reference: Option<String>,
    pub payment_error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: String,
    pub seller_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub total_amount: Decimal,
    pub currency: String,
    pub payment_method: String,
    pub status: String,
    pub payment_status: String,
    pub payment_reference: Option<String>,
    pub payment_error: Option<String>,
    pub commission_status: Option<String>,
    pub commission_summary: Option<CommissionSummary>,
    pub review_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for the durable order store.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates an order together with its line items in one transaction.
    #[instrument(skip(self, input), fields(order_id = %input.order_id, items = input.items.len()))]
    pub async fn create_order(
        &self,
        input: CreateOrderInput,
    ) -> Result<(order::Model, Vec<order_item::Model>), ServiceError> {
        let db = &*self.db;
        let now = Utc::now();

        if OrderEntity::find_by_id(input.order_id.clone())
            .one(db)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(format!(
                "Order {} already exists",
                input.order_id
            )));
        }

        let txn = db.begin().await?;

        let order_model = order::ActiveModel {
            id: Set(input.order_id.clone()),
            seller_id: Set(input.seller_id),
            customer_name: Set(input.customer_name),
            customer_email: Set(input.customer_email),
            customer_phone: Set(input.customer_phone),
            customer_address: Set(input.customer_address),
            total_amount: Set(input.total_amount),
            currency: Set(input.currency),
            payment_method: Set(input.payment_method),
            status: Set(input.status.as_str().to_string()),
            payment_status: Set(input.payment_status.as_str().to_string()),
            payment_reference: Set(input.payment_reference),
            payment_error: Set(None),
            cheque_number: Set(input.cheque_number),
            cheque_image_url: Set(input.cheque_image_url),
            commission_status: Set(None),
            commission_summary: Set(None),
            review_note: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            version: Set(1),
        };

        let order_model = order_model.insert(&txn).await?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in input.items {
            let item_model = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_model.id.clone()),
                product_id: Set(item.product_id),
                product_name: Set(item.product_name),
                unit_price: Set(item.unit_price),
                quantity: Set(item.quantity),
                line_total: Set(item.line_total),
                created_at: Set(now),
            };
            items.push(item_model.insert(&txn).await?);
        }

        txn.commit().await?;

        if let Err(e) = self
            .event_sender
            .send(Event::OrderCreated(order_model.id.clone()))
            .await
        {
            warn!(error = %e, order_id = %order_model.id, "Failed to send order created event");
        }

        info!(order_id = %order_model.id, "Order created");
        Ok((order_model, items))
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: &str) -> Result<Option<order::Model>, ServiceError> {
        Ok(OrderEntity::find_by_id(order_id.to_string())
            .one(&*self.db)
            .await?)
    }

    pub async fn get_order_required(&self, order_id: &str) -> Result<order::Model, ServiceError> {
        self.get_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    pub async fn get_order_items(
        &self,
        order_id: &str,
    ) -> Result<Vec<order_item::Model>, ServiceError> {
        Ok(OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?)
    }

    /// Lists orders with pagination, newest first, optionally filtered
    /// by lifecycle status (the reconciliation view filters on
    /// `pending`).
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
        status_filter: Option<&str>,
    ) -> Result<OrderListResponse, ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page number must be greater than 0".to_string(),
            ));
        }
        if per_page == 0 || per_page > 1000 {
            return Err(ServiceError::ValidationError(
                "Limit must be between 1 and 1000".to_string(),
            ));
        }

        let mut query = OrderEntity::find().order_by_desc(order::Column::CreatedAt);
        if let Some(status) = status_filter {
            query = query.filter(order::Column::Status.eq(status));
        }

        let paginator = query.paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;

        Ok(OrderListResponse {
            orders: orders.into_iter().map(model_to_response).collect(),
            total,
            page,
            per_page,
        })
    }

    /// Claims a status transition exactly once.
    ///
    /// The update commits only if the order still has the expected
    /// status and version; a lost race (a concurrent callback or a
    /// double-submitted approval) sees zero rows affected and gets a
    /// conflict instead of a second side effect.
    #[instrument(skip(self, payment), fields(order_id = %order_id))]
    pub async fn claim_transition(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
        payment: PaymentUpdate,
    ) -> Result<order::Model, ServiceError> {
        if !is_valid_transition(from, to) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot transition from '{}' to '{}'",
                from.as_str(),
                to.as_str()
            )));
        }

        let db = &*self.db;
        let current = self.get_order_required(order_id).await?;

        if current.status != from.as_str() {
            return Err(ServiceError::InvalidStatus(format!(
                "Order {} is '{}', expected '{}'",
                order_id, current.status, from.as_str()
            )));
        }

        let mut update = OrderEntity::update_many()
            .col_expr(order::Column::Status, Expr::value(to.as_str()))
            .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now()))
            .col_expr(order::Column::Version, Expr::value(current.version + 1));

        if let Some(payment_status) = payment.payment_status {
            update = update.col_expr(
                order::Column::PaymentStatus,
                Expr::value(payment_status.as_str()),
            );
        }
        if let Some(reference) = payment.payment_reference.clone() {
            update = update.col_expr(order::Column::PaymentReference, Expr::value(reference));
        }
        if let Some(error) = payment.payment_error.clone() {
            update = update.col_expr(order::Column::PaymentError, Expr::value(error));
        }

        let result = update
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.eq(from.as_str()))
            .filter(order::Column::Version.eq(current.version))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "Order {} was concurrently updated",
                order_id
            )));
        }

        if let Err(e) = self
            .event_sender
            .send(Event::OrderStatusChanged {
                order_id: order_id.to_string(),
                old_status: from.as_str().to_string(),
                new_status: to.as_str().to_string(),
            })
            .await
        {
            warn!(error = %e, order_id = %order_id, "Failed to send status changed event");
        }

        info!(
            order_id = %order_id,
            from = from.as_str(),
            to = to.as_str(),
            "Order status transition claimed"
        );

        self.get_order_required(order_id).await
    }

    /// Persists the commission rollup and, when the distribution fell
    /// short of full success, moves the order into the manual
    /// reconciliation queue.
    #[instrument(skip(self, summary), fields(order_id = %order_id))]
    pub async fn set_commission_outcome(
        &self,
        order_id: &str,
        summary: &CommissionSummary,
        new_status: Option<OrderStatus>,
    ) -> Result<order::Model, ServiceError> {
        let order_model = self.get_order_required(order_id).await?;
        let old_status = order_model.status.clone();

        if let Some(to) = new_status {
            let from = OrderStatus::from_str(&old_status).ok_or_else(|| {
                ServiceError::InvalidStatus(format!("Unknown order status '{}'", old_status))
            })?;
            if from != to && !is_valid_transition(from, to) {
                return Err(ServiceError::InvalidStatus(format!(
                    "Cannot transition from '{}' to '{}'",
                    old_status,
                    to.as_str()
                )));
            }
        }

        let mut active: order::ActiveModel = order_model.clone().into();
        active.commission_status =
            Set(Some(summary.distribution_status.as_str().to_string()));
        active.commission_summary = Set(Some(summary.to_json()?));
        if let Some(to) = new_status {
            active.status = Set(to.as_str().to_string());
        }
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(order_model.version + 1);

        let updated = active.update(&*self.db).await?;

        if let Some(to) = new_status {
            if old_status != to.as_str() {
                if let Err(e) = self
                    .event_sender
                    .send(Event::OrderStatusChanged {
                        order_id: order_id.to_string(),
                        old_status,
                        new_status: to.as_str().to_string(),
                    })
                    .await
                {
                    warn!(error = %e, order_id = %order_id, "Failed to send status changed event");
                }
            }
        }

        Ok(updated)
    }

    /// Records the reviewer's note (cheque rejection reason or
    /// reconciliation remark).
    pub async fn set_review_note(
        &self,
        order_id: &str,
        note: &str,
    ) -> Result<order::Model, ServiceError> {
        let order_model = self.get_order_required(order_id).await?;
        let version = order_model.version;

        let mut active: order::ActiveModel = order_model.into();
        active.review_note = Set(Some(note.to_string()));
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);

        Ok(active.update(&*self.db).await?)
    }
}

/// Allowed lifecycle transitions. Everything not listed is invalid;
/// same-status updates are treated as no-ops.
pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    match (from, to) {
        (AwaitingPayment, Paid) => true,
        (AwaitingPayment, PaymentFailed) => true,
        (Paid, Pending) => true,
        (CashPendingCollection, Pending) => true,
        (WaitingConfirmation, Confirmed) => true,
        (WaitingConfirmation, Cancelled) => true,
        _ => from == to,
    }
}

/// Converts an order model to its response form, parsing the stored
/// commission summary when present.
pub fn model_to_response(model: order::Model) -> OrderResponse {
    let commission_summary = model
        .commission_summary
        .as_deref()
        .and_then(|raw| CommissionSummary::from_json(raw).ok());

    OrderResponse {
        id: model.id,
        seller_id: model.seller_id,
        customer_name: model.customer_name,
        customer_email: model.customer_email,
        total_amount: model.total_amount,
        currency: model.currency,
        payment_method: model.payment_method,
        status: model.status,
        payment_status: model.payment_status,
        payment_reference: model.payment_reference,
        payment_error: model.payment_error,
        commission_status: model.commission_status,
        commission_summary,
        review_note: model.review_note,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cheque_orders_only_reach_confirmed_or_cancelled() {
        use OrderStatus::*;
        assert!(is_valid_transition(WaitingConfirmation, Confirmed));
        assert!(is_valid_transition(WaitingConfirmation, Cancelled));
        assert!(!is_valid_transition(WaitingConfirmation, Paid));
        assert!(!is_valid_transition(WaitingConfirmation, Pending));
        assert!(!is_valid_transition(Cancelled, Confirmed));
        assert!(!is_valid_transition(Confirmed, Cancelled));
    }

    #[test]
    fn settled_orders_may_enter_reconciliation() {
        use OrderStatus::*;
        assert!(is_valid_transition(Paid, Pending));
        assert!(is_valid_transition(CashPendingCollection, Pending));
        assert!(!is_valid_transition(Pending, Paid));
    }

    #[test]
    fn gateway_outcomes_are_terminal() {
        use OrderStatus::*;
        assert!(is_valid_transition(AwaitingPayment, Paid));
        assert!(is_valid_transition(AwaitingPayment, PaymentFailed));
        assert!(!is_valid_transition(PaymentFailed, Paid));
        assert!(!is_valid_transition(PaymentFailed, AwaitingPayment));
    }

    #[test]
    fn same_status_is_a_noop() {
        use OrderStatus::*;
        assert!(is_valid_transition(Paid, Paid));
        assert!(is_valid_transition(Cancelled, Cancelled));
    }
}
