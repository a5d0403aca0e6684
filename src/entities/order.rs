use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an order. Terminal statuses are append-only:
/// once reached, only a human action can move the order again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Online order created, gateway outcome not yet reported.
    AwaitingPayment,
    /// Settled in full, commission fully distributed.
    Paid,
    /// Settled, but commission distribution needs manual reconciliation.
    Pending,
    /// Cash order awaiting collection by the delivery agent.
    CashPendingCollection,
    /// Cheque uploaded, awaiting human verification.
    WaitingConfirmation,
    /// Cheque verified by a reviewer.
    Confirmed,
    /// Cheque rejected by a reviewer.
    Cancelled,
    /// Gateway reported failure or the buyer dismissed payment.
    PaymentFailed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::AwaitingPayment => "awaiting_payment",
            OrderStatus::Paid => "paid",
            OrderStatus::Pending => "pending",
            OrderStatus::CashPendingCollection => "cash_pending_collection",
            OrderStatus::WaitingConfirmation => "waiting_confirmation",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::PaymentFailed => "payment_failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "awaiting_payment" => Some(OrderStatus::AwaitingPayment),
            "paid" => Some(OrderStatus::Paid),
            "pending" => Some(OrderStatus::Pending),
            "cash_pending_collection" => Some(OrderStatus::CashPendingCollection),
            "waiting_confirmation" => Some(OrderStatus::WaitingConfirmation),
            "confirmed" => Some(OrderStatus::Confirmed),
            "cancelled" => Some(OrderStatus::Cancelled),
            "payment_failed" => Some(OrderStatus::PaymentFailed),
            _ => None,
        }
    }
}

/// Settlement state, tracked independently of the lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    AwaitingVerification,
    Verified,
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::AwaitingVerification => "awaiting_verification",
            PaymentStatus::Verified => "verified",
            PaymentStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            "awaiting_verification" => Some(PaymentStatus::AwaitingVerification),
            "verified" => Some(PaymentStatus::Verified),
            "rejected" => Some(PaymentStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Client-generated order token (`ORD-<millis>-<random>`), unique
    /// per checkout attempt.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Selling agent credited for commission distribution.
    pub seller_id: String,

    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,

    pub total_amount: Decimal,
    pub currency: String,

    /// Payment method tag: wallet, online, cash or cheque.
    pub payment_method: String,

    pub status: String,
    pub payment_status: String,

    /// Gateway payment identifier, persisted verbatim on success.
    pub payment_reference: Option<String>,
    /// Gateway error code/description, persisted verbatim on failure.
    pub payment_error: Option<String>,

    pub cheque_number: Option<String>,
    pub cheque_image_url: Option<String>,

    /// Rollup of the per-line-item distribution outcome. The sale
    /// records are the source of truth; this is for status display.
    pub commission_status: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub commission_summary: Option<String>,

    /// Reviewer note: cheque rejection reason or reconciliation note.
    pub review_note: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::sale_record::Entity")]
    SaleRecords,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::sale_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatus::AwaitingPayment,
            OrderStatus::Paid,
            OrderStatus::Pending,
            OrderStatus::CashPendingCollection,
            OrderStatus::WaitingConfirmation,
            OrderStatus::Confirmed,
            OrderStatus::Cancelled,
            OrderStatus::PaymentFailed,
        ] {
            assert_eq!(OrderStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::from_str("shipped"), None);
    }

    #[test]
    fn payment_status_round_trips_through_strings() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::AwaitingVerification,
            PaymentStatus::Verified,
            PaymentStatus::Rejected,
        ] {
            assert_eq!(PaymentStatus::from_str(status.as_str()), Some(status));
        }
    }
}
