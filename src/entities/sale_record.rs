use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a commission distribution attempt for one line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleStatus {
    /// Every payout recipient was credited by the ledger service.
    Completed,
    /// The ledger call failed; the sale stands, the payout does not.
    CommissionFailed,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::CommissionFailed => "commission_failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(SaleStatus::Completed),
            "commission_failed" => Some(SaleStatus::CommissionFailed),
            _ => None,
        }
    }
}

/// One row per (order, line item). Written exactly once when commission
/// distribution for that line is attempted; the primary key
/// `<order_id>_<product_id>` doubles as the duplicate-payout guard.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sale_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub order_id: String,
    pub product_id: Uuid,
    pub seller_id: String,
    pub product_name: String,

    /// Line amount the commission was computed against.
    pub amount: Decimal,

    /// JSON map of recipient id to `{amount, rate, role}`.
    #[sea_orm(column_type = "Text")]
    pub commissions: String,

    pub commission_distributed: bool,

    /// Error string from the ledger service when the attempt failed.
    pub error: Option<String>,

    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
