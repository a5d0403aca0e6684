use crate::{
    entities::{
        order,
        order_item,
        sale_record::{self, Entity as SaleRecordEntity, SaleStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use futures::future::join_all;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Rollup classification of a distribution run across all line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStatus {
    Distributed,
    PartiallyDistributed,
    Failed,
}

impl DistributionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionStatus::Distributed => "distributed",
            DistributionStatus::PartiallyDistributed => "partially_distributed",
            DistributionStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "distributed" => Some(DistributionStatus::Distributed),
            "partially_distributed" => Some(DistributionStatus::PartiallyDistributed),
            "failed" => Some(DistributionStatus::Failed),
            _ => None,
        }
    }

    /// Classifies `ok_count` successes out of `total` line items.
    pub fn classify(ok_count: usize, total: usize) -> Self {
        if total > 0 && ok_count == total {
            DistributionStatus::Distributed
        } else if ok_count == 0 {
            DistributionStatus::Failed
        } else {
            DistributionStatus::PartiallyDistributed
        }
    }
}

/// A single payout recipient reported by the commission ledger.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommissionPayout {
    pub uid: String,
    pub amount: Decimal,
    pub rate: Decimal,
    pub role: String,
}

/// Per-recipient share as persisted on a sale record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionShare {
    pub amount: Decimal,
    pub rate: Decimal,
    pub role: String,
}

/// Outcome of one line item's distribution attempt. Folded into the
/// sale record and the order's commission summary; never persisted on
/// its own.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommissionLineResult {
    pub product_id: Uuid,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paid_to: Vec<CommissionPayout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Denormalized rollup written to `orders.commission_summary`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommissionSummary {
    pub distributed: u32,
    pub total_items: u32,
    pub distribution_status: DistributionStatus,
    pub message: String,
    pub results: Vec<CommissionLineResult>,
}

impl CommissionSummary {
    pub fn from_results(results: Vec<CommissionLineResult>) -> Self {
        let total = results.len();
        let ok_count = results.iter().filter(|r| r.ok).count();
        let status = DistributionStatus::classify(ok_count, total);

        let message = match status {
            DistributionStatus::Distributed => {
                format!("commission distributed for all {} line items", total)
            }
            DistributionStatus::PartiallyDistributed => format!(
                "payment settled; commission distributed for {} of {} line items, manual reconciliation required",
                ok_count, total
            ),
            DistributionStatus::Failed => format!(
                "payment settled; commission distribution failed for all {} line items, manual reconciliation required",
                total
            ),
        };

        Self {
            distributed: ok_count as u32,
            total_items: total as u32,
            distribution_status: status,
            message,
            results,
        }
    }

    pub fn to_json(&self) -> Result<String, ServiceError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, ServiceError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Request body for the external ledger's distribute endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DistributeRequest {
    pub seller_id: String,
    pub amount: Decimal,
    pub product: ProductRef,
    pub order_ref: String,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct DistributeResponse {
    ok: bool,
    #[serde(default)]
    payouts: Vec<CommissionPayout>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the external commission ledger.
///
/// Any transport error, non-2xx status or malformed body is reported
/// as an `ExternalServiceError`; callers treat that as a line-item
/// failure, never as a fatal error for the whole order.
#[derive(Clone)]
pub struct CommissionClient {
    http: reqwest::Client,
    base_url: String,
}

impl CommissionClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        let base_url: String = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[instrument(skip(self, request), fields(order_ref = %request.order_ref))]
    pub async fn distribute(
        &self,
        request: &DistributeRequest,
    ) -> Result<Vec<CommissionPayout>, ServiceError> {
        let url = format!("{}/distribute", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!("commission service unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "commission service returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: DistributeResponse = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("malformed commission response: {}", e))
        })?;

        if !body.ok {
            return Err(ServiceError::ExternalServiceError(format!(
                "commission service rejected the request: {}",
                body.error.unwrap_or_else(|| "no reason given".to_string())
            )));
        }

        Ok(body.payouts)
    }
}

/// Idempotency key for one line item's distribution attempt. Lets the
/// ledger deduplicate retried calls for the same attempt; the guard
/// against a second independent attempt is the caller's, enforced via
/// existing sale records.
pub fn idempotency_key(order_id: &str, product_id: Uuid) -> String {
    format!(
        "{}_{}_{}",
        order_id,
        product_id,
        Utc::now().timestamp_millis()
    )
}

/// Distribution engine: drives the per-line-item ledger calls, writes
/// sale records and aggregates the rollup.
#[derive(Clone)]
pub struct CommissionService {
    db: Arc<DatabaseConnection>,
    client: Arc<CommissionClient>,
    event_sender: EventSender,
}

impl CommissionService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        client: Arc<CommissionClient>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            client,
            event_sender,
        }
    }

    /// Fails when sale records already exist for the order. This is the
    /// guard that keeps a retried approval or a re-entered checkout
    /// from paying commission out twice.
    pub async fn ensure_not_distributed(&self, order_id: &str) -> Result<(), ServiceError> {
        let existing = SaleRecordEntity::find()
            .filter(sale_record::Column::OrderId.eq(order_id))
            .count(&*self.db)
            .await?;

        if existing > 0 {
            return Err(ServiceError::Conflict(format!(
                "commission already distributed for order {}",
                order_id
            )));
        }
        Ok(())
    }

    /// Runs commission distribution for every line item of an order.
    ///
    /// Line items are fanned out concurrently; each item's ledger call
    /// and sale-record write happen together, and a failure on one item
    /// never blocks the others. The caller decides what the resulting
    /// summary means for the order's lifecycle status.
    #[instrument(skip(self, order, items), fields(order_id = %order.id, items = items.len()))]
    pub async fn distribute_for_order(
        &self,
        order: &order::Model,
        items: &[order_item::Model],
    ) -> Result<CommissionSummary, ServiceError> {
        self.ensure_not_distributed(&order.id).await?;

        let attempts = items.iter().map(|item| self.distribute_line(order, item));
        let results: Vec<CommissionLineResult> = join_all(attempts).await;

        let summary = CommissionSummary::from_results(results);

        if let Err(e) = self
            .event_sender
            .send(Event::CommissionDistributed {
                order_id: order.id.clone(),
                distribution_status: summary.distribution_status.as_str().to_string(),
                distributed: summary.distributed,
                total_items: summary.total_items,
            })
            .await
        {
            warn!(error = %e, order_id = %order.id, "Failed to send commission distributed event");
        }

        info!(
            order_id = %order.id,
            status = summary.distribution_status.as_str(),
            distributed = summary.distributed,
            total = summary.total_items,
            "Commission distribution completed"
        );

        Ok(summary)
    }

    /// One line item: ledger call plus sale-record write. All failure
    /// modes collapse into the returned result; this future never
    /// errors, so `join_all` always yields one result per item.
    async fn distribute_line(
        &self,
        order: &order::Model,
        item: &order_item::Model,
    ) -> CommissionLineResult {
        let request = DistributeRequest {
            seller_id: order.seller_id.clone(),
            amount: item.line_total,
            product: ProductRef {
                id: item.product_id,
                name: item.product_name.clone(),
            },
            order_ref: format!("{}_{}", order.id, item.product_id),
            idempotency_key: idempotency_key(&order.id, item.product_id),
        };

        let mut result = match self.client.distribute(&request).await {
            Ok(payouts) => CommissionLineResult {
                product_id: item.product_id,
                ok: true,
                paid_to: payouts,
                error: None,
            },
            Err(e) => {
                warn!(
                    order_id = %order.id,
                    product_id = %item.product_id,
                    error = %e,
                    "Commission distribution failed for line item"
                );
                CommissionLineResult {
                    product_id: item.product_id,
                    ok: false,
                    paid_to: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };

        if let Err(e) = self.write_sale_record(order, item, &result).await {
            error!(
                order_id = %order.id,
                product_id = %item.product_id,
                error = %e,
                "Failed to persist sale record"
            );
            // Without a sale record the payout cannot be proven; push
            // the line into the reconciliation queue.
            result.ok = false;
            result.error = Some(format!("sale record write failed: {}", e));
        }

        result
    }

    async fn write_sale_record(
        &self,
        order: &order::Model,
        item: &order_item::Model,
        result: &CommissionLineResult,
    ) -> Result<(), ServiceError> {
        let commissions: BTreeMap<String, CommissionShare> = result
            .paid_to
            .iter()
            .map(|p| {
                (
                    p.uid.clone(),
                    CommissionShare {
                        amount: p.amount,
                        rate: p.rate,
                        role: p.role.clone(),
                    },
                )
            })
            .collect();

        let status = if result.ok {
            SaleStatus::Completed
        } else {
            SaleStatus::CommissionFailed
        };

        let sale_id = format!("{}_{}", order.id, item.product_id);
        let record = sale_record::ActiveModel {
            id: Set(sale_id.clone()),
            order_id: Set(order.id.clone()),
            product_id: Set(item.product_id),
            seller_id: Set(order.seller_id.clone()),
            product_name: Set(item.product_name.clone()),
            amount: Set(item.line_total),
            commissions: Set(serde_json::to_string(&commissions)?),
            commission_distributed: Set(result.ok),
            error: Set(result.error.clone()),
            status: Set(status.as_str().to_string()),
            created_at: Set(Utc::now()),
        };

        record.insert(&*self.db).await?;

        if let Err(e) = self
            .event_sender
            .send(Event::SaleRecorded {
                sale_id,
                commission_distributed: result.ok,
            })
            .await
        {
            warn!(error = %e, order_id = %order.id, "Failed to send sale recorded event");
        }

        Ok(())
    }

    /// Sale records for an order, for detail views and reconciliation.
    pub async fn list_for_order(
        &self,
        order_id: &str,
    ) -> Result<Vec<sale_record::Model>, ServiceError> {
        Ok(SaleRecordEntity::find()
            .filter(sale_record::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?)
    }
}
