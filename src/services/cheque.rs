use crate::{
    entities::order::{self, OrderStatus, PaymentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        commission::{CommissionService, CommissionSummary},
        invoicing::InvoiceService,
        orders::{OrderService, PaymentUpdate},
    },
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Human review workflow for cheque-paid orders.
///
/// Approval is the only path that runs commission distribution for a
/// cheque order, days after the original checkout. The transition
/// claim plus the sale-record guard make a retried approval a
/// conflict, never a second payout.
#[derive(Clone)]
pub struct ChequeReviewService {
    orders: Arc<OrderService>,
    commission: Arc<CommissionService>,
    invoicing: Arc<InvoiceService>,
    event_sender: EventSender,
}

/// Outcome of an approval, for the review UI.
#[derive(Debug)]
pub struct ApprovalOutcome {
    pub order: order::Model,
    pub summary: CommissionSummary,
    pub invoice_warning: Option<String>,
}

impl ChequeReviewService {
    pub fn new(
        orders: Arc<OrderService>,
        commission: Arc<CommissionService>,
        invoicing: Arc<InvoiceService>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            orders,
            commission,
            invoicing,
            event_sender,
        }
    }

    /// Approves a cheque after visual verification.
    ///
    /// Claims the `waiting_confirmation -> confirmed` transition first;
    /// a second approval (or a concurrent one) fails that claim and
    /// never reaches distribution. Distribution failures follow the
    /// same partial/aggregate rules as checkout-time distribution and
    /// leave the order `confirmed` with the outcome recorded.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn approve(&self, order_id: &str) -> Result<ApprovalOutcome, ServiceError> {
        let current = self.orders.get_order_required(order_id).await?;
        if current.payment_method != "cheque" {
            return Err(ServiceError::InvalidOperation(format!(
                "Order {} was not paid by cheque",
                order_id
            )));
        }

        self.commission.ensure_not_distributed(order_id).await?;

        let order_model = self
            .orders
            .claim_transition(
                order_id,
                OrderStatus::WaitingConfirmation,
                OrderStatus::Confirmed,
                PaymentUpdate {
                    payment_status: Some(PaymentStatus::Verified),
                    payment_reference: current.cheque_number.clone(),
                    payment_error: None,
                },
            )
            .await?;

        let items = self.orders.get_order_items(order_id).await?;
        let summary = self
            .commission
            .distribute_for_order(&order_model, &items)
            .await?;

        // A failed distribution keeps the order confirmed; the cheque
        // itself is good. The summary routes it to reconciliation.
        let updated = self
            .orders
            .set_commission_outcome(order_id, &summary, None)
            .await?;

        let invoice_warning = self.invoicing.generate_for_order(&updated).await;

        if let Err(e) = self
            .event_sender
            .send(Event::ChequeApproved(order_id.to_string()))
            .await
        {
            warn!(error = %e, order_id = %order_id, "Failed to send cheque approved event");
        }

        info!(
            order_id = %order_id,
            distribution_status = summary.distribution_status.as_str(),
            "Cheque approved"
        );

        Ok(ApprovalOutcome {
            order: updated,
            summary,
            invoice_warning,
        })
    }

    /// Rejects a cheque with a mandatory human-readable reason.
    ///
    /// No commission distribution occurs and no summary is written.
    /// Stock reserved at checkout is not auto-released; rejections are
    /// rare and corrected manually.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn reject(
        &self,
        order_id: &str,
        reason: &str,
    ) -> Result<order::Model, ServiceError> {
        if reason.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "A rejection reason is required".to_string(),
            ));
        }

        let current = self.orders.get_order_required(order_id).await?;
        if current.payment_method != "cheque" {
            return Err(ServiceError::InvalidOperation(format!(
                "Order {} was not paid by cheque",
                order_id
            )));
        }

        self.orders
            .claim_transition(
                order_id,
                OrderStatus::WaitingConfirmation,
                OrderStatus::Cancelled,
                PaymentUpdate {
                    payment_status: Some(PaymentStatus::Rejected),
                    payment_reference: None,
                    payment_error: None,
                },
            )
            .await?;

        let updated = self.orders.set_review_note(order_id, reason).await?;

        if let Err(e) = self
            .event_sender
            .send(Event::ChequeRejected {
                order_id: order_id.to_string(),
                reason: reason.to_string(),
            })
            .await
        {
            warn!(error = %e, order_id = %order_id, "Failed to send cheque rejected event");
        }

        info!(order_id = %order_id, "Cheque rejected");
        Ok(updated)
    }
}
