use crate::{
    entities::{invoice, order},
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Writes invoice metadata for finalized orders.
///
/// This is a terminal, best-effort side effect: a failure is reported
/// as a warning string for the operator and never rolls back or blocks
/// the financial state it trails.
#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InvoiceService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Generates the invoice record for an order. Returns a warning
    /// instead of an error when generation fails.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn generate_for_order(&self, order: &order::Model) -> Option<String> {
        let invoice_number = format!("INV-{}", order.id);

        let model = invoice::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id.clone()),
            invoice_number: Set(invoice_number.clone()),
            total_amount: Set(order.total_amount),
            currency: Set(order.currency.clone()),
            issued_at: Set(Utc::now()),
        };

        match model.insert(&*self.db).await {
            Ok(_) => {
                if let Err(e) = self
                    .event_sender
                    .send(Event::InvoiceGenerated {
                        order_id: order.id.clone(),
                        invoice_number: invoice_number.clone(),
                    })
                    .await
                {
                    warn!(error = %e, order_id = %order.id, "Failed to send invoice generated event");
                }
                info!(order_id = %order.id, invoice_number = %invoice_number, "Invoice generated");
                None
            }
            Err(e) => {
                let reason = format!("invoice generation failed for order {}: {}", order.id, e);
                warn!(order_id = %order.id, error = %e, "Invoice generation failed");
                if let Err(send_err) = self
                    .event_sender
                    .send(Event::InvoiceFailed {
                        order_id: order.id.clone(),
                        reason: reason.clone(),
                    })
                    .await
                {
                    warn!(error = %send_err, order_id = %order.id, "Failed to send invoice failed event");
                }
                Some(reason)
            }
        }
    }
}
