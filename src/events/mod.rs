use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderCreated(String),
    OrderPaid {
        order_id: String,
        payment_method: String,
    },
    PaymentFailed {
        order_id: String,
        error_code: String,
    },
    OrderStatusChanged {
        order_id: String,
        old_status: String,
        new_status: String,
    },

    // Inventory events
    StockReserved {
        product_id: Uuid,
        quantity: i32,
        order_id: String,
    },
    StockReleased {
        product_id: Uuid,
        quantity: i32,
    },

    // Wallet events
    WalletDebited {
        user_id: String,
        amount: Decimal,
    },
    WalletCredited {
        user_id: String,
        amount: Decimal,
    },

    // Commission events
    CommissionDistributed {
        order_id: String,
        distribution_status: String,
        distributed: u32,
        total_items: u32,
    },
    SaleRecorded {
        sale_id: String,
        commission_distributed: bool,
    },

    // Cheque review events
    ChequeSubmitted(String),
    ChequeApproved(String),
    ChequeRejected {
        order_id: String,
        reason: String,
    },

    // Invoice events
    InvoiceGenerated {
        order_id: String,
        invoice_number: String,
    },
    InvoiceFailed {
        order_id: String,
        reason: String,
    },

    // Withdrawal events
    WithdrawRequested(Uuid),
    WithdrawApproved(Uuid),
    WithdrawRejected(Uuid),

    // Catalog events
    ProductCreated(Uuid),

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    /// Create a generic event with string data
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

// Function to process incoming events. Today this fans out to the log;
// notification/webhook delivery hangs off the same loop.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCreated(order_id) => {
                info!(order_id = %order_id, "Order created");
            }
            Event::OrderPaid {
                order_id,
                payment_method,
            } => {
                info!(order_id = %order_id, payment_method = %payment_method, "Order paid");
            }
            Event::PaymentFailed {
                order_id,
                error_code,
            } => {
                warn!(order_id = %order_id, error_code = %error_code, "Payment failed");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    order_id = %order_id,
                    old_status = %old_status,
                    new_status = %new_status,
                    "Order status changed"
                );
            }
            Event::StockReserved {
                product_id,
                quantity,
                order_id,
            } => {
                info!(
                    product_id = %product_id,
                    quantity = quantity,
                    order_id = %order_id,
                    "Stock reserved"
                );
            }
            Event::StockReleased {
                product_id,
                quantity,
            } => {
                info!(product_id = %product_id, quantity = quantity, "Stock released");
            }
            Event::WalletDebited { user_id, amount } => {
                info!(user_id = %user_id, amount = %amount, "Wallet debited");
            }
            Event::WalletCredited { user_id, amount } => {
                info!(user_id = %user_id, amount = %amount, "Wallet credited");
            }
            Event::CommissionDistributed {
                order_id,
                distribution_status,
                distributed,
                total_items,
            } => {
                info!(
                    order_id = %order_id,
                    distribution_status = %distribution_status,
                    distributed = distributed,
                    total_items = total_items,
                    "Commission distribution completed"
                );
            }
            Event::SaleRecorded {
                sale_id,
                commission_distributed,
            } => {
                info!(
                    sale_id = %sale_id,
                    commission_distributed = commission_distributed,
                    "Sale recorded"
                );
            }
            Event::ChequeSubmitted(order_id) => {
                info!(order_id = %order_id, "Cheque submitted for verification");
            }
            Event::ChequeApproved(order_id) => {
                info!(order_id = %order_id, "Cheque approved");
            }
            Event::ChequeRejected { order_id, reason } => {
                warn!(order_id = %order_id, reason = %reason, "Cheque rejected");
            }
            Event::InvoiceGenerated {
                order_id,
                invoice_number,
            } => {
                info!(order_id = %order_id, invoice_number = %invoice_number, "Invoice generated");
            }
            Event::InvoiceFailed { order_id, reason } => {
                warn!(order_id = %order_id, reason = %reason, "Invoice generation failed");
            }
            Event::WithdrawRequested(id) => {
                info!(request_id = %id, "Withdrawal requested");
            }
            Event::WithdrawApproved(id) => {
                info!(request_id = %id, "Withdrawal approved");
            }
            Event::WithdrawRejected(id) => {
                info!(request_id = %id, "Withdrawal rejected");
            }
            Event::ProductCreated(id) => {
                info!(product_id = %id, "Product created");
            }
            Event::Generic { message, .. } => {
                info!("{}", message);
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::OrderCreated("ORD-1".to_string()))
            .await
            .expect("send should succeed");

        match rx.recv().await {
            Some(Event::OrderCreated(order_id)) => assert_eq!(order_id, "ORD-1"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        let result = sender.send(Event::ChequeSubmitted("ORD-2".to_string())).await;
        assert!(result.is_err());
    }
}
