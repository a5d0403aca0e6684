pub mod cheques;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod payment_webhooks;
pub mod products;
pub mod wallet;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::services;
use std::sync::Arc;
use std::time::Duration;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<services::catalog::ProductService>,
    pub inventory: Arc<services::inventory::InventoryService>,
    pub wallet: Arc<services::wallet::WalletService>,
    pub orders: Arc<services::orders::OrderService>,
    pub commission: Arc<services::commission::CommissionService>,
    pub checkout: Arc<services::checkout::CheckoutService>,
    pub cheque_review: Arc<services::cheque::ChequeReviewService>,
    pub invoicing: Arc<services::invoicing::InvoiceService>,
    pub withdrawals: Arc<services::withdrawals::WithdrawalService>,
}

impl AppServices {
    /// Builds the service container used by both the server and tests.
    pub fn new(
        db: Arc<DbPool>,
        event_sender: EventSender,
        config: &AppConfig,
    ) -> Result<Self, ServiceError> {
        let catalog = Arc::new(services::catalog::ProductService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let inventory = Arc::new(services::inventory::InventoryService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let wallet = Arc::new(services::wallet::WalletService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let orders = Arc::new(services::orders::OrderService::new(
            db.clone(),
            event_sender.clone(),
        ));

        let commission_client = Arc::new(services::commission::CommissionClient::new(
            config.commission_service_url.clone(),
            Duration::from_secs(config.commission_timeout_secs),
        )?);
        let commission = Arc::new(services::commission::CommissionService::new(
            db.clone(),
            commission_client,
            event_sender.clone(),
        ));

        let invoicing = Arc::new(services::invoicing::InvoiceService::new(
            db.clone(),
            event_sender.clone(),
        ));

        let checkout = Arc::new(services::checkout::CheckoutService::new(
            inventory.clone(),
            wallet.clone(),
            orders.clone(),
            commission.clone(),
            invoicing.clone(),
            event_sender.clone(),
            config.currency.clone(),
        ));

        let cheque_review = Arc::new(services::cheque::ChequeReviewService::new(
            orders.clone(),
            commission.clone(),
            invoicing.clone(),
            event_sender.clone(),
        ));

        let withdrawals = Arc::new(services::withdrawals::WithdrawalService::new(
            db,
            wallet.clone(),
            event_sender,
        ));

        Ok(Self {
            catalog,
            inventory,
            wallet,
            orders,
            commission,
            checkout,
            cheque_review,
            invoicing,
            withdrawals,
        })
    }
}
