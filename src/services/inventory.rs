use crate::{
    entities::product::{self, Entity as ProductEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Upper bound on conditional-update retries before giving up with a
/// conflict error. Each lost round means another writer committed, so
/// this also bounds how many concurrent winners a single reservation
/// will wait out before surfacing the conflict.
const MAX_CAS_ATTEMPTS: u32 = 16;

/// Service owning the per-product stock ledger.
///
/// Stock is mutated exclusively through an atomic conditional update:
/// read the row, compute the new quantity, and commit only if the row's
/// version has not moved since the read. The pre-checkout availability
/// check is advisory UX; this primitive is the actual safety boundary.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Reads the current stock level for a product.
    #[instrument(skip(self))]
    pub async fn get_stock(&self, product_id: Uuid) -> Result<i32, ServiceError> {
        let product = self.find_product(product_id).await?;
        Ok(product.stock_quantity)
    }

    /// Advisory availability check used before reservation. The answer
    /// can be stale by the time the reservation commits; the
    /// conditional decrement re-validates.
    #[instrument(skip(self))]
    pub async fn check_available(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<product::Model, ServiceError> {
        let product = self.find_product(product_id).await?;
        if product.stock_quantity < quantity {
            return Err(ServiceError::InsufficientStock(format!(
                "no sufficient quantity for product '{}': requested {}, available {}",
                product.name, quantity, product.stock_quantity
            )));
        }
        Ok(product)
    }

    /// Reserves stock with an atomic conditional decrement. Refuses to
    /// go negative; retries transparently when a concurrent checkout
    /// moved the row between read and commit.
    #[instrument(skip(self), fields(product_id = %product_id, quantity = quantity))]
    pub async fn reserve_stock(
        &self,
        product_id: Uuid,
        quantity: i32,
        order_id: &str,
    ) -> Result<i32, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidInput(
                "Reservation quantity must be positive".to_string(),
            ));
        }

        let remaining = self
            .apply_stock_mutation(product_id, |current| {
                let next = current - quantity;
                if next < 0 {
                    Err(ServiceError::InsufficientStock(format!(
                        "no sufficient quantity for product {}: requested {}, available {}",
                        product_id, quantity, current
                    )))
                } else {
                    Ok(next)
                }
            })
            .await?;

        if let Err(e) = self
            .event_sender
            .send(Event::StockReserved {
                product_id,
                quantity,
                order_id: order_id.to_string(),
            })
            .await
        {
            warn!(error = %e, product_id = %product_id, "Failed to send stock reserved event");
        }

        info!(
            product_id = %product_id,
            quantity = quantity,
            remaining = remaining,
            "Stock reserved"
        );
        Ok(remaining)
    }

    /// Returns previously reserved stock to the shelf. Used by manual
    /// correction flows; the orchestrator deliberately does not call
    /// this on settlement failure.
    #[instrument(skip(self), fields(product_id = %product_id, quantity = quantity))]
    pub async fn release_stock(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<i32, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidInput(
                "Release quantity must be positive".to_string(),
            ));
        }

        let remaining = self
            .apply_stock_mutation(product_id, |current| Ok(current + quantity))
            .await?;

        if let Err(e) = self
            .event_sender
            .send(Event::StockReleased {
                product_id,
                quantity,
            })
            .await
        {
            warn!(error = %e, product_id = %product_id, "Failed to send stock released event");
        }

        Ok(remaining)
    }

    /// The conditional-update primitive: applies `f` to the current
    /// stock value and commits only if the row version is unchanged
    /// since the read. On conflict, re-reads and retries `f` against
    /// the latest value, up to `MAX_CAS_ATTEMPTS`.
    async fn apply_stock_mutation<F>(
        &self,
        product_id: Uuid,
        mut f: F,
    ) -> Result<i32, ServiceError>
    where
        F: FnMut(i32) -> Result<i32, ServiceError>,
    {
        let db = &*self.db;

        for attempt in 0..MAX_CAS_ATTEMPTS {
            let product = self.find_product(product_id).await?;
            let next = f(product.stock_quantity)?;

            let result = ProductEntity::update_many()
                .col_expr(product::Column::StockQuantity, Expr::value(next))
                .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
                .col_expr(product::Column::Version, Expr::value(product.version + 1))
                .filter(product::Column::Id.eq(product_id))
                .filter(product::Column::Version.eq(product.version))
                .exec(db)
                .await
                .map_err(ServiceError::DatabaseError)?;

            if result.rows_affected == 1 {
                return Ok(next);
            }

            warn!(
                product_id = %product_id,
                attempt = attempt + 1,
                "Concurrent stock update detected, retrying"
            );
        }

        Err(ServiceError::ConcurrentModification(format!(
            "product {}",
            product_id
        )))
    }

    async fn find_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }
}
