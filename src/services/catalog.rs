use crate::{
    entities::product::{self, Entity as ProductEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 255, message = "Product name is required"))]
    pub name: String,
    pub unit_price: Decimal,
    pub stock_quantity: i32,
}

/// Catalog surface the orchestrator depends on: price and stock reads
/// plus a seed/create path. Browsing, variants and media live in the
/// storefront, not here.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;

        if input.unit_price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Unit price must be positive".to_string(),
            ));
        }
        if input.stock_quantity < 0 {
            return Err(ServiceError::ValidationError(
                "Stock quantity must not be negative".to_string(),
            ));
        }

        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            unit_price: Set(input.unit_price),
            stock_quantity: Set(input.stock_quantity),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            version: Set(1),
        };

        let created = model.insert(&*self.db).await?;

        if let Err(e) = self.event_sender.send(Event::ProductCreated(created.id)).await {
            warn!(error = %e, product_id = %created.id, "Failed to send product created event");
        }

        info!(product_id = %created.id, "Product created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    /// Lists products with pagination, newest first.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page number must be greater than 0".to_string(),
            ));
        }
        if limit == 0 || limit > 1000 {
            return Err(ServiceError::ValidationError(
                "Limit must be between 1 and 1000".to_string(),
            ));
        }

        let paginator = ProductEntity::find()
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;

        Ok((products, total))
    }
}
