use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        product::{self, Entity as ProductEntity},
        purchase_order_item::{self, Entity as PurchaseOrderItemEntity},
        sales_order_item::{self, Entity as SalesOrderItemEntity},
        stock_transaction::{self, Entity as StockTransactionEntity},
    },
    errors::ServiceError,
    services::audit::AuditService,
};

#[derive(Debug, Clone)]
pub struct CreateProductInput {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub reorder_level: i32,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub reorder_level: Option<i32>,
    pub cost_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
}

/// Product reference data. A product referenced by ledger rows or order
/// items is immutable in identity: deletion is blocked while dependents
/// exist.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    audit: Arc<AuditService>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, audit: Arc<AuditService>) -> Self {
        Self { db, audit }
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create(
        &self,
        actor: Uuid,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        if input.reorder_level < 0 {
            return Err(ServiceError::InvalidInput(
                "reorder level must not be negative".to_string(),
            ));
        }

        let exists = ProductEntity::find()
            .filter(product::Column::Sku.eq(input.sku.clone()))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;
        if exists.is_some() {
            return Err(ServiceError::Conflict(format!(
                "SKU {} already exists",
                input.sku
            )));
        }

        let now = Utc::now();
        let row = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(input.sku),
            name: Set(input.name),
            description: Set(input.description),
            reorder_level: Set(input.reorder_level),
            cost_price: Set(input.cost_price),
            selling_price: Set(input.selling_price),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = row.insert(&*self.db).await.map_err(ServiceError::db_error)?;

        self.audit
            .record(
                actor,
                "PRODUCT_CREATED",
                "PRODUCT",
                Some(created.id),
                Some(json!({ "sku": created.sku, "name": created.name })),
            )
            .await;

        info!(product_id = %created.id, sku = %created.sku, "product created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let paginator = ProductEntity::find()
            .order_by_asc(product::Column::Sku)
            .paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        actor: Uuid,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        if let Some(level) = input.reorder_level {
            if level < 0 {
                return Err(ServiceError::InvalidInput(
                    "reorder level must not be negative".to_string(),
                ));
            }
        }

        let existing = self.get(product_id).await?;
        let mut active: product::ActiveModel = existing.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(reorder_level) = input.reorder_level {
            active.reorder_level = Set(reorder_level);
        }
        if let Some(cost_price) = input.cost_price {
            active.cost_price = Set(cost_price);
        }
        if let Some(selling_price) = input.selling_price {
            active.selling_price = Set(selling_price);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await.map_err(ServiceError::db_error)?;

        self.audit
            .record(actor, "PRODUCT_UPDATED", "PRODUCT", Some(product_id), None)
            .await;

        Ok(updated)
    }

    /// Deletes a product unless movements or order lines reference it.
    #[instrument(skip(self))]
    pub async fn delete(&self, actor: Uuid, product_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get(product_id).await?;

        let transactions = StockTransactionEntity::find()
            .filter(stock_transaction::Column::ProductId.eq(product_id))
            .count(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;
        let po_items = PurchaseOrderItemEntity::find()
            .filter(purchase_order_item::Column::ProductId.eq(product_id))
            .count(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;
        let so_items = SalesOrderItemEntity::find()
            .filter(sales_order_item::Column::ProductId.eq(product_id))
            .count(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        if transactions > 0 || po_items > 0 || so_items > 0 {
            return Err(ServiceError::Conflict(format!(
                "product {} has dependent records and cannot be deleted",
                existing.sku
            )));
        }

        existing
            .delete(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        self.audit
            .record(actor, "PRODUCT_DELETED", "PRODUCT", Some(product_id), None)
            .await;

        info!(%product_id, "product deleted");
        Ok(())
    }
}
