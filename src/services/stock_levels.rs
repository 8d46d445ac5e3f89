use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        location::Entity as LocationEntity,
        product::{self, Entity as ProductEntity},
        stock_level::{self, Entity as StockLevelEntity},
    },
    errors::ServiceError,
};

/// Produced when a movement takes a balance from above a product's reorder
/// level to at-or-below it. Carried out of the transaction by the caller and
/// emitted as an event only after commit.
#[derive(Debug, Clone)]
pub struct LowStockAlert {
    pub product_id: Uuid,
    pub sku: String,
    pub product_name: String,
    pub location_id: Uuid,
    pub quantity: i32,
    pub reorder_level: i32,
}

/// A stock row joined with its product for reporting.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StockLevelWithProduct {
    pub level: stock_level::Model,
    pub product: product::Model,
}

/// Owns every mutation of `stock_levels`. All writes go through
/// [`apply_change`](StockLevelService::apply_change) inside a caller-held
/// transaction so the balance and its ledger row commit together.
#[derive(Clone)]
pub struct StockLevelService {
    db: Arc<DatabaseConnection>,
}

impl StockLevelService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Atomic read-modify-write of one (product, location) balance.
    ///
    /// The row is locked (`SELECT ... FOR UPDATE`) before the increment so
    /// two concurrent decrements serialize and the second observes the
    /// first's effect before its own negative check. A missing row is
    /// created lazily with `max(0, change)`. With `enforce_non_negative`,
    /// a result below zero fails with `InsufficientStock` before anything
    /// is written, which rolls the caller's whole unit of work back.
    ///
    /// Returns the updated row plus a low-stock alert when this change
    /// crossed the product's reorder threshold. The alert must only be
    /// emitted after the surrounding transaction commits.
    #[instrument(skip(self, txn))]
    pub async fn apply_change(
        &self,
        txn: &DatabaseTransaction,
        product_id: Uuid,
        location_id: Uuid,
        change: i32,
        enforce_non_negative: bool,
    ) -> Result<(stock_level::Model, Option<LowStockAlert>), ServiceError> {
        if change == 0 {
            return Err(ServiceError::InvalidInput(
                "quantity change must be non-zero".to_string(),
            ));
        }

        let product = ProductEntity::find_by_id(product_id)
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        LocationEntity::find_by_id(location_id)
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", location_id)))?;

        let existing = StockLevelEntity::find()
            .filter(stock_level::Column::ProductId.eq(product_id))
            .filter(stock_level::Column::LocationId.eq(location_id))
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?;

        let updated = match existing {
            Some(row) => {
                let previous = row.quantity;
                let new_quantity = previous + change;
                if enforce_non_negative && new_quantity < 0 {
                    error!(
                        %product_id, %location_id, available = previous, requested = change.abs(),
                        "rejected stock change: balance would go negative"
                    );
                    return Err(ServiceError::InsufficientStock {
                        product_id,
                        location_id,
                        requested: change.abs(),
                        available: previous,
                    });
                }

                let mut active: stock_level::ActiveModel = row.into();
                active.quantity = Set(new_quantity);
                active.last_updated = Set(Utc::now());
                active.update(txn).await.map_err(ServiceError::db_error)?
            }
            None => {
                if enforce_non_negative && change < 0 {
                    return Err(ServiceError::InsufficientStock {
                        product_id,
                        location_id,
                        requested: change.abs(),
                        available: 0,
                    });
                }

                let row = stock_level::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    product_id: Set(product_id),
                    location_id: Set(location_id),
                    quantity: Set(change.max(0)),
                    last_updated: Set(Utc::now()),
                };
                row.insert(txn).await.map_err(ServiceError::db_error)?
            }
        };

        let alert = low_stock_crossing(&product, &updated, change);
        Ok((updated, alert))
    }

    /// Current balance for one (product, location) pair, if a movement has
    /// ever touched it.
    #[instrument(skip(self))]
    pub async fn get_level(
        &self,
        product_id: Uuid,
        location_id: Uuid,
    ) -> Result<Option<stock_level::Model>, ServiceError> {
        StockLevelEntity::find()
            .filter(stock_level::Column::ProductId.eq(product_id))
            .filter(stock_level::Column::LocationId.eq(location_id))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Paginated balances, optionally restricted to one location.
    #[instrument(skip(self))]
    pub async fn list_levels(
        &self,
        location_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_level::Model>, u64), ServiceError> {
        let mut query = StockLevelEntity::find();
        if let Some(location_id) = location_id {
            query = query.filter(stock_level::Column::LocationId.eq(location_id));
        }

        let paginator = query.paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((items, total))
    }

    /// Balances currently at or below their product's reorder level.
    /// Products with `reorder_level == 0` never appear.
    #[instrument(skip(self))]
    pub async fn low_stock_report(&self) -> Result<Vec<StockLevelWithProduct>, ServiceError> {
        let rows = StockLevelEntity::find()
            .find_also_related(ProductEntity)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(rows
            .into_iter()
            .filter_map(|(level, product)| product.map(|p| (level, p)))
            .filter(|(level, product)| {
                product.reorder_level > 0 && level.quantity <= product.reorder_level
            })
            .map(|(level, product)| StockLevelWithProduct { level, product })
            .collect())
    }
}

/// Threshold-crossing detection: fires only on the transition from above the
/// reorder level to at-or-below it, so repeated movements below the line do
/// not re-alert.
fn low_stock_crossing(
    product: &product::Model,
    updated: &stock_level::Model,
    change: i32,
) -> Option<LowStockAlert> {
    let previous = updated.quantity - change;
    if product.reorder_level > 0
        && updated.quantity <= product.reorder_level
        && previous > product.reorder_level
    {
        Some(LowStockAlert {
            product_id: product.id,
            sku: product.sku.clone(),
            product_name: product.name.clone(),
            location_id: updated.location_id,
            quantity: updated.quantity,
            reorder_level: product.reorder_level,
        })
    } else {
        None
    }
}
