use chrono::Utc;
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
        location::{self, Entity as LocationEntity},
        stock_level::{self, Entity as StockLevelEntity},
        stock_transaction::{self, Entity as StockTransactionEntity},
    },
    errors::ServiceError,
    services::audit::AuditService,
};

#[derive(Debug, Clone)]
pub struct CreateLocationInput {
    pub name: String,
    pub description: Option<String>,
}

/// Location reference data. Deletion is blocked while stock rows or ledger
/// rows reference the location.
#[derive(Clone)]
pub struct LocationService {
    db: Arc<DatabaseConnection>,
    audit: Arc<AuditService>,
}

impl LocationService {
    pub fn new(db: Arc<DatabaseConnection>, audit: Arc<AuditService>) -> Self {
        Self { db, audit }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(
        &self,
        actor: Uuid,
        input: CreateLocationInput,
    ) -> Result<location::Model, ServiceError> {
        let exists = LocationEntity::find()
            .filter(location::Column::Name.eq(input.name.clone()))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;
        if exists.is_some() {
            return Err(ServiceError::Conflict(format!(
                "location name {} already exists",
                input.name
            )));
        }

        let now = Utc::now();
        let row = location::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = row.insert(&*self.db).await.map_err(ServiceError::db_error)?;

        self.audit
            .record(
                actor,
                "LOCATION_CREATED",
                "LOCATION",
                Some(created.id),
                Some(json!({ "name": created.name })),
            )
            .await;

        info!(location_id = %created.id, name = %created.name, "location created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, location_id: Uuid) -> Result<location::Model, ServiceError> {
        LocationEntity::find_by_id(location_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", location_id)))
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<location::Model>, u64), ServiceError> {
        let paginator = LocationEntity::find()
            .order_by_asc(location::Column::Name)
            .paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }

    /// Deletes a location unless stock balances or ledger rows reference it.
    #[instrument(skip(self))]
    pub async fn delete(&self, actor: Uuid, location_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get(location_id).await?;

        let stock_rows = StockLevelEntity::find()
            .filter(stock_level::Column::LocationId.eq(location_id))
            .count(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;
        let ledger_rows = StockTransactionEntity::find()
            .filter(
                stock_transaction::Column::SourceLocationId
                    .eq(location_id)
                    .or(stock_transaction::Column::DestinationLocationId.eq(location_id)),
            )
            .count(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        if stock_rows > 0 || ledger_rows > 0 {
            return Err(ServiceError::Conflict(format!(
                "location {} has stock history and cannot be deleted",
                existing.name
            )));
        }

        existing
            .delete(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        self.audit
            .record(actor, "LOCATION_DELETED", "LOCATION", Some(location_id), None)
            .await;

        info!(%location_id, "location deleted");
        Ok(())
    }
}
