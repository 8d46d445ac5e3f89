use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::stock_transaction::{self, Entity as StockTransactionEntity, TransactionType},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        audit::AuditService,
        order_status::FulfillmentDirection,
        stock_levels::{LowStockAlert, StockLevelService},
    },
};

/// Direction of a manual adjustment. Outbound adjustments enforce the
/// non-negative invariant; inbound ones cannot violate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentDirection {
    In,
    Out,
}

/// Input for one append-only ledger row.
#[derive(Debug, Clone)]
pub struct NewStockTransaction {
    pub transaction_type: TransactionType,
    pub product_id: Uuid,
    pub quantity_change: i32,
    pub source_location_id: Option<Uuid>,
    pub destination_location_id: Option<Uuid>,
    pub user_id: Uuid,
    pub purchase_order_id: Option<Uuid>,
    pub sales_order_id: Option<Uuid>,
    pub transfer_ref: Option<Uuid>,
    pub notes: Option<String>,
}

/// Result of a committed manual adjustment.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AdjustmentOutcome {
    pub stock_level: crate::entities::stock_level::Model,
    pub transaction: stock_transaction::Model,
}

/// Result of a committed transfer: both balances and both ledger rows.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TransferOutcome {
    pub source_level: crate::entities::stock_level::Model,
    pub destination_level: crate::entities::stock_level::Model,
    pub outbound: stock_transaction::Model,
    pub inbound: stock_transaction::Model,
}

/// Filters for the transaction-log listing.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub product_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub transaction_type: Option<TransactionType>,
}

/// Writes the append-only stock ledger and owns the compositions that pair a
/// balance change with its causal ledger row inside one transaction.
#[derive(Clone)]
pub struct StockTransactionService {
    db: Arc<DatabaseConnection>,
    stock_levels: Arc<StockLevelService>,
    event_sender: EventSender,
    audit: Arc<AuditService>,
}

impl StockTransactionService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        stock_levels: Arc<StockLevelService>,
        event_sender: EventSender,
        audit: Arc<AuditService>,
    ) -> Self {
        Self {
            db,
            stock_levels,
            event_sender,
            audit,
        }
    }

    /// Pure append of one ledger row. Business validation is the caller's
    /// job; this never reads or mutates prior rows.
    pub async fn record(
        &self,
        txn: &DatabaseTransaction,
        new: NewStockTransaction,
    ) -> Result<stock_transaction::Model, ServiceError> {
        let row = stock_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            transaction_type: Set(new.transaction_type.to_string()),
            product_id: Set(new.product_id),
            quantity_change: Set(new.quantity_change),
            source_location_id: Set(new.source_location_id),
            destination_location_id: Set(new.destination_location_id),
            user_id: Set(new.user_id),
            purchase_order_id: Set(new.purchase_order_id),
            sales_order_id: Set(new.sales_order_id),
            transfer_ref: Set(new.transfer_ref),
            notes: Set(new.notes),
            created_at: Set(Utc::now()),
        };

        row.insert(txn).await.map_err(ServiceError::db_error)
    }

    /// Manual stock adjustment: one balance change and one ledger row in one
    /// transaction. Outbound direction enforces the non-negative invariant.
    #[instrument(skip(self, notes))]
    pub async fn record_adjustment(
        &self,
        actor: Uuid,
        product_id: Uuid,
        location_id: Uuid,
        quantity: i32,
        direction: AdjustmentDirection,
        notes: Option<String>,
    ) -> Result<AdjustmentOutcome, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidInput(
                "adjustment quantity must be positive".to_string(),
            ));
        }

        let (change, transaction_type, enforce) = match direction {
            AdjustmentDirection::In => (quantity, TransactionType::AdjustmentIn, false),
            AdjustmentDirection::Out => (-quantity, TransactionType::AdjustmentOut, true),
        };

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let (level, alert) = self
            .stock_levels
            .apply_change(&txn, product_id, location_id, change, enforce)
            .await?;

        let (source, destination) = match direction {
            AdjustmentDirection::In => (None, Some(location_id)),
            AdjustmentDirection::Out => (Some(location_id), None),
        };

        let transaction = self
            .record(
                &txn,
                NewStockTransaction {
                    transaction_type,
                    product_id,
                    quantity_change: change,
                    source_location_id: source,
                    destination_location_id: destination,
                    user_id: actor,
                    purchase_order_id: None,
                    sales_order_id: None,
                    transfer_ref: None,
                    notes,
                },
            )
            .await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send_or_log(Event::StockAdjusted {
                product_id,
                location_id,
                quantity_change: change,
                new_quantity: level.quantity,
                user_id: actor,
            })
            .await;
        self.emit_alert(alert, actor).await;

        self.audit
            .record(
                actor,
                "STOCK_ADJUSTED",
                "STOCK_LEVEL",
                Some(level.id),
                Some(json!({
                    "product_id": product_id,
                    "location_id": location_id,
                    "quantity_change": change,
                    "new_quantity": level.quantity,
                })),
            )
            .await;

        info!(
            %product_id, %location_id, change, new_quantity = level.quantity,
            "stock adjustment recorded"
        );

        Ok(AdjustmentOutcome {
            stock_level: level,
            transaction,
        })
    }

    /// Inter-location transfer: enforced decrement at the source, unenforced
    /// increment at the destination, two ledger rows paired by a shared
    /// `transfer_ref` — all in one transaction. A failure at the destination
    /// rolls the source decrement back with it.
    #[instrument(skip(self, notes))]
    pub async fn record_transfer(
        &self,
        actor: Uuid,
        product_id: Uuid,
        source_location_id: Uuid,
        destination_location_id: Uuid,
        quantity: i32,
        notes: Option<String>,
    ) -> Result<TransferOutcome, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidInput(
                "transfer quantity must be positive".to_string(),
            ));
        }
        if source_location_id == destination_location_id {
            return Err(ServiceError::InvalidInput(
                "source and destination locations must differ".to_string(),
            ));
        }

        let transfer_ref = Uuid::new_v4();
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let (source_level, source_alert) = self
            .stock_levels
            .apply_change(&txn, product_id, source_location_id, -quantity, true)
            .await?;

        let (destination_level, _) = self
            .stock_levels
            .apply_change(&txn, product_id, destination_location_id, quantity, false)
            .await?;

        let outbound = self
            .record(
                &txn,
                NewStockTransaction {
                    transaction_type: TransactionType::TransferOut,
                    product_id,
                    quantity_change: -quantity,
                    source_location_id: Some(source_location_id),
                    destination_location_id: None,
                    user_id: actor,
                    purchase_order_id: None,
                    sales_order_id: None,
                    transfer_ref: Some(transfer_ref),
                    notes: notes.clone(),
                },
            )
            .await?;

        let inbound = self
            .record(
                &txn,
                NewStockTransaction {
                    transaction_type: TransactionType::TransferIn,
                    product_id,
                    quantity_change: quantity,
                    source_location_id: None,
                    destination_location_id: Some(destination_location_id),
                    user_id: actor,
                    purchase_order_id: None,
                    sales_order_id: None,
                    transfer_ref: Some(transfer_ref),
                    notes,
                },
            )
            .await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send_or_log(Event::StockTransferred {
                product_id,
                source_location_id,
                destination_location_id,
                quantity,
                transfer_ref,
                user_id: actor,
            })
            .await;
        self.emit_alert(source_alert, actor).await;

        self.audit
            .record(
                actor,
                "STOCK_TRANSFERRED",
                "STOCK_LEVEL",
                Some(source_level.id),
                Some(json!({
                    "product_id": product_id,
                    "source_location_id": source_location_id,
                    "destination_location_id": destination_location_id,
                    "quantity": quantity,
                    "transfer_ref": transfer_ref,
                })),
            )
            .await;

        info!(
            %product_id, %source_location_id, %destination_location_id, quantity,
            "stock transfer recorded"
        );

        Ok(TransferOutcome {
            source_level,
            destination_level,
            outbound,
            inbound,
        })
    }

    /// Fulfillment composition used by the order services inside their own
    /// unit of work: receipt adds stock unenforced, shipment removes stock
    /// with the non-negative invariant. No commit happens here; the caller
    /// owns the transaction and emits the returned alert after it commits.
    pub async fn apply_fulfillment(
        &self,
        txn: &DatabaseTransaction,
        actor: Uuid,
        product_id: Uuid,
        location_id: Uuid,
        quantity: i32,
        direction: FulfillmentDirection,
        order_id: Uuid,
        notes: Option<String>,
    ) -> Result<
        (
            crate::entities::stock_level::Model,
            stock_transaction::Model,
            Option<LowStockAlert>,
        ),
        ServiceError,
    > {
        let change = direction.signed_change(quantity);

        let (level, alert) = self
            .stock_levels
            .apply_change(
                txn,
                product_id,
                location_id,
                change,
                direction.enforces_non_negative(),
            )
            .await?;

        let (source, destination, purchase_order_id, sales_order_id) = match direction {
            FulfillmentDirection::Receipt => (None, Some(location_id), Some(order_id), None),
            FulfillmentDirection::Shipment => (Some(location_id), None, None, Some(order_id)),
        };

        let transaction = self
            .record(
                txn,
                NewStockTransaction {
                    transaction_type: direction.transaction_type(),
                    product_id,
                    quantity_change: change,
                    source_location_id: source,
                    destination_location_id: destination,
                    user_id: actor,
                    purchase_order_id,
                    sales_order_id,
                    transfer_ref: None,
                    notes,
                },
            )
            .await?;

        Ok((level, transaction, alert))
    }

    /// Emits a low-stock event when a movement crossed the threshold.
    pub(crate) async fn emit_alert(&self, alert: Option<LowStockAlert>, triggered_by: Uuid) {
        if let Some(alert) = alert {
            self.event_sender
                .send_or_log(Event::LowStockDetected {
                    product_id: alert.product_id,
                    sku: alert.sku,
                    product_name: alert.product_name,
                    location_id: alert.location_id,
                    quantity: alert.quantity,
                    reorder_level: alert.reorder_level,
                    triggered_by,
                })
                .await;
        }
    }

    /// Paginated ledger listing, newest first.
    #[instrument(skip(self))]
    pub async fn list_transactions(
        &self,
        filter: TransactionFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_transaction::Model>, u64), ServiceError> {
        let mut query = StockTransactionEntity::find();

        if let Some(product_id) = filter.product_id {
            query = query.filter(stock_transaction::Column::ProductId.eq(product_id));
        }
        if let Some(location_id) = filter.location_id {
            query = query.filter(
                stock_transaction::Column::SourceLocationId
                    .eq(location_id)
                    .or(stock_transaction::Column::DestinationLocationId.eq(location_id)),
            );
        }
        if let Some(transaction_type) = filter.transaction_type {
            query = query
                .filter(stock_transaction::Column::TransactionType.eq(transaction_type.as_ref()));
        }

        let paginator = query
            .order_by_desc(stock_transaction::Column::CreatedAt)
            .paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((items, total))
    }
}
