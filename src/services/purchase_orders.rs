use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        purchase_order::{self, Entity as PurchaseOrderEntity},
        purchase_order_item::{self, Entity as PurchaseOrderItemEntity},
        product::Entity as ProductEntity,
        supplier::Entity as SupplierEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender, OrderKind},
    services::{
        audit::AuditService,
        generate_order_number,
        order_status::{
            check_fulfillment_quantity, derive_status, parse_status, FulfillmentDirection,
            OrderStatus,
        },
        stock_transactions::StockTransactionService,
    },
};

/// One requested order line at creation time.
#[derive(Debug, Clone)]
pub struct CreateOrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_cost: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreatePurchaseOrderInput {
    pub supplier_id: Uuid,
    pub order_number: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<CreateOrderItemInput>,
}

#[derive(Debug, Clone)]
pub struct ReceiveItemInput {
    pub quantity: i32,
    pub location_id: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PurchaseOrderWithItems {
    pub order: purchase_order::Model,
    pub items: Vec<purchase_order_item::Model>,
}

/// Purchase order lifecycle: creation, manual status transitions, and the
/// receive path that moves stock in through the ledger.
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: Arc<DatabaseConnection>,
    ledger: Arc<StockTransactionService>,
    event_sender: EventSender,
    audit: Arc<AuditService>,
}

impl PurchaseOrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        ledger: Arc<StockTransactionService>,
        event_sender: EventSender,
        audit: Arc<AuditService>,
    ) -> Self {
        Self {
            db,
            ledger,
            event_sender,
            audit,
        }
    }

    /// Creates a purchase order with its items in one transaction. The
    /// header starts PENDING and every line starts with nothing received.
    #[instrument(skip(self, input), fields(supplier_id = %input.supplier_id))]
    pub async fn create(
        &self,
        actor: Uuid,
        input: CreatePurchaseOrderInput,
    ) -> Result<PurchaseOrderWithItems, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::InvalidInput(
                "purchase order must have at least one item".to_string(),
            ));
        }
        for item in &input.items {
            if item.quantity <= 0 {
                return Err(ServiceError::InvalidInput(
                    "item quantity must be positive".to_string(),
                ));
            }
            if item.unit_cost < Decimal::ZERO {
                return Err(ServiceError::InvalidInput(
                    "item unit cost must not be negative".to_string(),
                ));
            }
        }

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        SupplierEntity::find_by_id(input.supplier_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", input.supplier_id))
            })?;

        for item in &input.items {
            ProductEntity::find_by_id(item.product_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;
        }

        let order_number = match input.order_number {
            Some(number) => {
                let exists = PurchaseOrderEntity::find()
                    .filter(purchase_order::Column::OrderNumber.eq(number.clone()))
                    .one(&txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                if exists.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "order number {} already exists",
                        number
                    )));
                }
                number
            }
            None => generate_order_number("PO"),
        };

        let now = Utc::now();
        let order = purchase_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(order_number),
            supplier_id: Set(input.supplier_id),
            status: Set(OrderStatus::Pending.to_string()),
            notes: Set(input.notes),
            created_by: Set(actor),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let order = order.insert(&txn).await.map_err(ServiceError::db_error)?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in input.items {
            let row = purchase_order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                purchase_order_id: Set(order.id),
                product_id: Set(item.product_id),
                quantity_ordered: Set(item.quantity),
                quantity_received: Set(0),
                unit_cost: Set(item.unit_cost),
                created_at: Set(now),
                updated_at: Set(now),
            };
            items.push(row.insert(&txn).await.map_err(ServiceError::db_error)?);
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        self.audit
            .record(
                actor,
                "PURCHASE_ORDER_CREATED",
                "PURCHASE_ORDER",
                Some(order.id),
                Some(json!({
                    "order_number": order.order_number,
                    "supplier_id": order.supplier_id,
                    "item_count": items.len(),
                })),
            )
            .await;

        info!(order_id = %order.id, order_number = %order.order_number, "purchase order created");

        Ok(PurchaseOrderWithItems { order, items })
    }

    /// Order header plus its items.
    #[instrument(skip(self))]
    pub async fn get(&self, order_id: Uuid) -> Result<PurchaseOrderWithItems, ServiceError> {
        let order = PurchaseOrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase order {} not found", order_id))
            })?;

        let items = PurchaseOrderItemEntity::find()
            .filter(purchase_order_item::Column::PurchaseOrderId.eq(order_id))
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(PurchaseOrderWithItems { order, items })
    }

    /// Paginated headers, optionally filtered by status, newest first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<purchase_order::Model>, u64), ServiceError> {
        let mut query = PurchaseOrderEntity::find();
        if let Some(status) = status {
            query = query.filter(purchase_order::Column::Status.eq(status.as_ref()));
        }

        let paginator = query
            .order_by_desc(purchase_order::Column::CreatedAt)
            .paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((orders, total))
    }

    /// Explicit header-level status change, checked against the transition
    /// table. Terminal states reject everything.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        actor: Uuid,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<purchase_order::Model, ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let order = PurchaseOrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase order {} not found", order_id))
            })?;

        let current = parse_status(&order.status)?;
        if !current.can_transition_to(new_status, OrderKind::Purchase) {
            return Err(ServiceError::InvalidTransition {
                from: current.to_string(),
                to: new_status.to_string(),
            });
        }

        let order_number = order.order_number.clone();
        let created_by = order.created_by;

        let mut active: purchase_order::ActiveModel = order.into();
        active.status = Set(new_status.to_string());
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                order_kind: OrderKind::Purchase,
                order_number: order_number.clone(),
                new_status: new_status.to_string(),
                notify_user_id: created_by,
            })
            .await;

        self.audit
            .record(
                actor,
                "PURCHASE_ORDER_STATUS_CHANGED",
                "PURCHASE_ORDER",
                Some(order_id),
                Some(json!({
                    "order_number": order_number,
                    "from": current.to_string(),
                    "to": new_status.to_string(),
                })),
            )
            .await;

        info!(%order_id, from = %current, to = %new_status, "purchase order status changed");

        Ok(updated)
    }

    /// Receives a quantity against one order line: ledger movement, item
    /// counter, and derived header status commit or roll back as one unit.
    #[instrument(skip(self, input), fields(quantity = input.quantity))]
    pub async fn receive_item(
        &self,
        actor: Uuid,
        order_id: Uuid,
        item_id: Uuid,
        input: ReceiveItemInput,
    ) -> Result<purchase_order_item::Model, ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let order = PurchaseOrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase order {} not found", order_id))
            })?;

        let item = PurchaseOrderItemEntity::find_by_id(item_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .filter(|item| item.purchase_order_id == order_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Item {} not found on purchase order {}",
                    item_id, order_id
                ))
            })?;

        let current = parse_status(&order.status)?;
        if !current.accepts_fulfillment() {
            return Err(ServiceError::Conflict(format!(
                "purchase order {} in status {} cannot accept receipts",
                order.order_number, current
            )));
        }

        check_fulfillment_quantity(item.quantity_ordered, item.quantity_received, input.quantity)?;

        let (_, _, alert) = self
            .ledger
            .apply_fulfillment(
                &txn,
                actor,
                item.product_id,
                input.location_id,
                input.quantity,
                FulfillmentDirection::Receipt,
                order_id,
                input.notes,
            )
            .await?;

        let product_id = item.product_id;
        let new_received = item.quantity_received + input.quantity;
        let mut active: purchase_order_item::ActiveModel = item.into();
        active.quantity_received = Set(new_received);
        active.updated_at = Set(Utc::now());
        let updated_item = active.update(&txn).await.map_err(ServiceError::db_error)?;

        let items = PurchaseOrderItemEntity::find()
            .filter(purchase_order_item::Column::PurchaseOrderId.eq(order_id))
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        let total_ordered: i64 = items.iter().map(|i| i.quantity_ordered as i64).sum();
        let total_received: i64 = items.iter().map(|i| i.quantity_received as i64).sum();

        let derived = derive_status(OrderKind::Purchase, total_ordered, total_received);
        let status_changed = derived != current && !current.is_terminal();
        if status_changed {
            let mut active: purchase_order::ActiveModel = order.clone().into();
            active.status = Set(derived.to_string());
            active.updated_at = Set(Utc::now());
            active.update(&txn).await.map_err(ServiceError::db_error)?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        self.ledger.emit_alert(alert, actor).await;
        self.event_sender
            .send_or_log(Event::OrderItemFulfilled {
                order_id,
                order_kind: OrderKind::Purchase,
                item_id,
                product_id,
                location_id: input.location_id,
                quantity: input.quantity,
                user_id: actor,
            })
            .await;
        if status_changed {
            self.event_sender
                .send_or_log(Event::OrderStatusChanged {
                    order_id,
                    order_kind: OrderKind::Purchase,
                    order_number: order.order_number.clone(),
                    new_status: derived.to_string(),
                    notify_user_id: order.created_by,
                })
                .await;
        }

        self.audit
            .record(
                actor,
                "PURCHASE_ORDER_ITEM_RECEIVED",
                "PURCHASE_ORDER",
                Some(order_id),
                Some(json!({
                    "item_id": item_id,
                    "product_id": product_id,
                    "location_id": input.location_id,
                    "quantity": input.quantity,
                    "quantity_received": updated_item.quantity_received,
                })),
            )
            .await;

        info!(
            %order_id, %item_id, quantity = input.quantity,
            received = updated_item.quantity_received,
            "purchase order item received"
        );

        Ok(updated_item)
    }
}
