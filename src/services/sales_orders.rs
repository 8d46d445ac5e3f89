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
        customer::Entity as CustomerEntity,
        product::Entity as ProductEntity,
        sales_order::{self, Entity as SalesOrderEntity},
        sales_order_item::{self, Entity as SalesOrderItemEntity},
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

#[derive(Debug, Clone)]
pub struct CreateSalesOrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreateSalesOrderInput {
    pub customer_id: Uuid,
    pub order_number: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<CreateSalesOrderItemInput>,
}

#[derive(Debug, Clone)]
pub struct ShipItemInput {
    pub quantity: i32,
    pub location_id: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SalesOrderWithItems {
    pub order: sales_order::Model,
    pub items: Vec<sales_order_item::Model>,
}

/// Sales order lifecycle, the outbound mirror of the purchase path. The ship
/// path runs through the same ledger composition with the non-negative
/// invariant enforced, so an insufficient balance aborts the whole unit.
#[derive(Clone)]
pub struct SalesOrderService {
    db: Arc<DatabaseConnection>,
    ledger: Arc<StockTransactionService>,
    event_sender: EventSender,
    audit: Arc<AuditService>,
}

impl SalesOrderService {
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

    /// Creates a sales order with its items in one transaction.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub async fn create(
        &self,
        actor: Uuid,
        input: CreateSalesOrderInput,
    ) -> Result<SalesOrderWithItems, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::InvalidInput(
                "sales order must have at least one item".to_string(),
            ));
        }
        for item in &input.items {
            if item.quantity <= 0 {
                return Err(ServiceError::InvalidInput(
                    "item quantity must be positive".to_string(),
                ));
            }
            if item.unit_price < Decimal::ZERO {
                return Err(ServiceError::InvalidInput(
                    "item unit price must not be negative".to_string(),
                ));
            }
        }

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        CustomerEntity::find_by_id(input.customer_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", input.customer_id))
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
                let exists = SalesOrderEntity::find()
                    .filter(sales_order::Column::OrderNumber.eq(number.clone()))
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
            None => generate_order_number("SO"),
        };

        let now = Utc::now();
        let order = sales_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(order_number),
            customer_id: Set(input.customer_id),
            status: Set(OrderStatus::Pending.to_string()),
            notes: Set(input.notes),
            created_by: Set(actor),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let order = order.insert(&txn).await.map_err(ServiceError::db_error)?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in input.items {
            let row = sales_order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                sales_order_id: Set(order.id),
                product_id: Set(item.product_id),
                quantity_ordered: Set(item.quantity),
                quantity_shipped: Set(0),
                unit_price: Set(item.unit_price),
                created_at: Set(now),
                updated_at: Set(now),
            };
            items.push(row.insert(&txn).await.map_err(ServiceError::db_error)?);
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        self.audit
            .record(
                actor,
                "SALES_ORDER_CREATED",
                "SALES_ORDER",
                Some(order.id),
                Some(json!({
                    "order_number": order.order_number,
                    "customer_id": order.customer_id,
                    "item_count": items.len(),
                })),
            )
            .await;

        info!(order_id = %order.id, order_number = %order.order_number, "sales order created");

        Ok(SalesOrderWithItems { order, items })
    }

    /// Order header plus its items.
    #[instrument(skip(self))]
    pub async fn get(&self, order_id: Uuid) -> Result<SalesOrderWithItems, ServiceError> {
        let order = SalesOrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Sales order {} not found", order_id)))?;

        let items = SalesOrderItemEntity::find()
            .filter(sales_order_item::Column::SalesOrderId.eq(order_id))
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(SalesOrderWithItems { order, items })
    }

    /// Paginated headers, optionally filtered by status, newest first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<sales_order::Model>, u64), ServiceError> {
        let mut query = SalesOrderEntity::find();
        if let Some(status) = status {
            query = query.filter(sales_order::Column::Status.eq(status.as_ref()));
        }

        let paginator = query
            .order_by_desc(sales_order::Column::CreatedAt)
            .paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((orders, total))
    }

    /// Explicit header-level status change, checked against the transition
    /// table.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        actor: Uuid,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<sales_order::Model, ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let order = SalesOrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Sales order {} not found", order_id)))?;

        let current = parse_status(&order.status)?;
        if !current.can_transition_to(new_status, OrderKind::Sales) {
            return Err(ServiceError::InvalidTransition {
                from: current.to_string(),
                to: new_status.to_string(),
            });
        }

        let order_number = order.order_number.clone();
        let created_by = order.created_by;

        let mut active: sales_order::ActiveModel = order.into();
        active.status = Set(new_status.to_string());
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                order_kind: OrderKind::Sales,
                order_number: order_number.clone(),
                new_status: new_status.to_string(),
                notify_user_id: created_by,
            })
            .await;

        self.audit
            .record(
                actor,
                "SALES_ORDER_STATUS_CHANGED",
                "SALES_ORDER",
                Some(order_id),
                Some(json!({
                    "order_number": order_number,
                    "from": current.to_string(),
                    "to": new_status.to_string(),
                })),
            )
            .await;

        info!(%order_id, from = %current, to = %new_status, "sales order status changed");

        Ok(updated)
    }

    /// Ships a quantity against one order line. The enforced ledger
    /// decrement, the item counter, and the derived header status commit or
    /// roll back as one unit; insufficient stock aborts everything.
    #[instrument(skip(self, input), fields(quantity = input.quantity))]
    pub async fn ship_item(
        &self,
        actor: Uuid,
        order_id: Uuid,
        item_id: Uuid,
        input: ShipItemInput,
    ) -> Result<sales_order_item::Model, ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let order = SalesOrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Sales order {} not found", order_id)))?;

        let item = SalesOrderItemEntity::find_by_id(item_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .filter(|item| item.sales_order_id == order_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Item {} not found on sales order {}",
                    item_id, order_id
                ))
            })?;

        let current = parse_status(&order.status)?;
        if !current.accepts_fulfillment() {
            return Err(ServiceError::Conflict(format!(
                "sales order {} in status {} cannot accept shipments",
                order.order_number, current
            )));
        }

        check_fulfillment_quantity(item.quantity_ordered, item.quantity_shipped, input.quantity)?;

        let (_, _, alert) = self
            .ledger
            .apply_fulfillment(
                &txn,
                actor,
                item.product_id,
                input.location_id,
                input.quantity,
                FulfillmentDirection::Shipment,
                order_id,
                input.notes,
            )
            .await?;

        let product_id = item.product_id;
        let new_shipped = item.quantity_shipped + input.quantity;
        let mut active: sales_order_item::ActiveModel = item.into();
        active.quantity_shipped = Set(new_shipped);
        active.updated_at = Set(Utc::now());
        let updated_item = active.update(&txn).await.map_err(ServiceError::db_error)?;

        let items = SalesOrderItemEntity::find()
            .filter(sales_order_item::Column::SalesOrderId.eq(order_id))
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        let total_ordered: i64 = items.iter().map(|i| i.quantity_ordered as i64).sum();
        let total_shipped: i64 = items.iter().map(|i| i.quantity_shipped as i64).sum();

        let derived = derive_status(OrderKind::Sales, total_ordered, total_shipped);
        let status_changed = derived != current && !current.is_terminal();
        if status_changed {
            let mut active: sales_order::ActiveModel = order.clone().into();
            active.status = Set(derived.to_string());
            active.updated_at = Set(Utc::now());
            active.update(&txn).await.map_err(ServiceError::db_error)?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        self.ledger.emit_alert(alert, actor).await;
        self.event_sender
            .send_or_log(Event::OrderItemFulfilled {
                order_id,
                order_kind: OrderKind::Sales,
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
                    order_kind: OrderKind::Sales,
                    order_number: order.order_number.clone(),
                    new_status: derived.to_string(),
                    notify_user_id: order.created_by,
                })
                .await;
        }

        self.audit
            .record(
                actor,
                "SALES_ORDER_ITEM_SHIPPED",
                "SALES_ORDER",
                Some(order_id),
                Some(json!({
                    "item_id": item_id,
                    "product_id": product_id,
                    "location_id": input.location_id,
                    "quantity": input.quantity,
                    "quantity_shipped": updated_item.quantity_shipped,
                })),
            )
            .await;

        info!(
            %order_id, %item_id, quantity = input.quantity,
            shipped = updated_item.quantity_shipped,
            "sales order item shipped"
        );

        Ok(updated_item)
    }
}
