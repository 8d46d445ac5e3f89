use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::notifications::NotificationService;

/// Which side of the order book an order belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Purchase,
    Sales,
}

impl OrderKind {
    pub fn entity_type(&self) -> &'static str {
        match self {
            OrderKind::Purchase => "PURCHASE_ORDER",
            OrderKind::Sales => "SALES_ORDER",
        }
    }
}

/// Events emitted by the services strictly after their transaction commits.
/// Consumers run outside the mutation path; a lost event never implies a
/// lost stock movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockAdjusted {
        product_id: Uuid,
        location_id: Uuid,
        quantity_change: i32,
        new_quantity: i32,
        user_id: Uuid,
    },
    StockTransferred {
        product_id: Uuid,
        source_location_id: Uuid,
        destination_location_id: Uuid,
        quantity: i32,
        transfer_ref: Uuid,
        user_id: Uuid,
    },
    /// Fired when a stock movement takes a product at a location from above
    /// its reorder level to at-or-below it.
    LowStockDetected {
        product_id: Uuid,
        sku: String,
        product_name: String,
        location_id: Uuid,
        quantity: i32,
        reorder_level: i32,
        triggered_by: Uuid,
    },
    OrderStatusChanged {
        order_id: Uuid,
        order_kind: OrderKind,
        order_number: String,
        new_status: String,
        notify_user_id: Uuid,
    },
    OrderItemFulfilled {
        order_id: Uuid,
        order_kind: OrderKind,
        item_id: Uuid,
        product_id: Uuid,
        location_id: Uuid,
        quantity: i32,
        user_id: Uuid,
    },
}

/// Cloneable handle for emitting events into the processing loop.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Emits an event, logging on failure instead of surfacing it. This is
    /// the only correct way to emit from a code path that has already
    /// committed: delivery failure must never fail the caller.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "event channel rejected event; dropping");
        }
    }
}

/// Consumes events and persists user-facing notifications. Runs as a
/// background task spawned at startup; errors are logged and the loop
/// continues.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, notifications: Arc<NotificationService>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        debug!(?event, "Processing event");

        let result = match &event {
            Event::LowStockDetected {
                product_id,
                sku,
                product_name,
                location_id,
                quantity,
                reorder_level,
                triggered_by,
            } => {
                notifications
                    .notify(
                        *triggered_by,
                        format!(
                            "Low stock: {} ({}) is at {} (reorder level {}) at location {}",
                            product_name, sku, quantity, reorder_level, location_id
                        ),
                        "LOW_STOCK",
                        Some(*product_id),
                        Some("PRODUCT"),
                    )
                    .await
                    .map(|_| ())
            }
            Event::OrderStatusChanged {
                order_id,
                order_kind,
                order_number,
                new_status,
                notify_user_id,
            } => {
                notifications
                    .notify(
                        *notify_user_id,
                        format!("Order {} is now {}", order_number, new_status),
                        "ORDER_STATUS",
                        Some(*order_id),
                        Some(order_kind.entity_type()),
                    )
                    .await
                    .map(|_| ())
            }
            // Remaining events are informational; structured logs are enough.
            _ => Ok(()),
        };

        if let Err(e) = result {
            warn!(error = %e, ?event, "event handler failed; continuing");
        }
    }

    info!("Event processing loop stopped");
}
