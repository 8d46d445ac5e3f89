//! Test harness: an in-memory SQLite database with the embedded migrations
//! applied, the full service graph, and direct access to the event channel
//! so emitted events can be asserted deterministically.
#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

use stockflow_api::{
    db::{self, DbConfig},
    entities::{
        customer, location, product, stock_level,
        stock_transaction::{self, Entity as StockTransactionEntity},
        supplier,
    },
    events::{Event, EventSender},
    services::AppServices,
};

pub struct TestApp {
    pub db: Arc<sea_orm::DatabaseConnection>,
    pub services: AppServices,
    pub events: mpsc::Receiver<Event>,
    pub actor: Uuid,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            acquire_timeout: Duration::from_secs(5),
            statement_timeout: None,
        };

        let pool = db::establish_connection_with_config(&config)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");

        let db = Arc::new(pool);
        let (tx, rx) = mpsc::channel(64);
        let services = AppServices::build(db.clone(), EventSender::new(tx));

        Self {
            db,
            services,
            events: rx,
            actor: Uuid::new_v4(),
        }
    }

    /// All events emitted so far, drained from the channel.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

pub async fn create_product(
    db: &sea_orm::DatabaseConnection,
    sku: &str,
    reorder_level: i32,
) -> product::Model {
    let now = Utc::now();
    product::ActiveModel {
        id: Set(Uuid::new_v4()),
        sku: Set(sku.to_string()),
        name: Set(format!("Product {}", sku)),
        description: Set(None),
        reorder_level: Set(reorder_level),
        cost_price: Set(Decimal::new(500, 2)),
        selling_price: Set(Decimal::new(900, 2)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("failed to create product")
}

pub async fn create_location(db: &sea_orm::DatabaseConnection, name: &str) -> location::Model {
    let now = Utc::now();
    location::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("failed to create location")
}

pub async fn create_supplier(db: &sea_orm::DatabaseConnection, name: &str) -> supplier::Model {
    let now = Utc::now();
    supplier::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        contact_email: Set(None),
        phone: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("failed to create supplier")
}

pub async fn create_customer(db: &sea_orm::DatabaseConnection, name: &str) -> customer::Model {
    let now = Utc::now();
    customer::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(None),
        phone: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("failed to create customer")
}

pub async fn stock_quantity(
    db: &sea_orm::DatabaseConnection,
    product_id: Uuid,
    location_id: Uuid,
) -> Option<i32> {
    stock_level::Entity::find()
        .filter(stock_level::Column::ProductId.eq(product_id))
        .filter(stock_level::Column::LocationId.eq(location_id))
        .one(db)
        .await
        .expect("failed to query stock level")
        .map(|row| row.quantity)
}

pub async fn transactions_for_product(
    db: &sea_orm::DatabaseConnection,
    product_id: Uuid,
) -> Vec<stock_transaction::Model> {
    StockTransactionEntity::find()
        .filter(stock_transaction::Column::ProductId.eq(product_id))
        .order_by_asc(stock_transaction::Column::CreatedAt)
        .all(db)
        .await
        .expect("failed to query stock transactions")
}

/// Replays the ledger for one (product, location): the signed sum of every
/// row touching the location must equal the materialized balance.
pub fn replay_balance(rows: &[stock_transaction::Model], location_id: Uuid) -> i32 {
    rows.iter()
        .filter(|row| {
            row.source_location_id == Some(location_id)
                || row.destination_location_id == Some(location_id)
        })
        .map(|row| row.quantity_change)
        .sum()
}
