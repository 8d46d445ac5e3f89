pub mod audit;
pub mod locations;
pub mod notifications;
pub mod order_status;
pub mod products;
pub mod purchase_orders;
pub mod sales_orders;
pub mod stock_levels;
pub mod stock_transactions;

use rand::distributions::Alphanumeric;
use rand::Rng;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::events::EventSender;

/// The wired service graph shared through `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<products::ProductService>,
    pub locations: Arc<locations::LocationService>,
    pub stock_levels: Arc<stock_levels::StockLevelService>,
    pub stock_transactions: Arc<stock_transactions::StockTransactionService>,
    pub purchase_orders: Arc<purchase_orders::PurchaseOrderService>,
    pub sales_orders: Arc<sales_orders::SalesOrderService>,
    pub notifications: Arc<notifications::NotificationService>,
    pub audit: Arc<audit::AuditService>,
}

impl AppServices {
    /// Builds the full graph over one connection pool and event channel.
    pub fn build(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        let audit = Arc::new(audit::AuditService::new(db.clone()));
        let notifications = Arc::new(notifications::NotificationService::new(db.clone()));
        let stock_levels = Arc::new(stock_levels::StockLevelService::new(db.clone()));
        let stock_transactions = Arc::new(stock_transactions::StockTransactionService::new(
            db.clone(),
            stock_levels.clone(),
            event_sender.clone(),
            audit.clone(),
        ));
        let purchase_orders = Arc::new(purchase_orders::PurchaseOrderService::new(
            db.clone(),
            stock_transactions.clone(),
            event_sender.clone(),
            audit.clone(),
        ));
        let sales_orders = Arc::new(sales_orders::SalesOrderService::new(
            db.clone(),
            stock_transactions.clone(),
            event_sender.clone(),
            audit.clone(),
        ));
        let products = Arc::new(products::ProductService::new(db.clone(), audit.clone()));
        let locations = Arc::new(locations::LocationService::new(db, audit.clone()));

        Self {
            products,
            locations,
            stock_levels,
            stock_transactions,
            purchase_orders,
            sales_orders,
            notifications,
            audit,
        }
    }
}

/// Generates an order number like `PO-7K2F9QXA`. Collisions are improbable
/// at this length and the unique index is the final guard.
pub(crate) fn generate_order_number(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("{}-{}", prefix, suffix)
}
