use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Why a stock quantity changed. Stored as a string column; the sum of
/// `quantity_change` per (product, location) must always reconstruct the
/// current `stock_levels.quantity` for that pair.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Purchase,
    Sale,
    AdjustmentIn,
    AdjustmentOut,
    TransferOut,
    TransferIn,
}

impl TransactionType {
    /// Whether this movement adds stock at its affected location.
    pub fn is_inbound(&self) -> bool {
        matches!(
            self,
            TransactionType::Purchase | TransactionType::AdjustmentIn | TransactionType::TransferIn
        )
    }
}

/// Append-only ledger row. Never updated or deleted once written.
///
/// Exactly the applicable location side(s) are populated per type:
/// adjustments one side, transfers both (paired by `transfer_ref`),
/// purchase/sale destination/source respectively.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub transaction_type: String,
    pub product_id: Uuid,
    pub quantity_change: i32,
    pub source_location_id: Option<Uuid>,
    pub destination_location_id: Option<Uuid>,
    pub user_id: Uuid,
    pub purchase_order_id: Option<Uuid>,
    pub sales_order_id: Option<Uuid>,
    pub transfer_ref: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
