use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthenticatedUser,
    entities::{stock_level, stock_transaction},
    errors::ServiceError,
    services::stock_transactions::{
        AdjustmentDirection, AdjustmentOutcome, TransactionFilter, TransferOutcome,
    },
    ApiResponse, AppState, PaginatedResponse,
};

use super::PaginationParams;

#[derive(Debug, Deserialize, Validate)]
pub struct AdjustStockRequest {
    pub product_id: Uuid,
    pub location_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    /// "IN" adds stock, "OUT" removes it.
    pub direction: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TransferStockRequest {
    pub product_id: Uuid,
    pub source_location_id: Uuid,
    pub destination_location_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StockLevelQuery {
    pub location_id: Option<Uuid>,
    #[serde(default = "super::default_page")]
    pub page: u64,
    #[serde(default = "super::default_limit")]
    pub limit: u64,
}

#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    pub product_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub transaction_type: Option<String>,
    #[serde(default = "super::default_page")]
    pub page: u64,
    #[serde(default = "super::default_limit")]
    pub limit: u64,
}

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/stock-levels", get(list_stock_levels))
        .route("/stock-levels/low-stock", get(low_stock_report))
        .route(
            "/stock-levels/:product_id/:location_id",
            get(get_stock_level),
        )
        .route("/stock-adjustments", post(adjust_stock))
        .route("/stock-transfers", post(transfer_stock))
        .route("/stock-transactions", get(list_transactions))
}

async fn list_stock_levels(
    State(state): State<AppState>,
    Query(query): Query<StockLevelQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<stock_level::Model>>>, ServiceError> {
    let pagination = PaginationParams {
        page: query.page,
        limit: query.limit,
    };
    let (items, total) = state
        .services
        .stock_levels
        .list_levels(query.location_id, pagination.page, pagination.limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        total_pages: pagination.total_pages(total),
        items,
        total,
        page: pagination.page,
        limit: pagination.limit,
    })))
}

async fn get_stock_level(
    State(state): State<AppState>,
    Path((product_id, location_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<stock_level::Model>>, ServiceError> {
    let level = state
        .services
        .stock_levels
        .get_level(product_id, location_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "No stock recorded for product {} at location {}",
                product_id, location_id
            ))
        })?;

    Ok(Json(ApiResponse::success(level)))
}

async fn low_stock_report(
    State(state): State<AppState>,
) -> Result<
    Json<ApiResponse<Vec<crate::services::stock_levels::StockLevelWithProduct>>>,
    ServiceError,
> {
    let report = state.services.stock_levels.low_stock_report().await?;
    Ok(Json(ApiResponse::success(report)))
}

async fn adjust_stock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<Json<ApiResponse<AdjustmentOutcome>>, ServiceError> {
    payload.validate()?;

    let direction = match payload.direction.to_ascii_uppercase().as_str() {
        "IN" => AdjustmentDirection::In,
        "OUT" => AdjustmentDirection::Out,
        other => {
            return Err(ServiceError::InvalidInput(format!(
                "direction must be IN or OUT, got {}",
                other
            )))
        }
    };

    let outcome = state
        .services
        .stock_transactions
        .record_adjustment(
            user.user_id,
            payload.product_id,
            payload.location_id,
            payload.quantity,
            direction,
            payload.notes,
        )
        .await?;

    Ok(Json(ApiResponse::success(outcome)))
}

async fn transfer_stock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<TransferStockRequest>,
) -> Result<Json<ApiResponse<TransferOutcome>>, ServiceError> {
    payload.validate()?;

    let outcome = state
        .services
        .stock_transactions
        .record_transfer(
            user.user_id,
            payload.product_id,
            payload.source_location_id,
            payload.destination_location_id,
            payload.quantity,
            payload.notes,
        )
        .await?;

    Ok(Json(ApiResponse::success(outcome)))
}

async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<stock_transaction::Model>>>, ServiceError> {
    let transaction_type = query
        .transaction_type
        .as_deref()
        .map(|raw| {
            raw.to_ascii_uppercase()
                .parse::<stock_transaction::TransactionType>()
                .map_err(|_| {
                    ServiceError::InvalidInput(format!("unknown transaction type {}", raw))
                })
        })
        .transpose()?;

    let filter = TransactionFilter {
        product_id: query.product_id,
        location_id: query.location_id,
        transaction_type,
    };

    let pagination = PaginationParams {
        page: query.page,
        limit: query.limit,
    };
    let (items, total) = state
        .services
        .stock_transactions
        .list_transactions(filter, pagination.page, pagination.limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        total_pages: pagination.total_pages(total),
        items,
        total,
        page: pagination.page,
        limit: pagination.limit,
    })))
}
