use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthenticatedUser,
    entities::{sales_order, sales_order_item},
    errors::ServiceError,
    services::{
        order_status::OrderStatus,
        sales_orders::{
            CreateSalesOrderInput, CreateSalesOrderItemInput, SalesOrderWithItems, ShipItemInput,
        },
    },
    ApiResponse, AppState, PaginatedResponse,
};

use super::{purchase_orders::parse_status_param, PaginationParams};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSalesOrderRequest {
    pub customer_id: Uuid,
    pub order_number: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1))]
    pub items: Vec<SalesOrderItemRequest>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SalesOrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ShipItemRequest {
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub location_id: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    #[serde(default = "super::default_page")]
    pub page: u64,
    #[serde(default = "super::default_limit")]
    pub limit: u64,
}

pub fn sales_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_sales_order).get(list_sales_orders))
        .route("/:id", get(get_sales_order))
        .route("/:id/status", put(update_status))
        .route("/:id/cancel", post(cancel_order))
        .route("/:id/items/:item_id/ship", post(ship_item))
}

async fn create_sales_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateSalesOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SalesOrderWithItems>>), ServiceError> {
    payload.validate()?;

    let input = CreateSalesOrderInput {
        customer_id: payload.customer_id,
        order_number: payload.order_number,
        notes: payload.notes,
        items: payload
            .items
            .into_iter()
            .map(|item| CreateSalesOrderItemInput {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect(),
    };

    let created = state
        .services
        .sales_orders
        .create(user.user_id, input)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn list_sales_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<sales_order::Model>>>, ServiceError> {
    let status = query
        .status
        .as_deref()
        .map(parse_status_param)
        .transpose()?;

    let pagination = PaginationParams {
        page: query.page,
        limit: query.limit,
    };
    let (items, total) = state
        .services
        .sales_orders
        .list(status, pagination.page, pagination.limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        total_pages: pagination.total_pages(total),
        items,
        total,
        page: pagination.page,
        limit: pagination.limit,
    })))
}

async fn get_sales_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SalesOrderWithItems>>, ServiceError> {
    let order = state.services.sales_orders.get(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

async fn update_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<sales_order::Model>>, ServiceError> {
    let status = parse_status_param(&payload.status)?;
    let updated = state
        .services
        .sales_orders
        .update_status(user.user_id, id, status)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn cancel_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<sales_order::Model>>, ServiceError> {
    let updated = state
        .services
        .sales_orders
        .update_status(user.user_id, id, OrderStatus::Cancelled)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn ship_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ShipItemRequest>,
) -> Result<Json<ApiResponse<sales_order_item::Model>>, ServiceError> {
    payload.validate()?;

    let item = state
        .services
        .sales_orders
        .ship_item(
            user.user_id,
            id,
            item_id,
            ShipItemInput {
                quantity: payload.quantity,
                location_id: payload.location_id,
                notes: payload.notes,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(item)))
}
