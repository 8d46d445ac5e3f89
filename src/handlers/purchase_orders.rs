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
    entities::{purchase_order, purchase_order_item},
    errors::ServiceError,
    services::{
        order_status::OrderStatus,
        purchase_orders::{
            CreateOrderItemInput, CreatePurchaseOrderInput, PurchaseOrderWithItems,
            ReceiveItemInput,
        },
    },
    ApiResponse, AppState, PaginatedResponse,
};

use super::PaginationParams;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePurchaseOrderRequest {
    pub supplier_id: Uuid,
    pub order_number: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1))]
    pub items: Vec<PurchaseOrderItemRequest>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PurchaseOrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_cost: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReceiveItemRequest {
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

pub fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_purchase_order).get(list_purchase_orders))
        .route("/:id", get(get_purchase_order))
        .route("/:id/status", put(update_status))
        .route("/:id/cancel", post(cancel_order))
        .route("/:id/items/:item_id/receive", post(receive_item))
}

pub(crate) fn parse_status_param(raw: &str) -> Result<OrderStatus, ServiceError> {
    raw.to_ascii_uppercase()
        .parse()
        .map_err(|_| ServiceError::InvalidInput(format!("unknown order status {}", raw)))
}

async fn create_purchase_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreatePurchaseOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PurchaseOrderWithItems>>), ServiceError> {
    payload.validate()?;

    let input = CreatePurchaseOrderInput {
        supplier_id: payload.supplier_id,
        order_number: payload.order_number,
        notes: payload.notes,
        items: payload
            .items
            .into_iter()
            .map(|item| CreateOrderItemInput {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_cost: item.unit_cost,
            })
            .collect(),
    };

    let created = state
        .services
        .purchase_orders
        .create(user.user_id, input)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<purchase_order::Model>>>, ServiceError> {
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
        .purchase_orders
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

async fn get_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PurchaseOrderWithItems>>, ServiceError> {
    let order = state.services.purchase_orders.get(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

async fn update_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<purchase_order::Model>>, ServiceError> {
    let status = parse_status_param(&payload.status)?;
    let updated = state
        .services
        .purchase_orders
        .update_status(user.user_id, id, status)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn cancel_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<purchase_order::Model>>, ServiceError> {
    let updated = state
        .services
        .purchase_orders
        .update_status(user.user_id, id, OrderStatus::Cancelled)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn receive_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ReceiveItemRequest>,
) -> Result<Json<ApiResponse<purchase_order_item::Model>>, ServiceError> {
    payload.validate()?;

    let item = state
        .services
        .purchase_orders
        .receive_item(
            user.user_id,
            id,
            item_id,
            ReceiveItemInput {
                quantity: payload.quantity,
                location_id: payload.location_id,
                notes: payload.notes,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(item)))
}
