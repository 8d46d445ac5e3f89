use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthenticatedUser,
    entities::product,
    errors::ServiceError,
    services::products::{CreateProductInput, UpdateProductInput},
    ApiResponse, AppState, PaginatedResponse,
};

use super::PaginationParams;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub reorder_level: i32,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub reorder_level: Option<i32>,
    pub cost_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

async fn create_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<product::Model>>), ServiceError> {
    payload.validate()?;

    let created = state
        .services
        .products
        .create(
            user.user_id,
            CreateProductInput {
                sku: payload.sku,
                name: payload.name,
                description: payload.description,
                reorder_level: payload.reorder_level,
                cost_price: payload.cost_price,
                selling_price: payload.selling_price,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<product::Model>>>, ServiceError> {
    let (items, total) = state
        .services
        .products
        .list(pagination.page, pagination.limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        total_pages: pagination.total_pages(total),
        items,
        total,
        page: pagination.page,
        limit: pagination.limit,
    })))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<product::Model>>, ServiceError> {
    let found = state.services.products.get(id).await?;
    Ok(Json(ApiResponse::success(found)))
}

async fn update_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<product::Model>>, ServiceError> {
    let updated = state
        .services
        .products
        .update(
            user.user_id,
            id,
            UpdateProductInput {
                name: payload.name,
                description: payload.description.map(Some),
                reorder_level: payload.reorder_level,
                cost_price: payload.cost_price,
                selling_price: payload.selling_price,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(updated)))
}

async fn delete_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.products.delete(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
