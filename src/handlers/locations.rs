use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthenticatedUser,
    entities::location,
    errors::ServiceError,
    services::locations::CreateLocationInput,
    ApiResponse, AppState, PaginatedResponse,
};

use super::PaginationParams;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLocationRequest {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    pub description: Option<String>,
}

pub fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_location).get(list_locations))
        .route("/:id", get(get_location).delete(delete_location))
}

async fn create_location(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateLocationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<location::Model>>), ServiceError> {
    payload.validate()?;

    let created = state
        .services
        .locations
        .create(
            user.user_id,
            CreateLocationInput {
                name: payload.name,
                description: payload.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn list_locations(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<location::Model>>>, ServiceError> {
    let (items, total) = state
        .services
        .locations
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

async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<location::Model>>, ServiceError> {
    let found = state.services.locations.get(id).await?;
    Ok(Json(ApiResponse::success(found)))
}

async fn delete_location(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.locations.delete(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
