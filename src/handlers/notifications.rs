use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    entities::notification,
    errors::ServiceError,
    ApiResponse, AppState, PaginatedResponse,
};

use super::PaginationParams;

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default = "super::default_page")]
    pub page: u64,
    #[serde(default = "super::default_limit")]
    pub limit: u64,
}

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/:id/read", post(mark_read))
}

async fn list_notifications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<notification::Model>>>, ServiceError> {
    let pagination = PaginationParams {
        page: query.page,
        limit: query.limit,
    };
    let (items, total) = state
        .services
        .notifications
        .list_for_user(user.user_id, query.unread_only, pagination.page, pagination.limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        total_pages: pagination.total_pages(total),
        items,
        total,
        page: pagination.page,
        limit: pagination.limit,
    })))
}

async fn mark_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<notification::Model>>, ServiceError> {
    let updated = state.services.notifications.mark_read(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(updated)))
}
