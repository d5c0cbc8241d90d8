use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::services::schedules::{
    CreateScheduleRequest, ScheduleResponse, UpdateScheduleRequest,
};
use crate::{errors::ServiceError, ApiResponse, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListSchedulesQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Filter by delivery date (YYYY-MM-DD)
    pub delivery_date: Option<NaiveDate>,
    /// Filter by branch
    pub branch_id: Option<Uuid>,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

/// Create a delivery schedule
#[utoipa::path(
    post,
    path = "/api/v1/schedules",
    summary = "Create schedule",
    request_body = CreateScheduleRequest,
    responses(
        (status = 201, description = "Schedule created", body = ApiResponse<ScheduleResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    tag = "Schedules"
)]
pub async fn create_schedule(
    State(state): State<AppState>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ScheduleResponse>>), ServiceError> {
    let schedule = state.services.schedules.create_schedule(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(schedule))))
}

/// List schedules with pagination and filters
#[utoipa::path(
    get,
    path = "/api/v1/schedules",
    summary = "List schedules",
    params(ListSchedulesQuery),
    responses(
        (status = 200, description = "Schedules retrieved", body = ApiResponse<PaginatedResponse<ScheduleResponse>>),
        (status = 400, description = "Invalid pagination", body = crate::errors::ErrorResponse),
    ),
    tag = "Schedules"
)]
pub async fn list_schedules(
    State(state): State<AppState>,
    Query(query): Query<ListSchedulesQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<ScheduleResponse>>>, ServiceError> {
    let result = state
        .services
        .schedules
        .list_schedules(query.page, query.limit, query.delivery_date, query.branch_id)
        .await?;
    let total_pages = (result.total + query.limit - 1) / query.limit;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: result.schedules,
        total: result.total,
        page: result.page,
        limit: result.per_page,
        total_pages,
    })))
}

/// Get one schedule by id
#[utoipa::path(
    get,
    path = "/api/v1/schedules/{id}",
    summary = "Get schedule",
    params(("id" = Uuid, Path, description = "Schedule id")),
    responses(
        (status = 200, description = "Schedule retrieved", body = ApiResponse<ScheduleResponse>),
        (status = 404, description = "Schedule not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Schedules"
)]
pub async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ScheduleResponse>>, ServiceError> {
    let schedule = state
        .services
        .schedules
        .get_schedule(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Schedule {} not found", id)))?;
    Ok(Json(ApiResponse::success(schedule)))
}

/// Apply a partial update to a schedule
#[utoipa::path(
    put,
    path = "/api/v1/schedules/{id}",
    summary = "Update schedule",
    params(("id" = Uuid, Path, description = "Schedule id")),
    request_body = UpdateScheduleRequest,
    responses(
        (status = 200, description = "Schedule updated", body = ApiResponse<ScheduleResponse>),
        (status = 404, description = "Schedule not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Schedules"
)]
pub async fn update_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<ApiResponse<ScheduleResponse>>, ServiceError> {
    let schedule = state
        .services
        .schedules
        .update_schedule(id, request)
        .await?;
    Ok(Json(ApiResponse::success(schedule)))
}

/// Delete a schedule and the items assigned to it
#[utoipa::path(
    delete,
    path = "/api/v1/schedules/{id}",
    summary = "Delete schedule",
    description = "Deletes the schedule and, in the same transaction, every distribution item assigned to it.",
    params(("id" = Uuid, Path, description = "Schedule id")),
    responses(
        (status = 200, description = "Schedule deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Schedule not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Schedules"
)]
pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    let removed_items = state.services.schedules.delete_schedule(id).await?;
    Ok(Json(ApiResponse::success(json!({
        "deleted": true,
        "id": id,
        "removed_items": removed_items,
    }))))
}
