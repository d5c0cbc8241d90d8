use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::services::allocation::{
    AssignmentResponse, CreateAssignmentRequest, UpdateAssignmentRequest,
};
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListAssignmentsQuery {
    /// Scope the listing to one schedule (board view)
    pub schedule_id: Option<Uuid>,
    /// Scope the listing to one slot within the schedule
    pub slot_index: Option<i32>,
}

/// Place an order-distribution/area pair into a schedule slot
#[utoipa::path(
    post,
    path = "/api/v1/assignments",
    summary = "Create assignment",
    description = "Places an order-distribution/area pair into a schedule slot. The item's planned count starts at the full area capacity ceiling for the distribution's method.",
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Assignment created", body = ApiResponse<AssignmentResponse>),
        (status = 400, description = "Invalid slot index", body = crate::errors::ErrorResponse),
        (status = 404, description = "Referenced record not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Assignments"
)]
pub async fn create_assignment(
    State(state): State<AppState>,
    Json(request): Json<CreateAssignmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AssignmentResponse>>), ServiceError> {
    let assignment = state.services.allocation.create_assignment(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(assignment))))
}

/// List assignments, optionally filtered by schedule and slot
#[utoipa::path(
    get,
    path = "/api/v1/assignments",
    summary = "List assignments",
    params(ListAssignmentsQuery),
    responses(
        (status = 200, description = "Assignments retrieved", body = ApiResponse<Vec<AssignmentResponse>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Assignments"
)]
pub async fn list_assignments(
    State(state): State<AppState>,
    Query(query): Query<ListAssignmentsQuery>,
) -> Result<Json<ApiResponse<Vec<AssignmentResponse>>>, ServiceError> {
    let assignments = state
        .services
        .allocation
        .list_assignments(query.schedule_id, query.slot_index)
        .await?;
    Ok(Json(ApiResponse::success(assignments)))
}

/// Get one assignment by id
#[utoipa::path(
    get,
    path = "/api/v1/assignments/{id}",
    summary = "Get assignment",
    params(("id" = Uuid, Path, description = "Distribution item id")),
    responses(
        (status = 200, description = "Assignment retrieved", body = ApiResponse<AssignmentResponse>),
        (status = 404, description = "Assignment not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Assignments"
)]
pub async fn get_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AssignmentResponse>>, ServiceError> {
    let assignment = state
        .services
        .allocation
        .get_assignment(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Distribution item {} not found", id)))?;
    Ok(Json(ApiResponse::success(assignment)))
}

/// Relocate and/or resize an assignment
#[utoipa::path(
    put,
    path = "/api/v1/assignments/{id}",
    summary = "Update assignment",
    description = "Partial update: moves the item to another schedule/slot and/or changes its planned count. Counts above the area ceiling are allowed unless capacity enforcement is configured.",
    params(("id" = Uuid, Path, description = "Distribution item id")),
    request_body = UpdateAssignmentRequest,
    responses(
        (status = 200, description = "Assignment updated", body = ApiResponse<AssignmentResponse>),
        (status = 400, description = "Invalid slot index or count", body = crate::errors::ErrorResponse),
        (status = 404, description = "Assignment not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Assignments"
)]
pub async fn update_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAssignmentRequest>,
) -> Result<Json<ApiResponse<AssignmentResponse>>, ServiceError> {
    let assignment = state
        .services
        .allocation
        .update_assignment(id, request)
        .await?;
    Ok(Json(ApiResponse::success(assignment)))
}

/// Remove an assignment
#[utoipa::path(
    delete,
    path = "/api/v1/assignments/{id}",
    summary = "Delete assignment",
    params(("id" = Uuid, Path, description = "Distribution item id")),
    responses(
        (status = 200, description = "Assignment deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Assignment not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Assignments"
)]
pub async fn delete_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    state.services.allocation.delete_assignment(id).await?;
    Ok(Json(ApiResponse::success(json!({ "deleted": true, "id": id }))))
}
