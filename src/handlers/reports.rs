use std::collections::BTreeMap;

use axum::{extract::State, response::Json};

use crate::services::allocation::{AllocationStats, UnassignedWork};
use crate::{errors::ServiceError, ApiResponse, AppState};

/// Aggregate allocation statistics per order distribution
#[utoipa::path(
    get,
    path = "/api/v1/reports/allocation-stats",
    summary = "Allocation statistics",
    description = "For every order distribution, the total assigned across all schedule placements, the remaining quota, and the over-allocation flag. Keyed by `orderId_flyerId`. Recomputed on every call.",
    responses(
        (status = 200, description = "Statistics computed", body = ApiResponse<BTreeMap<String, AllocationStats>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Reports"
)]
pub async fn allocation_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BTreeMap<String, AllocationStats>>>, ServiceError> {
    let stats = state.services.allocation.get_stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// Unassigned demand: active distribution/area pairs with no placement
#[utoipa::path(
    get,
    path = "/api/v1/reports/unassigned",
    summary = "Unassigned work",
    description = "Lists every (distribution, area) pair from confirmed or in-progress orders that has no placement at all. Pairs with any placement are excluded even when under-allocated; see the allocation statistics for quota coverage.",
    responses(
        (status = 200, description = "Unassigned pairs listed", body = ApiResponse<Vec<UnassignedWork>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Reports"
)]
pub async fn unassigned_work(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UnassignedWork>>>, ServiceError> {
    let unassigned = state.services.allocation.get_unassigned().await?;
    Ok(Json(ApiResponse::success(unassigned)))
}
