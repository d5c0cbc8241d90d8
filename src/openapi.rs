use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::services::allocation::{
    AllocationStats, AssignmentResponse, CreateAssignmentRequest, UnassignedWork,
    UpdateAssignmentRequest,
};
use crate::services::schedules::{
    CreateScheduleRequest, ScheduleResponse, UpdateScheduleRequest,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FlyerOps API",
        version = "0.3.0",
        description = r#"
Backend API for flyer-distribution operations.

The core subsystem is distribution scheduling and allocation: order
distributions declare how many flyers go to which areas, schedules provide
dated slot containers, and assignments place distribution/area pairs into
slots. Capacity consumption is always derived from current assignments; the
allocation-stats and unassigned reports are the operators' correction
mechanism for over- and under-allocation.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    paths(
        handlers::assignments::create_assignment,
        handlers::assignments::list_assignments,
        handlers::assignments::get_assignment,
        handlers::assignments::update_assignment,
        handlers::assignments::delete_assignment,
        handlers::schedules::create_schedule,
        handlers::schedules::list_schedules,
        handlers::schedules::get_schedule,
        handlers::schedules::update_schedule,
        handlers::schedules::delete_schedule,
        handlers::reports::allocation_stats,
        handlers::reports::unassigned_work,
    ),
    components(schemas(
        CreateAssignmentRequest,
        UpdateAssignmentRequest,
        AssignmentResponse,
        AllocationStats,
        UnassignedWork,
        CreateScheduleRequest,
        UpdateScheduleRequest,
        ScheduleResponse,
        crate::errors::ErrorResponse,
    )),
    tags(
        (name = "Assignments", description = "Slot placement and relocation"),
        (name = "Schedules", description = "Delivery schedule lifecycle"),
        (name = "Reports", description = "Derived allocation views"),
    )
)]
pub struct ApiDoc;

/// Swagger UI router, mounted at `/docs`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
