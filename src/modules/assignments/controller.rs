use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use brigada_core::AppError;
use brigada_models::AssignmentId;
use tracing::instrument;

use super::model::{
    AssignmentFilterParams, CreateAssignmentDto, FirefighterAssignment,
    PaginatedAssignmentsResponse,
};
use super::service::AssignmentService;
use crate::middleware::auth::{RequireAssignmentsManage, RequireAssignmentsRead};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Transfer a firefighter to a brigade from a start date
#[utoipa::path(
    post,
    path = "/api/assignments",
    request_body = CreateAssignmentDto,
    responses(
        (status = 201, description = "Assignment created", body = FirefighterAssignment),
        (status = 400, description = "Already in that brigade on the start date", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "User or brigade not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Assignments"
)]
#[instrument(skip(state, auth_user))]
pub async fn create_assignment(
    State(state): State<AppState>,
    RequireAssignmentsManage(auth_user): RequireAssignmentsManage,
    ValidatedJson(dto): ValidatedJson<CreateAssignmentDto>,
) -> Result<(StatusCode, Json<FirefighterAssignment>), AppError> {
    let created_by = auth_user.user_id()?;
    let assignment = AssignmentService::create_assignment(&state.db, dto, created_by).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Assignment history
#[utoipa::path(
    get,
    path = "/api/assignments",
    params(AssignmentFilterParams),
    responses(
        (status = 200, description = "Assignments, newest first", body = PaginatedAssignmentsResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Assignments"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_assignments(
    State(state): State<AppState>,
    RequireAssignmentsRead(_auth_user): RequireAssignmentsRead,
    Query(filters): Query<AssignmentFilterParams>,
) -> Result<Json<PaginatedAssignmentsResponse>, AppError> {
    let response = AssignmentService::get_assignments(&state.db, filters).await?;
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/api/assignments/{id}",
    params(("id" = AssignmentId, Path, description = "Assignment ID")),
    responses(
        (status = 204, description = "Assignment deleted"),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Assignments"
)]
#[instrument(skip(state, _auth_user))]
pub async fn delete_assignment(
    State(state): State<AppState>,
    RequireAssignmentsManage(_auth_user): RequireAssignmentsManage,
    Path(id): Path<AssignmentId>,
) -> Result<StatusCode, AppError> {
    AssignmentService::delete_assignment(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
