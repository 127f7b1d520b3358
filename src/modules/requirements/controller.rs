use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use brigada_core::AppError;
use brigada_models::RequirementId;
use tracing::instrument;

use super::model::{
    AvailableParams, CreateRequirementDto, PaginatedRequirementsResponse, Requirement,
    RequirementCandidate, RequirementFilterParams,
};
use super::service::RequirementService;
use crate::middleware::auth::RequireRequirementsManage;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Recall list for a date, best candidate first
#[utoipa::path(
    get,
    path = "/api/requirements/available",
    params(AvailableParams),
    responses(
        (status = 200, description = "Available firefighters ordered by offered hours, offer date and DNI", body = Vec<RequirementCandidate>),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Requirements"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_available(
    State(state): State<AppState>,
    RequireRequirementsManage(_auth_user): RequireRequirementsManage,
    Query(params): Query<AvailableParams>,
) -> Result<Json<Vec<RequirementCandidate>>, AppError> {
    Ok(Json(RequirementService::get_available(&state.db, params).await?))
}

#[utoipa::path(
    post,
    path = "/api/requirements",
    request_body = CreateRequirementDto,
    responses(
        (status = 201, description = "Firefighter recalled", body = Requirement),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Firefighter not available", body = ErrorResponse),
        (status = 422, description = "Brigade has no guard that day", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Requirements"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_requirement(
    State(state): State<AppState>,
    RequireRequirementsManage(auth_user): RequireRequirementsManage,
    ValidatedJson(dto): ValidatedJson<CreateRequirementDto>,
) -> Result<(StatusCode, Json<Requirement>), AppError> {
    let requirement =
        RequirementService::create_requirement(&state.db, dto, auth_user.user_id()?).await?;
    Ok((StatusCode::CREATED, Json(requirement)))
}

#[utoipa::path(
    get,
    path = "/api/requirements",
    params(RequirementFilterParams),
    responses(
        (status = 200, description = "Paginated requirements", body = PaginatedRequirementsResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Requirements"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_requirements(
    State(state): State<AppState>,
    RequireRequirementsManage(_auth_user): RequireRequirementsManage,
    Query(filters): Query<RequirementFilterParams>,
) -> Result<Json<PaginatedRequirementsResponse>, AppError> {
    Ok(Json(RequirementService::get_requirements(&state.db, filters).await?))
}

#[utoipa::path(
    delete,
    path = "/api/requirements/{id}",
    params(("id" = RequirementId, Path, description = "Requirement ID")),
    responses(
        (status = 204, description = "Requirement deleted"),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Requirement not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Requirements"
)]
#[instrument(skip(state, _auth_user))]
pub async fn delete_requirement(
    State(state): State<AppState>,
    RequireRequirementsManage(_auth_user): RequireRequirementsManage,
    Path(id): Path<RequirementId>,
) -> Result<StatusCode, AppError> {
    RequirementService::delete_requirement(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
