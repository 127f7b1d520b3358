use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use brigada_core::AppError;
use brigada_models::ShiftChangeId;
use chrono::Utc;
use tracing::instrument;

use super::model::{
    CreateShiftChangeDto, PaginatedShiftChangesResponse, ShiftChangeAction,
    ShiftChangeFilterParams, ShiftChangeRequest,
};
use super::service::ShiftChangeService;
use crate::middleware::auth::{AuthUser, RequireShiftChangesCreate, RequireShiftChangesReview};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Propose a guard swap with another firefighter
#[utoipa::path(
    post,
    path = "/api/shift-changes",
    request_body = CreateShiftChangeDto,
    responses(
        (status = 201, description = "Swap proposed", body = ShiftChangeRequest),
        (status = 400, description = "Invalid swap", body = ErrorResponse),
        (status = 404, description = "Counterpart not found", body = ErrorResponse),
        (status = 422, description = "A firefighter has no brigade on the swap date", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Shift changes"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_shift_change(
    State(state): State<AppState>,
    RequireShiftChangesCreate(auth_user): RequireShiftChangesCreate,
    ValidatedJson(dto): ValidatedJson<CreateShiftChangeDto>,
) -> Result<(StatusCode, Json<ShiftChangeRequest>), AppError> {
    let request = ShiftChangeService::create_shift_change(
        &state.db,
        auth_user.user_id()?,
        dto,
        Utc::now().date_naive(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/shift-changes",
    params(ShiftChangeFilterParams),
    responses(
        (status = 200, description = "Swaps the caller takes part in, or all for reviewers", body = PaginatedShiftChangesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Shift changes"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_shift_changes(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<ShiftChangeFilterParams>,
) -> Result<Json<PaginatedShiftChangesResponse>, AppError> {
    let requests = ShiftChangeService::get_shift_changes(
        &state.db,
        auth_user.user_id()?,
        auth_user.can_review_shift_changes(),
        filters,
    )
    .await?;
    Ok(Json(requests))
}

#[utoipa::path(
    get,
    path = "/api/shift-changes/{id}",
    params(("id" = ShiftChangeId, Path, description = "Shift change ID")),
    responses(
        (status = 200, description = "Shift change", body = ShiftChangeRequest),
        (status = 403, description = "Not involved", body = ErrorResponse),
        (status = 404, description = "Shift change not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Shift changes"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_shift_change(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<ShiftChangeId>,
) -> Result<Json<ShiftChangeRequest>, AppError> {
    let request = ShiftChangeService::get_shift_change(
        &state.db,
        id,
        auth_user.user_id()?,
        auth_user.can_review_shift_changes(),
    )
    .await?;
    Ok(Json(request))
}

/// Counterpart agrees to the swap
#[utoipa::path(
    post,
    path = "/api/shift-changes/{id}/accept",
    params(("id" = ShiftChangeId, Path, description = "Shift change ID")),
    responses(
        (status = 200, description = "Accepted by the employees", body = ShiftChangeRequest),
        (status = 403, description = "Only the counterpart can accept", body = ErrorResponse),
        (status = 404, description = "Shift change not found", body = ErrorResponse),
        (status = 409, description = "Not en_tramite", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Shift changes"
)]
#[instrument(skip(state, auth_user))]
pub async fn accept_shift_change(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<ShiftChangeId>,
) -> Result<Json<ShiftChangeRequest>, AppError> {
    decide(&state, &auth_user, id, ShiftChangeAction::Accept).await
}

#[utoipa::path(
    post,
    path = "/api/shift-changes/{id}/reject",
    params(("id" = ShiftChangeId, Path, description = "Shift change ID")),
    responses(
        (status = 200, description = "Rejected", body = ShiftChangeRequest),
        (status = 403, description = "Not the counterpart or a reviewer", body = ErrorResponse),
        (status = 404, description = "Shift change not found", body = ErrorResponse),
        (status = 409, description = "Already closed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Shift changes"
)]
#[instrument(skip(state, auth_user))]
pub async fn reject_shift_change(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<ShiftChangeId>,
) -> Result<Json<ShiftChangeRequest>, AppError> {
    decide(&state, &auth_user, id, ShiftChangeAction::Reject).await
}

/// Approve an agreed swap and write it into the assignment history
#[utoipa::path(
    post,
    path = "/api/shift-changes/{id}/approve",
    params(("id" = ShiftChangeId, Path, description = "Shift change ID")),
    responses(
        (status = 200, description = "Approved and applied", body = ShiftChangeRequest),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Shift change not found", body = ErrorResponse),
        (status = 409, description = "Not aceptado_por_empleados", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Shift changes"
)]
#[instrument(skip(state, auth_user))]
pub async fn approve_shift_change(
    State(state): State<AppState>,
    RequireShiftChangesReview(auth_user): RequireShiftChangesReview,
    Path(id): Path<ShiftChangeId>,
) -> Result<Json<ShiftChangeRequest>, AppError> {
    decide(&state, &auth_user, id, ShiftChangeAction::Approve).await
}

async fn decide(
    state: &AppState,
    auth_user: &AuthUser,
    id: ShiftChangeId,
    action: ShiftChangeAction,
) -> Result<Json<ShiftChangeRequest>, AppError> {
    let request = ShiftChangeService::decide(
        &state.db,
        id,
        action,
        auth_user.user_id()?,
        auth_user.can_review_shift_changes(),
    )
    .await?;
    Ok(Json(request))
}
