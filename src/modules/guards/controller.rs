use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use brigada_core::AppError;
use brigada_models::{DateRange, GuardId};
use chrono::Utc;
use tracing::instrument;

use super::model::{
    CreateGuardDto, DateRangeParams, GenerateGuardsDto, GenerateGuardsResponse, Guard,
    GuardFilterParams, GuardWithBrigade, UpdateGuardDto,
};
use super::service::GuardService;
use crate::middleware::auth::{AuthUser, RequireGuardsManage, RequireGuardsRead};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/guards",
    request_body = CreateGuardDto,
    responses(
        (status = 201, description = "Guard created", body = Guard),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Brigade not found", body = ErrorResponse),
        (status = 409, description = "Guard already scheduled", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Guards"
)]
#[instrument(skip(state, _auth_user))]
pub async fn create_guard(
    State(state): State<AppState>,
    RequireGuardsManage(_auth_user): RequireGuardsManage,
    ValidatedJson(dto): ValidatedJson<CreateGuardDto>,
) -> Result<(StatusCode, Json<Guard>), AppError> {
    let guard = GuardService::create_guard(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(guard)))
}

/// Guard calendar. `from` defaults to today and `to` to 30 days after `from`.
#[utoipa::path(
    get,
    path = "/api/guards",
    params(GuardFilterParams),
    responses(
        (status = 200, description = "Guards ordered by date and shift", body = Vec<GuardWithBrigade>),
        (status = 400, description = "Inverted range or longer than 366 days", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Guards"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_guards(
    State(state): State<AppState>,
    RequireGuardsRead(_auth_user): RequireGuardsRead,
    Query(filters): Query<GuardFilterParams>,
) -> Result<Json<Vec<GuardWithBrigade>>, AppError> {
    let range = DateRange::resolve(filters.from, filters.to, Utc::now().date_naive())
        .map_err(AppError::bad_request)?;
    Ok(Json(GuardService::get_guards(&state.db, &filters, range).await?))
}

/// Guards the caller is on duty for
#[utoipa::path(
    get,
    path = "/api/guards/mine",
    params(DateRangeParams),
    responses(
        (status = 200, description = "Caller's guards", body = Vec<GuardWithBrigade>),
        (status = 400, description = "Invalid range", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Guards"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_my_guards(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<DateRangeParams>,
) -> Result<Json<Vec<GuardWithBrigade>>, AppError> {
    let range = DateRange::resolve(params.from, params.to, Utc::now().date_naive())
        .map_err(AppError::bad_request)?;
    let guards = GuardService::get_user_guards(&state.db, auth_user.user_id()?, range).await?;
    Ok(Json(guards))
}

#[utoipa::path(
    get,
    path = "/api/guards/{id}",
    params(("id" = GuardId, Path, description = "Guard ID")),
    responses(
        (status = 200, description = "Guard", body = Guard),
        (status = 404, description = "Guard not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Guards"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_guard(
    State(state): State<AppState>,
    RequireGuardsRead(_auth_user): RequireGuardsRead,
    Path(id): Path<GuardId>,
) -> Result<Json<Guard>, AppError> {
    Ok(Json(GuardService::get_guard(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/guards/{id}",
    params(("id" = GuardId, Path, description = "Guard ID")),
    request_body = UpdateGuardDto,
    responses(
        (status = 200, description = "Guard updated", body = Guard),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Guard not found", body = ErrorResponse),
        (status = 409, description = "Guard already scheduled", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Guards"
)]
#[instrument(skip(state, _auth_user))]
pub async fn update_guard(
    State(state): State<AppState>,
    RequireGuardsManage(_auth_user): RequireGuardsManage,
    Path(id): Path<GuardId>,
    ValidatedJson(dto): ValidatedJson<UpdateGuardDto>,
) -> Result<Json<Guard>, AppError> {
    Ok(Json(GuardService::update_guard(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/guards/{id}",
    params(("id" = GuardId, Path, description = "Guard ID")),
    responses(
        (status = 204, description = "Guard deleted"),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Guard not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Guards"
)]
#[instrument(skip(state, _auth_user))]
pub async fn delete_guard(
    State(state): State<AppState>,
    RequireGuardsManage(_auth_user): RequireGuardsManage,
    Path(id): Path<GuardId>,
) -> Result<StatusCode, AppError> {
    GuardService::delete_guard(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Generate a guard rotation over a date range
#[utoipa::path(
    post,
    path = "/api/guards/generate",
    request_body = GenerateGuardsDto,
    responses(
        (status = 200, description = "Created and skipped counts", body = GenerateGuardsResponse),
        (status = 400, description = "Invalid range", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Brigade not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Guards"
)]
#[instrument(skip(state, _auth_user))]
pub async fn generate_guards(
    State(state): State<AppState>,
    RequireGuardsManage(_auth_user): RequireGuardsManage,
    ValidatedJson(dto): ValidatedJson<GenerateGuardsDto>,
) -> Result<Json<GenerateGuardsResponse>, AppError> {
    Ok(Json(GuardService::generate_guards(&state.db, dto).await?))
}
