use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use brigada_core::AppError;
use brigada_models::BrigadeId;
use brigada_models::users::OnDateParams;
use chrono::Utc;
use tracing::instrument;

use super::model::{
    Brigade, BrigadeFilterParams, BrigadeRoster, BrigadeWithPark, CreateBrigadeDto,
    PaginatedBrigadesResponse, UpdateBrigadeDto,
};
use super::service::BrigadeService;
use crate::middleware::auth::{RequireBrigadesManage, RequireBrigadesRead};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/brigades",
    request_body = CreateBrigadeDto,
    responses(
        (status = 201, description = "Brigade created", body = Brigade),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Park not found", body = ErrorResponse),
        (status = 409, description = "Name already used in the park", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Brigades"
)]
#[instrument(skip(state, _auth_user))]
pub async fn create_brigade(
    State(state): State<AppState>,
    RequireBrigadesManage(_auth_user): RequireBrigadesManage,
    ValidatedJson(dto): ValidatedJson<CreateBrigadeDto>,
) -> Result<(StatusCode, Json<Brigade>), AppError> {
    let brigade = BrigadeService::create_brigade(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(brigade)))
}

#[utoipa::path(
    get,
    path = "/api/brigades",
    params(BrigadeFilterParams),
    responses(
        (status = 200, description = "Brigades", body = PaginatedBrigadesResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Brigades"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_brigades(
    State(state): State<AppState>,
    RequireBrigadesRead(_auth_user): RequireBrigadesRead,
    Query(filters): Query<BrigadeFilterParams>,
) -> Result<Json<PaginatedBrigadesResponse>, AppError> {
    Ok(Json(BrigadeService::get_brigades(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/brigades/{id}",
    params(("id" = BrigadeId, Path, description = "Brigade ID")),
    responses(
        (status = 200, description = "Brigade", body = BrigadeWithPark),
        (status = 404, description = "Brigade not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Brigades"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_brigade(
    State(state): State<AppState>,
    RequireBrigadesRead(_auth_user): RequireBrigadesRead,
    Path(id): Path<BrigadeId>,
) -> Result<Json<BrigadeWithPark>, AppError> {
    Ok(Json(BrigadeService::get_brigade(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/brigades/{id}",
    params(("id" = BrigadeId, Path, description = "Brigade ID")),
    request_body = UpdateBrigadeDto,
    responses(
        (status = 200, description = "Brigade updated", body = Brigade),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Brigade or park not found", body = ErrorResponse),
        (status = 409, description = "Name already used in the park", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Brigades"
)]
#[instrument(skip(state, _auth_user))]
pub async fn update_brigade(
    State(state): State<AppState>,
    RequireBrigadesManage(_auth_user): RequireBrigadesManage,
    Path(id): Path<BrigadeId>,
    ValidatedJson(dto): ValidatedJson<UpdateBrigadeDto>,
) -> Result<Json<Brigade>, AppError> {
    Ok(Json(BrigadeService::update_brigade(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/brigades/{id}",
    params(("id" = BrigadeId, Path, description = "Brigade ID")),
    responses(
        (status = 204, description = "Brigade deleted"),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Brigade not found", body = ErrorResponse),
        (status = 409, description = "Brigade still referenced by roster data", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Brigades"
)]
#[instrument(skip(state, _auth_user))]
pub async fn delete_brigade(
    State(state): State<AppState>,
    RequireBrigadesManage(_auth_user): RequireBrigadesManage,
    Path(id): Path<BrigadeId>,
) -> Result<StatusCode, AppError> {
    BrigadeService::delete_brigade(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Firefighters serving in the brigade on a date (default today)
#[utoipa::path(
    get,
    path = "/api/brigades/{id}/firefighters",
    params(("id" = BrigadeId, Path, description = "Brigade ID"), OnDateParams),
    responses(
        (status = 200, description = "Roster", body = BrigadeRoster),
        (status = 404, description = "Brigade not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Brigades"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_brigade_firefighters(
    State(state): State<AppState>,
    RequireBrigadesRead(_auth_user): RequireBrigadesRead,
    Path(id): Path<BrigadeId>,
    Query(params): Query<OnDateParams>,
) -> Result<Json<BrigadeRoster>, AppError> {
    let date = params.date.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(BrigadeService::get_roster(&state.db, id, date).await?))
}
