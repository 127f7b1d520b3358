use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use brigada_core::AppError;
use brigada_models::ParkId;
use brigada_models::brigades::Brigade;
use tracing::instrument;

use super::model::{CreateParkDto, PaginatedParksResponse, Park, ParkFilterParams, UpdateParkDto};
use super::service::ParkService;
use crate::middleware::auth::{RequireParksManage, RequireParksRead};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/parks",
    request_body = CreateParkDto,
    responses(
        (status = 201, description = "Park created", body = Park),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 409, description = "Name already in use", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Parks"
)]
#[instrument(skip(state, _auth_user))]
pub async fn create_park(
    State(state): State<AppState>,
    RequireParksManage(_auth_user): RequireParksManage,
    ValidatedJson(dto): ValidatedJson<CreateParkDto>,
) -> Result<(StatusCode, Json<Park>), AppError> {
    let park = ParkService::create_park(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(park)))
}

#[utoipa::path(
    get,
    path = "/api/parks",
    params(ParkFilterParams),
    responses(
        (status = 200, description = "Parks with brigade and vehicle counts", body = PaginatedParksResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Parks"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_parks(
    State(state): State<AppState>,
    RequireParksRead(_auth_user): RequireParksRead,
    Query(filters): Query<ParkFilterParams>,
) -> Result<Json<PaginatedParksResponse>, AppError> {
    Ok(Json(ParkService::get_parks(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/parks/{id}",
    params(("id" = ParkId, Path, description = "Park ID")),
    responses(
        (status = 200, description = "Park", body = Park),
        (status = 404, description = "Park not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Parks"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_park(
    State(state): State<AppState>,
    RequireParksRead(_auth_user): RequireParksRead,
    Path(id): Path<ParkId>,
) -> Result<Json<Park>, AppError> {
    Ok(Json(ParkService::get_park(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/parks/{id}",
    params(("id" = ParkId, Path, description = "Park ID")),
    request_body = UpdateParkDto,
    responses(
        (status = 200, description = "Park updated", body = Park),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Park not found", body = ErrorResponse),
        (status = 409, description = "Name already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Parks"
)]
#[instrument(skip(state, _auth_user))]
pub async fn update_park(
    State(state): State<AppState>,
    RequireParksManage(_auth_user): RequireParksManage,
    Path(id): Path<ParkId>,
    ValidatedJson(dto): ValidatedJson<UpdateParkDto>,
) -> Result<Json<Park>, AppError> {
    Ok(Json(ParkService::update_park(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/parks/{id}",
    params(("id" = ParkId, Path, description = "Park ID")),
    responses(
        (status = 204, description = "Park deleted"),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Park not found", body = ErrorResponse),
        (status = 409, description = "Park still has brigades or vehicles", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Parks"
)]
#[instrument(skip(state, _auth_user))]
pub async fn delete_park(
    State(state): State<AppState>,
    RequireParksManage(_auth_user): RequireParksManage,
    Path(id): Path<ParkId>,
) -> Result<StatusCode, AppError> {
    ParkService::delete_park(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/parks/{id}/brigades",
    params(("id" = ParkId, Path, description = "Park ID")),
    responses(
        (status = 200, description = "Brigades based at the park", body = Vec<Brigade>),
        (status = 404, description = "Park not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Parks"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_park_brigades(
    State(state): State<AppState>,
    RequireParksRead(_auth_user): RequireParksRead,
    Path(id): Path<ParkId>,
) -> Result<Json<Vec<Brigade>>, AppError> {
    Ok(Json(ParkService::get_park_brigades(&state.db, id).await?))
}
