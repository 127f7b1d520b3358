use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use brigada_core::AppError;
use brigada_models::VehicleId;
use tracing::instrument;

use super::model::{
    CreateVehicleDto, PaginatedVehiclesResponse, UpdateVehicleDto, Vehicle, VehicleFilterParams,
};
use super::service::VehicleService;
use crate::middleware::auth::{RequireVehiclesManage, RequireVehiclesRead};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/vehicles",
    request_body = CreateVehicleDto,
    responses(
        (status = 201, description = "Vehicle created", body = Vehicle),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Park not found", body = ErrorResponse),
        (status = 409, description = "Plate already registered", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Vehicles"
)]
#[instrument(skip(state, _auth_user))]
pub async fn create_vehicle(
    State(state): State<AppState>,
    RequireVehiclesManage(_auth_user): RequireVehiclesManage,
    ValidatedJson(dto): ValidatedJson<CreateVehicleDto>,
) -> Result<(StatusCode, Json<Vehicle>), AppError> {
    let vehicle = VehicleService::create_vehicle(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

#[utoipa::path(
    get,
    path = "/api/vehicles",
    params(VehicleFilterParams),
    responses(
        (status = 200, description = "Paginated vehicles", body = PaginatedVehiclesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Vehicles"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_vehicles(
    State(state): State<AppState>,
    RequireVehiclesRead(_auth_user): RequireVehiclesRead,
    Query(filters): Query<VehicleFilterParams>,
) -> Result<Json<PaginatedVehiclesResponse>, AppError> {
    Ok(Json(VehicleService::get_vehicles(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/vehicles/{id}",
    params(("id" = VehicleId, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle", body = Vehicle),
        (status = 404, description = "Vehicle not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Vehicles"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_vehicle(
    State(state): State<AppState>,
    RequireVehiclesRead(_auth_user): RequireVehiclesRead,
    Path(id): Path<VehicleId>,
) -> Result<Json<Vehicle>, AppError> {
    Ok(Json(VehicleService::get_vehicle(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/vehicles/{id}",
    params(("id" = VehicleId, Path, description = "Vehicle ID")),
    request_body = UpdateVehicleDto,
    responses(
        (status = 200, description = "Vehicle updated", body = Vehicle),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Vehicle or park not found", body = ErrorResponse),
        (status = 409, description = "Plate already registered", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Vehicles"
)]
#[instrument(skip(state, _auth_user))]
pub async fn update_vehicle(
    State(state): State<AppState>,
    RequireVehiclesManage(_auth_user): RequireVehiclesManage,
    Path(id): Path<VehicleId>,
    ValidatedJson(dto): ValidatedJson<UpdateVehicleDto>,
) -> Result<Json<Vehicle>, AppError> {
    Ok(Json(VehicleService::update_vehicle(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/vehicles/{id}",
    params(("id" = VehicleId, Path, description = "Vehicle ID")),
    responses(
        (status = 204, description = "Vehicle deleted"),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Vehicle not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Vehicles"
)]
#[instrument(skip(state, _auth_user))]
pub async fn delete_vehicle(
    State(state): State<AppState>,
    RequireVehiclesManage(_auth_user): RequireVehiclesManage,
    Path(id): Path<VehicleId>,
) -> Result<StatusCode, AppError> {
    VehicleService::delete_vehicle(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
