use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use brigada_core::AppError;
use brigada_models::IncidentId;
use tracing::instrument;

use super::model::{
    CreateIncidentDto, Incident, IncidentFilterParams, PaginatedIncidentsResponse,
    ResolveIncidentDto,
};
use super::service::IncidentService;
use crate::middleware::auth::{RequireIncidentsCreate, RequireIncidentsRead, RequireIncidentsResolve};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Report an incident at a park
#[utoipa::path(
    post,
    path = "/api/incidents",
    request_body = CreateIncidentDto,
    responses(
        (status = 201, description = "Incident reported", body = Incident),
        (status = 404, description = "Park or vehicle not found", body = ErrorResponse),
        (status = 422, description = "Vehicle missing for a vehicle incident", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Incidents"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_incident(
    State(state): State<AppState>,
    RequireIncidentsCreate(auth_user): RequireIncidentsCreate,
    ValidatedJson(dto): ValidatedJson<CreateIncidentDto>,
) -> Result<(StatusCode, Json<Incident>), AppError> {
    let incident = IncidentService::create_incident(&state.db, dto, auth_user.user_id()?).await?;
    Ok((StatusCode::CREATED, Json(incident)))
}

#[utoipa::path(
    get,
    path = "/api/incidents",
    params(IncidentFilterParams),
    responses(
        (status = 200, description = "Paginated incidents", body = PaginatedIncidentsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Incidents"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_incidents(
    State(state): State<AppState>,
    RequireIncidentsRead(_auth_user): RequireIncidentsRead,
    Query(filters): Query<IncidentFilterParams>,
) -> Result<Json<PaginatedIncidentsResponse>, AppError> {
    Ok(Json(IncidentService::get_incidents(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/incidents/{id}",
    params(("id" = IncidentId, Path, description = "Incident ID")),
    responses(
        (status = 200, description = "Incident", body = Incident),
        (status = 404, description = "Incident not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Incidents"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_incident(
    State(state): State<AppState>,
    RequireIncidentsRead(_auth_user): RequireIncidentsRead,
    Path(id): Path<IncidentId>,
) -> Result<Json<Incident>, AppError> {
    Ok(Json(IncidentService::get_incident(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/incidents/{id}/resolve",
    params(("id" = IncidentId, Path, description = "Incident ID")),
    request_body = ResolveIncidentDto,
    responses(
        (status = 200, description = "Incident resolved", body = Incident),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Incident not found", body = ErrorResponse),
        (status = 409, description = "Already resolved", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Incidents"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn resolve_incident(
    State(state): State<AppState>,
    RequireIncidentsResolve(auth_user): RequireIncidentsResolve,
    Path(id): Path<IncidentId>,
    ValidatedJson(dto): ValidatedJson<ResolveIncidentDto>,
) -> Result<Json<Incident>, AppError> {
    let incident =
        IncidentService::resolve_incident(&state.db, id, dto, auth_user.user_id()?).await?;
    Ok(Json(incident))
}

#[utoipa::path(
    delete,
    path = "/api/incidents/{id}",
    params(("id" = IncidentId, Path, description = "Incident ID")),
    responses(
        (status = 204, description = "Incident deleted"),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Incident not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Incidents"
)]
#[instrument(skip(state, _auth_user))]
pub async fn delete_incident(
    State(state): State<AppState>,
    RequireIncidentsResolve(_auth_user): RequireIncidentsResolve,
    Path(id): Path<IncidentId>,
) -> Result<StatusCode, AppError> {
    IncidentService::delete_incident(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
