use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use brigada_core::{AppError, permissions};
use brigada_models::LeaveRequestId;
use tracing::instrument;

use super::model::{
    CreateLeaveRequestDto, LeaveFilterParams, LeaveRequest, PaginatedLeaveRequestsResponse,
};
use super::service::{LeaveRequestService, Requester};
use crate::middleware::auth::{AuthUser, RequireRequestsCreate, RequireRequestsReview};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

fn requester(auth_user: &AuthUser) -> Result<Requester, AppError> {
    Ok(Requester {
        user_id: auth_user.user_id()?,
        is_reviewer: auth_user.can_review_requests(),
    })
}

/// File a leave or permission request for the caller
#[utoipa::path(
    post,
    path = "/api/requests",
    request_body = CreateLeaveRequestDto,
    responses(
        (status = 201, description = "Request filed as pendiente", body = LeaveRequest),
        (status = 400, description = "Invalid dates or hours", body = ErrorResponse),
        (status = 409, description = "Overlaps an active request", body = ErrorResponse),
        (status = 422, description = "Insufficient balance", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_request(
    State(state): State<AppState>,
    RequireRequestsCreate(auth_user): RequireRequestsCreate,
    ValidatedJson(dto): ValidatedJson<CreateLeaveRequestDto>,
) -> Result<(StatusCode, Json<LeaveRequest>), AppError> {
    let request =
        LeaveRequestService::create_request(&state.db, auth_user.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// List requests. Callers without `requests:read_all` only see their own and
/// the `user_id` filter is ignored.
#[utoipa::path(
    get,
    path = "/api/requests",
    params(LeaveFilterParams),
    responses(
        (status = 200, description = "Paginated requests", body = PaginatedLeaveRequestsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_requests(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<LeaveFilterParams>,
) -> Result<Json<PaginatedLeaveRequestsResponse>, AppError> {
    let read_all = auth_user.has_permission(permissions::REQUESTS_READ_ALL);
    let requests =
        LeaveRequestService::get_requests(&state.db, auth_user.user_id()?, read_all, filters)
            .await?;
    Ok(Json(requests))
}

#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    params(("id" = LeaveRequestId, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request", body = LeaveRequest),
        (status = 403, description = "Not the owner or a reviewer", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<LeaveRequestId>,
) -> Result<Json<LeaveRequest>, AppError> {
    let request = LeaveRequestService::get_request(&state.db, id, requester(&auth_user)?).await?;
    Ok(Json(request))
}

#[utoipa::path(
    post,
    path = "/api/requests/{id}/confirm",
    params(("id" = LeaveRequestId, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request confirmed and balance deducted", body = LeaveRequest),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Request is not pendiente", body = ErrorResponse),
        (status = 422, description = "Insufficient balance", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
#[instrument(skip(state, auth_user))]
pub async fn confirm_request(
    State(state): State<AppState>,
    RequireRequestsReview(auth_user): RequireRequestsReview,
    Path(id): Path<LeaveRequestId>,
) -> Result<Json<LeaveRequest>, AppError> {
    let request =
        LeaveRequestService::confirm_request(&state.db, id, auth_user.user_id()?).await?;
    Ok(Json(request))
}

#[utoipa::path(
    post,
    path = "/api/requests/{id}/deny",
    params(("id" = LeaveRequestId, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request denied", body = LeaveRequest),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Request is not pendiente", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
#[instrument(skip(state, auth_user))]
pub async fn deny_request(
    State(state): State<AppState>,
    RequireRequestsReview(auth_user): RequireRequestsReview,
    Path(id): Path<LeaveRequestId>,
) -> Result<Json<LeaveRequest>, AppError> {
    let request = LeaveRequestService::deny_request(&state.db, id, auth_user.user_id()?).await?;
    Ok(Json(request))
}

/// Cancel a request. A confirmed request gives its balance back.
#[utoipa::path(
    post,
    path = "/api/requests/{id}/cancel",
    params(("id" = LeaveRequestId, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request cancelled", body = LeaveRequest),
        (status = 403, description = "Not the owner or a reviewer", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Request already closed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
#[instrument(skip(state, auth_user))]
pub async fn cancel_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<LeaveRequestId>,
) -> Result<Json<LeaveRequest>, AppError> {
    let request =
        LeaveRequestService::cancel_request(&state.db, id, requester(&auth_user)?).await?;
    Ok(Json(request))
}
