use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use brigada_core::{AppError, permissions};
use brigada_models::UserId;
use chrono::Utc;
use tracing::instrument;

use super::model::{
    CreateUserDto, OfferHoursDto, OnDateParams, PaginatedUsersResponse, UpdateBalancesDto,
    UpdateUserDto, User, UserBrigadeResponse, UserFilterParams,
};
use super::service::UserService;
use crate::middleware::auth::{
    AuthUser, RequireUsersBalances, RequireUsersCreate, RequireUsersDelete, RequireUsersRead,
    RequireUsersUpdate,
};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 409, description = "Email or DNI already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, _auth_user, dto))]
pub async fn create_user(
    State(state): State<AppState>,
    RequireUsersCreate(_auth_user): RequireUsersCreate,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = UserService::create_user(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(UserFilterParams),
    responses(
        (status = 200, description = "Users", body = PaginatedUsersResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_users(
    State(state): State<AppState>,
    RequireUsersRead(_auth_user): RequireUsersRead,
    Query(filters): Query<UserFilterParams>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    let response = UserService::get_users(&state.db, filters).await?;
    Ok(Json(response))
}

/// Fetch a user. Anyone may fetch themselves; others need `users:read`.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = UserId, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<UserId>,
) -> Result<Json<User>, AppError> {
    if auth_user.user_id()? != id && !auth_user.has_permission(permissions::USERS_READ) {
        return Err(AppError::forbidden(format!(
            "Access denied. Missing required permission: {}",
            permissions::USERS_READ
        )));
    }
    let user = UserService::get_user(&state.db, id).await?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = UserId, Path, description = "User ID")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, _auth_user))]
pub async fn update_user(
    State(state): State<AppState>,
    RequireUsersUpdate(_auth_user): RequireUsersUpdate,
    Path(id): Path<UserId>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<User>, AppError> {
    let user = UserService::update_user(&state.db, id, dto).await?;
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = UserId, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Cannot delete yourself", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireUsersDelete(auth_user): RequireUsersDelete,
    Path(id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    UserService::delete_user(&state.db, id, auth_user.user_id()?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set vacation days, personal days or compensation hours
#[utoipa::path(
    patch,
    path = "/api/users/{id}/balances",
    params(("id" = UserId, Path, description = "User ID")),
    request_body = UpdateBalancesDto,
    responses(
        (status = 200, description = "Balances updated", body = User),
        (status = 400, description = "Nothing to update", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Negative balance", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, _auth_user))]
pub async fn update_balances(
    State(state): State<AppState>,
    RequireUsersBalances(_auth_user): RequireUsersBalances,
    Path(id): Path<UserId>,
    ValidatedJson(dto): ValidatedJson<UpdateBalancesDto>,
) -> Result<Json<User>, AppError> {
    let user = UserService::update_balances(&state.db, id, dto).await?;
    Ok(Json(user))
}

/// Offer hours for requirements
#[utoipa::path(
    put,
    path = "/api/users/me/offered-hours",
    request_body = OfferHoursDto,
    responses(
        (status = 200, description = "Offer recorded", body = User),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, auth_user))]
pub async fn offer_hours(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<OfferHoursDto>,
) -> Result<Json<User>, AppError> {
    let user = UserService::offer_hours(&state.db, auth_user.user_id()?, dto.hours).await?;
    Ok(Json(user))
}

/// Effective brigade of a user on a date (default today)
#[utoipa::path(
    get,
    path = "/api/users/{id}/brigade",
    params(("id" = UserId, Path, description = "User ID"), OnDateParams),
    responses(
        (status = 200, description = "Effective brigade", body = UserBrigadeResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "User not found or never assigned", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_user_brigade(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<UserId>,
    Query(params): Query<OnDateParams>,
) -> Result<Json<UserBrigadeResponse>, AppError> {
    if auth_user.user_id()? != id
        && !auth_user.has_any_permission(&[permissions::USERS_READ, permissions::ASSIGNMENTS_READ])
    {
        return Err(AppError::forbidden("You can only look up your own brigade"));
    }
    let date = params.date.unwrap_or_else(|| Utc::now().date_naive());
    let response = UserService::get_user_brigade(&state.db, id, date).await?;
    Ok(Json(response))
}
