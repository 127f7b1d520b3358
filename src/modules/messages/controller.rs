use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use brigada_core::{AppError, PaginationParams};
use brigada_models::MessageId;
use tracing::instrument;

use super::model::{
    Message, MessageView, PaginatedMessagesResponse, SendMessageDto, UnreadCountResponse,
};
use super::service::MessageService;
use crate::middleware::auth::{AuthUser, RequireMessagesSend};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = SendMessageDto,
    responses(
        (status = 201, description = "Message sent", body = Message),
        (status = 400, description = "Message to self", body = ErrorResponse),
        (status = 403, description = "Reply to a foreign conversation", body = ErrorResponse),
        (status = 404, description = "Recipient or parent not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn send_message(
    State(state): State<AppState>,
    RequireMessagesSend(auth_user): RequireMessagesSend,
    ValidatedJson(dto): ValidatedJson<SendMessageDto>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let message = MessageService::send_message(&state.db, auth_user.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[utoipa::path(
    get,
    path = "/api/messages/inbox",
    params(PaginationParams),
    responses(
        (status = 200, description = "Received messages, newest first", body = PaginatedMessagesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_inbox(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedMessagesResponse>, AppError> {
    Ok(Json(
        MessageService::get_inbox(&state.db, auth_user.user_id()?, pagination).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/messages/sent",
    params(PaginationParams),
    responses(
        (status = 200, description = "Sent messages, newest first", body = PaginatedMessagesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_sent(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedMessagesResponse>, AppError> {
    Ok(Json(
        MessageService::get_sent(&state.db, auth_user.user_id()?, pagination).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/messages/unread-count",
    responses(
        (status = 200, description = "Unread messages in the inbox", body = UnreadCountResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_unread_count(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UnreadCountResponse>, AppError> {
    Ok(Json(
        MessageService::unread_count(&state.db, auth_user.user_id()?).await?,
    ))
}

/// Read a message; the recipient's first read marks it as read
#[utoipa::path(
    get,
    path = "/api/messages/{id}",
    params(("id" = MessageId, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Message", body = MessageView),
        (status = 403, description = "Not a participant", body = ErrorResponse),
        (status = 404, description = "Message not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_message(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<MessageId>,
) -> Result<Json<MessageView>, AppError> {
    Ok(Json(
        MessageService::get_message(&state.db, id, auth_user.user_id()?).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/messages/{id}",
    params(("id" = MessageId, Path, description = "Message ID")),
    responses(
        (status = 204, description = "Message deleted"),
        (status = 403, description = "Not a participant", body = ErrorResponse),
        (status = 404, description = "Message not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_message(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<MessageId>,
) -> Result<StatusCode, AppError> {
    MessageService::delete_message(&state.db, id, auth_user.user_id()?).await?;
    Ok(StatusCode::NO_CONTENT)
}
