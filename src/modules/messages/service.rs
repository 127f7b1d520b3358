use anyhow::Context;
use brigada_core::{AppError, PaginationMeta, PaginationParams};
use brigada_models::{MessageId, UserId};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use super::model::{
    Message, MessageView, PaginatedMessagesResponse, SendMessageDto, UnreadCountResponse,
};
use crate::modules::users::service::UserService;

const MESSAGE_COLUMNS: &str =
    "id, sender_id, recipient_id, parent_id, subject, body, read_at, created_at";

const VIEW_SELECT: &str = "SELECT m.id, m.sender_id, \
     s.first_name || ' ' || s.last_name AS sender_name, m.recipient_id, \
     r.first_name || ' ' || r.last_name AS recipient_name, \
     m.parent_id, m.subject, m.body, m.read_at, m.created_at \
     FROM messages m \
     JOIN users s ON s.id = m.sender_id \
     JOIN users r ON r.id = m.recipient_id";

/// Which side of the mailbox a listing reads.
#[derive(Debug, Clone, Copy)]
enum Mailbox {
    Inbox,
    Sent,
}

impl Mailbox {
    fn owner_column(self) -> &'static str {
        match self {
            Self::Inbox => "recipient_id",
            Self::Sent => "sender_id",
        }
    }
}

pub struct MessageService;

impl MessageService {
    async fn find_message(db: &PgPool, id: MessageId) -> Result<Message, AppError> {
        sqlx::query_as::<_, Message>(&format!(
            "SELECT {} FROM messages WHERE id = $1",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch message")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Message not found")))
    }

    #[instrument(skip(db, dto), fields(sender = %sender_id, recipient = %dto.recipient_id))]
    pub async fn send_message(
        db: &PgPool,
        sender_id: UserId,
        dto: SendMessageDto,
    ) -> Result<Message, AppError> {
        if dto.recipient_id == sender_id {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "You cannot send a message to yourself"
            )));
        }
        if !UserService::exists(db, dto.recipient_id).await? {
            return Err(AppError::not_found(anyhow::anyhow!("Recipient not found")));
        }
        if let Some(parent_id) = dto.parent_id {
            let parent = Self::find_message(db, parent_id).await?;
            if !parent.is_participant(sender_id) {
                return Err(AppError::forbidden(
                    "You can only reply to conversations you take part in",
                ));
            }
        }

        let message = sqlx::query_as::<_, Message>(&format!(
            "INSERT INTO messages (sender_id, recipient_id, parent_id, subject, body) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            MESSAGE_COLUMNS
        ))
        .bind(sender_id)
        .bind(dto.recipient_id)
        .bind(dto.parent_id)
        .bind(dto.subject.trim())
        .bind(&dto.body)
        .fetch_one(db)
        .await
        .context("Failed to send message")
        .map_err(AppError::database)?;

        tracing::info!(message.id = %message.id, "message sent");
        Ok(message)
    }

    async fn mailbox(
        db: &PgPool,
        user_id: UserId,
        mailbox: Mailbox,
        pagination: PaginationParams,
    ) -> Result<PaginatedMessagesResponse, AppError> {
        let column = mailbox.owner_column();

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM messages WHERE {column} = $1"
        ))
        .bind(user_id)
        .fetch_one(db)
        .await
        .context("Failed to count messages")
        .map_err(AppError::database)?;

        let messages = sqlx::query_as::<_, MessageView>(&format!(
            "{VIEW_SELECT} WHERE m.{column} = $1 ORDER BY m.created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch messages")
        .map_err(AppError::database)?;

        Ok(PaginatedMessagesResponse {
            data: messages,
            meta: PaginationMeta::new(total, &pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_inbox(
        db: &PgPool,
        user_id: UserId,
        pagination: PaginationParams,
    ) -> Result<PaginatedMessagesResponse, AppError> {
        Self::mailbox(db, user_id, Mailbox::Inbox, pagination).await
    }

    #[instrument(skip(db))]
    pub async fn get_sent(
        db: &PgPool,
        user_id: UserId,
        pagination: PaginationParams,
    ) -> Result<PaginatedMessagesResponse, AppError> {
        Self::mailbox(db, user_id, Mailbox::Sent, pagination).await
    }

    #[instrument(skip(db))]
    pub async fn unread_count(db: &PgPool, user_id: UserId) -> Result<UnreadCountResponse, AppError> {
        let unread = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages WHERE recipient_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(db)
        .await
        .context("Failed to count unread messages")
        .map_err(AppError::database)?;

        Ok(UnreadCountResponse { unread })
    }

    /// Fetches a message for one of its participants. The recipient's first
    /// read stamps `read_at`.
    #[instrument(skip(db))]
    pub async fn get_message(
        db: &PgPool,
        id: MessageId,
        user_id: UserId,
    ) -> Result<MessageView, AppError> {
        let mut view = sqlx::query_as::<_, MessageView>(&format!("{VIEW_SELECT} WHERE m.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch message")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Message not found")))?;

        if view.sender_id != user_id && view.recipient_id != user_id {
            return Err(AppError::forbidden("You are not a participant of this message"));
        }

        if view.recipient_id == user_id && view.read_at.is_none() {
            let read_at = sqlx::query_scalar::<_, DateTime<Utc>>(
                "UPDATE messages SET read_at = COALESCE(read_at, NOW()) WHERE id = $1 \
                 RETURNING read_at",
            )
            .bind(id)
            .fetch_one(db)
            .await
            .context("Failed to mark message as read")
            .map_err(AppError::database)?;
            view.read_at = Some(read_at);
        }

        Ok(view)
    }

    #[instrument(skip(db))]
    pub async fn delete_message(
        db: &PgPool,
        id: MessageId,
        user_id: UserId,
    ) -> Result<(), AppError> {
        let message = Self::find_message(db, id).await?;
        if !message.is_participant(user_id) {
            return Err(AppError::forbidden("You are not a participant of this message"));
        }

        sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete message")
            .map_err(AppError::database)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(pool: &PgPool, dni: &str, first_name: &str) -> UserId {
        sqlx::query_scalar::<_, UserId>(
            "INSERT INTO users (first_name, last_name, dni, email, password) \
             VALUES ($2, 'Ruiz', $1, $1 || '@parque.es', 'x') RETURNING id",
        )
        .bind(dni)
        .bind(first_name)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    fn dto(recipient_id: UserId, parent_id: Option<MessageId>) -> SendMessageDto {
        SendMessageDto {
            recipient_id,
            subject: "Guardia del sábado".to_string(),
            body: "¿Puedes cubrirme?".to_string(),
            parent_id,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_send_read_and_reply(pool: PgPool) {
        let ana = seed_user(&pool, "00000001R", "Ana").await;
        let luis = seed_user(&pool, "00000002W", "Luis").await;
        let eva = seed_user(&pool, "00000003A", "Eva").await;

        let sent = MessageService::send_message(&pool, ana, dto(luis, None))
            .await
            .unwrap();
        assert_eq!(MessageService::unread_count(&pool, luis).await.unwrap().unread, 1);

        let inbox = MessageService::get_inbox(&pool, luis, PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(inbox.meta.total, 1);
        assert_eq!(inbox.data[0].sender_name, "Ana Ruiz");

        // The sender reading does not mark it read.
        let by_sender = MessageService::get_message(&pool, sent.id, ana).await.unwrap();
        assert!(by_sender.read_at.is_none());

        let by_recipient = MessageService::get_message(&pool, sent.id, luis).await.unwrap();
        assert!(by_recipient.read_at.is_some());
        assert_eq!(MessageService::unread_count(&pool, luis).await.unwrap().unread, 0);

        let err = MessageService::get_message(&pool, sent.id, eva).await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);

        MessageService::send_message(&pool, luis, dto(ana, Some(sent.id)))
            .await
            .unwrap();
        let err = MessageService::send_message(&pool, eva, dto(ana, Some(sent.id)))
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_send_validations(pool: PgPool) {
        let ana = seed_user(&pool, "00000001R", "Ana").await;

        let err = MessageService::send_message(&pool, ana, dto(ana, None))
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);

        let err = MessageService::send_message(&pool, ana, dto(UserId::new(), None))
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_by_participant_only(pool: PgPool) {
        let ana = seed_user(&pool, "00000001R", "Ana").await;
        let luis = seed_user(&pool, "00000002W", "Luis").await;
        let eva = seed_user(&pool, "00000003A", "Eva").await;
        let sent = MessageService::send_message(&pool, ana, dto(luis, None))
            .await
            .unwrap();

        let err = MessageService::delete_message(&pool, sent.id, eva)
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);

        MessageService::delete_message(&pool, sent.id, luis).await.unwrap();
        let err = MessageService::get_message(&pool, sent.id, ana).await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
    }
}
