//! Internal messaging between staff.

use crate::ids::{MessageId, UserId};
use brigada_core::PaginationMeta;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub parent_id: Option<MessageId>,
    pub subject: String,
    pub body: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.sender_id == user_id || self.recipient_id == user_id
    }
}

/// Message as listed in a mailbox, with both names resolved.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MessageView {
    pub id: MessageId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub recipient_id: UserId,
    pub recipient_name: String,
    pub parent_id: Option<MessageId>,
    pub subject: String,
    pub body: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SendMessageDto {
    pub recipient_id: UserId,
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1, max = 5000))]
    pub body: String,
    /// Message being replied to
    pub parent_id: Option<MessageId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedMessagesResponse {
    pub data: Vec<MessageView>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participants() {
        let msg = Message {
            id: MessageId::new(),
            sender_id: UserId::from_u128(1),
            recipient_id: UserId::from_u128(2),
            parent_id: None,
            subject: "Cambio".into(),
            body: "¿Me cambias el martes?".into(),
            read_at: None,
            created_at: Utc::now(),
        };
        assert!(msg.is_participant(UserId::from_u128(1)));
        assert!(msg.is_participant(UserId::from_u128(2)));
        assert!(!msg.is_participant(UserId::from_u128(3)));
    }

    #[test]
    fn empty_body_is_invalid() {
        let dto = SendMessageDto {
            recipient_id: UserId::from_u128(2),
            subject: "Hola".into(),
            body: String::new(),
            parent_id: None,
        };
        assert!(dto.validate().is_err());
    }
}
