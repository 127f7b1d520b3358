use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{
    delete_message, get_inbox, get_message, get_sent, get_unread_count, send_message,
};
use crate::state::AppState;

pub fn init_messages_router() -> Router<AppState> {
    Router::new()
        .route("/", post(send_message))
        .route("/inbox", get(get_inbox))
        .route("/sent", get(get_sent))
        .route("/unread-count", get(get_unread_count))
        .route("/{id}", get(get_message).delete(delete_message))
}
