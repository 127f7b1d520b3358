use axum::{
    Router,
    routing::{get, patch, post, put},
};

use super::controller::{
    create_user, delete_user, get_user, get_user_brigade, get_users, offer_hours,
    update_balances, update_user,
};
use crate::state::AppState;

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user).get(get_users))
        .route("/me/offered-hours", put(offer_hours))
        .route(
            "/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/{id}/balances", patch(update_balances))
        .route("/{id}/brigade", get(get_user_brigade))
}
