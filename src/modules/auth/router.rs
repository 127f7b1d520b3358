use axum::{
    Router,
    routing::{get, post, put},
};

use super::controller::{change_password, get_me, login_user, refresh_token};
use crate::state::AppState;

/// Token endpoints; the router layers a stricter rate limit on this subtree.
pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login_user))
        .route("/refresh", post(refresh_token))
}

pub fn init_account_router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/password", put(change_password))
}
