use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{
    cancel_request, confirm_request, create_request, deny_request, get_request, get_requests,
};
use crate::state::AppState;

pub fn init_requests_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_request).get(get_requests))
        .route("/{id}", get(get_request))
        .route("/{id}/confirm", post(confirm_request))
        .route("/{id}/deny", post(deny_request))
        .route("/{id}/cancel", post(cancel_request))
}
