use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{
    accept_shift_change, approve_shift_change, create_shift_change, get_shift_change,
    get_shift_changes, reject_shift_change,
};
use crate::state::AppState;

pub fn init_shift_changes_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_shift_change).get(get_shift_changes))
        .route("/{id}", get(get_shift_change))
        .route("/{id}/accept", post(accept_shift_change))
        .route("/{id}/reject", post(reject_shift_change))
        .route("/{id}/approve", post(approve_shift_change))
}
