use axum::{
    Router,
    routing::{delete, post},
};

use super::controller::{create_assignment, delete_assignment, get_assignments};
use crate::state::AppState;

pub fn init_assignments_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_assignment).get(get_assignments))
        .route("/{id}", delete(delete_assignment))
}
