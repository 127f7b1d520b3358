use axum::{
    Router,
    routing::{delete, get, post},
};

use super::controller::{
    create_requirement, delete_requirement, get_available, get_requirements,
};
use crate::state::AppState;

pub fn init_requirements_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_requirement).get(get_requirements))
        .route("/available", get(get_available))
        .route("/{id}", delete(delete_requirement))
}
