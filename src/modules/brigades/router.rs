use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{
    create_brigade, delete_brigade, get_brigade, get_brigade_firefighters, get_brigades,
    update_brigade,
};
use crate::state::AppState;

pub fn init_brigades_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_brigade).get(get_brigades))
        .route(
            "/{id}",
            get(get_brigade).put(update_brigade).delete(delete_brigade),
        )
        .route("/{id}/firefighters", get(get_brigade_firefighters))
}
