use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{
    create_guard, delete_guard, generate_guards, get_guard, get_guards, get_my_guards,
    update_guard,
};
use crate::state::AppState;

pub fn init_guards_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_guard).get(get_guards))
        .route("/generate", post(generate_guards))
        .route("/mine", get(get_my_guards))
        .route(
            "/{id}",
            get(get_guard).put(update_guard).delete(delete_guard),
        )
}
