use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{
    create_park, delete_park, get_park, get_park_brigades, get_parks, update_park,
};
use crate::state::AppState;

pub fn init_parks_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_park).get(get_parks))
        .route("/{id}", get(get_park).put(update_park).delete(delete_park))
        .route("/{id}/brigades", get(get_park_brigades))
}
