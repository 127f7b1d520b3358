use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{
    create_vehicle, delete_vehicle, get_vehicle, get_vehicles, update_vehicle,
};
use crate::state::AppState;

pub fn init_vehicles_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_vehicle).get(get_vehicles))
        .route(
            "/{id}",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
}
