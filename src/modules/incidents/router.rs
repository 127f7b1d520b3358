use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{
    create_incident, delete_incident, get_incident, get_incidents, resolve_incident,
};
use crate::state::AppState;

pub fn init_incidents_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_incident).get(get_incidents))
        .route("/{id}", get(get_incident).delete(delete_incident))
        .route("/{id}/resolve", post(resolve_incident))
}
