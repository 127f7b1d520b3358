use std::sync::Arc;

use crate::docs::ApiDoc;
use crate::modules::assignments::router::init_assignments_router;
use crate::modules::auth::router::{init_account_router, init_auth_router};
use crate::modules::brigades::router::init_brigades_router;
use crate::modules::guards::router::init_guards_router;
use crate::modules::health::router::init_health_router;
use crate::modules::incidents::router::init_incidents_router;
use crate::modules::messages::router::init_messages_router;
use crate::modules::parks::router::init_parks_router;
use crate::modules::requests::router::init_requests_router;
use crate::modules::requirements::router::init_requirements_router;
use crate::modules::shift_changes::router::init_shift_changes_router;
use crate::modules::users::router::init_users_router;
use crate::modules::vehicles::router::init_vehicles_router;
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use brigada_observability::{logging_middleware, metrics_middleware};
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

/// Login and refresh, behind the stricter auth bucket when limiting is on.
fn auth_routes(state: &AppState) -> Router<AppState> {
    let router = init_auth_router();
    if !state.rate_limit_config.enabled {
        return router;
    }
    match state.rate_limit_config.auth_governor_config() {
        Some(config) => router.layer(GovernorLayer::new(Arc::new(config))),
        None => {
            tracing::warn!("auth rate limit misconfigured, login is not rate limited");
            router
        }
    }
}

fn api_routes(state: &AppState) -> Router<AppState> {
    let router = Router::new()
        .nest("/auth", auth_routes(state).merge(init_account_router()))
        .nest("/users", init_users_router())
        .nest("/parks", init_parks_router())
        .nest("/brigades", init_brigades_router())
        .nest("/guards", init_guards_router())
        .nest("/assignments", init_assignments_router())
        .nest("/requests", init_requests_router())
        .nest("/shift-changes", init_shift_changes_router())
        .nest("/requirements", init_requirements_router())
        .nest("/vehicles", init_vehicles_router())
        .nest("/incidents", init_incidents_router())
        .nest("/messages", init_messages_router());

    if !state.rate_limit_config.enabled {
        return router;
    }
    match state.rate_limit_config.general_governor_config() {
        Some(config) => router.layer(GovernorLayer::new(Arc::new(config))),
        None => {
            tracing::warn!("general rate limit misconfigured, API is not rate limited");
            router
        }
    }
}

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .merge(init_health_router())
        .nest("/api", api_routes(&state))
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
