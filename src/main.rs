use std::net::SocketAddr;

use anyhow::Context;
use brigada::router::init_router;
use brigada::state::init_app_state;
use brigada_config::ServerConfig;
use dotenvy::dotenv;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    brigada_observability::init_tracing();
    if brigada_observability::init_metrics() {
        tracing::info!("Prometheus metrics enabled at /metrics");
    }

    let state = init_app_state()
        .await
        .context("Failed to connect to the database")?;

    brigada_db::run_migrations(&state.db)
        .await
        .context("Failed to run database migrations")?;

    let server = ServerConfig::from_env();
    let address = server.bind_address();
    let app = init_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!(%address, "server running");
    tracing::info!("Swagger UI available at http://{}/swagger-ui", address);
    tracing::info!("Scalar UI available at http://{}/scalar", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
