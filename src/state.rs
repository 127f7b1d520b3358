use brigada_config::{CorsConfig, JwtConfig, RateLimitConfig};
use brigada_db::init_db_pool;
use sqlx::PgPool;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
}

impl AppState {
    /// State around an existing pool with the remaining config read from the environment.
    pub fn with_pool(db: PgPool) -> Self {
        Self {
            db,
            jwt_config: JwtConfig::from_env(),
            cors_config: CorsConfig::from_env(),
            rate_limit_config: RateLimitConfig::from_env(),
        }
    }
}

pub async fn init_app_state() -> Result<AppState, sqlx::Error> {
    Ok(AppState::with_pool(init_db_pool().await?))
}
