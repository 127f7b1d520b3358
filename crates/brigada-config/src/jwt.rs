use std::env;

use crate::env_or;

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    /// Seconds
    pub access_token_expiry: i64,
    /// Seconds
    pub refresh_token_expiry: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "change-me-brigada-secret".to_string()),
            access_token_expiry: env_or("JWT_ACCESS_EXPIRY", 3600),
            refresh_token_expiry: env_or("JWT_REFRESH_EXPIRY", 604800),
        }
    }
}
