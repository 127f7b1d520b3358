//! # Brigada Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`jwt`]: token signing secret and lifetimes
//! - [`cors`]: allowed browser origins
//! - [`rate_limit`]: request rate limits per client IP
//! - [`server`]: bind address
//!
//! ```ignore
//! use brigada_config::{JwtConfig, CorsConfig, RateLimitConfig, ServerConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let server = ServerConfig::from_env();
//! println!("listening on {}", server.bind_address());
//! ```

pub mod cors;
pub mod jwt;
pub mod rate_limit;
pub mod server;

pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;

/// Reads and parses an environment variable, falling back to `default` when
/// it is unset or unparsable.
pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
