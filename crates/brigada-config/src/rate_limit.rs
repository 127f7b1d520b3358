//! Rate limiting configuration.
//!
//! Token bucket limits keyed by client IP (honouring `X-Forwarded-For` and
//! `X-Real-IP` when the API sits behind the station's reverse proxy).
//!
//! # Environment Variables
//!
//! - `RATE_LIMIT_ENABLED`: default `true`
//! - `RATE_LIMIT_GENERAL_PER_SECOND`: default 2
//! - `RATE_LIMIT_GENERAL_BURST_SIZE`: default 30
//! - `RATE_LIMIT_AUTH_PER_SECOND`: default 10
//! - `RATE_LIMIT_AUTH_BURST_SIZE`: default 5

use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::SmartIpKeyExtractor;

use crate::env_or;

pub type IpGovernorConfig =
    GovernorConfig<SmartIpKeyExtractor, ::governor::middleware::NoOpMiddleware>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Seconds between token replenishments for general endpoints.
    pub general_per_second: u64,
    pub general_burst_size: u32,
    /// Login and refresh get a separate, smaller bucket.
    pub auth_per_second: u64,
    pub auth_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            general_per_second: 2,
            general_burst_size: 30,
            auth_per_second: 10,
            auth_burst_size: 5,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            enabled: env_or("RATE_LIMIT_ENABLED", default.enabled),
            general_per_second: env_or("RATE_LIMIT_GENERAL_PER_SECOND", default.general_per_second),
            general_burst_size: env_or("RATE_LIMIT_GENERAL_BURST_SIZE", default.general_burst_size),
            auth_per_second: env_or("RATE_LIMIT_AUTH_PER_SECOND", default.auth_per_second),
            auth_burst_size: env_or("RATE_LIMIT_AUTH_BURST_SIZE", default.auth_burst_size),
        }
    }

    /// A configuration with limiting switched off, used by tests.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Returns `None` when a zero rate or burst makes the bucket unbuildable.
    #[must_use]
    pub fn general_governor_config(&self) -> Option<IpGovernorConfig> {
        build(self.general_per_second, self.general_burst_size)
    }

    #[must_use]
    pub fn auth_governor_config(&self) -> Option<IpGovernorConfig> {
        build(self.auth_per_second, self.auth_burst_size)
    }
}

fn build(per_second: u64, burst_size: u32) -> Option<IpGovernorConfig> {
    GovernorConfigBuilder::default()
        .per_second(per_second)
        .burst_size(burst_size)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.general_burst_size, 30);
        assert_eq!(config.auth_burst_size, 5);
    }

    #[test]
    fn disabled_keeps_limits() {
        let config = RateLimitConfig::disabled();
        assert!(!config.enabled);
        assert_eq!(config.auth_per_second, 10);
    }

    #[test]
    fn zero_burst_cannot_build() {
        let config = RateLimitConfig {
            auth_burst_size: 0,
            ..RateLimitConfig::default()
        };
        assert!(config.auth_governor_config().is_none());
        assert!(config.general_governor_config().is_some());
    }
}
