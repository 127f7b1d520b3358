//! Brigada observability.
//!
//! - Console, error-file and JSON-file logging through `tracing`
//! - Per-request log lines with a request id
//! - Prometheus metrics for HTTP traffic and scheduling events
//!
//! Everything except console logging is compiled only with the
//! `observability` feature (on by default). At runtime
//! `OBSERVABILITY_ENABLED=false` turns off metrics and request logging.
//!
//! ```no_run
//! brigada_observability::init_tracing();
//! let _metrics = brigada_observability::init_metrics();
//! ```

mod basic_logging;

pub use basic_logging::init_basic_console_logging;

#[cfg(feature = "observability")]
pub mod logging;
#[cfg(feature = "observability")]
pub mod metrics;

#[cfg(feature = "observability")]
pub use logging::{init_tracing, logging_middleware};
#[cfg(feature = "observability")]
pub use metrics::{
    init_metrics, metrics_middleware, render_metrics, track_leave_request, track_login,
    track_requirement_created, track_shift_change,
};

use std::sync::OnceLock;

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Reads `OBSERVABILITY_ENABLED` once; anything but `false`/`0` enables.
pub fn is_observability_enabled() -> bool {
    cfg!(feature = "observability")
        && *OBSERVABILITY_ENABLED.get_or_init(|| {
            std::env::var("OBSERVABILITY_ENABLED")
                .map(|v| !v.eq_ignore_ascii_case("false") && v != "0")
                .unwrap_or(true)
        })
}

#[cfg(not(feature = "observability"))]
mod stubs {
    use axum::{extract::Request, middleware::Next, response::Response};

    pub fn init_tracing() {
        super::init_basic_console_logging();
    }

    pub async fn logging_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub async fn metrics_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub fn init_metrics() -> bool {
        false
    }

    pub fn render_metrics() -> Option<String> {
        None
    }

    pub fn track_login(_success: bool) {}
    pub fn track_leave_request(_kind: &str, _status: &str) {}
    pub fn track_shift_change(_status: &str) {}
    pub fn track_requirement_created() {}
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
