use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::is_observability_enabled;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Installs the Prometheus recorder and its upkeep task.
///
/// Returns `false` when observability is off or a recorder could not be
/// installed. Must run inside a Tokio runtime.
pub fn init_metrics() -> bool {
    if !is_observability_enabled() {
        return false;
    }
    if HANDLE.get().is_some() {
        return true;
    }

    let handle = match PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
        .and_then(|builder| builder.install_recorder())
    {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder not installed");
            return false;
        }
    };

    let upkeep = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep.run_upkeep();
        }
    });

    HANDLE.get_or_init(|| handle);
    true
}

/// Prometheus text exposition, `None` before [`init_metrics`] succeeded.
pub fn render_metrics() -> Option<String> {
    HANDLE.get().map(PrometheusHandle::render)
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    gauge!("http_requests_active").increment(1.0);
    let response = next.run(req).await;
    gauge!("http_requests_active").decrement(1.0);

    let status = response.status().as_u16().to_string();
    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status)
        .increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(start.elapsed().as_secs_f64());

    response
}

pub fn track_login(success: bool) {
    if !is_observability_enabled() {
        return;
    }
    let status = if success { "success" } else { "failure" };
    counter!("logins_total", "status" => status).increment(1);
}

/// `status` is the state the request moved to.
pub fn track_leave_request(kind: &str, status: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("leave_requests_total", "kind" => kind.to_owned(), "status" => status.to_owned())
        .increment(1);
}

pub fn track_shift_change(status: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("shift_changes_total", "status" => status.to_owned()).increment(1);
}

pub fn track_requirement_created() {
    if !is_observability_enabled() {
        return;
    }
    counter!("requirements_created_total").increment(1);
}
