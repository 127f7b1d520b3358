use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Console-only logging, used when the `observability` feature is off and
/// by the CLI.
///
/// `RUST_LOG` wins over `LOG_LEVEL` (default `info`). Safe to call twice.
pub fn init_basic_console_logging() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "brigada={level},brigada_cli={level},tower_http=warn,hyper=warn,sqlx=warn",
            level = log_level
        ))
    });

    let console_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter);

    let _ = tracing_subscriber::registry().with(console_layer).try_init();
}
