//! Structured logging initialization.

use tracing_subscriber::{fmt::time::UtcTime, layer::Identity, prelude::*, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Initialize logging: console output plus an optional rolling file
/// appender, driven by [`LoggingConfig`]. Level resolution: config level,
/// then `RUST_LOG`, then `info`.
pub fn init_with_config(cfg: &LoggingConfig) {
    let env_filter = match &cfg.level {
        Some(level) => EnvFilter::new(level.as_str()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let json = cfg.format == LogFormat::Json;

    let console = tracing_subscriber::fmt::layer()
        .with_ansi(!json)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(std::io::stdout);
    let console = if json {
        console.json().boxed()
    } else {
        console.boxed()
    };

    let registry = tracing_subscriber::registry().with(env_filter).with(console);

    if cfg.enable_file_logging {
        if let Some(writer) = build_file_writer(cfg) {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(writer);
            let file_layer = if json {
                file_layer.json().boxed()
            } else {
                file_layer.boxed()
            };
            let _ = registry.with(file_layer).try_init();
            return;
        }
    }

    let _ = registry.with(Identity::new()).try_init();
}

fn build_file_writer(cfg: &LoggingConfig) -> Option<tracing_appender::non_blocking::NonBlocking> {
    let rotation = match cfg.rotation.to_lowercase().as_str() {
        "hourly" => tracing_appender::rolling::Rotation::HOURLY,
        "never" => tracing_appender::rolling::Rotation::NEVER,
        _ => tracing_appender::rolling::Rotation::DAILY,
    };

    if std::fs::create_dir_all(&cfg.dir).is_err() {
        eprintln!(
            "Failed to create log directory '{}', continuing with stdout logs",
            cfg.dir
        );
        return None;
    }

    let file_appender =
        tracing_appender::rolling::RollingFileAppender::new(rotation, &cfg.dir, &cfg.filename);
    let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

    // Keep guard alive for process lifetime
    let _leaked: &'static _ = Box::leak(Box::new(file_guard));

    Some(non_blocking)
}
