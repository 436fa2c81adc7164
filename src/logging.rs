use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AppConfig;

/// Noisy dependencies, capped regardless of `log_level`
const DEPENDENCY_DIRECTIVES: &[&str] = &["sqlx=warn", "hyper=warn", "tower=warn"];

/// Filter directives: the configured level for the ledger's own targets,
/// dependencies capped at `warn`.
fn filter_directives(config: &AppConfig) -> String {
    let mut directives = vec![
        config.log_level.clone(),
        format!("{}={}", env!("CARGO_CRATE_NAME"), config.log_level),
    ];
    directives.extend(DEPENDENCY_DIRECTIVES.iter().map(|d| d.to_string()));
    directives.join(",")
}

fn rotation(name: &str) -> Rotation {
    match name {
        "minutely" => Rotation::MINUTELY,
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        _ => Rotation::NEVER,
    }
}

/// Installs the global subscriber. Keep the returned guard alive for the
/// lifetime of the process or buffered file output is lost.
///
/// `RUST_LOG`, when set, replaces the configured filter.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let file_appender = RollingFileAppender::new(
        rotation(&config.rotation),
        &config.log_dir,
        &config.log_file,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));
    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        // Transfer logs carry account ids as fields; keep them queryable
        let file_layer = fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_target(true)
            .with_writer(non_blocking);
        registry.with(file_layer).init();
    } else {
        let file_layer = fmt::layer()
            .with_target(true)
            .with_writer(non_blocking)
            .with_ansi(false);
        let stdout_layer = fmt::layer().with_target(false).compact();
        registry.with(file_layer).with(stdout_layer).init();
    }

    guard
}
