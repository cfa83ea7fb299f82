use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::DomainError;

const LOG_FILE: &str = "plume.log";

/// Default filter: `level` for this crate, warnings for dependencies.
fn default_directives(level: &str) -> String {
    format!("plume={},warn", level)
}

/// Initialize console logging and, optionally, a daily-rotated JSON log file.
///
/// Returns a guard that must be kept alive for the duration of the
/// application; dropping it flushes pending file output. `RUST_LOG`
/// overrides the console filter. Calling this more than once keeps the first
/// subscriber.
pub fn init_logging(
    logs_dir: &Path,
    level: &str,
    file_logging: bool,
) -> Result<Option<WorkerGuard>, DomainError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::NONE)
        .with_filter(env_filter);

    if !file_logging {
        let _ = tracing_subscriber::registry().with(console_layer).try_init();
        tracing::info!(level = level, "Logging initialized (console only)");
        return Ok(None);
    }

    fs::create_dir_all(logs_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, logs_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(EnvFilter::new(format!("plume={}", level)));

    if tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
    {
        tracing::info!(logs_dir = ?logs_dir, level = level, "Logging initialized with file output");
    }

    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives("debug"), "plume=debug,warn");
        assert!(EnvFilter::try_new(default_directives("info")).is_ok());
    }

    #[test]
    fn test_file_logging_creates_logs_dir() {
        let logs_dir = env::temp_dir().join(format!("plume_log_test_{}", std::process::id()));
        let _ = fs::remove_dir_all(&logs_dir);

        let guard = init_logging(&logs_dir, "info", true).unwrap();
        assert!(guard.is_some());
        assert!(logs_dir.exists());

        drop(guard);
        let _ = fs::remove_dir_all(&logs_dir);
    }
}
