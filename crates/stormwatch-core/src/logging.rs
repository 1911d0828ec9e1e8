//! Logging infrastructure for stormwatch.
//!
//! Structured logging through the `tracing` ecosystem. The terminal belongs to
//! the alert UI while it runs, so logs go to a JSON-lines file by default and
//! only optionally to stderr.
//!
//! ## Example
//!
//! ```no_run
//! use stormwatch_core::logging;
//!
//! let _guard = logging::init_logging(None, false, false).expect("logging init");
//! tracing::info!("stormwatch started");
//! tracing::debug!(new_alerts = 3, "merged alerts");
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{Result, StormError};

/// Guard that must be held to ensure log flushing on shutdown.
///
/// Keep this guard alive for the lifetime of the application.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the stormwatch logging system.
///
/// # Arguments
///
/// * `log_dir` - Optional custom log directory. Defaults to `~/.stormwatch/logs/`
/// * `verbose` - If true, sets log level to DEBUG. Otherwise uses INFO.
/// * `console` - Also write human-readable logs to stderr.
pub fn init_logging(log_dir: Option<PathBuf>, verbose: bool, console: bool) -> Result<LogGuard> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };

    std::fs::create_dir_all(&log_dir).map_err(|e| StormError::DirectoryCreation {
        path: log_dir.clone(),
        source: e,
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "stormwatch.log");
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stormwatch={default_level}")));

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_current_span(true)
        .with_span_list(true);

    let console_layer = console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .with_file(verbose)
            .with_line_number(verbose)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| StormError::internal(format!("logging already initialized: {e}")))?;

    tracing::debug!(log_dir = %log_dir.display(), verbose, console, "logging initialized");

    Ok(LogGuard {
        _file_guard: Some(file_guard),
    })
}

/// Initialize minimal console-only logging for testing.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Get the stormwatch home directory, `~/.stormwatch/`.
pub fn stormwatch_home() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".stormwatch"))
        .ok_or_else(|| StormError::internal("home directory could not be determined"))
}

/// Get the default log directory path, `~/.stormwatch/logs/`.
pub fn default_log_dir() -> Result<PathBuf> {
    Ok(stormwatch_home()?.join("logs"))
}

/// Get the default log file path, `~/.stormwatch/logs/stormwatch.log`.
pub fn default_log_file() -> Result<PathBuf> {
    Ok(default_log_dir()?.join("stormwatch.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_paths_nest_under_home() {
        let dir = default_log_dir().unwrap();
        assert!(dir.ends_with(".stormwatch/logs"));

        let file = default_log_file().unwrap();
        assert_eq!(file, dir.join("stormwatch.log"));
    }

    #[test]
    fn test_init_test_logging() {
        // Should not panic, even when called twice
        init_test_logging();
        init_test_logging();
    }
}
