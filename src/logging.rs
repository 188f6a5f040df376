//! Structured logging via `tracing-subscriber`, optionally recorded to disk
//! with `tracing-appender`.
//!
//! Every run logs human-readable events to stderr, filtered by `RUST_LOG`
//! (default `info`). With a log directory the same events are also written as
//! JSON lines to a daily-rotated file, which keeps the per-persona failure
//! records of long batch runs around after the terminal is gone.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// File name prefix of recorded logs; the appender adds `.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "persona-sim.log";

const DEFAULT_FILTER: &str = "info";

/// Keeps the background log writer alive.
///
/// Dropping it flushes buffered JSON lines and closes the file, so hold it
/// until the run's result table has been written.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber for one run.
///
/// Returns a guard only when `log_dir` is given.
///
/// # Errors
///
/// See [`init_production`].
pub fn init(log_dir: Option<&Path>) -> anyhow::Result<Option<LoggingGuard>> {
    match log_dir {
        Some(dir) => init_production(dir).map(Some),
        None => {
            init_cli();
            Ok(None)
        }
    }
}

/// Log to stderr and to `{logs_dir}/persona-sim.log.YYYY-MM-DD` as JSON.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or a global
/// subscriber is already installed. The directory is created first either
/// way.
pub fn init_production(logs_dir: &Path) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(logs_dir).map_err(|e| {
        anyhow::anyhow!(
            "failed to create logs directory {}: {e}",
            logs_dir.display()
        )
    })?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX));

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(LoggingGuard { _guard: guard })
}

/// Log to stderr only.
///
/// A second call in the same process is a no-op.
pub fn init_cli() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}
