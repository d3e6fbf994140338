//! Tracing setup.
//!
//! `cupid start` logs JSON lines to a daily-rotated file and human-readable
//! lines to stderr; one-shot commands log to stderr only. Both honour
//! `RUST_LOG` and default to `info`.

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// File name prefix of the rotated log files.
pub const LOG_FILE_PREFIX: &str = "cupid.log";

/// Keeps the background log writer alive; dropping it flushes the file.
pub struct LoggingGuard {
    _writer: WorkerGuard,
}

impl std::fmt::Debug for LoggingGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingGuard").finish_non_exhaustive()
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the long-running bot subscriber.
///
/// JSON lines go to `{log_dir}/cupid.log.YYYY-MM-DD`.
///
/// # Errors
///
/// Returns an error if `log_dir` cannot be created or a global subscriber
/// is already installed.
pub fn init_production(log_dir: &Path) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let (file_writer, writer_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX));

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_writer(file_writer),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(LoggingGuard {
        _writer: writer_guard,
    })
}

/// Install a stderr-only subscriber for one-shot commands.
///
/// Does nothing if a subscriber is already installed.
pub fn init_cli() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}
