//! Shared logging utilities for casdrop binaries.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "casdrop=info,casdrop_ingest=info,casdrop_db=info";

/// Logging configuration shared by casdrop binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Mirror the file filter on stderr instead of warnings only.
    pub verbose: bool,
    /// Write a daily rolling log file under [`logs_dir`].
    pub file: bool,
}

/// Keeps the non-blocking file writer flushing until dropped.
#[must_use = "dropping the guard stops the log file writer"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Initialize tracing with a daily rolling file writer and stderr output.
///
/// `RUST_LOG` overrides the default filter for both layers. A log directory
/// that cannot be created downgrades to console-only logging.
pub fn init_logging(config: LogConfig<'_>) -> Result<LogGuard> {
    let file_filter = default_filter();
    let console_filter = if config.verbose {
        default_filter()
    } else {
        EnvFilter::new("warn")
    };

    let mut guard = None;
    let file_layer = if config.file {
        match ensure_logs_dir() {
            Ok(dir) => {
                let appender =
                    tracing_appender::rolling::daily(dir, format!("{}.log", sanitize_name(config.app_name)));
                let (writer, worker_guard) = tracing_appender::non_blocking(appender);
                guard = Some(worker_guard);
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_filter(file_filter),
                )
            }
            Err(err) => {
                eprintln!("Warning: file logging disabled: {err:#}");
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LogGuard { _file: guard })
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Get the casdrop home directory: `~/.casdrop`, or `CASDROP_HOME` when set.
pub fn casdrop_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("CASDROP_HOME") {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .map(|home| home.join(".casdrop"))
        .unwrap_or_else(|| PathBuf::from(".casdrop"))
}

/// Get the logs directory: `~/.casdrop/logs`
pub fn logs_dir() -> PathBuf {
    casdrop_home().join("logs")
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}
