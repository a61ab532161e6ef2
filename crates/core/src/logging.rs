//! Logging infrastructure for the science tutor.
//!
//! This module initializes the tracing subscriber for structured logging.
//! Logs go to stderr (stdout is reserved for answers) and, when a log
//! directory is given, to a daily file `rag_log_YYYYMMDD.log` inside it.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

/// Initialize the tracing subscriber.
///
/// This sets up structured logging with:
/// - Output to stderr
/// - Environment-based filtering (RUST_LOG or provided level)
/// - Optional ANSI color control
/// - An append-only daily log file when `log_dir` is set
///
/// # Arguments
/// * `log_level` - Optional log level override (e.g., "debug", "info")
/// * `no_color` - Disable colored output
/// * `log_dir` - Directory for the daily log file
pub fn init_logging(log_level: Option<&str>, no_color: bool, log_dir: Option<&Path>) -> AppResult<()> {
    // Determine the filter level
    let default_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_str = log_level.unwrap_or(&default_level);

    let env_filter = EnvFilter::try_new(filter_str)
        .map_err(|e| AppError::Config(format!("Invalid log filter: {}", e)))?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(!no_color && supports_color());

    let file_layer = match log_dir {
        Some(dir) => {
            let file = open_log_file(dir)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_target(false)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))?;

    Ok(())
}

/// Path of today's log file inside `log_dir`.
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    let date = chrono::Local::now().format("%Y%m%d");
    log_dir.join(format!("rag_log_{}.log", date))
}

fn open_log_file(log_dir: &Path) -> AppResult<File> {
    fs::create_dir_all(log_dir)
        .map_err(|e| AppError::Config(format!("Failed to create log directory {:?}: {}", log_dir, e)))?;

    let path = log_file_path(log_dir);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| AppError::Config(format!("Failed to open log file {:?}: {}", path, e)))
}

/// Check if the terminal supports color output.
fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
}
