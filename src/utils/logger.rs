use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Timestamped log file path inside `log_dir`.
pub fn log_file_path(log_dir: &str) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    Path::new(log_dir).join(format!("clone_api_{}.log", timestamp))
}

/// Initialize the global tracing subscriber writing to a timestamped file.
/// `RUST_LOG` controls the filter; `info` when unset. Returns the path the
/// file was created at.
pub fn init_logger(log_dir: &str) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir))?;

    let log_file = log_file_path(log_dir);
    let writer = fs::File::create(&log_file)
        .with_context(|| format!("Failed to create log file: {}", log_file.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install global tracing subscriber")?;
    info!("Logger initialized, writing to {}", log_file.display());

    Ok(log_file)
}
