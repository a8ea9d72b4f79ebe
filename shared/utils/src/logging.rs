//! Logging setup for the importer binaries.
//!
//! stdout carries the import report, so log lines go to stderr unless
//! `logging.file_path` names a file.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let log_file = config.file_path.as_deref().map(open_log_file).transpose()?;
    let json = config.format.eq_ignore_ascii_case("json");
    let registry = tracing_subscriber::registry().with(env_filter);

    match (json, log_file) {
        (true, Some(file)) => registry
            .with(fmt::layer().json().with_target(false).with_writer(Mutex::new(file)))
            .try_init(),
        (true, None) => registry
            .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr))
            .try_init(),
        (false, Some(file)) => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .try_init(),
        (false, None) => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")?;

    tracing::debug!(level = %config.level, format = %config.format, "logging initialized");
    Ok(())
}

fn open_log_file(path: &str) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path))
}
