//! File logging. Output never goes to stdout so the TUI and CLI text stay clean.

use std::fs;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "plugin-builder.log";

/// Directory holding the daily log files.
pub fn log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "plugin-builder")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir)
}

/// `RUST_LOG` wins; otherwise only this crate at `level`.
pub fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("plugin_builder={level}")))
        .unwrap_or_else(|_| EnvFilter::new("plugin_builder=info"))
}

/// Install the global subscriber. Keep the guard alive until exit or
/// buffered lines are lost.
pub fn init(level: &str) -> Result<WorkerGuard> {
    let log_dir = log_dir();
    fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(filter(level))
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {e}"))?;

    tracing::info!("plugin-builder starting, logging to {}", log_dir.display());
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_scopes_to_crate() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert_eq!(filter("debug").to_string(), "plugin_builder=debug");
    }

    #[test]
    fn bad_level_falls_back_to_info() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert_eq!(filter("verbose").to_string(), "plugin_builder=info");
    }

    #[test]
    fn log_dir_is_absolute() {
        assert!(log_dir().is_absolute());
    }
}
