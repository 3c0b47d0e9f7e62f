//! src/logging.rs
//! ============================================================================
//! # Logging: tracing to a rolling file
//!
//! The terminal belongs to the UI, so all tracing output goes to a daily
//! rotated file under the data directory. `RUST_LOG` overrides the level.

use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use compact_str::CompactString;
use tokio::fs as TokioFs;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter, filter::Directive, layer::SubscriberExt, util::SubscriberInitExt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    Never,
    Daily,
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub log_dir: PathBuf,
    pub log_file_prefix: CompactString,
    pub log_level: CompactString,
    pub max_log_files: usize,
    pub rotation: LogRotation,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("./logs"),
            log_file_prefix: CompactString::const_new("bfm"),
            log_level: CompactString::const_new("info"),
            max_log_files: 7,
            rotation: LogRotation::Daily,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log directory: {0}")]
    InvalidLogDirectory(String),

    #[error("Failed to create log directory: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),
}

#[derive(Debug, Default)]
pub struct LoggerBuilder {
    config: LoggerConfig,
}

impl LoggerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_log_dir(mut self, log_dir: PathBuf) -> Self {
        self.config.log_dir = log_dir;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: &str) -> Self {
        self.config.log_level = CompactString::new(level);
        self
    }

    /// Install the global subscriber. Keep the guard alive until exit or
    /// buffered lines are lost.
    pub async fn build(self) -> Result<WorkerGuard> {
        let config: LoggerConfig = self.config;
        validate_log_directory(&config.log_dir)?;
        setup_log_directory(&config.log_dir).await?;

        let rotation: Rotation = match config.rotation {
            LogRotation::Never => Rotation::NEVER,
            LogRotation::Daily => Rotation::DAILY,
        };

        let file_appender = RollingFileAppender::builder()
            .rotation(rotation)
            .filename_prefix(config.log_file_prefix.as_str())
            .filename_suffix("log")
            .max_log_files(config.max_log_files)
            .build(&config.log_dir)
            .context("Failed to create file appender")?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let env_filter: EnvFilter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::default().add_directive(
                Directive::from_str(&config.log_level).context("Invalid log level in config")?,
            ),
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .context("Failed to install global tracing subscriber")?;

        Ok(guard)
    }
}

fn validate_log_directory(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(LoggingError::InvalidLogDirectory("Empty path".to_string()).into());
    }

    if path.components().any(|c| c == Component::ParentDir) {
        return Err(LoggingError::InvalidLogDirectory(
            "Path contains parent directory references".to_string(),
        )
        .into());
    }

    Ok(())
}

async fn setup_log_directory(log_dir: &Path) -> Result<()> {
    if !log_dir.exists() {
        TokioFs::create_dir_all(log_dir)
            .await
            .map_err(LoggingError::from)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }
    Ok(())
}

pub async fn init_logging(log_dir: PathBuf) -> Result<WorkerGuard> {
    LoggerBuilder::new().with_log_dir(log_dir).build().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_directory_rules() {
        assert!(validate_log_directory(Path::new("")).is_err());
        assert!(validate_log_directory(Path::new("/var/log/../etc")).is_err());
        assert!(validate_log_directory(Path::new("/tmp/bfm/logs")).is_ok());
    }

    #[tokio::test]
    async fn creates_missing_directory() -> Result<()> {
        let tmp = tempfile::TempDir::new()?;
        let dir = tmp.path().join("a/b/logs");

        setup_log_directory(&dir).await?;
        assert!(dir.is_dir());
        Ok(())
    }
}
