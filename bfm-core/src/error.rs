//! src/error.rs
//! ============================================================================
//! # `AppError`: Unified Error Type for the File Browser
//!
//! Every fallible operation of the navigation engine returns
//! `Result<T, AppError>`. None of these errors are fatal to the process: the
//! event loop turns them into a status-line warning and carries on.

use std::{io, path::PathBuf};
use thiserror::Error;

use crate::model::session::SessionId;

/// Unified error type for all file browser operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Error retrieving file or directory metadata.
    #[error("Filesystem metadata error on {path:?}: {source}")]
    FsMetadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Neither the requested path nor any of its ancestors could be opened.
    #[error("No readable directory along {requested:?} (gave up at {last:?})")]
    Unresolvable { requested: PathBuf, last: PathBuf },

    /// `mkdir` failed.
    #[error("Cannot create directory {path:?}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An external action could not be started.
    #[error("Failed to start `{command}`: {reason}")]
    Spawn { command: String, reason: String },

    /// An external action ran but reported failure.
    #[error("External command failed: {cmd} (exit code: {code:?}) {stderr}")]
    ExternalCmd {
        cmd: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Input validation errors
    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    /// TOML config parsing error.
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// Config file I/O error with path.
    #[error("Failed to read config file {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A command targeted a session that is no longer open.
    #[error("Session {0} is not open")]
    UnknownSession(SessionId),
}

impl AppError {
    pub fn metadata<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Self::FsMetadata {
            path: path.into(),
            source,
        }
    }

    pub fn unresolvable<P: Into<PathBuf>, Q: Into<PathBuf>>(requested: P, last: Q) -> Self {
        Self::Unresolvable {
            requested: requested.into(),
            last: last.into(),
        }
    }

    pub fn spawn<S: Into<String>, R: ToString>(command: S, reason: R) -> Self {
        Self::Spawn {
            command: command.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_input<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}
