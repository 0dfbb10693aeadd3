//! Error types for the repository watcher.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from watcher setup and subscription management.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Repos root does not exist: {path}")]
    RootMissing { path: PathBuf },

    #[error("Repos root is not a directory: {path}")]
    RootNotDirectory { path: PathBuf },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("Cannot unwatch path {path}: {reason}")]
    PathUnwatchFailed { path: PathBuf, reason: String },

    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}

/// Errors from running the configured command.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Failed to start `{command}` in {dir}: {source}")]
    Spawn {
        command: String,
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` in {dir} exited with {status}: {stderr}")]
    Failed {
        command: String,
        dir: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },
}
