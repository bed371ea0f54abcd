//! Crate-wide error type.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("access denied: {0}")]
    AccessDenied(PathBuf),

    #[error("filesystem watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("malformed rename batch: {0}")]
    MalformedBatch(String),

    #[error("directory tree contract violation: {0}")]
    TreeContractViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WatchError>;
