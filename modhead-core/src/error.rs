//! Error types for modhead operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a local storage backend
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage file is locked by another process: {0}")]
    FileLocked(PathBuf),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse storage file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value stored under '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while reading or importing profile files
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("File content is not text")]
    NotText,

    #[error("Failed to read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid profile JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("File contains no profiles")]
    Empty,
}

/// Errors raised when an event targets state that does not exist
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Profile '{profile}' has no header at index {index}")]
    HeaderNotFound { profile: String, index: usize },

    #[error("Profile '{profile}' has no URL filter at index {index}")]
    UrlFilterNotFound { profile: String, index: usize },

    #[error("Cannot move profile to position {to}; collection has {len} profiles")]
    InvalidMove { to: usize, len: usize },
}
