//! Error types and per-file results for the filter config loader.

use std::path::PathBuf;

use crate::error::CompileError;

/// Errors raised while reading or compiling filter configuration files.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document header problems (wrong kind, empty id, unsupported extension).
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Notify watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// Result alias for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Outcome of loading a single file.
#[derive(Debug)]
pub struct LoadResult {
    pub path: PathBuf,
    pub status: LoadStatus,
}

#[derive(Debug)]
pub enum LoadStatus {
    /// Document compiled and installed under `plan_id`.
    Loaded { plan_id: String },
    /// Dotfile, unsupported extension or disabled document.
    Skipped { reason: String },
    /// Parse, validation or compile error.
    Failed { error: String },
}
