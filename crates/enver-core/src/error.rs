//! Error types for catalog resolution

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used across the core crate.
pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cache file {} is corrupt: {source}", path.display())]
    CorruptCache {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("Invalid project descriptor {}: {message}", path.display())]
    Project { path: PathBuf, message: String },

    #[error("Release API error: {0}")]
    Remote(String),

    #[error("Install registry query failed: {0}")]
    Registry(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Unknown version {0}")]
    UnknownVersion(String),

    #[error("No changeset known for {0}")]
    MissingChangeset(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CatalogError {
    /// Transient errors are recovered from by degrading to another source.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Io(_) | Self::Remote(_) | Self::Registry(_) | Self::Timeout(_)
        )
    }
}
