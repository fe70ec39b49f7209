use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the snapshot file failed.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot file exists but is not a valid message array.
    #[error("Malformed snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Encoding records for writing failed.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Unknown `persist_mode` value.
    #[error("Unknown persist mode '{0}' (expected 'suffix' or 'cumulative')")]
    UnknownMode(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
