use std::path::PathBuf;

use thiserror::Error;

/// Startup failures. Request handling never surfaces errors to clients, so
/// every variant here is fatal for the process.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Invalid persist interval '{value}': {source}")]
    InvalidInterval {
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("Persist interval must be greater than zero")]
    ZeroInterval,

    #[error("SSL enabled but no {0} path configured")]
    MissingTlsMaterial(&'static str),
}
