use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;
use webchat_shared::{to_pretty_json, Message};

use crate::error::{Result, StoreError};

/// The on-disk message snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. `Ok(None)` means the file does not exist yet.
    pub async fn load(&self) -> Result<Option<Vec<Message>>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let records: Vec<Message> =
            serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), count = records.len(), "Loaded snapshot");
        Ok(Some(records))
    }

    /// Replace the file contents with `records`.
    pub async fn write(&self, records: &[Message]) -> Result<()> {
        let json = to_pretty_json(records)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        fs::write(&self.path, json)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), count = records.len(), "Wrote snapshot");
        Ok(())
    }
}
