//! File-backed session store: one JSON document per session.

use std::path::PathBuf;

use astrid_core::SessionId;
use tokio::fs;

use crate::error::{StorageError, StorageResult};
use crate::session::{SessionDocument, SessionStore};

/// Persists session documents as pretty-printed JSON files under a root
/// directory, one file named by session id per session.
///
/// Writes go through a `.tmp` sibling file followed by a rename, so a
/// reader never observes a half-written document.
#[derive(Debug)]
pub struct FileSessionStore {
    root: PathBuf,
}

impl FileSessionStore {
    /// Opens a store rooted at `root`, creating the directory if it
    /// doesn't already exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Internal`] if the directory cannot be
    /// created.
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(Self { root })
    }

    fn path_for(&self, id: SessionId) -> PathBuf {
        self.root.join(format!("{}.json", id.0))
    }

    fn tmp_path_for(&self, id: SessionId) -> PathBuf {
        self.root.join(format!("{}.json.tmp", id.0))
    }
}

#[async_trait::async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, id: SessionId) -> StorageResult<Option<SessionDocument>> {
        match fs::read(self.path_for(id)).await {
            Ok(bytes) => {
                let document = serde_json::from_slice(&bytes)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some(document))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Internal(e.to_string())),
        }
    }

    async fn save(&self, id: SessionId, document: &SessionDocument) -> StorageResult<()> {
        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let tmp_path = self.tmp_path_for(id);
        fs::write(&tmp_path, &bytes)
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        fs::rename(&tmp_path, self.path_for(id))
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, id: SessionId) -> StorageResult<()> {
        match fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Internal(e.to_string())),
        }
    }
}
