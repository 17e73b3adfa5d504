//! In-memory session store, for tests and ephemeral runs.

use std::collections::HashMap;

use astrid_core::SessionId;
use tokio::sync::RwLock;

use crate::error::StorageResult;
use crate::session::{SessionDocument, SessionStore};

/// Keeps session documents in a process-local map. Nothing survives a
/// restart; `save` is durable only for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    documents: RwLock<HashMap<SessionId, SessionDocument>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: SessionId) -> StorageResult<Option<SessionDocument>> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn save(&self, id: SessionId, document: &SessionDocument) -> StorageResult<()> {
        self.documents.write().await.insert(id, document.clone());
        Ok(())
    }

    async fn delete(&self, id: SessionId) -> StorageResult<()> {
        self.documents.write().await.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astrid_core::Timestamp;
    use chrono::Utc;

    fn now() -> Timestamp {
        Utc::now()
    }

    #[tokio::test]
    async fn round_trips_a_document() {
        let store = MemorySessionStore::new();
        let id = SessionId::new();
        let doc = SessionDocument::new(now());

        store.save(id, &doc).await.unwrap();
        let loaded = store.load(id).await.unwrap().unwrap();
        assert_eq!(loaded.version, doc.version);
        assert_eq!(loaded.metrics, doc.metrics);
    }

    #[tokio::test]
    async fn missing_session_loads_none() {
        let store = MemorySessionStore::new();
        assert!(store.load(SessionId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_the_document() {
        let store = MemorySessionStore::new();
        let id = SessionId::new();
        store.save(id, &SessionDocument::new(now())).await.unwrap();

        store.delete(id).await.unwrap();
        assert!(store.load(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_of_unknown_session_is_not_an_error() {
        let store = MemorySessionStore::new();
        store.delete(SessionId::new()).await.unwrap();
    }

    #[tokio::test]
    async fn save_overwrites_an_existing_document() {
        let store = MemorySessionStore::new();
        let id = SessionId::new();
        let mut doc = SessionDocument::new(now());
        store.save(id, &doc).await.unwrap();

        doc.metrics.llm_calls = 3;
        store.save(id, &doc).await.unwrap();

        let loaded = store.load(id).await.unwrap().unwrap();
        assert_eq!(loaded.metrics.llm_calls, 3);
    }
}
