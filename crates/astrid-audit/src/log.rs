//! In-memory audit log with an optional append-only file sink.

use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use astrid_core::SessionId;

use crate::entry::{AuditAction, AuditEntry, AuditOutcome};
use crate::error::{AuditError, AuditResult};

/// Default capacity of the in-memory ring buffer.
const DEFAULT_RING_CAPACITY: usize = 10_000;

struct Inner {
    ring: VecDeque<AuditEntry>,
    capacity: usize,
    next_sequence: u64,
    sink_path: Option<PathBuf>,
}

/// Append-only audit log.
///
/// Entries accumulate in a bounded in-memory ring (oldest entries are
/// dropped once `capacity` is exceeded) and, if a sink path is configured,
/// are also appended as newline-delimited JSON to a file. The ring is what
/// callers query; the file sink is a durable record of everything that was
/// ever appended, including entries since evicted from the ring.
pub struct AuditLog {
    inner: Mutex<Inner>,
}

impl AuditLog {
    /// Create an in-memory-only audit log with the default ring capacity.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_capacity(DEFAULT_RING_CAPACITY)
    }

    /// Create an in-memory-only audit log with a specific ring capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                ring: VecDeque::with_capacity(capacity.min(1024)),
                capacity,
                next_sequence: 0,
                sink_path: None,
            }),
        }
    }

    /// Create an audit log that also appends entries to a file sink.
    ///
    /// The file is opened in append mode on first write and created if it
    /// does not exist.
    #[must_use]
    pub fn with_file_sink(capacity: usize, path: impl AsRef<Path>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                ring: VecDeque::with_capacity(capacity.min(1024)),
                capacity,
                next_sequence: 0,
                sink_path: Some(path.as_ref().to_path_buf()),
            }),
        }
    }

    /// Append an entry for the given session and action, assigning the
    /// next sequence number.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Io`] if the file sink is configured and the
    /// write fails, or [`AuditError::Serialization`] if the entry cannot
    /// be serialized for the sink.
    pub fn append(
        &self,
        session_id: SessionId,
        action: AuditAction,
        outcome: AuditOutcome,
    ) -> AuditResult<AuditEntry> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let sequence = inner.next_sequence;
        inner.next_sequence += 1;

        let entry = AuditEntry::new(session_id, sequence, action, outcome);

        if let Some(path) = inner.sink_path.clone() {
            Self::write_to_sink(&path, &entry)?;
        }

        if inner.ring.len() >= inner.capacity {
            inner.ring.pop_front();
        }
        inner.ring.push_back(entry.clone());

        tracing::debug!(sequence, action = %entry.action.description(), "audit entry recorded");

        Ok(entry)
    }

    fn write_to_sink(path: &Path, entry: &AuditEntry) -> AuditResult<()> {
        let line =
            serde_json::to_string(entry).map_err(|e| AuditError::Serialization(e.to_string()))?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| AuditError::Io(e.to_string()))?;

        writeln!(file, "{line}").map_err(|e| AuditError::Io(e.to_string()))?;
        Ok(())
    }

    /// Return all entries currently held in the ring, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.ring.iter().cloned().collect()
    }

    /// Return entries for a single session, oldest first.
    #[must_use]
    pub fn session_entries(&self, session_id: &SessionId) -> Vec<AuditEntry> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .ring
            .iter()
            .filter(|e| &e.session_id == session_id)
            .cloned()
            .collect()
    }

    /// Number of entries currently held in the ring.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.ring.len()
    }

    /// Whether the ring is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up an entry by its sequence number.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::EntryNotFound`] if the sequence number is not
    /// present in the ring (either never recorded or already evicted).
    pub fn get(&self, sequence: u64) -> AuditResult<AuditEntry> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .ring
            .iter()
            .find(|e| e.sequence == sequence)
            .cloned()
            .ok_or(AuditError::EntryNotFound { sequence })
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog").finish_non_exhaustive()
    }
}
