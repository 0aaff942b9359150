//! In-memory checkpoint store for testing.
//!
//! This adapter keeps serialized checkpoints in a shared map, enabling fast
//! tests without any file system I/O.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{
    Result,
    error::Error,
    ports::{Checkpoint, CheckpointId, CheckpointStore},
};

/// In-memory checkpoint store.
///
/// Checkpoints are stored as MessagePack bytes, so a save/load round trip
/// exercises the same serialization as the file-backed store.
///
/// # Thread Safety
///
/// All clones share the same underlying storage.
#[derive(Clone, Default)]
pub struct InMemoryCheckpointStore {
    storage: Arc<Mutex<BTreeMap<CheckpointId, Vec<u8>>>>,
}

impl InMemoryCheckpointStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of checkpoints currently stored.
    pub fn count(&self) -> usize {
        self.storage().len()
    }

    /// Remove all stored checkpoints.
    pub fn clear(&self) {
        self.storage().clear();
    }

    fn storage(&self) -> MutexGuard<'_, BTreeMap<CheckpointId, Vec<u8>>> {
        // A poisoned map still holds complete entries; each insert is atomic.
        self.storage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let bytes = rmp_serde::to_vec(checkpoint).map_err(|e| Error::SerializationContext {
            operation: "serialize checkpoint for in-memory storage".to_string(),
            message: e.to_string(),
        })?;

        self.storage().insert(checkpoint.id, bytes);
        Ok(())
    }

    fn load(&self, id: CheckpointId) -> Result<Checkpoint> {
        let storage = self.storage();
        let bytes = storage.get(&id).ok_or(Error::CheckpointNotFound { id })?;

        rmp_serde::from_slice(bytes).map_err(|e| Error::SerializationContext {
            operation: "deserialize checkpoint from in-memory storage".to_string(),
            message: e.to_string(),
        })
    }

    fn contains(&self, id: CheckpointId) -> bool {
        self.storage().contains_key(&id)
    }

    fn ids(&self) -> Result<Vec<CheckpointId>> {
        Ok(self.storage().keys().copied().collect())
    }
}
