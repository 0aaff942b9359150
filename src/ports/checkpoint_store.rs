//! Checkpoint store port for approximator persistence.
//!
//! This module defines the trait boundary between the training loop and the
//! storage of parameter snapshots.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Non-negative checkpoint identifier; 0 means "freshly initialized"
pub type CheckpointId = u32;

/// Metadata about the training state captured by a checkpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// Epoch that produced the checkpoint
    pub epoch: u32,
    /// Games simulated in that epoch
    pub games: usize,
    /// Training examples consumed by the update
    pub examples: usize,
    /// Loss after the update
    pub loss: Option<f64>,
    /// Random seed used (if any)
    pub seed: Option<u64>,
    /// Name of the approximator that produced the parameters
    pub approximator: String,
    /// Seconds since the Unix epoch when saved
    pub saved_at: Option<u64>,
}

/// A versioned, opaque snapshot of approximator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    pub id: CheckpointId,
    pub parameters: Vec<u8>,
    pub metadata: CheckpointMetadata,
}

impl Checkpoint {
    /// Current checkpoint format version
    pub const VERSION: u32 = 1;

    pub fn new(id: CheckpointId, parameters: Vec<u8>, metadata: CheckpointMetadata) -> Self {
        Self {
            version: Self::VERSION,
            id,
            parameters,
            metadata,
        }
    }
}

/// Port for persisting and loading checkpoints by id.
///
/// This trait abstracts the storage mechanism, allowing different
/// implementations (MessagePack files, memory, ...) without coupling the
/// training loop to a serialization format.
///
/// # Examples
///
/// ```
/// use deeptictactoe::adapters::InMemoryCheckpointStore;
/// use deeptictactoe::ports::{Checkpoint, CheckpointMetadata, CheckpointStore};
///
/// let store = InMemoryCheckpointStore::new();
/// store.save(&Checkpoint::new(2, vec![1, 2, 3], CheckpointMetadata::default()))?;
///
/// assert!(store.contains(2));
/// assert_eq!(store.load(2)?.parameters, vec![1, 2, 3]);
/// assert!(store.load(4).is_err());
/// # Ok::<(), deeptictactoe::Error>(())
/// ```
pub trait CheckpointStore: Send + Sync {
    /// Save a checkpoint under its id, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    fn save(&self, checkpoint: &Checkpoint) -> Result<()>;

    /// Load the checkpoint with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CheckpointNotFound`](crate::Error::CheckpointNotFound)
    /// if no checkpoint has that id, or a serialization error if the stored
    /// data is corrupted.
    fn load(&self, id: CheckpointId) -> Result<Checkpoint>;

    /// Check whether a checkpoint with the given id exists
    fn contains(&self, id: CheckpointId) -> bool;

    /// All stored checkpoint ids in ascending order
    fn ids(&self) -> Result<Vec<CheckpointId>>;
}
