//! Ports (trait boundaries) for external collaborators.
//!
//! The game engine and training loop only talk to policies, approximators,
//! checkpoint stores and observers through these traits. Concrete
//! implementations live in `policies`, `q_learning`, `adapters` and
//! `pipeline::observers`.

pub mod approximator;
pub mod checkpoint_store;
pub mod observer;
pub mod policy;

pub use approximator::{Approximator, FitReport, TrainingExample};
pub use checkpoint_store::{Checkpoint, CheckpointId, CheckpointMetadata, CheckpointStore};
pub use observer::Observer;
pub use policy::Policy;
