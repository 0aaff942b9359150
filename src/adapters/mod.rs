//! Adapters implementing domain ports.
//!
//! This module contains infrastructure implementations of the traits defined
//! in the ports module. Adapters depend on domain ports, not the other way
//! around.

pub mod in_memory_store;
pub mod msgpack_store;

pub use in_memory_store::InMemoryCheckpointStore;
pub use msgpack_store::MsgPackCheckpointStore;
