//! Q-learning with a function approximator
//!
//! Instead of a lookup table, action values come from a trainable regressor
//! behind the [`Approximator`](crate::ports::Approximator) port. Learning is
//! batched: an epoch of games is played against frozen parameters, the games
//! are turned into TD(0) regression targets, and the approximator is fitted
//! once on the whole batch.
//!
//! ## Components
//!
//! - [`features`]: (state, action) input encoding
//! - [`network`]: multilayer perceptron trained with Adam
//! - [`agent`]: epsilon-greedy policy over any approximator
//! - [`targets`]: TD(0) target construction
//!
//! ## Usage Example
//!
//! ```no_run
//! use deeptictactoe::q_learning::{NetworkConfig, QAgent, QNetwork};
//!
//! # fn main() -> deeptictactoe::Result<()> {
//! let network = QNetwork::new(NetworkConfig::default().with_seed(42))?;
//! let agent = QAgent::new(&network, 0.05)?;
//! # let _ = agent;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod features;
pub mod network;
pub mod targets;

// Public re-exports
pub use agent::{DEFAULT_AGENT_EXPLORATION, QAgent};
pub use features::{FEATURE_LEN, encode};
pub use network::{NetworkConfig, QNetwork};
pub use targets::{
    DEFAULT_GAMMA, build_training_set, build_training_set_parallel, td_targets, validate_discount,
};
