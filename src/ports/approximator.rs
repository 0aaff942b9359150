//! Approximator port - the Q-value oracle behind the learning agent
//!
//! Any trainable regressor from (state, action) to a real value satisfies
//! this contract: a neural network, a linear model, a tree ensemble.

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    tictactoe::{Action, EncodedState},
};

/// A single supervised example produced from a finished game
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub state: EncodedState,
    pub action: Action,
    pub target: f64,
}

/// Summary of one parameter update
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    /// Number of examples the update consumed
    pub examples: usize,
    /// Mean squared error over the examples before the update
    pub initial_loss: f64,
    /// Mean squared error over the examples after the update
    pub final_loss: f64,
}

/// Approximator trait - estimates and learns action values
///
/// # Contract
///
/// - [`q_value`](Approximator::q_value) is a pure function of its inputs and
///   the current parameters.
/// - [`fit`](Approximator::fit) is the only way parameters change. Callers
///   never evaluate Q-values while a fit is running; with `&self`/`&mut self`
///   this ordering is enforced by the borrow checker.
/// - [`snapshot`](Approximator::snapshot) and
///   [`restore`](Approximator::restore) move the parameters in and out of an
///   opaque byte blob used for checkpoints.
pub trait Approximator: Send + Sync {
    /// Estimated value of taking `action` in `state`
    fn q_value(&self, state: &EncodedState, action: Action) -> f64;

    /// Estimated values for several actions in the same state.
    ///
    /// # Default Implementation
    ///
    /// Calls [`q_value`](Approximator::q_value) once per action.
    fn q_values(&self, state: &EncodedState, actions: &[Action]) -> Vec<f64> {
        actions
            .iter()
            .map(|&action| self.q_value(state, action))
            .collect()
    }

    /// Regress the approximator toward the example targets.
    ///
    /// Minibatch size and the number of passes are internal hyperparameters.
    fn fit(&mut self, examples: &[TrainingExample]) -> Result<FitReport>;

    /// Serialize the current parameters
    fn snapshot(&self) -> Result<Vec<u8>>;

    /// Replace the current parameters with a snapshot
    fn restore(&mut self, snapshot: &[u8]) -> Result<()>;

    /// Get the approximator's name.
    fn name(&self) -> &str;
}
