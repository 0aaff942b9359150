//! Policy port - anything that can pick a move for a seat
//!
//! The game engine holds two opaque policies and never inspects their
//! concrete type. Implementations include:
//! - Uniform random play
//! - Epsilon-greedy play over a Q-value approximator

use rand::RngCore;

use crate::{
    Result,
    tictactoe::{Action, EncodedState},
};

/// Policy trait - chooses one action from the legal action set
///
/// Randomness is injected per call, so a policy can be shared immutably
/// between both seats of a game, or between games simulated in parallel, and
/// still be reproduced exactly under a seeded rng.
///
/// # Examples
///
/// ```
/// use deeptictactoe::{
///     ports::Policy,
///     tictactoe::{Action, EncodedState},
/// };
/// use rand::RngCore;
///
/// /// Always takes the first empty cell
/// struct FirstFree;
///
/// impl Policy for FirstFree {
///     fn select_move(
///         &self,
///         _state: &EncodedState,
///         actions: &[Action],
///         _rng: &mut dyn RngCore,
///     ) -> deeptictactoe::Result<Action> {
///         actions
///             .first()
///             .copied()
///             .ok_or(deeptictactoe::Error::EmptyActionSet)
///     }
///
///     fn name(&self) -> &str {
///         "FirstFree"
///     }
/// }
/// ```
pub trait Policy: Send + Sync {
    /// Select an action for the encoded state.
    ///
    /// `state` is encoded relative to the seat about to move and `actions`
    /// holds the empty cells in row-major order.
    ///
    /// # Errors
    ///
    /// Returns an error if `actions` is empty; the engine only asks while a
    /// game is in progress, so this signals a broken caller.
    fn select_move(
        &self,
        state: &EncodedState,
        actions: &[Action],
        rng: &mut dyn RngCore,
    ) -> Result<Action>;

    /// Get the policy's name.
    ///
    /// Used for identification in evaluation reports and logging.
    fn name(&self) -> &str;
}
