//! Observer port - abstraction for training observation
//!
//! This port defines the interface for observing self-play training,
//! allowing progress display, logging and metrics without coupling the
//! epoch loop to a specific output.

use crate::{
    Result,
    pipeline::EpochReport,
    ports::CheckpointId,
    tictactoe::{GameResult, Seat},
};

/// Observer trait for monitoring training
///
/// # Event Sequence
///
/// 1. `on_training_start(epochs, games_per_epoch)` - Once at the beginning
/// 2. For each epoch:
///    - `on_epoch_start(epoch)`
///    - `on_game_end(...)` - For each simulated game, in game order
///    - `on_checkpoint_saved(id)` - When the epoch persists a checkpoint
///    - `on_epoch_end(report)`
/// 3. `on_training_end()` - Once at the end
///
/// # Examples
///
/// ```
/// use deeptictactoe::{
///     ports::Observer,
///     tictactoe::{GameResult, Seat},
/// };
///
/// struct CountingObserver {
///     games: usize,
/// }
///
/// impl Observer for CountingObserver {
///     fn on_game_end(
///         &mut self,
///         _epoch: u32,
///         _game_index: usize,
///         _agent_seat: Seat,
///         _result: GameResult,
///     ) -> deeptictactoe::Result<()> {
///         self.games += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called when training starts with the number of epochs still to run.
    fn on_training_start(&mut self, _epochs: u32, _games_per_epoch: usize) -> Result<()> {
        Ok(())
    }

    /// Called before an epoch's games are simulated.
    fn on_epoch_start(&mut self, _epoch: u32) -> Result<()> {
        Ok(())
    }

    /// Called once per simulated game, as soon as it finishes in sequential
    /// runs and in game order after the batch in parallel runs.
    ///
    /// # Parameters
    ///
    /// * `epoch` - Current epoch
    /// * `game_index` - Index of the game within the epoch (0-based)
    /// * `agent_seat` - Seat the learning agent occupied
    /// * `result` - Final result of the game
    fn on_game_end(
        &mut self,
        _epoch: u32,
        _game_index: usize,
        _agent_seat: Seat,
        _result: GameResult,
    ) -> Result<()> {
        Ok(())
    }

    /// Called after a checkpoint was persisted.
    fn on_checkpoint_saved(&mut self, _id: CheckpointId) -> Result<()> {
        Ok(())
    }

    /// Called after the epoch's parameter update.
    fn on_epoch_end(&mut self, _report: &EpochReport) -> Result<()> {
        Ok(())
    }

    /// Called when training completes.
    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}
