//! TD(0) regression targets from finished games
//!
//! For every seat's list of turn records:
//!
//! - the seat's last move is regressed toward the terminal reward
//!   (+1 win, -1 loss, 0 draw);
//! - every earlier move is regressed toward
//!   `γ · max_a' Q(s', a')`, where `s'` is the state at the same seat's next
//!   turn and `a'` ranges over the actions that were legal there.
//!
//! The opponent's reply between the two turns is treated as part of the
//! environment transition.

use rayon::prelude::*;

use crate::{
    Error, Result,
    ports::{Approximator, TrainingExample},
    tictactoe::{GameHistory, Seat, TurnRecord},
};

/// Reference discount factor γ
pub const DEFAULT_GAMMA: f64 = 0.99;

/// Check that a discount factor lies strictly between 0 and 1
pub fn validate_discount(gamma: f64) -> Result<f64> {
    if gamma > 0.0 && gamma < 1.0 {
        Ok(gamma)
    } else {
        Err(Error::InvalidDiscount { value: gamma })
    }
}

/// Discounted best value available at a seat's next turn.
///
/// A NaN or infinite estimate anywhere in the successor state fails the
/// whole target rather than being skipped.
fn bootstrap(approximator: &dyn Approximator, next: &TurnRecord, gamma: f64) -> Result<f64> {
    let values = approximator.q_values(&next.state, &next.actions);
    let mut best = f64::NEG_INFINITY;
    for (&value, &action) in values.iter().zip(&next.actions) {
        if !value.is_finite() {
            return Err(Error::NonFiniteEstimate { value, action });
        }
        best = best.max(value);
    }
    Ok(gamma * best)
}

/// Training examples for one finished game, seat one's moves first
///
/// # Errors
///
/// Returns [`Error::NonFiniteEstimate`] if the approximator produces a NaN or
/// infinite Q-value for any successor action.
pub fn td_targets(
    history: &GameHistory,
    approximator: &dyn Approximator,
    gamma: f64,
) -> Result<Vec<TrainingExample>> {
    let result = history.result();
    let mut examples = Vec::with_capacity(history.total_moves());

    for seat in Seat::ALL {
        let turns = history.turns(seat);
        for (i, turn) in turns.iter().enumerate() {
            let target = match turns.get(i + 1) {
                Some(next) => bootstrap(approximator, next, gamma)?,
                None => result.reward_for(seat),
            };
            examples.push(TrainingExample {
                state: turn.state,
                action: turn.action,
                target,
            });
        }
    }

    Ok(examples)
}

/// Training examples for a whole batch of games, in game order
pub fn build_training_set(
    histories: &[GameHistory],
    approximator: &dyn Approximator,
    gamma: f64,
) -> Result<Vec<TrainingExample>> {
    let mut examples = Vec::new();
    for history in histories {
        examples.extend(td_targets(history, approximator, gamma)?);
    }
    Ok(examples)
}

/// Same as [`build_training_set`], evaluating games on the rayon pool
pub fn build_training_set_parallel(
    histories: &[GameHistory],
    approximator: &dyn Approximator,
    gamma: f64,
) -> Result<Vec<TrainingExample>> {
    let per_game: Vec<Vec<TrainingExample>> = histories
        .par_iter()
        .map(|history| td_targets(history, approximator, gamma))
        .collect::<Result<_>>()?;
    Ok(per_game.into_iter().flatten().collect())
}
