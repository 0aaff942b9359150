//! Epsilon-greedy agent over a Q-value approximator
//!
//! The agent borrows its approximator immutably, so the same instance can sit
//! in both seats of a self-play game and every game of a parallel epoch sees
//! the same frozen parameters.

use rand::{Rng, RngCore};

use crate::{
    Error, Result,
    policies::random::choose_uniform,
    ports::{Approximator, Policy},
    tictactoe::{Action, EncodedState},
};

/// Exploration rate used for the learning agent during training
pub const DEFAULT_AGENT_EXPLORATION: f64 = 0.05;

/// Epsilon-greedy action selection
///
/// With probability `exploration_rate` a uniformly random legal action is
/// played; otherwise the action with the highest estimated Q-value. Ties go
/// to the first maximum in row-major order.
pub struct QAgent<'a> {
    approximator: &'a dyn Approximator,
    exploration_rate: f64,
}

impl<'a> QAgent<'a> {
    /// Create an agent, rejecting rates outside `[0, 1]`
    pub fn new(approximator: &'a dyn Approximator, exploration_rate: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&exploration_rate) {
            return Err(Error::InvalidExplorationRate {
                value: exploration_rate,
            });
        }
        Ok(Self {
            approximator,
            exploration_rate,
        })
    }

    /// Deterministic agent for evaluation
    pub fn greedy(approximator: &'a dyn Approximator) -> Self {
        Self {
            approximator,
            exploration_rate: 0.0,
        }
    }

    pub fn exploration_rate(&self) -> f64 {
        self.exploration_rate
    }

    /// Highest-valued action; NaN estimates never win
    pub fn greedy_action(&self, state: &EncodedState, actions: &[Action]) -> Result<Action> {
        let values = self.approximator.q_values(state, actions);
        let mut best: Option<(Action, f64)> = None;
        for (&action, value) in actions.iter().zip(values) {
            if value.is_nan() {
                continue;
            }
            if best.is_none_or(|(_, current)| value > current) {
                best = Some((action, value));
            }
        }
        best.map(|(action, _)| action)
            .or_else(|| actions.first().copied())
            .ok_or(Error::EmptyActionSet)
    }
}

impl Policy for QAgent<'_> {
    fn select_move(
        &self,
        state: &EncodedState,
        actions: &[Action],
        rng: &mut dyn RngCore,
    ) -> Result<Action> {
        if actions.is_empty() {
            return Err(Error::EmptyActionSet);
        }
        // One draw per decision keeps the rng stream independent of the rate
        let u: f64 = rng.random();
        if self.exploration_rate > 0.0 && u <= self.exploration_rate {
            choose_uniform(actions, rng)
        } else {
            self.greedy_action(state, actions)
        }
    }

    fn name(&self) -> &str {
        "QAgent"
    }
}
