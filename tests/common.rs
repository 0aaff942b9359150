//! Common test utilities for the deeptictactoe test suite.
//!
//! This module provides scripted policies, a fixed-value approximator and
//! small network constructors used across multiple tests.

#![allow(dead_code)]

use std::sync::Mutex;

use deeptictactoe::{
    Error, Result,
    ports::{Approximator, FitReport, Policy, TrainingExample},
    q_learning::{NetworkConfig, QNetwork},
    tictactoe::{Action, EncodedState, Game, GameHistory},
};
use rand::{RngCore, SeedableRng, rngs::StdRng};

/// Policy replaying a fixed list of cell indices in order.
pub struct Scripted {
    moves: Mutex<Vec<usize>>,
}

impl Scripted {
    pub fn new(moves: &[usize]) -> Self {
        let mut moves = moves.to_vec();
        moves.reverse();
        Self {
            moves: Mutex::new(moves),
        }
    }
}

impl Policy for Scripted {
    fn select_move(
        &self,
        _state: &EncodedState,
        _actions: &[Action],
        _rng: &mut dyn RngCore,
    ) -> Result<Action> {
        let next = self
            .moves
            .lock()
            .map_err(|_| Error::EmptyActionSet)?
            .pop()
            .ok_or(Error::EmptyActionSet)?;
        Action::from_index(next)
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}

/// Play a game from interleaved cell indices (seat one first).
pub fn play_scripted(moves: &[usize]) -> GameHistory {
    let one: Vec<usize> = moves.iter().copied().step_by(2).collect();
    let two: Vec<usize> = moves.iter().copied().skip(1).step_by(2).collect();
    let seat_one = Scripted::new(&one);
    let seat_two = Scripted::new(&two);
    let mut rng = StdRng::seed_from_u64(0);
    Game::new(&seat_one, &seat_two)
        .play(&mut rng)
        .expect("scripted game should finish")
}

/// Approximator returning a fixed value per cell, whatever the state.
#[derive(Debug, Clone)]
pub struct CellValues(pub [f64; 9]);

impl Approximator for CellValues {
    fn q_value(&self, _state: &EncodedState, action: Action) -> f64 {
        self.0[action.index()]
    }

    fn fit(&mut self, _examples: &[TrainingExample]) -> Result<FitReport> {
        Ok(FitReport::default())
    }

    fn snapshot(&self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }

    fn restore(&mut self, _snapshot: &[u8]) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "CellValues"
    }
}

/// Seeded network small enough for fast tests.
pub fn small_network(seed: u64) -> QNetwork {
    QNetwork::new(small_network_config(seed)).expect("valid network config")
}

pub fn small_network_config(seed: u64) -> NetworkConfig {
    NetworkConfig::default()
        .with_seed(seed)
        .with_hidden_layers(vec![12])
        .with_passes(1)
        .with_batch_size(32)
}
