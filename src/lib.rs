//! Self-play Q-learning for Tic-Tac-Toe
//!
//! This crate provides:
//! - A Tic-Tac-Toe engine that drives two policies and records each seat's turns
//! - An epsilon-greedy agent over a Q-value function approximator
//! - TD(0) target construction from finished games
//! - A self-play training loop with checkpoints and evaluation

pub mod adapters;
pub mod cli;
pub mod error;
pub mod pipeline;
pub mod policies;
pub mod ports;
pub mod q_learning;
pub mod tictactoe;

pub use error::{Error, Result};
