//! CLI infrastructure for the deeptictactoe trainer
//!
//! This module provides the command-line interface for training and
//! evaluating the self-play Q-learning agent.

pub mod commands;
pub mod output;
