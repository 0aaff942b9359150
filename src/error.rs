//! Error types for the deeptictactoe crate

use thiserror::Error;

use crate::tictactoe::{Action, Seat};

/// Main error type for the deeptictactoe crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("illegal move: {seat} tried to mark {action}, but it is already marked")]
    IllegalMove { seat: Seat, action: Action },

    #[error("action ({row}, {column}) is off the board (row and column must be 0-2)")]
    InvalidAction { row: usize, column: usize },

    #[error("game already over")]
    GameOver,

    #[error("no legal actions available for {seat}")]
    NoLegalActions { seat: Seat },

    #[error("policy asked to choose from an empty action set")]
    EmptyActionSet,

    #[error("game exceeded {limit} plies without reaching a terminal board")]
    MoveLimit { limit: usize },

    #[error("exploration rate {value} must lie within [0, 1]")]
    InvalidExplorationRate { value: f64 },

    #[error("discount factor {value} must lie within (0, 1)")]
    InvalidDiscount { value: f64 },

    #[error("approximator estimated Q = {value} for {action}")]
    NonFiniteEstimate { value: f64, action: Action },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("checkpoint {id} not found")]
    CheckpointNotFound { id: u32 },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
