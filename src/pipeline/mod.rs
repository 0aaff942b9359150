//! Training and evaluation pipeline
//!
//! This module provides:
//! - The self-play epoch loop that turns games into TD(0) updates
//! - Greedy evaluation against fixed opponents
//! - Observers recording progress during training

pub mod evaluation;
pub mod observers;
pub mod training;

pub use evaluation::{
    EvaluationConfig, EvaluationOpponent, EvaluationResult, Evaluator, SeatAssignment,
};
// Re-export observer implementations (adapters)
pub use observers::{JsonlObserver, LogObserver, MetricsObserver, MetricsSummary, ProgressObserver};
pub use training::{
    EpochReport, OpponentKind, SelfPlayTrainer, SimulatedGame, TrainingConfig, TrainingResult,
};

pub use crate::ports::Observer;
