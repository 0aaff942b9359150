//! Observer pattern for training pipelines
//!
//! Observers allow composable data collection during training without coupling
//! the epoch loop to specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::training::EpochReport;
use crate::{
    Result,
    ports::{CheckpointId, Observer},
    tictactoe::{GameResult, Seat},
};

/// Progress bar observer - Shows training progress across all epochs
///
/// The bar advances per game. With parallel simulation the games of an
/// epoch are reported together once the batch completes.
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    games_per_epoch: usize,
    completed_epochs: usize,
    wins: usize,
    draws: usize,
    losses: usize,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            games_per_epoch: 0,
            completed_epochs: 0,
            wins: 0,
            draws: 0,
            losses: 0,
        }
    }

    fn message(&self) -> String {
        format!("{} D:{} L:{}", self.wins, self.draws, self.losses)
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, epochs: u32, games_per_epoch: usize) -> Result<()> {
        let pb = ProgressBar::new(epochs as u64 * games_per_epoch as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} games {prefix} (W:{msg})",
                )
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.games_per_epoch = games_per_epoch;
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_epoch_start(&mut self, epoch: u32) -> Result<()> {
        self.wins = 0;
        self.draws = 0;
        self.losses = 0;
        if let Some(pb) = &self.progress_bar {
            pb.set_prefix(format!("epoch {epoch}"));
        }
        Ok(())
    }

    fn on_game_end(
        &mut self,
        _epoch: u32,
        game_index: usize,
        agent_seat: Seat,
        result: GameResult,
    ) -> Result<()> {
        match result.winner() {
            None => self.draws += 1,
            Some(winner) if winner == agent_seat => self.wins += 1,
            Some(_) => self.losses += 1,
        }

        if let Some(pb) = &self.progress_bar {
            let done = self.completed_epochs * self.games_per_epoch + game_index + 1;
            pb.set_position(done as u64);
            pb.set_message(self.message());
        }
        Ok(())
    }

    fn on_epoch_end(&mut self, _report: &EpochReport) -> Result<()> {
        self.completed_epochs += 1;
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message());
        }
        Ok(())
    }
}

/// Log observer - Reports checkpoints and epoch summaries through `log`
#[derive(Debug, Default)]
pub struct LogObserver {
    epochs: u32,
}

impl LogObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Observer for LogObserver {
    fn on_training_start(&mut self, epochs: u32, games_per_epoch: usize) -> Result<()> {
        self.epochs = epochs;
        info!("starting {epochs} epochs of {games_per_epoch} games");
        Ok(())
    }

    fn on_epoch_start(&mut self, epoch: u32) -> Result<()> {
        debug!("simulating epoch {epoch}");
        Ok(())
    }

    fn on_checkpoint_saved(&mut self, id: CheckpointId) -> Result<()> {
        info!("checkpoint {id} saved");
        Ok(())
    }

    fn on_epoch_end(&mut self, report: &EpochReport) -> Result<()> {
        info!(
            "epoch {} done: win rate {:.3}, loss {:.5}",
            report.epoch,
            report.win_rate(),
            report.final_loss
        );
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        info!("training finished after {} epochs", self.epochs);
        Ok(())
    }
}

/// Metrics observer - Tracks training metrics
pub struct MetricsObserver {
    wins: usize,
    draws: usize,
    losses: usize,
    total_games: usize,
    epochs: Vec<EpochReport>,
}

impl MetricsObserver {
    /// Create a new metrics observer
    pub fn new() -> Self {
        Self {
            wins: 0,
            draws: 0,
            losses: 0,
            total_games: 0,
            epochs: Vec::new(),
        }
    }

    /// Get current win rate
    pub fn win_rate(&self) -> f64 {
        if self.total_games == 0 {
            0.0
        } else {
            self.wins as f64 / self.total_games as f64
        }
    }

    /// Get current draw rate
    pub fn draw_rate(&self) -> f64 {
        if self.total_games == 0 {
            0.0
        } else {
            self.draws as f64 / self.total_games as f64
        }
    }

    /// Get current loss rate
    pub fn loss_rate(&self) -> f64 {
        if self.total_games == 0 {
            0.0
        } else {
            self.losses as f64 / self.total_games as f64
        }
    }

    /// Epoch reports seen so far
    pub fn epochs(&self) -> &[EpochReport] {
        &self.epochs
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_games: self.total_games,
            wins: self.wins,
            draws: self.draws,
            losses: self.losses,
            win_rate: self.win_rate(),
            draw_rate: self.draw_rate(),
            loss_rate: self.loss_rate(),
            last_loss: self.epochs.last().map(|e| e.final_loss),
        }
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_games: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub draw_rate: f64,
    pub loss_rate: f64,
    pub last_loss: Option<f64>,
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for MetricsObserver {
    fn on_game_end(
        &mut self,
        _epoch: u32,
        _game_index: usize,
        agent_seat: Seat,
        result: GameResult,
    ) -> Result<()> {
        self.total_games += 1;
        match result.winner() {
            None => self.draws += 1,
            Some(winner) if winner == agent_seat => self.wins += 1,
            Some(_) => self.losses += 1,
        }
        Ok(())
    }

    fn on_epoch_end(&mut self, report: &EpochReport) -> Result<()> {
        self.epochs.push(report.clone());
        Ok(())
    }
}

/// JSONL observer - Writes one epoch report per line
pub struct JsonlObserver {
    writer: BufWriter<File>,
}

impl JsonlObserver {
    /// Create a new JSONL observer
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl Observer for JsonlObserver {
    fn on_epoch_end(&mut self, report: &EpochReport) -> Result<()> {
        serde_json::to_writer(&mut self.writer, report)?;
        writeln!(&mut self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(epoch: u32) -> EpochReport {
        EpochReport {
            epoch,
            games: 2,
            wins: 1,
            draws: 1,
            losses: 0,
            examples: 9,
            initial_loss: 0.4,
            final_loss: 0.2,
            checkpoint: None,
        }
    }

    #[test]
    fn test_metrics_observer_counts_from_agent_seat() {
        let mut observer = MetricsObserver::new();
        observer
            .on_game_end(1, 0, Seat::One, GameResult::SeatOneWin)
            .unwrap();
        observer
            .on_game_end(1, 1, Seat::Two, GameResult::SeatOneWin)
            .unwrap();
        observer.on_game_end(1, 2, Seat::Two, GameResult::Draw).unwrap();
        observer.on_epoch_end(&report(1)).unwrap();

        let summary = observer.summary();
        assert_eq!(summary.total_games, 3);
        assert_eq!((summary.wins, summary.draws, summary.losses), (1, 1, 1));
        assert_eq!(summary.last_loss, Some(0.2));
        assert_eq!(observer.epochs().len(), 1);
    }

    #[test]
    fn test_jsonl_observer_writes_one_line_per_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epochs.jsonl");
        {
            let mut observer = JsonlObserver::new(&path).unwrap();
            observer.on_epoch_end(&report(1)).unwrap();
            observer.on_epoch_end(&report(2)).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<EpochReport> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines, vec![report(1), report(2)]);
    }
}
