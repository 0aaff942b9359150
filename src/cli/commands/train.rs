//! Train command - Self-play Q-learning with checkpoints

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::{
    adapters::MsgPackCheckpointStore,
    cli::output::{format_count, format_number, print_kv, print_section},
    pipeline::{
        EpochReport, LogObserver, OpponentKind, ProgressObserver, SelfPlayTrainer, TrainingConfig,
        TrainingResult,
    },
    ports::Approximator,
    q_learning::{NetworkConfig, QNetwork},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OpponentArg {
    /// The same network with a higher exploration rate
    SelfPlay,
    /// Uniformly random moves
    Random,
    /// Older checkpoints of the network
    PastCheckpoint,
}

impl From<OpponentArg> for OpponentKind {
    fn from(arg: OpponentArg) -> Self {
        match arg {
            OpponentArg::SelfPlay => OpponentKind::SelfPlay,
            OpponentArg::Random => OpponentKind::Random,
            OpponentArg::PastCheckpoint => OpponentKind::PastCheckpoint,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Train the Q-network through self-play")]
pub struct TrainArgs {
    /// Last epoch to train (inclusive)
    #[arg(long, short = 'e')]
    pub epochs: Option<u32>,

    /// Games simulated per epoch
    #[arg(long, short = 'g')]
    pub games_per_epoch: Option<usize>,

    /// Checkpoint to resume from (0 starts from fresh weights)
    #[arg(long)]
    pub start_epoch: Option<u32>,

    /// Directory holding checkpoint files
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Persist a checkpoint every this many epochs
    #[arg(long)]
    pub checkpoint_every: Option<u32>,

    /// Opponent to train against
    #[arg(long, short = 'o', value_enum)]
    pub opponent: Option<OpponentArg>,

    /// Exploration rate of the learning agent
    #[arg(long)]
    pub agent_exploration: Option<f64>,

    /// Exploration rate of the self-play opponent
    #[arg(long)]
    pub opponent_exploration: Option<f64>,

    /// Discount factor γ
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Simulate games in parallel
    #[arg(long, default_value_t = false)]
    pub parallel: bool,

    /// JSON file with a training configuration; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Show progress bar
    #[arg(long, default_value_t = false)]
    pub progress: bool,
}

impl TrainArgs {
    /// Resolve the effective configuration: defaults, then file, then flags
    fn training_config(&self) -> Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => TrainingConfig::from_json_file(path)
                .with_context(|| format!("reading training config {}", path.display()))?,
            None => TrainingConfig::default(),
        };

        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(games) = self.games_per_epoch {
            config.games_per_epoch = games;
        }
        if let Some(start_epoch) = self.start_epoch {
            config.start_epoch = start_epoch;
        }
        if let Some(every) = self.checkpoint_every {
            config.checkpoint_every = every;
        }
        if let Some(opponent) = self.opponent {
            config.opponent = opponent.into();
        }
        if let Some(rate) = self.agent_exploration {
            config.agent_exploration = rate;
        }
        if let Some(rate) = self.opponent_exploration {
            config.opponent_exploration = rate;
        }
        if let Some(gamma) = self.gamma {
            config.gamma = gamma;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.parallel {
            config.parallel = true;
        }

        config.validate().context("invalid training configuration")?;
        Ok(config)
    }
}

#[derive(Debug, Serialize)]
struct TrainingSummaryFile<'a> {
    config: &'a TrainingConfig,
    network: &'a NetworkConfig,
    total_games: usize,
    wins: usize,
    draws: usize,
    losses: usize,
    win_rate: f64,
    draw_rate: f64,
    loss_rate: f64,
    checkpoints: &'a [u32],
    epochs: &'a [EpochReport],
}

impl<'a> TrainingSummaryFile<'a> {
    fn new(config: &'a TrainingConfig, network: &'a NetworkConfig, result: &'a TrainingResult) -> Self {
        Self {
            config,
            network,
            total_games: result.total_games,
            wins: result.wins,
            draws: result.draws,
            losses: result.losses,
            win_rate: result.win_rate,
            draw_rate: result.draw_rate,
            loss_rate: result.loss_rate,
            checkpoints: &result.checkpoints,
            epochs: &result.epochs,
        }
    }
}

fn sanitize_summary_path(raw: &Path) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    // Treat trailing separators or missing filename as a directory target.
    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push("training_summary.json");
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            normalized.set_extension("json");
            normalized
        }
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let config = args.training_config()?;
    let store = MsgPackCheckpointStore::new(&args.checkpoint_dir).with_context(|| {
        format!(
            "opening checkpoint directory {}",
            args.checkpoint_dir.display()
        )
    })?;

    let mut network_config = NetworkConfig::default();
    if let Some(seed) = config.seed {
        network_config = network_config.with_seed(seed);
    }
    let mut network = QNetwork::load(&store, Some(config.start_epoch), network_config.clone())
        .with_context(|| format!("loading checkpoint {}", config.start_epoch))?;

    print_section("Self-play training");
    print_kv("Approximator", network.name());
    print_kv("Checkpoints", &args.checkpoint_dir.display().to_string());
    print_kv(
        "Epochs",
        &format!("{}..={}", config.start_epoch + 1, config.epochs),
    );
    print_kv("Games per epoch", &format_number(config.games_per_epoch));
    print_kv("Opponent", &config.opponent.to_string());

    let mut trainer = SelfPlayTrainer::new(config.clone(), &store)?;
    trainer = if args.progress {
        trainer.with_observer(Box::new(ProgressObserver::new()))
    } else {
        trainer.with_observer(Box::new(LogObserver::new()))
    };

    let result = trainer.run(&mut network).context("training failed")?;

    print_section("Training results");
    print_kv("Games", &format_number(result.total_games));
    print_kv("Wins", &format_count(result.wins, result.win_rate));
    print_kv("Draws", &format_count(result.draws, result.draw_rate));
    print_kv("Losses", &format_count(result.losses, result.loss_rate));
    if let Some(last) = result.epochs.last() {
        print_kv("Final loss", &format!("{:.5}", last.final_loss));
    }
    let checkpoints: Vec<String> = result.checkpoints.iter().map(u32::to_string).collect();
    print_kv("Checkpoints saved", &checkpoints.join(", "));

    if let Some(raw) = &args.summary {
        let path = sanitize_summary_path(raw);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating summary directory {}", parent.display()))?;
        }
        let file = File::create(&path)
            .with_context(|| format!("creating summary file {}", path.display()))?;
        to_writer_pretty(file, &TrainingSummaryFile::new(&config, &network_config, &result))?;
        println!("\nSummary written to {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: TrainArgs,
    }

    fn parse(argv: &[&str]) -> TrainArgs {
        let mut full = vec!["train"];
        full.extend_from_slice(argv);
        Wrapper::parse_from(full).args
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = parse(&[
            "--epochs",
            "4",
            "--games-per-epoch",
            "10",
            "--opponent",
            "past-checkpoint",
            "--gamma",
            "0.9",
            "--seed",
            "3",
            "--parallel",
        ]);
        let config = args.training_config().unwrap();
        assert_eq!(config.epochs, 4);
        assert_eq!(config.games_per_epoch, 10);
        assert_eq!(config.opponent, OpponentKind::PastCheckpoint);
        assert_eq!(config.gamma, 0.9);
        assert_eq!(config.seed, Some(3));
        assert!(config.parallel);
        assert_eq!(config.agent_exploration, 0.05);
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.json");
        std::fs::write(&path, r#"{"epochs": 8, "games_per_epoch": 20, "opponent": "random"}"#)
            .unwrap();

        let path_str = path.to_string_lossy().to_string();
        let args = parse(&["--config", &path_str, "--epochs", "6"]);
        let config = args.training_config().unwrap();
        assert_eq!(config.epochs, 6);
        assert_eq!(config.games_per_epoch, 20);
        assert_eq!(config.opponent, OpponentKind::Random);
    }

    #[test]
    fn test_invalid_gamma_is_rejected() {
        let args = parse(&["--gamma", "1.5"]);
        assert!(args.training_config().is_err());
    }

    #[test]
    fn test_sanitize_summary_path() {
        assert_eq!(
            sanitize_summary_path(Path::new("out/summary")),
            PathBuf::from("out/summary.json")
        );
        assert_eq!(
            sanitize_summary_path(Path::new("summary.JSON")),
            PathBuf::from("summary.JSON")
        );
    }
}
