//! Evaluate command - Play a stored checkpoint greedily against opponents

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use crate::{
    adapters::MsgPackCheckpointStore,
    cli::output::{format_count, format_number, print_kv, print_section},
    pipeline::{EvaluationConfig, EvaluationOpponent, Evaluator, SeatAssignment},
    ports::CheckpointStore,
    q_learning::{NetworkConfig, QNetwork},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EvalOpponentArg {
    /// Uniformly random moves
    Random,
    /// The greedy agent itself
    #[value(name = "self")]
    SelfPlay,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SeatArg {
    One,
    Two,
    Alternate,
}

#[derive(Parser, Debug)]
#[command(about = "Evaluate a stored checkpoint")]
pub struct EvaluateArgs {
    /// Directory holding checkpoint files
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Checkpoint id to evaluate (defaults to the newest stored checkpoint)
    #[arg(long, short = 'c')]
    pub checkpoint: Option<u32>,

    /// Opponent to evaluate against
    #[arg(long, short = 'o', value_enum, default_value = "random")]
    pub opponent: EvalOpponentArg,

    /// Number of evaluation games
    #[arg(long, short = 'g', default_value_t = 1000)]
    pub games: usize,

    /// Seat of the evaluated agent
    #[arg(long, value_enum, default_value = "alternate")]
    pub agent_seat: SeatArg,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the board after every move
    #[arg(long, default_value_t = false)]
    pub show_board: bool,

    /// Pause after every move when showing the board
    #[arg(long, default_value_t = 0)]
    pub delay_ms: u64,

    /// Export results to a JSON file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

impl EvaluateArgs {
    fn evaluation_config(&self) -> EvaluationConfig {
        let mut config = EvaluationConfig::default()
            .with_games(self.games)
            .with_opponent(match self.opponent {
                EvalOpponentArg::Random => EvaluationOpponent::Random,
                EvalOpponentArg::SelfPlay => EvaluationOpponent::SelfPlay,
            })
            .with_agent_seat(match self.agent_seat {
                SeatArg::One => SeatAssignment::One,
                SeatArg::Two => SeatAssignment::Two,
                SeatArg::Alternate => SeatAssignment::Alternate,
            })
            .with_show_board(self.show_board, self.delay_ms);
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config
    }
}

pub fn execute(args: EvaluateArgs) -> Result<()> {
    let store = MsgPackCheckpointStore::new(&args.checkpoint_dir).with_context(|| {
        format!(
            "opening checkpoint directory {}",
            args.checkpoint_dir.display()
        )
    })?;

    let checkpoint = match args.checkpoint {
        Some(id) => Some(id),
        None => store.ids()?.last().copied(),
    };
    let network = QNetwork::load(&store, checkpoint, NetworkConfig::default())
        .with_context(|| format!("loading checkpoint {}", checkpoint.unwrap_or(0)))?;

    print_section("Evaluation");
    print_kv(
        "Checkpoint",
        &checkpoint.map_or_else(|| "fresh weights".to_string(), |id| id.to_string()),
    );

    let mut evaluator = Evaluator::new(args.evaluation_config())?;
    let result = evaluator.evaluate(&network)?;

    print_kv("Opponent", &result.opponent);
    print_kv("Games", &format_number(result.games));
    print_kv("Wins", &format_count(result.wins, result.win_rate));
    print_kv("Draws", &format_count(result.draws, result.draw_rate));
    print_kv("Losses", &format_count(result.losses, result.loss_rate));
    for (seat, label) in [(0, "seat one"), (1, "seat two")] {
        if result.games_by_seat[seat] > 0 {
            print_kv(
                &format!("Wins on {label}"),
                &format!(
                    "{}/{}",
                    result.wins_by_seat[seat], result.games_by_seat[seat]
                ),
            );
        }
    }

    if let Some(path) = &args.export {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating export file {}", path.display()))?;
        serde_json::to_writer_pretty(file, &result)?;
        println!("\nResults exported to {}", path.display());
    }

    Ok(())
}
