//! deeptictactoe CLI - Self-play Q-learning for Tic-Tac-Toe
//!
//! This CLI provides:
//! - Training a Q-network through self-play with periodic checkpoints
//! - Evaluating stored checkpoints against a random player or itself

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "deeptictactoe")]
#[command(version, about = "Self-play Q-learning for Tic-Tac-Toe", long_about = None)]
struct Cli {
    /// Log debug output (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the Q-network through self-play
    Train(Box<deeptictactoe::cli::commands::train::TrainArgs>),

    /// Evaluate a stored checkpoint
    Evaluate(deeptictactoe::cli::commands::evaluate::EvaluateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Train(args) => deeptictactoe::cli::commands::train::execute(*args),
        Commands::Evaluate(args) => deeptictactoe::cli::commands::evaluate::execute(args),
    }
}
