//! Evaluation of a trained approximator
//!
//! The agent plays greedily (no exploration) against a fixed opponent and
//! the results are tallied from its seat.

use std::time::Duration;

use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    policies::RandomPolicy,
    ports::{Approximator, Policy},
    q_learning::QAgent,
    tictactoe::{Game, GameResult, PlayOptions, Seat},
};

/// Opponent faced during evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationOpponent {
    /// Uniformly random moves
    #[default]
    Random,
    /// The greedy agent itself
    SelfPlay,
}

/// Seat the evaluated agent occupies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeatAssignment {
    One,
    Two,
    /// Seat one on even games, seat two on odd games
    #[default]
    Alternate,
}

impl SeatAssignment {
    pub fn seat_for(self, game_index: usize) -> Seat {
        match self {
            SeatAssignment::One => Seat::One,
            SeatAssignment::Two => Seat::Two,
            SeatAssignment::Alternate if game_index % 2 == 0 => Seat::One,
            SeatAssignment::Alternate => Seat::Two,
        }
    }
}

/// Evaluation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Number of games to play
    pub games: usize,
    pub opponent: EvaluationOpponent,
    pub agent_seat: SeatAssignment,
    /// Random seed for the opponent
    pub seed: Option<u64>,
    /// Print the board after every move
    pub show_board: bool,
    /// Pause after every move when showing the board
    pub delay_ms: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            games: 1000,
            opponent: EvaluationOpponent::Random,
            agent_seat: SeatAssignment::Alternate,
            seed: None,
            show_board: false,
            delay_ms: 0,
        }
    }
}

impl EvaluationConfig {
    pub fn with_games(mut self, games: usize) -> Self {
        self.games = games;
        self
    }

    pub fn with_opponent(mut self, opponent: EvaluationOpponent) -> Self {
        self.opponent = opponent;
        self
    }

    pub fn with_agent_seat(mut self, agent_seat: SeatAssignment) -> Self {
        self.agent_seat = agent_seat;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_show_board(mut self, show_board: bool, delay_ms: u64) -> Self {
        self.show_board = show_board;
        self.delay_ms = delay_ms;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.games == 0 {
            return Err(Error::InvalidConfiguration {
                message: "evaluation needs at least one game".to_string(),
            });
        }
        Ok(())
    }
}

/// Tallied evaluation outcome from the agent's seat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub agent: String,
    pub opponent: String,
    pub games: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub draw_rate: f64,
    pub loss_rate: f64,
    /// Wins with the agent on seat one and seat two
    pub wins_by_seat: [usize; 2],
    /// Games with the agent on seat one and seat two
    pub games_by_seat: [usize; 2],
}

impl EvaluationResult {
    fn new(agent: String, opponent: String) -> Self {
        Self {
            agent,
            opponent,
            games: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            win_rate: 0.0,
            draw_rate: 0.0,
            loss_rate: 0.0,
            wins_by_seat: [0; 2],
            games_by_seat: [0; 2],
        }
    }

    fn record(&mut self, agent_seat: Seat, result: GameResult) {
        self.games += 1;
        self.games_by_seat[agent_seat.index()] += 1;
        match result.winner() {
            None => self.draws += 1,
            Some(winner) if winner == agent_seat => {
                self.wins += 1;
                self.wins_by_seat[agent_seat.index()] += 1;
            }
            Some(_) => self.losses += 1,
        }
    }

    fn finish(mut self) -> Self {
        if self.games > 0 {
            let total = self.games as f64;
            self.win_rate = self.wins as f64 / total;
            self.draw_rate = self.draws as f64 / total;
            self.loss_rate = self.losses as f64 / total;
        }
        self
    }
}

/// Plays a greedy agent against a fixed opponent
pub struct Evaluator {
    config: EvaluationConfig,
    rng: StdRng,
}

impl Evaluator {
    pub fn new(config: EvaluationConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Play the configured number of games and tally them
    pub fn evaluate(&mut self, approximator: &dyn Approximator) -> Result<EvaluationResult> {
        let agent = QAgent::greedy(approximator);
        let random = RandomPolicy::new();
        let opponent: &dyn Policy = match self.config.opponent {
            EvaluationOpponent::Random => &random,
            EvaluationOpponent::SelfPlay => &agent,
        };
        let options = PlayOptions {
            show_board: self.config.show_board,
            delay: Duration::from_millis(self.config.delay_ms),
        };

        info!(
            "evaluating {} against {} for {} games",
            approximator.name(),
            opponent.name(),
            self.config.games
        );
        let mut result = EvaluationResult::new(
            approximator.name().to_string(),
            opponent.name().to_string(),
        );
        for index in 0..self.config.games {
            let agent_seat = self.config.agent_seat.seat_for(index);
            let game = match agent_seat {
                Seat::One => Game::new(&agent, opponent),
                Seat::Two => Game::new(opponent, &agent),
            };
            let history = game.with_options(options).play(&mut self.rng)?;
            if options.show_board {
                println!("result: {:?} (agent on {agent_seat})\n", history.result());
            }
            result.record(agent_seat, history.result());
            debug!("evaluation game {index}: {:?}", history.result());
        }

        Ok(result.finish())
    }
}
