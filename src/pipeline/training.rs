//! Self-play training loop
//!
//! Every epoch simulates a batch of games against frozen approximator
//! parameters, turns the histories into TD(0) targets and fits the
//! approximator once on the whole batch.

use std::{
    collections::BTreeMap,
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use log::{debug, info, warn};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    policies::RandomPolicy,
    ports::{
        Approximator, Checkpoint, CheckpointId, CheckpointMetadata, CheckpointStore, FitReport,
        Observer, Policy,
    },
    q_learning::{
        DEFAULT_AGENT_EXPLORATION, DEFAULT_GAMMA, QAgent, build_training_set,
        build_training_set_parallel, validate_discount,
    },
    tictactoe::{Game, GameHistory, GameResult, Seat},
};

/// Who sits across from the learning agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpponentKind {
    /// The same approximator with a higher exploration rate
    #[default]
    SelfPlay,
    /// Uniformly random moves
    Random,
    /// An older checkpoint of the approximator with a random exploration rate
    PastCheckpoint,
}

impl std::fmt::Display for OpponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpponentKind::SelfPlay => write!(f, "self-play"),
            OpponentKind::Random => write!(f, "random"),
            OpponentKind::PastCheckpoint => write!(f, "past-checkpoint"),
        }
    }
}

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Last epoch to run (inclusive)
    pub epochs: u32,

    /// Checkpoint the run resumes from; epochs start at `start_epoch + 1`
    pub start_epoch: u32,

    /// Games simulated per epoch
    pub games_per_epoch: usize,

    /// Discount factor γ
    pub gamma: f64,

    /// Exploration rate of the learning agent
    pub agent_exploration: f64,

    /// Opponent schedule
    pub opponent: OpponentKind,

    /// Exploration rate of the self-play opponent
    pub opponent_exploration: f64,

    /// Games between opponent re-draws for past-checkpoint play
    pub opponent_refresh: usize,

    /// Persist a checkpoint every this many epochs
    pub checkpoint_every: u32,

    /// Random seed
    pub seed: Option<u64>,

    /// Simulate each epoch's games on the rayon pool
    pub parallel: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            start_epoch: 0,
            games_per_epoch: 2000,
            gamma: DEFAULT_GAMMA,
            agent_exploration: DEFAULT_AGENT_EXPLORATION,
            opponent: OpponentKind::SelfPlay,
            opponent_exploration: 0.5,
            opponent_refresh: 200,
            checkpoint_every: 2,
            seed: None,
            parallel: false,
        }
    }
}

impl TrainingConfig {
    pub fn with_epochs(mut self, epochs: u32) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_start_epoch(mut self, start_epoch: u32) -> Self {
        self.start_epoch = start_epoch;
        self
    }

    pub fn with_games_per_epoch(mut self, games_per_epoch: usize) -> Self {
        self.games_per_epoch = games_per_epoch;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_agent_exploration(mut self, rate: f64) -> Self {
        self.agent_exploration = rate;
        self
    }

    pub fn with_opponent(mut self, opponent: OpponentKind) -> Self {
        self.opponent = opponent;
        self
    }

    pub fn with_opponent_exploration(mut self, rate: f64) -> Self {
        self.opponent_exploration = rate;
        self
    }

    pub fn with_opponent_refresh(mut self, games: usize) -> Self {
        self.opponent_refresh = games;
        self
    }

    pub fn with_checkpoint_every(mut self, epochs: u32) -> Self {
        self.checkpoint_every = epochs;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| Error::Io {
            operation: format!("open training config {}", path.display()),
            source,
        })?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }

    /// Check the configuration before training starts
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(Error::InvalidConfiguration { message });

        validate_discount(self.gamma)?;
        for rate in [self.agent_exploration, self.opponent_exploration] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(Error::InvalidExplorationRate { value: rate });
            }
        }
        if self.games_per_epoch == 0 {
            return invalid("games per epoch must be positive".to_string());
        }
        if self.opponent_refresh == 0 {
            return invalid("opponent refresh interval must be positive".to_string());
        }
        if self.checkpoint_every == 0 {
            return invalid("checkpoint interval must be positive".to_string());
        }
        if self.start_epoch > self.epochs {
            return invalid(format!(
                "start epoch {} is past the final epoch {}",
                self.start_epoch, self.epochs
            ));
        }
        Ok(())
    }

    /// Whether an epoch ends with a persisted checkpoint
    pub fn persists(&self, epoch: u32) -> bool {
        epoch % self.checkpoint_every == 0 || epoch == self.epochs
    }
}

/// One simulated game together with the seat the learning agent held
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedGame {
    pub agent_seat: Seat,
    pub history: GameHistory,
}

impl SimulatedGame {
    /// Outcome from the learning agent's point of view
    pub fn agent_reward(&self) -> f64 {
        self.history.result().reward_for(self.agent_seat)
    }
}

/// Summary of one epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochReport {
    pub epoch: u32,
    pub games: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub examples: usize,
    pub initial_loss: f64,
    pub final_loss: f64,
    pub checkpoint: Option<CheckpointId>,
}

impl EpochReport {
    fn tally(epoch: u32, games: &[SimulatedGame], fit: FitReport) -> Self {
        let mut report = Self {
            epoch,
            games: games.len(),
            wins: 0,
            draws: 0,
            losses: 0,
            examples: fit.examples,
            initial_loss: fit.initial_loss,
            final_loss: fit.final_loss,
            checkpoint: None,
        };
        for game in games {
            match game.history.result() {
                GameResult::Draw => report.draws += 1,
                result if result.winner() == Some(game.agent_seat) => report.wins += 1,
                _ => report.losses += 1,
            }
        }
        report
    }

    pub fn win_rate(&self) -> f64 {
        rate(self.wins, self.games)
    }
}

fn rate(count: usize, total: usize) -> f64 {
    if total > 0 {
        count as f64 / total as f64
    } else {
        0.0
    }
}

/// Result of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Per-epoch reports in order
    pub epochs: Vec<EpochReport>,

    /// Total games played
    pub total_games: usize,

    /// Number of wins for the learning agent
    pub wins: usize,

    /// Number of draws
    pub draws: usize,

    /// Number of losses for the learning agent
    pub losses: usize,

    /// Win rate
    pub win_rate: f64,

    /// Draw rate
    pub draw_rate: f64,

    /// Loss rate
    pub loss_rate: f64,

    /// Checkpoints persisted during the run
    pub checkpoints: Vec<CheckpointId>,
}

impl TrainingResult {
    /// Aggregate per-epoch reports
    pub fn new(epochs: Vec<EpochReport>) -> Self {
        let total_games: usize = epochs.iter().map(|e| e.games).sum();
        let wins: usize = epochs.iter().map(|e| e.wins).sum();
        let draws: usize = epochs.iter().map(|e| e.draws).sum();
        let losses: usize = epochs.iter().map(|e| e.losses).sum();
        let checkpoints = epochs.iter().filter_map(|e| e.checkpoint).collect();

        Self {
            epochs,
            total_games,
            wins,
            draws,
            losses,
            win_rate: rate(wins, total_games),
            draw_rate: rate(draws, total_games),
            loss_rate: rate(losses, total_games),
            checkpoints,
        }
    }

    /// Save result to JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

/// Opponent resolved for one refresh block of an epoch
#[derive(Debug, Clone, Copy, PartialEq)]
enum OpponentPlan {
    SelfPlay { exploration: f64 },
    Random,
    Past { id: CheckpointId, exploration: f64 },
}

/// Seed for one epoch's games and opponent schedule.
///
/// Derived from the epoch number, so a run resumed at `start_epoch` draws
/// the same epoch seeds as an uninterrupted run and never replays epoch 1.
fn epoch_seed(base_seed: u64, epoch: u32) -> u64 {
    StdRng::seed_from_u64(base_seed ^ u64::from(epoch).wrapping_mul(0xD1B5_4A32_D192_ED03)).random()
}

/// Per-game seed, independent of the order games are simulated in
fn game_seed(epoch_seed: u64, game_index: usize) -> u64 {
    epoch_seed ^ (game_index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn notify_game_end(
    observers: &mut [Box<dyn Observer>],
    epoch: u32,
    index: usize,
    game: &SimulatedGame,
) -> Result<()> {
    for observer in observers {
        observer.on_game_end(epoch, index, game.agent_seat, game.history.result())?;
    }
    Ok(())
}

/// Self-play Q-learning trainer
pub struct SelfPlayTrainer<'s> {
    config: TrainingConfig,
    store: &'s dyn CheckpointStore,
    observers: Vec<Box<dyn Observer>>,
    base_seed: u64,
}

impl<'s> SelfPlayTrainer<'s> {
    /// Create a trainer persisting checkpoints to `store`
    pub fn new(config: TrainingConfig, store: &'s dyn CheckpointStore) -> Result<Self> {
        config.validate()?;
        let base_seed = config.seed.unwrap_or_else(|| rand::rng().random());
        Ok(Self {
            config,
            store,
            observers: Vec::new(),
            base_seed,
        })
    }

    /// Add an observer to the trainer
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Run every remaining epoch, fitting `approximator` in place
    pub fn run<A>(&mut self, approximator: &mut A) -> Result<TrainingResult>
    where
        A: Approximator + Clone,
    {
        let remaining = self.config.epochs - self.config.start_epoch;
        info!(
            "training {} for {} epochs of {} games against {} (resuming after epoch {})",
            approximator.name(),
            remaining,
            self.config.games_per_epoch,
            self.config.opponent,
            self.config.start_epoch
        );
        for observer in &mut self.observers {
            observer.on_training_start(remaining, self.config.games_per_epoch)?;
        }

        let mut reports = Vec::with_capacity(remaining as usize);
        for epoch in self.config.start_epoch + 1..=self.config.epochs {
            for observer in &mut self.observers {
                observer.on_epoch_start(epoch)?;
            }

            let games = self.simulate_epoch(epoch, approximator)?;

            let histories: Vec<GameHistory> = games.iter().map(|g| g.history.clone()).collect();
            let persist = self.config.persists(epoch);
            let fit = self.train(approximator, &histories, persist, epoch)?;

            let mut report = EpochReport::tally(epoch, &games, fit);
            report.checkpoint = persist.then_some(epoch);
            info!(
                "epoch {}: {}W/{}D/{}L, {} examples, loss {:.5} -> {:.5}",
                epoch,
                report.wins,
                report.draws,
                report.losses,
                report.examples,
                report.initial_loss,
                report.final_loss
            );
            for observer in &mut self.observers {
                observer.on_epoch_end(&report)?;
            }
            reports.push(report);
        }

        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        Ok(TrainingResult::new(reports))
    }

    /// Simulate one epoch of games against the current parameters.
    ///
    /// Opponents are resolved up front and every game has its own rng, so
    /// the histories do not depend on whether the games run in parallel.
    /// Observers see `on_game_end` as each game finishes when running
    /// sequentially, and in game order once the whole batch is done when
    /// running in parallel.
    pub fn simulate_epoch<A>(&mut self, epoch: u32, approximator: &A) -> Result<Vec<SimulatedGame>>
    where
        A: Approximator + Clone,
    {
        let epoch_seed = epoch_seed(self.base_seed, epoch);
        let mut schedule_rng = StdRng::seed_from_u64(epoch_seed);
        let plans = self.plan_opponents(epoch, &mut schedule_rng)?;

        let mut past: BTreeMap<CheckpointId, A> = BTreeMap::new();
        for plan in &plans {
            if let OpponentPlan::Past { id, .. } = *plan {
                if past.contains_key(&id) {
                    continue;
                }
                let checkpoint = self.store.load(id)?;
                let mut older = approximator.clone();
                older.restore(&checkpoint.parameters)?;
                past.insert(id, older);
            }
        }

        let agent = QAgent::new(approximator, self.config.agent_exploration)?;
        let random = RandomPolicy::new();
        let mut opponents: Vec<Box<dyn Policy + '_>> = Vec::with_capacity(plans.len());
        for plan in &plans {
            let opponent: Box<dyn Policy + '_> = match *plan {
                OpponentPlan::SelfPlay { exploration } => {
                    Box::new(QAgent::new(approximator, exploration)?)
                }
                OpponentPlan::Random => Box::new(random),
                OpponentPlan::Past { id, exploration } => {
                    let older = past.get(&id).ok_or(Error::CheckpointNotFound { id })?;
                    Box::new(QAgent::new(older, exploration)?)
                }
            };
            opponents.push(opponent);
        }

        let refresh = self.config.opponent_refresh;
        let play = |index: usize| -> Result<SimulatedGame> {
            let opponent = opponents[index / refresh].as_ref();
            let agent_seat = if index % 2 == 0 { Seat::One } else { Seat::Two };
            let mut game = match agent_seat {
                Seat::One => Game::new(&agent, opponent),
                Seat::Two => Game::new(opponent, &agent),
            };
            let mut rng = StdRng::seed_from_u64(game_seed(epoch_seed, index));
            let history = game.play(&mut rng)?;
            Ok(SimulatedGame {
                agent_seat,
                history,
            })
        };

        let games = self.config.games_per_epoch;
        if self.config.parallel {
            let simulated: Vec<SimulatedGame> =
                (0..games).into_par_iter().map(play).collect::<Result<_>>()?;
            for (index, game) in simulated.iter().enumerate() {
                notify_game_end(&mut self.observers, epoch, index, game)?;
            }
            Ok(simulated)
        } else {
            let mut simulated = Vec::with_capacity(games);
            for index in 0..games {
                let game = play(index)?;
                notify_game_end(&mut self.observers, epoch, index, &game)?;
                simulated.push(game);
            }
            Ok(simulated)
        }
    }

    /// One opponent per block of `opponent_refresh` games
    fn plan_opponents(&self, epoch: u32, rng: &mut StdRng) -> Result<Vec<OpponentPlan>> {
        let blocks = self.config.games_per_epoch.div_ceil(self.config.opponent_refresh);
        let self_play = OpponentPlan::SelfPlay {
            exploration: self.config.opponent_exploration,
        };

        match self.config.opponent {
            OpponentKind::SelfPlay => Ok(vec![self_play; blocks]),
            OpponentKind::Random => Ok(vec![OpponentPlan::Random; blocks]),
            OpponentKind::PastCheckpoint => {
                let candidates: Vec<CheckpointId> = self
                    .store
                    .ids()?
                    .into_iter()
                    .filter(|&id| id > 0 && id < epoch)
                    .collect();
                if candidates.is_empty() {
                    warn!("epoch {epoch}: no earlier checkpoint stored, falling back to self-play");
                    return Ok(vec![self_play; blocks]);
                }
                let plans = (0..blocks)
                    .map(|_| {
                        let id = *candidates.choose(rng).unwrap_or(&candidates[0]);
                        let exploration: f64 = rng.random();
                        debug!("epoch {epoch}: opponent checkpoint {id} exploring at {exploration:.3}");
                        OpponentPlan::Past { id, exploration }
                    })
                    .collect();
                Ok(plans)
            }
        }
    }

    /// Fit the approximator on one epoch of histories.
    ///
    /// Targets are computed against the parameters as they were before the
    /// update. With `persist` the updated parameters are saved under
    /// `checkpoint_id`.
    pub fn train<A>(
        &mut self,
        approximator: &mut A,
        histories: &[GameHistory],
        persist: bool,
        checkpoint_id: CheckpointId,
    ) -> Result<FitReport>
    where
        A: Approximator,
    {
        let examples = if self.config.parallel {
            build_training_set_parallel(histories, &*approximator, self.config.gamma)?
        } else {
            build_training_set(histories, &*approximator, self.config.gamma)?
        };
        let report = approximator.fit(&examples)?;

        if persist {
            let metadata = CheckpointMetadata {
                epoch: checkpoint_id,
                games: histories.len(),
                examples: report.examples,
                loss: Some(report.final_loss),
                seed: self.config.seed,
                approximator: approximator.name().to_string(),
                saved_at: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .ok()
                    .map(|d| d.as_secs()),
            };
            let checkpoint = Checkpoint::new(checkpoint_id, approximator.snapshot()?, metadata);
            self.store.save(&checkpoint)?;
            debug!("saved checkpoint {checkpoint_id}");
            for observer in &mut self.observers {
                observer.on_checkpoint_saved(checkpoint_id)?;
            }
        }

        Ok(report)
    }
}
