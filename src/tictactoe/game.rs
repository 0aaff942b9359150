//! Game state machine driving two policies to a terminal board

use std::{thread, time::Duration};

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::board::{Action, Board, CELL_COUNT, EncodedState, Seat};
use crate::{Error, Result, ports::Policy};

/// Upper bound on plies in a single game
pub const MAX_PLIES: usize = CELL_COUNT;

/// Terminal result of a game
///
/// The discriminants match the conventional numeric encoding (0 draw, 1 seat
/// one wins, 2 seat two wins). An unfinished game has no result at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    Draw = 0,
    SeatOneWin = 1,
    SeatTwoWin = 2,
}

impl GameResult {
    /// Winning seat, `None` for a draw
    pub fn winner(self) -> Option<Seat> {
        match self {
            GameResult::Draw => None,
            GameResult::SeatOneWin => Some(Seat::One),
            GameResult::SeatTwoWin => Some(Seat::Two),
        }
    }

    /// Terminal reward for `seat`: +1 win, -1 loss, 0 draw
    pub fn reward_for(self, seat: Seat) -> f64 {
        match self.winner() {
            None => 0.0,
            Some(winner) if winner == seat => 1.0,
            Some(_) => -1.0,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Whether a game is still being played
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Terminal(GameResult),
}

/// One move of one seat: what it saw, what it could do and what it did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub state: EncodedState,
    pub actions: Vec<Action>,
    pub action: Action,
}

/// Immutable record of a finished game
///
/// Each seat's list holds only that seat's own moves, in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameHistory {
    seat_one: Vec<TurnRecord>,
    seat_two: Vec<TurnRecord>,
    result: GameResult,
}

impl GameHistory {
    pub fn new(seat_one: Vec<TurnRecord>, seat_two: Vec<TurnRecord>, result: GameResult) -> Self {
        Self {
            seat_one,
            seat_two,
            result,
        }
    }

    /// Turn records of one seat
    pub fn turns(&self, seat: Seat) -> &[TurnRecord] {
        match seat {
            Seat::One => &self.seat_one,
            Seat::Two => &self.seat_two,
        }
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    /// Total marks placed during the game
    pub fn total_moves(&self) -> usize {
        self.seat_one.len() + self.seat_two.len()
    }
}

/// Presentation knobs for watching a game unfold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayOptions {
    /// Print the board after each move
    pub show_board: bool,
    /// Pause after each move
    pub delay: Duration,
}

/// A single game between two policies
///
/// The engine never picks moves itself; every ply it asks the policy in the
/// current seat. A policy answering with a marked cell is a broken policy and
/// ends the game with [`Error::IllegalMove`].
pub struct Game<'p> {
    policies: [&'p dyn Policy; 2],
    board: Board,
    to_move: Seat,
    turns: [Vec<TurnRecord>; 2],
    plies: usize,
    history: Option<GameHistory>,
    options: PlayOptions,
}

impl<'p> Game<'p> {
    /// Create a game with an empty board and seat one to move
    pub fn new(seat_one: &'p dyn Policy, seat_two: &'p dyn Policy) -> Self {
        Self {
            policies: [seat_one, seat_two],
            board: Board::new(),
            to_move: Seat::One,
            turns: [Vec::new(), Vec::new()],
            plies: 0,
            history: None,
            options: PlayOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PlayOptions) -> Self {
        self.options = options;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Seat whose turn it is (the last mover once the game is over)
    pub fn to_move(&self) -> Seat {
        self.to_move
    }

    pub fn status(&self) -> GameStatus {
        match &self.history {
            Some(history) => GameStatus::Terminal(history.result()),
            None => GameStatus::InProgress,
        }
    }

    pub fn is_over(&self) -> bool {
        self.history.is_some()
    }

    /// Encoded board from the perspective of the seat to move
    pub fn encode_state(&self) -> EncodedState {
        self.board.encode(self.to_move)
    }

    pub fn available_actions(&self) -> Vec<Action> {
        self.board.legal_actions()
    }

    /// Frozen history, available once the game is over
    pub fn history(&self) -> Option<&GameHistory> {
        self.history.as_ref()
    }

    /// Play a single ply.
    ///
    /// Returns the finished history when this ply ended the game.
    ///
    /// # Errors
    ///
    /// - [`Error::GameOver`] if the game has already ended
    /// - [`Error::IllegalMove`] if the policy picks a marked cell
    /// - [`Error::NoLegalActions`] if the board has no empty cell left
    pub fn step(&mut self, rng: &mut dyn RngCore) -> Result<Option<GameHistory>> {
        if self.history.is_some() {
            return Err(Error::GameOver);
        }
        if self.plies >= MAX_PLIES {
            return Err(Error::MoveLimit { limit: MAX_PLIES });
        }

        let seat = self.to_move;
        let state = self.encode_state();
        let actions = self.available_actions();
        if actions.is_empty() {
            return Err(Error::NoLegalActions { seat });
        }

        let action = self.policies[seat.index()].select_move(&state, &actions, rng)?;
        self.board.mark(action, seat)?;
        self.turns[seat.index()].push(TurnRecord {
            state,
            actions,
            action,
        });
        self.plies += 1;

        if self.options.show_board {
            println!("\n{}", self.board);
        }
        if !self.options.delay.is_zero() {
            thread::sleep(self.options.delay);
        }

        if let Some(result) = self.board.result() {
            let [seat_one, seat_two] = std::mem::take(&mut self.turns);
            let history = GameHistory::new(seat_one, seat_two, result);
            self.history = Some(history.clone());
            return Ok(Some(history));
        }

        self.to_move = seat.opponent();
        Ok(None)
    }

    /// Play until the board is terminal and return the game history.
    ///
    /// Calling `play` again on a finished game fails with
    /// [`Error::GameOver`]; the history stays readable through
    /// [`Game::history`].
    pub fn play(&mut self, rng: &mut dyn RngCore) -> Result<GameHistory> {
        if self.history.is_some() {
            return Err(Error::GameOver);
        }
        loop {
            if let Some(history) = self.step(rng)? {
                return Ok(history);
            }
        }
    }
}
