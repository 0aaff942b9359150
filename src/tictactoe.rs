//! Tic-Tac-Toe rules and game engine

pub mod board;
pub mod game;
pub mod lines;

pub use board::{Action, BOARD_SIZE, Board, CELL_COUNT, Cell, EncodedState, Seat};
pub use game::{
    Game, GameHistory, GameResult, GameStatus, MAX_PLIES, PlayOptions, TurnRecord,
};
pub use lines::{LineAnalyzer, WINNING_LINES};
