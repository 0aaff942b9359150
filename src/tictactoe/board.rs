//! Board representation, seats, actions and the perspective-relative encoding

use std::{fmt, ops::Index};

use serde::{Deserialize, Serialize};

use super::{GameResult, lines::LineAnalyzer};
use crate::{Error, Result};

/// Side length of the board
pub const BOARD_SIZE: usize = 3;

/// Number of cells on the board
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// A cell on the Tic-Tac-Toe board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    X,
    O,
}

impl Cell {
    pub fn to_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::X => 'X',
            Cell::O => 'O',
        }
    }

    pub fn from_char(c: char) -> Option<Cell> {
        match c {
            '.' => Some(Cell::Empty),
            'X' | 'x' => Some(Cell::X),
            'O' | 'o' => Some(Cell::O),
            _ => None,
        }
    }

    /// The seat owning this mark, if any
    pub fn seat(self) -> Option<Seat> {
        match self {
            Cell::X => Some(Seat::One),
            Cell::O => Some(Seat::Two),
            Cell::Empty => None,
        }
    }
}

/// A turn-order slot in a single game
///
/// Seat one always opens. Which policy occupies a seat may change from game
/// to game, so a seat is not an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Seat {
    One,
    Two,
}

impl Seat {
    /// Both seats in turn order
    pub const ALL: [Seat; 2] = [Seat::One, Seat::Two];

    /// Get the other seat
    pub fn opponent(self) -> Seat {
        match self {
            Seat::One => Seat::Two,
            Seat::Two => Seat::One,
        }
    }

    /// Mark placed by this seat
    pub fn to_cell(self) -> Cell {
        match self {
            Seat::One => Cell::X,
            Seat::Two => Cell::O,
        }
    }

    /// Zero-based index, handy for per-seat arrays
    pub fn index(self) -> usize {
        match self {
            Seat::One => 0,
            Seat::Two => 1,
        }
    }

    /// One-based seat number (1 or 2)
    pub fn number(self) -> u8 {
        match self {
            Seat::One => 1,
            Seat::Two => 2,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat {}", self.number())
    }
}

/// A (row, column) coordinate on the board
///
/// The derived ordering is row-major: lower rows first, then lower columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Action {
    row: usize,
    column: usize,
}

impl Action {
    /// Create an action, rejecting coordinates off the board
    pub fn new(row: usize, column: usize) -> Result<Self> {
        if row >= BOARD_SIZE || column >= BOARD_SIZE {
            return Err(Error::InvalidAction { row, column });
        }
        Ok(Self { row, column })
    }

    /// Create an action from a row-major cell index (0-8)
    pub fn from_index(index: usize) -> Result<Self> {
        Self::new(index / BOARD_SIZE, index % BOARD_SIZE)
    }

    pub fn row(self) -> usize {
        self.row
    }

    pub fn column(self) -> usize {
        self.column
    }

    /// Row-major cell index (0-8)
    pub fn index(self) -> usize {
        self.row * BOARD_SIZE + self.column
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Board encoded relative to the seat about to move
///
/// Each entry is `+1` for the mover's marks, `-1` for the opponent's marks and
/// `0` for empty cells. The same physical board therefore has two encodings,
/// one per seat, and they are negations of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncodedState([i8; CELL_COUNT]);

impl EncodedState {
    pub fn new(values: [i8; CELL_COUNT]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[i8; CELL_COUNT] {
        &self.0
    }

    /// The same board seen from the other seat
    #[must_use]
    pub fn negated(&self) -> Self {
        let mut values = self.0;
        for value in &mut values {
            *value = -*value;
        }
        Self(values)
    }
}

impl Index<usize> for EncodedState {
    type Output = i8;

    fn index(&self, index: usize) -> &i8 {
        &self.0[index]
    }
}

/// A 3x3 grid of write-once cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    cells: [Cell; CELL_COUNT],
}

impl Board {
    /// Create an empty board
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; CELL_COUNT],
        }
    }

    /// Create a board from a string of nine cell characters.
    ///
    /// Whitespace is ignored, so `"XOX / .O. / X.."` style layouts work.
    ///
    /// # Errors
    ///
    /// Returns error if the string does not hold exactly nine valid cells.
    pub fn from_string(s: &str) -> Result<Self> {
        let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.len() != CELL_COUNT {
            return Err(Error::InvalidConfiguration {
                message: format!("board '{s}' must contain {CELL_COUNT} cells"),
            });
        }

        let mut cells = [Cell::Empty; CELL_COUNT];
        for (i, &c) in chars.iter().enumerate() {
            cells[i] = Cell::from_char(c).ok_or_else(|| Error::InvalidConfiguration {
                message: format!("invalid character '{c}' at position {i} in '{s}'"),
            })?;
        }
        Ok(Self { cells })
    }

    pub fn cells(&self) -> &[Cell; CELL_COUNT] {
        &self.cells
    }

    /// Get the cell at an action's coordinate
    pub fn get(&self, action: Action) -> Cell {
        self.cells[action.index()]
    }

    /// Check if an action's cell is empty
    pub fn is_empty(&self, action: Action) -> bool {
        self.get(action) == Cell::Empty
    }

    /// Count the number of marked cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != Cell::Empty).count()
    }

    /// All empty cells in row-major order
    pub fn legal_actions(&self) -> Vec<Action> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &cell)| cell == Cell::Empty)
            .map(|(index, _)| Action {
                row: index / BOARD_SIZE,
                column: index % BOARD_SIZE,
            })
            .collect()
    }

    /// Mark a cell for a seat.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalMove`] if the cell is already marked; cells are
    /// never overwritten.
    pub fn mark(&mut self, action: Action, seat: Seat) -> Result<()> {
        if action.row >= BOARD_SIZE || action.column >= BOARD_SIZE {
            return Err(Error::InvalidAction {
                row: action.row,
                column: action.column,
            });
        }
        if !self.is_empty(action) {
            return Err(Error::IllegalMove { seat, action });
        }
        self.cells[action.index()] = seat.to_cell();
        Ok(())
    }

    /// Encode the board from the perspective of `seat`
    pub fn encode(&self, seat: Seat) -> EncodedState {
        let own = seat.to_cell();
        let mut values = [0i8; CELL_COUNT];
        for (value, &cell) in values.iter_mut().zip(self.cells.iter()) {
            *value = match cell {
                Cell::Empty => 0,
                c if c == own => 1,
                _ => -1,
            };
        }
        EncodedState(values)
    }

    /// Check if a seat has three in a line
    pub fn has_won(&self, seat: Seat) -> bool {
        LineAnalyzer::has_won(&self.cells, seat)
    }

    /// Get the winner if there is one
    pub fn winner(&self) -> Option<Seat> {
        LineAnalyzer::winner(&self.cells)
    }

    pub fn is_full(&self) -> bool {
        !self.cells.contains(&Cell::Empty)
    }

    /// Terminal result of the board, `None` while the game is still going
    pub fn result(&self) -> Option<GameResult> {
        match self.winner() {
            Some(Seat::One) => Some(GameResult::SeatOneWin),
            Some(Seat::Two) => Some(GameResult::SeatTwoWin),
            None if self.is_full() => Some(GameResult::Draw),
            None => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.result().is_some()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, &cell) in self.cells.iter().enumerate() {
            write!(f, "{}", cell.to_char())?;
            if (i + 1).is_multiple_of(BOARD_SIZE) && i < CELL_COUNT - 1 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
