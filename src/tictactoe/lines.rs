//! Winning line analysis for Tic-Tac-Toe

use super::{Cell, Seat, board::CELL_COUNT};

/// Winning line indices on the 3x3 board
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8], // rows
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8], // columns
    [0, 4, 8],
    [2, 4, 6], // diagonals
];

/// Utility for analyzing winning lines in Tic-Tac-Toe
pub struct LineAnalyzer;

impl LineAnalyzer {
    /// Check if a seat has three in a row, column or diagonal
    pub fn has_won(cells: &[Cell; CELL_COUNT], seat: Seat) -> bool {
        let target = seat.to_cell();
        WINNING_LINES
            .iter()
            .any(|line| line.iter().all(|&idx| cells[idx] == target))
    }

    /// Seat owning the first completed line, if any
    pub fn winner(cells: &[Cell; CELL_COUNT]) -> Option<Seat> {
        WINNING_LINES.iter().find_map(|&[a, b, c]| {
            if cells[a] != Cell::Empty && cells[a] == cells[b] && cells[b] == cells[c] {
                cells[a].seat()
            } else {
                None
            }
        })
    }
}
