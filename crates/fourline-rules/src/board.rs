//! The board and its rule checks: gravity drops, win detection, draw
//! detection.

use serde::{Deserialize, Serialize};

use crate::{PlayerId, RulesError};

/// Number of rows on the board. Row 0 is the top.
pub const ROWS: usize = 6;

/// Number of columns on the board.
pub const COLS: usize = 7;

/// The four run axes checked for a win, as `(row_step, col_step)`:
/// horizontal, vertical, and both diagonals.
const AXES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// A 6×7 grid of cells, each empty or owned by a player.
///
/// Invariant: pieces obey gravity — within a column, no cell below a filled
/// cell is ever empty. [`Board::drop_piece`] is the only way to fill a cell
/// and always picks the lowest empty one.
///
/// The board is `Copy`, so trial moves (the scripted opponent simulates up
/// to one drop per column) operate on an independent copy and never touch
/// the live game state.
///
/// Serializes transparently as a row-major array of arrays, empty cells as
/// `null`, which is the wire shape of `game_update.board`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [[Option<PlayerId>; COLS]; ROWS],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            cells: [[None; COLS]; ROWS],
        }
    }

    /// Returns the owner of the cell at `(row, column)`, if any.
    pub fn cell(&self, row: usize, column: usize) -> Option<PlayerId> {
        self.cells[row][column]
    }

    /// Returns `true` if a piece can still be dropped into `column`.
    pub fn is_playable(&self, column: usize) -> bool {
        column < COLS && self.cells[0][column].is_none()
    }

    /// Drops a piece for `player` into `column`.
    ///
    /// The piece lands in the lowest empty cell of the column (gravity).
    /// Returns the `(row, column)` where it came to rest.
    ///
    /// # Errors
    /// - [`RulesError::InvalidColumn`] if `column >= COLS`
    /// - [`RulesError::ColumnFull`] if the topmost cell is occupied
    ///
    /// On error the board is unchanged.
    pub fn drop_piece(
        &mut self,
        column: usize,
        player: PlayerId,
    ) -> Result<(usize, usize), RulesError> {
        if column >= COLS {
            return Err(RulesError::InvalidColumn(column));
        }

        for row in (0..ROWS).rev() {
            if self.cells[row][column].is_none() {
                self.cells[row][column] = Some(player);
                return Ok((row, column));
            }
        }

        Err(RulesError::ColumnFull(column))
    }

    /// Returns `true` if `player` owns four consecutive cells along any of
    /// the four axes.
    ///
    /// Every cell is scanned as a potential run start; the scan
    /// short-circuits on the first qualifying run.
    pub fn check_win(&self, player: PlayerId) -> bool {
        AXES.iter().any(|&axis| self.has_run(player, axis))
    }

    /// Returns `true` if the board is full.
    ///
    /// Gravity guarantees lower cells are filled whenever the top row is,
    /// so checking the top row alone is sufficient. No mutation; repeated
    /// calls return the same result.
    pub fn check_draw(&self) -> bool {
        self.cells[0].iter().all(|cell| cell.is_some())
    }

    /// Scans for a run of four `player` cells along one axis.
    fn has_run(&self, player: PlayerId, (row_step, col_step): (isize, isize)) -> bool {
        for row in 0..ROWS {
            for col in 0..COLS {
                let run = (0..4).all(|i| {
                    let r = row as isize + i * row_step;
                    let c = col as isize + i * col_step;
                    (0..ROWS as isize).contains(&r)
                        && (0..COLS as isize).contains(&c)
                        && self.cells[r as usize][c as usize] == Some(player)
                });
                if run {
                    return true;
                }
            }
        }
        false
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
