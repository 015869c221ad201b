//! The scripted opponent's move selection.
//!
//! A shallow heuristic, not a search: take a win if one exists, block the
//! opponent's win otherwise, else prefer central columns. Each candidate is
//! simulated on a board copy with the real rules, so the heuristic can
//! never disagree with the engine about legality.

use crate::{Board, COLS, PlayerId};

/// Column preference when neither side has an immediate win: center first,
/// then alternating outward.
const CENTER_PREFERENCE: [usize; COLS] = [3, 2, 4, 1, 5, 0, 6];

/// Picks a column for the scripted opponent, or `None` if the board is
/// full.
///
/// Precedence, with left-to-right column order as the tie-break:
/// 1. a column that wins for `self_id` immediately;
/// 2. a column that would let `opponent_id` win on their next drop (block);
/// 3. the first playable column from [`CENTER_PREFERENCE`].
///
/// The live board is never mutated; every simulation runs on a copy.
pub fn select_move(
    board: &Board,
    self_id: PlayerId,
    opponent_id: PlayerId,
) -> Option<usize> {
    for column in 0..COLS {
        if wins_after_drop(board, column, self_id) {
            return Some(column);
        }
    }

    for column in 0..COLS {
        if wins_after_drop(board, column, opponent_id) {
            return Some(column);
        }
    }

    CENTER_PREFERENCE
        .into_iter()
        .find(|&column| board.is_playable(column))
}

/// Simulates dropping `player` into `column` on a copy. `false` if the
/// column is unplayable.
fn wins_after_drop(board: &Board, column: usize, player: PlayerId) -> bool {
    let mut trial = *board;
    trial.drop_piece(column, player).is_ok() && trial.check_win(player)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: PlayerId = PlayerId(1);
    const HUMAN: PlayerId = PlayerId(2);

    /// Stacks `count` pieces for `player` in `column`.
    fn stack(board: &mut Board, column: usize, player: PlayerId, count: usize) {
        for _ in 0..count {
            board.drop_piece(column, player).expect("column has room");
        }
    }

    #[test]
    fn test_select_move_takes_winning_column() {
        // Three bot pieces stacked in column 3: dropping there wins.
        let mut board = Board::new();
        stack(&mut board, 3, BOT, 3);

        assert_eq!(select_move(&board, BOT, HUMAN), Some(3));
    }

    #[test]
    fn test_select_move_win_takes_precedence_over_block() {
        // Both sides threaten column wins; the bot must take its own
        // (column 5) rather than block the human's (column 0).
        let mut board = Board::new();
        stack(&mut board, 0, HUMAN, 3);
        stack(&mut board, 5, BOT, 3);

        assert_eq!(select_move(&board, BOT, HUMAN), Some(5));
    }

    #[test]
    fn test_select_move_blocks_opponent_win() {
        let mut board = Board::new();
        stack(&mut board, 6, HUMAN, 3);

        assert_eq!(select_move(&board, BOT, HUMAN), Some(6));
    }

    #[test]
    fn test_select_move_blocks_horizontal_threat() {
        // Human holds columns 1-3 on the bottom row; both 0 and 4 complete
        // the run. Left-to-right scan finds 0 first.
        let mut board = Board::new();
        for col in 1..4 {
            board.drop_piece(col, HUMAN).unwrap();
        }

        assert_eq!(select_move(&board, BOT, HUMAN), Some(0));
    }

    #[test]
    fn test_select_move_prefers_center_when_no_threats() {
        let board = Board::new();

        assert_eq!(select_move(&board, BOT, HUMAN), Some(3));
    }

    #[test]
    fn test_select_move_walks_preference_outward_when_center_full() {
        let mut board = Board::new();
        stack(&mut board, 3, HUMAN, 3);
        stack(&mut board, 3, BOT, 3);
        assert!(!board.is_playable(3));

        assert_eq!(select_move(&board, BOT, HUMAN), Some(2));
    }

    #[test]
    fn test_select_move_returns_none_on_full_board() {
        // Fill every column; with no playable column there is no move.
        let mut board = Board::new();
        for col in 0..COLS {
            let (a, b) = if col % 3 == 0 { (BOT, HUMAN) } else { (HUMAN, BOT) };
            stack(&mut board, col, a, 2);
            stack(&mut board, col, b, 1);
            stack(&mut board, col, a, 2);
            stack(&mut board, col, b, 1);
        }
        assert!(board.check_draw());

        assert_eq!(select_move(&board, BOT, HUMAN), None);
    }

    #[test]
    fn test_select_move_never_mutates_the_live_board() {
        let mut board = Board::new();
        stack(&mut board, 2, HUMAN, 3);
        let before = board;

        let _ = select_move(&board, BOT, HUMAN);

        assert_eq!(board, before);
    }
}
