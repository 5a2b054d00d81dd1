//! This module contains the position evaluation tables and functions.
//!
//! Evaluation is material plus a piece-square bonus, always from the
//! perspective of the side to move.  The full-board evaluation is only
//! used to initialise a position (and to cross-check in tests); during
//! search the score is maintained incrementally via eval_move.

use crate::board;
use crate::board::Board;
use crate::moves::Move;
use crate::pieces;

// Piece-square table for a man, in square order 1..50 with zero
// sentinels at indices 0 and 51.  Advancement toward the promotion
// row is rewarded, with a mild preference for the centre files.
pub const PST_MAN: [i32; 52] = [
     0,
    60, 65, 70, 65, 60,
    50, 55, 60, 55, 50,
    40, 45, 50, 45, 40,
    30, 35, 40, 35, 30,
    25, 30, 35, 30, 25,
    20, 25, 30, 25, 20,
    15, 20, 25, 20, 15,
    10, 15, 20, 15, 10,
     5, 10, 15, 10,  5,
     0,  5, 10,  5,  0,
     0,
];

// A king is strong everywhere; a flat bonus keeps the table shape
pub const PST_KING: [i32; 52] = [
     0,
    50, 50, 50, 50, 50,
    50, 50, 50, 50, 50,
    50, 50, 50, 50, 50,
    50, 50, 50, 50, 50,
    50, 50, 50, 50, 50,
    50, 50, 50, 50, 50,
    50, 50, 50, 50, 50,
    50, 50, 50, 50, 50,
    50, 50, 50, 50, 50,
    50, 50, 50, 50, 50,
     0,
];

// Piece-square plus material value of an own-side piece on a square
#[inline]
fn cell_value(cell: u8, square: usize) -> i32 {
    match cell {
        pieces::MAN => PST_MAN[square] + pieces::MAN_VALUE,
        pieces::KING => PST_KING[square] + pieces::KING_VALUE,
        _ => 0,
    }
}

// Evaluate a full board from the side to move's perspective.  The
// opponent's pieces are scored at mirrored indices (51 - i), which is
// their own-perspective placement.
pub fn eval_pos(board: &Board) -> i32 {
    let mut score = 0;
    for i in 1..=50 {
        let cell = board[i];
        if pieces::is_own(cell) {
            score += cell_value(cell, i);
        } else if pieces::is_opp(cell) {
            score -= cell_value(pieces::to_own(cell), 51 - i);
        }
    }
    score
}

// Score delta a move induces, from the mover's perspective.  This is
// what keeps the position score incremental: the piece leaves its
// origin, lands (possibly promoted) on its destination, and every
// captured piece gives back its mirrored value.
pub fn eval_move(board: &Board, m: &Move) -> i32 {
    let from = m.steps[0];
    let to = m.steps[m.steps.len() - 1];
    let piece = board[from];
    let landed = if piece == pieces::MAN && board::is_promotion_square(to) {
        pieces::KING
    } else {
        piece
    };
    let mut delta = cell_value(landed, to) - cell_value(piece, from);
    for &t in &m.takes {
        delta += cell_value(pieces::to_own(board[t]), 51 - t);
    }
    delta
}

// =====================================
//             UNIT TESTS
// =====================================

#[cfg(test)]
mod tests {

    use super::*;
    use crate::board::INITIAL_BOARD;

    #[test]
    fn test_tables_have_zero_sentinels() {
        assert_eq!(PST_MAN[0], 0);
        assert_eq!(PST_MAN[51], 0);
        assert_eq!(PST_KING[0], 0);
        assert_eq!(PST_KING[51], 0);
    }

    #[test]
    fn test_initial_position_is_balanced() {
        assert_eq!(eval_pos(&INITIAL_BOARD), 0);
    }

    #[test]
    fn test_eval_move_quiet() {
        // 32-28: the man gains the advancement difference
        let m = Move { steps: vec![32, 28], takes: vec![] };
        let expected = PST_MAN[28] - PST_MAN[32];
        assert_eq!(eval_move(&INITIAL_BOARD, &m), expected);
    }

    #[test]
    fn test_eval_move_capture_counts_mirrored_square() {
        let mut b = INITIAL_BOARD;
        b[23] = pieces::OPP_MAN;
        b[28] = pieces::MAN;
        let m = Move { steps: vec![28, 19], takes: vec![23] };
        let expected = (PST_MAN[19] - PST_MAN[28]) + (PST_MAN[51 - 23] + pieces::MAN_VALUE);
        assert_eq!(eval_move(&b, &m), expected);
    }

    #[test]
    fn test_eval_move_promotion() {
        let mut b = [pieces::EMPTY; 52];
        b[0] = pieces::OFFBOARD;
        b[51] = pieces::OFFBOARD;
        b[6] = pieces::MAN;
        let m = Move { steps: vec![6, 1], takes: vec![] };
        let expected = (PST_KING[1] + pieces::KING_VALUE) - (PST_MAN[6] + pieces::MAN_VALUE);
        assert_eq!(eval_move(&b, &m), expected);
    }
}
