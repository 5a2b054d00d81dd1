//! This module contains the immutable position: a padded board plus
//! the incrementally maintained score of the side to move.
//!
//! A position never mutates.  Applying a move produces a fresh
//! position, rotated so that the opponent becomes the uppercase side;
//! passing the turn (the null move) is a bare rotation.  Because the
//! score invariant `score == eval_pos(board)` is kept by every
//! operation, search never has to re-evaluate a board from scratch.

use crate::board;
use crate::board::Board;
use crate::evaluate;
use crate::moves::Move;
use crate::pieces;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {

    // The padded 52-cell board, side to move in uppercase
    pub board: Board,

    // Score from the side to move's perspective
    pub score: i32,
}

impl Position {

    // The starting position, White to move
    pub fn initial() -> Position {
        Position { board: board::INITIAL_BOARD, score: 0 }
    }

    // Build a position from a 50-character dark-square layout in
    // square order ('P', 'K', 'p', 'k', '.'), side to move White.
    // Returns None if the layout has the wrong length or characters.
    pub fn from_layout(layout: &str) -> Option<Position> {
        let cells = layout.trim().as_bytes();
        if cells.len() != 50 {
            return None;
        }
        let mut b = [pieces::EMPTY; board::BOARD_SIZE];
        b[0] = pieces::OFFBOARD;
        b[51] = pieces::OFFBOARD;
        for (i, &cell) in cells.iter().enumerate() {
            match cell {
                pieces::MAN | pieces::KING | pieces::OPP_MAN | pieces::OPP_KING
                | pieces::EMPTY => b[i + 1] = cell,
                _ => return None,
            }
        }
        Some(Position { board: b, score: evaluate::eval_pos(&b) })
    }

    // The transposition key of this position is the board itself
    #[inline]
    pub fn key(&self) -> Board {
        self.board
    }

    // Pass the turn: reverse the board, swap sides, negate the score.
    // This is also the null move.
    pub fn rotate(&self) -> Position {
        Position { board: board::rotated(&self.board), score: -self.score }
    }

    // Score delta this move would induce, from the mover's perspective
    #[inline]
    pub fn eval_move(&self, m: &Move) -> i32 {
        evaluate::eval_move(&self.board, m)
    }

    // Apply a legal move: relocate the mover (promoting a man that
    // ends on the promotion row), clear the captured squares, bump the
    // score incrementally, and rotate so the opponent is to move.
    pub fn do_move(&self, m: &Move) -> Position {
        let delta = self.eval_move(m);
        let mut b = self.board;
        let from = m.origin();
        let to = m.dest();
        let piece = b[from];
        let landed = if piece == pieces::MAN && board::is_promotion_square(to) {
            pieces::KING
        } else {
            piece
        };
        b[from] = pieces::EMPTY;
        for &t in &m.takes {
            b[t] = pieces::EMPTY;
        }
        b[to] = landed;
        Position { board: b, score: self.score + delta }.rotate()
    }
}

// =====================================
//             UNIT TESTS
// =====================================

#[cfg(test)]
mod tests {

    use super::*;
    use crate::moves;

    // 20 opponent men, 10 empty squares, 20 own men
    const INITIAL_LAYOUT: &str =
        "pppppppppppppppppppp..........PPPPPPPPPPPPPPPPPPPP";

    #[test]
    fn test_from_layout() {
        let pos = Position::from_layout(INITIAL_LAYOUT).unwrap();
        assert_eq!(pos, Position::initial());
        assert_eq!(pos.score, 0);
        assert!(Position::from_layout("PPP").is_none());
        assert!(Position::from_layout(&INITIAL_LAYOUT.replace('.', "x")).is_none());
    }

    #[test]
    fn test_rotate_laws() {
        let pos = Position::initial();
        assert_eq!(pos.rotate().rotate(), pos);
        let m = Move { steps: vec![33, 28], takes: vec![] };
        let after = pos.do_move(&m);
        assert_eq!(after.rotate().score, -after.score);
        assert_eq!(after.rotate().rotate(), after);
    }

    #[test]
    fn test_score_stays_incremental() {
        // Quiet openings, captures and promotions all have to keep
        // score == eval_pos(board).
        let mut stack = vec![Position::initial()];
        let mut visited = 0;
        while let Some(pos) = stack.pop() {
            assert_eq!(pos.score, evaluate::eval_pos(&pos.board));
            visited += 1;
            if visited > 200 {
                break;
            }
            if visited < 50 {
                for m in moves::legal_moves(&pos.board) {
                    stack.push(pos.do_move(&m));
                }
            }
        }
        assert!(visited > 50);
    }

    #[test]
    fn test_capture_clears_taken_squares() {
        let mut layout = [b'.'; 50];
        layout[28 - 1] = pieces::MAN;
        layout[23 - 1] = pieces::OPP_MAN;
        let pos = Position::from_layout(std::str::from_utf8(&layout).unwrap()).unwrap();
        let m = Move { steps: vec![28, 19], takes: vec![23] };
        let after = pos.do_move(&m);
        // The result is rotated: our man appears mirrored as 'p'
        assert_eq!(after.board[51 - 19], pieces::OPP_MAN);
        assert_eq!(after.board[51 - 23], pieces::EMPTY);
        assert_eq!(after.board[51 - 28], pieces::EMPTY);
        assert_eq!(after.score, evaluate::eval_pos(&after.board));
    }

    #[test]
    fn test_promotion_on_landing() {
        let mut layout = [b'.'; 50];
        layout[6 - 1] = pieces::MAN;
        layout[40 - 1] = pieces::OPP_MAN;
        let pos = Position::from_layout(std::str::from_utf8(&layout).unwrap()).unwrap();
        let m = Move { steps: vec![6, 1], takes: vec![] };
        let after = pos.do_move(&m);
        assert_eq!(after.board[51 - 1], pieces::OPP_KING);
        assert_eq!(after.score, evaluate::eval_pos(&after.board));
        // Rotating back shows the king on the promotion square
        assert_eq!(after.rotate().board[1], pieces::KING);
    }

    #[test]
    fn test_no_promotion_when_chain_passes_through() {
        let mut layout = [b'.'; 50];
        layout[11 - 1] = pieces::MAN;
        layout[7 - 1] = pieces::OPP_MAN;
        layout[8 - 1] = pieces::OPP_MAN;
        let pos = Position::from_layout(std::str::from_utf8(&layout).unwrap()).unwrap();
        let legal = moves::legal_moves(&pos.board);
        assert_eq!(legal.len(), 1);
        let after = pos.do_move(&legal[0]);
        // Landed on 13 as a man, despite visiting square 2 mid-chain
        assert_eq!(after.board[51 - 13], pieces::OPP_MAN);
        assert_eq!(after.score, evaluate::eval_pos(&after.board));
    }
}
