//! This module contains the legal move generator.
//!
//! International Draughts capture rules apply: men capture forward and
//! backward, kings slide and capture along full diagonals, and the
//! majority rule makes only the captures with the maximum number of
//! taken pieces legal.  Multi-jump chains are built by recursion; the
//! pieces taken along a chain stay on the board (and keep blocking
//! rays) until the chain is complete.
//!
//! Generation works on the rotated encoding: the side to move is
//! always uppercase and its men always advance toward lower squares.

use std::collections::HashMap;

use crate::board;
use crate::board::{Board, DIRECTIONS};
use crate::pieces;

// Maximum number of cached move lists.  The cache is cleared wholesale
// when it would grow beyond this.
const MOVE_TABLE_SIZE: usize = 1_000_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Move {

    // Visited squares in order: origin first, destination last.  For
    // king multi-jumps only the landing square of each leg appears.
    pub steps: Vec<usize>,

    // Squares of the captured pieces, in capture order
    pub takes: Vec<usize>,
}

impl Move {

    // Square the move starts from
    #[inline]
    pub fn origin(&self) -> usize {
        self.steps[0]
    }

    // Square the move ends on
    #[inline]
    pub fn dest(&self) -> usize {
        self.steps[self.steps.len() - 1]
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        !self.takes.is_empty()
    }
}

// Single-square moves and one-take captures starting at square i.
// For a man: a forward step onto an empty square, or a jump (in any of
// the four directions) over an adjacent opponent piece onto the empty
// square directly beyond it.
// For a king: every empty square along a ray before the first piece,
// and, if that first piece belongs to the opponent, every empty square
// of the run beyond it as a capture landing.
fn basic_moves_from(board: &Board, i: usize) -> Vec<Move> {
    let mut moves = Vec::new();
    match board[i] {
        pieces::MAN => {
            for (table, forward) in DIRECTIONS {
                let j = table[i];
                if j == 0 {
                    continue;
                }
                let cell = board[j];
                if cell == pieces::EMPTY {
                    if forward {
                        moves.push(Move { steps: vec![i, j], takes: vec![] });
                    }
                } else if pieces::is_opp(cell) {
                    let k = table[j];
                    if k != 0 && board[k] == pieces::EMPTY {
                        moves.push(Move { steps: vec![i, k], takes: vec![j] });
                    }
                }
            }
        }
        pieces::KING => {
            for (table, _) in DIRECTIONS {
                let mut taken: Option<usize> = None;
                for j in board::diagonal(i, table) {
                    let cell = board[j];
                    if cell == pieces::EMPTY {
                        match taken {
                            None => moves.push(Move { steps: vec![i, j], takes: vec![] }),
                            Some(t) => moves.push(Move { steps: vec![i, j], takes: vec![t] }),
                        }
                    } else if pieces::is_opp(cell) && taken.is_none() {
                        taken = Some(j);
                    } else {
                        // Own piece, or a second opponent piece
                        break;
                    }
                }
            }
        }
        _ => {}
    }
    moves
}

// The board as it looks mid-chain: the mover has left its origin and
// stands on the last landing square, the taken pieces are still there.
fn board_mid_chain(board: &Board, m: &Move) -> Board {
    let mut b = *board;
    let piece = b[m.origin()];
    b[m.origin()] = pieces::EMPTY;
    b[m.dest()] = piece;
    b
}

// Extend a one-take capture into all maximal chains.  Each candidate
// continuation is a fresh one-take capture from the current landing
// square whose taken piece is not already in the chain.  A chain with
// no continuation is complete and gets emitted.
fn extend_capture(board: &Board, m: Move, out: &mut Vec<Move>) {
    let mid = board_mid_chain(board, &m);
    let mut extended = false;
    for next in basic_moves_from(&mid, m.dest()) {
        if !next.is_capture() {
            continue;
        }
        let t = next.takes[0];
        if m.takes.contains(&t) {
            continue;
        }
        extended = true;
        let mut chain = m.clone();
        chain.steps.push(next.dest());
        chain.takes.push(t);
        extend_capture(board, chain, out);
    }
    if !extended {
        out.push(m);
    }
}

// Generate all legal moves for the side to move.  If any capture
// exists, only the captures taking the maximum number of pieces are
// returned (the majority rule); otherwise the non-captures are.
pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut captures: Vec<Move> = Vec::new();
    let mut quiet: Vec<Move> = Vec::new();
    for i in 1..=50 {
        if !pieces::is_own(board[i]) {
            continue;
        }
        for m in basic_moves_from(board, i) {
            if m.is_capture() {
                extend_capture(board, m, &mut captures);
            } else {
                quiet.push(m);
            }
        }
    }
    if captures.is_empty() {
        return quiet;
    }
    let most = captures.iter().map(|m| m.takes.len()).max().unwrap_or(0);
    captures.retain(|m| m.takes.len() == most);
    captures
}

// Does the side to move have any capture available?  This is the hot
// test of the quiescence and null-move checks, so it looks for a
// single jump and stops early instead of generating full chains.
pub fn has_capture(board: &Board) -> bool {
    (1..=50).any(|i| pieces::is_own(board[i]) && square_can_capture(board, i))
}

fn square_can_capture(board: &Board, i: usize) -> bool {
    match board[i] {
        pieces::MAN => DIRECTIONS.iter().any(|&(table, _)| {
            let j = table[i];
            j != 0 && pieces::is_opp(board[j]) && table[j] != 0 && board[table[j]] == pieces::EMPTY
        }),
        pieces::KING => DIRECTIONS.iter().any(|&(table, _)| {
            let mut taken = false;
            for j in board::diagonal(i, table) {
                let cell = board[j];
                if cell == pieces::EMPTY {
                    if taken {
                        return true;
                    }
                } else if pieces::is_opp(cell) && !taken {
                    taken = true;
                } else {
                    break;
                }
            }
            false
        }),
        _ => false,
    }
}

// Memo for generated move lists, keyed by the board itself.  Search
// revisits transposed positions constantly; this avoids regenerating
// their move lists.  On overflow the whole cache is dropped.
pub struct MoveTable {
    cache: HashMap<Board, Vec<Move>>,
    capacity: usize,
}

impl MoveTable {

    pub fn new() -> MoveTable {
        MoveTable {
            cache: HashMap::new(),
            capacity: MOVE_TABLE_SIZE,
        }
    }

    // The legal moves of a position, from the cache when possible
    pub fn gen(&mut self, board: &Board) -> Vec<Move> {
        if let Some(list) = self.cache.get(board) {
            return list.clone();
        }
        let list = legal_moves(board);
        if self.cache.len() >= self.capacity {
            self.cache.clear();
        }
        self.cache.insert(*board, list.clone());
        list
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

// =====================================
//             UNIT TESTS
// =====================================

#[cfg(test)]
mod tests {

    use super::*;
    use crate::board::INITIAL_BOARD;

    fn board_with(own: &[(usize, u8)], opp: &[(usize, u8)]) -> Board {
        let mut b = [pieces::EMPTY; board::BOARD_SIZE];
        b[0] = pieces::OFFBOARD;
        b[51] = pieces::OFFBOARD;
        for &(s, p) in own {
            b[s] = p;
        }
        for &(s, p) in opp {
            b[s] = p;
        }
        b
    }

    #[test]
    fn test_initial_position_has_nine_moves() {
        let moves = legal_moves(&INITIAL_BOARD);
        assert_eq!(moves.len(), 9);
        assert!(moves.iter().all(|m| !m.is_capture()));
        // Every move starts on the front rank and advances
        assert!(moves.iter().all(|m| (31..=35).contains(&m.origin())));
        assert!(moves.iter().all(|m| (26..=30).contains(&m.dest())));
        assert!(!has_capture(&INITIAL_BOARD));
    }

    #[test]
    fn test_man_captures_backward() {
        let b = board_with(&[(28, pieces::MAN)], &[(33, pieces::OPP_MAN)]);
        let moves = legal_moves(&b);
        assert_eq!(moves, vec![Move { steps: vec![28, 39], takes: vec![33] }]);
        assert!(has_capture(&b));
    }

    #[test]
    fn test_majority_capture_beats_shorter_chain() {
        // A triple jump and a single jump are both on the board; only
        // the triple is legal.
        let b = board_with(
            &[(38, pieces::MAN)],
            &[
                (33, pieces::OPP_MAN),
                (24, pieces::OPP_MAN),
                (14, pieces::OPP_MAN),
                (43, pieces::OPP_MAN),
            ],
        );
        let moves = legal_moves(&b);
        assert_eq!(
            moves,
            vec![Move { steps: vec![38, 29, 20, 9], takes: vec![33, 24, 14] }]
        );
    }

    #[test]
    fn test_chain_may_not_take_the_same_piece_twice() {
        // From square 20 the man could jump back over 24, but 24 is
        // already taken earlier in the chain.
        let b = board_with(
            &[(38, pieces::MAN)],
            &[(33, pieces::OPP_MAN), (24, pieces::OPP_MAN)],
        );
        let moves = legal_moves(&b);
        assert_eq!(moves, vec![Move { steps: vec![38, 29, 20], takes: vec![33, 24] }]);
    }

    #[test]
    fn test_king_slides_and_ray_captures() {
        let b = board_with(&[(3, pieces::KING)], &[(14, pieces::OPP_MAN)]);
        let moves = legal_moves(&b);
        // Captures exist, so only captures are returned: one landing
        // for every empty square beyond the taken piece on the ray.
        assert_eq!(moves.len(), 2);
        assert!(moves.contains(&Move { steps: vec![3, 20], takes: vec![14] }));
        assert!(moves.contains(&Move { steps: vec![3, 25], takes: vec![14] }));
    }

    #[test]
    fn test_king_ray_stops_behind_own_and_doubled_pieces() {
        // Own piece on the ray: no capture of the piece behind it.
        let b = board_with(
            &[(3, pieces::KING), (9, pieces::MAN)],
            &[(14, pieces::OPP_MAN)],
        );
        assert!(!has_capture(&b));
        // Two opponent pieces in a row cannot be jumped either.
        let b = board_with(
            &[(3, pieces::KING)],
            &[(9, pieces::OPP_MAN), (14, pieces::OPP_MAN)],
        );
        assert!(!has_capture(&b));
    }

    #[test]
    fn test_king_quiet_moves_cover_the_whole_diagonal() {
        let b = board_with(&[(46, pieces::KING)], &[]);
        let moves = legal_moves(&b);
        let ne: Vec<usize> = vec![41, 37, 32, 28, 23, 19, 14, 10, 5];
        for dest in ne {
            assert!(moves.contains(&Move { steps: vec![46, dest], takes: vec![] }));
        }
    }

    #[test]
    fn test_transit_through_promotion_row_keeps_chain_going() {
        // The chain lands on square 2 mid-jump and continues; the
        // single jump to 2 must not be emitted on its own.
        let b = board_with(
            &[(11, pieces::MAN)],
            &[(7, pieces::OPP_MAN), (8, pieces::OPP_MAN)],
        );
        let moves = legal_moves(&b);
        assert_eq!(moves, vec![Move { steps: vec![11, 2, 13], takes: vec![7, 8] }]);
    }

    #[test]
    fn test_move_table_caches_and_clears() {
        let mut table = MoveTable::new();
        let first = table.gen(&INITIAL_BOARD);
        let second = table.gen(&INITIAL_BOARD);
        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
        table.clear();
        assert!(table.is_empty());
    }
}
