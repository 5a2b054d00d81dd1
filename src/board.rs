//! This module contains the board geometry: the padded 52-cell board
//! array and the precomputed diagonal neighbour tables.
//! Note that 'for' loops are not allowed in Rust const fn (yet).  Hence,
//! these functions will often use a simple 'loop' with breaks.
//!
//! Only the 50 dark squares of the 10x10 board are playable, numbered
//! 1..50 in official notation, five per row with alternating offsets:
//!    01  02  03  04  05
//!  06  07  08  09  10
//!    11  12  13  14  15
//!  16  17  18  19  20
//!    21  22  23  24  25
//!  26  27  28  29  30
//!    31  32  33  34  35
//!  36  37  38  39  40
//!    41  42  43  44  45
//!  46  47  48  49  50
//! Indices 0 and 51 of the board array are off-board sentinels, which
//! makes rotation a simple index reversal.

use crate::pieces;

// The padded board: sentinel, squares 1..50, sentinel
pub const BOARD_SIZE: usize = 52;
pub type Board = [u8; BOARD_SIZE];

// Promotion squares for the side to move
pub const PROMOTION_FIRST: usize = 1;
pub const PROMOTION_LAST: usize = 5;

// Build the neighbour table for one diagonal direction.  Entry s holds
// the adjacent square of s in that direction, or 0 if the step leaves
// the board.  The column offset of a row alternates with row parity,
// which is why the even- and odd-row cases differ.
const fn build_direction_table(north: bool, east: bool) -> [usize; 51] {
    let mut table = [0usize; 51];
    let mut s = 1;
    loop {
        let row = (s - 1) / 5;
        let col = (s - 1) % 5;
        let even_row = row % 2 == 0;
        table[s] = if north {
            if row == 0 {
                0
            } else if even_row {
                // Even rows sit shifted right; their western neighbour
                // always exists, the eastern one falls off at col 4.
                if east {
                    if col < 4 { s - 4 } else { 0 }
                } else {
                    s - 5
                }
            } else if east {
                s - 5
            } else if col > 0 {
                s - 6
            } else {
                0
            }
        } else if row == 9 {
            0
        } else if even_row {
            if east {
                if col < 4 { s + 6 } else { 0 }
            } else {
                s + 5
            }
        } else if east {
            s + 5
        } else if col > 0 {
            s + 4
        } else {
            0
        };
        s += 1;
        if s > 50 {
            break;
        }
    }
    table
}

// The four diagonal neighbour tables
pub const NE: [usize; 51] = build_direction_table(true, true);
pub const NW: [usize; 51] = build_direction_table(true, false);
pub const SE: [usize; 51] = build_direction_table(false, true);
pub const SW: [usize; 51] = build_direction_table(false, false);

// All directions with their "forward for a man" flag.  The side to move
// advances north (toward lower square numbers).
pub const DIRECTIONS: [(&[usize; 51], bool); 4] =
    [(&NE, true), (&NW, true), (&SE, false), (&SW, false)];

// Walk a diagonal ray from a square (exclusive) until the board edge
pub fn diagonal(square: usize, table: &'static [usize; 51]) -> impl Iterator<Item = usize> {
    std::iter::successors(Some(table[square]), |&j| Some(table[j])).take_while(|&j| j != 0)
}

// Is this a promotion square for the side to move?
#[inline]
pub fn is_promotion_square(square: usize) -> bool {
    (PROMOTION_FIRST..=PROMOTION_LAST).contains(&square)
}

// The starting board: 20 opponent men on 1-20, 20 own men on 31-50,
// White to move
const fn build_initial_board() -> Board {
    let mut board = [pieces::EMPTY; BOARD_SIZE];
    board[0] = pieces::OFFBOARD;
    board[51] = pieces::OFFBOARD;
    let mut s = 1;
    loop {
        if s <= 20 {
            board[s] = pieces::OPP_MAN;
        } else if s >= 31 {
            board[s] = pieces::MAN;
        }
        s += 1;
        if s > 50 {
            break;
        }
    }
    board
}

pub const INITIAL_BOARD: Board = build_initial_board();

// Reverse the board and swap the side of every piece.  The sentinels
// at 0 and 51 map onto each other.
pub fn rotated(board: &Board) -> Board {
    let mut out = [pieces::OFFBOARD; BOARD_SIZE];
    for i in 0..BOARD_SIZE {
        out[i] = pieces::swap_side(board[BOARD_SIZE - 1 - i]);
    }
    out
}

// =====================================
//             UNIT TESTS
// =====================================

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_direction_tables() {
        // Sentinel entry
        assert_eq!(NE[0], 0);
        // Corners and edges
        assert_eq!(NE[1], 0);
        assert_eq!(NW[1], 0);
        assert_eq!(SW[1], 6);
        assert_eq!(SE[1], 7);
        assert_eq!(NE[6], 1);
        assert_eq!(NW[6], 0);
        assert_eq!(SE[50], 0);
        assert_eq!(SW[50], 0);
        assert_eq!(NE[50], 45);
        assert_eq!(NW[50], 44);
        // Left and right edge squares
        assert_eq!(NW[26], 0);
        assert_eq!(SW[26], 0);
        assert_eq!(NE[26], 21);
        assert_eq!(SE[26], 31);
        assert_eq!(NE[45], 0);
        assert_eq!(SE[45], 0);
        assert_eq!(NW[45], 40);
        assert_eq!(SW[45], 50);
        // Interior square
        assert_eq!(NE[28], 23);
        assert_eq!(NW[28], 22);
        assert_eq!(SE[28], 33);
        assert_eq!(SW[28], 32);
    }

    #[test]
    fn test_every_neighbour_is_reciprocal() {
        // If t is the d-neighbour of s, then s is the opposite-direction
        // neighbour of t.
        for s in 1..=50 {
            assert_eq!(NE[s] == 0 || SW[NE[s]] == s, true);
            assert_eq!(NW[s] == 0 || SE[NW[s]] == s, true);
            assert_eq!(SE[s] == 0 || NW[SE[s]] == s, true);
            assert_eq!(SW[s] == 0 || NE[SW[s]] == s, true);
        }
    }

    #[test]
    fn test_diagonal_ray() {
        let ray: Vec<usize> = diagonal(3, &SE).collect();
        assert_eq!(ray, vec![9, 14, 20, 25]);
        let ray: Vec<usize> = diagonal(46, &NE).collect();
        assert_eq!(ray, vec![41, 37, 32, 28, 23, 19, 14, 10, 5]);
        let ray: Vec<usize> = diagonal(5, &NE).collect();
        assert!(ray.is_empty());
    }

    #[test]
    fn test_initial_board() {
        assert_eq!(INITIAL_BOARD[0], pieces::OFFBOARD);
        assert_eq!(INITIAL_BOARD[51], pieces::OFFBOARD);
        assert_eq!(INITIAL_BOARD[1], pieces::OPP_MAN);
        assert_eq!(INITIAL_BOARD[20], pieces::OPP_MAN);
        assert_eq!(INITIAL_BOARD[25], pieces::EMPTY);
        assert_eq!(INITIAL_BOARD[31], pieces::MAN);
        assert_eq!(INITIAL_BOARD[50], pieces::MAN);
    }

    #[test]
    fn test_rotated_twice_is_identity() {
        let once = rotated(&INITIAL_BOARD);
        assert_eq!(rotated(&once), INITIAL_BOARD);
        // The initial position is symmetric under rotation
        assert_eq!(once, INITIAL_BOARD);
    }
}
