//! This module contains the text adapters around the engine core:
//! draughts FEN parsing and rendering, move notation, the matcher
//! that resolves typed moves against the legal-move list, and board
//! and principal-variation rendering for the console.
//!
//! The core always sees a position with the side to move encoded
//! uppercase.  These adapters translate between that rotated view and
//! the absolute view a player reads: for Black, squares are mirrored
//! by `i -> 51 - i` on the way in and out.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::board;
use crate::evaluate;
use crate::moves::Move;
use crate::pieces;
use crate::pieces::{COLOR_BLACK, COLOR_WHITE};
use crate::position::Position;
use crate::search::PvNode;

lazy_static! {
    // Optional move-number prefix, e.g. the "12." of "12.32-28"
    static ref MOVE_PREFIX: Regex = Regex::new(r"^\d{1,2}\.").unwrap();
    // "a-b" for a non-capture, "axb(xc...)" for a capture
    static ref MOVE_TOKEN: Regex = Regex::new(r"^\d{1,2}(-\d{1,2}|(x\d{1,2})+)$").unwrap();
    // One FEN item: a square or a square range, optionally a king
    static ref FEN_ITEM: Regex = Regex::new(r"^K?\d{1,2}(-\d{1,2})?$").unwrap();
}

#[derive(Debug, Error)]
pub enum ParseError {

    #[error("invalid FEN '{0}'")]
    BadFen(String),

    #[error("invalid move notation '{0}'")]
    BadMove(String),
}

// Mirror a square into the other player's point of view
#[inline]
pub fn mirror(square: usize) -> usize {
    51 - square
}

// Parse a move token into its square list, as seen by the engine.
// The optional move-number prefix is stripped; for Black the squares
// are mirrored into the rotated encoding.
pub fn parse_move(color: usize, token: &str) -> Result<Vec<usize>, ParseError> {
    let cleaned = MOVE_PREFIX.replace(token.trim(), "");
    if !MOVE_TOKEN.is_match(&cleaned) {
        return Err(ParseError::BadMove(token.to_string()));
    }
    let mut steps = Vec::new();
    for part in cleaned.split(|c| c == '-' || c == 'x') {
        let square: usize = part
            .parse()
            .map_err(|_| ParseError::BadMove(token.to_string()))?;
        if !(1..=50).contains(&square) {
            return Err(ParseError::BadMove(token.to_string()));
        }
        steps.push(if color == COLOR_BLACK { mirror(square) } else { square });
    }
    Ok(steps)
}

// Render a move in official notation for the given player
pub fn render_move(color: usize, m: &Move) -> String {
    let sep = if m.is_capture() { "x" } else { "-" };
    let squares: Vec<String> = m
        .steps
        .iter()
        .map(|&s| {
            let shown = if color == COLOR_BLACK { mirror(s) } else { s };
            shown.to_string()
        })
        .collect();
    squares.join(sep)
}

// Resolve a parsed square list against the legal moves.  Two squares
// match on origin and destination; a longer list must equal the step
// set of the move (king multi-jumps record leg endpoints, so set
// equality is the right comparison).
pub fn match_move(legal: &[Move], steps: &[usize]) -> Option<Move> {
    if steps.len() < 2 {
        return None;
    }
    if steps.len() == 2 {
        legal
            .iter()
            .find(|m| m.origin() == steps[0] && m.dest() == steps[1])
            .cloned()
    } else {
        let wanted: HashSet<usize> = steps.iter().copied().collect();
        legal
            .iter()
            .find(|m| m.steps.iter().copied().collect::<HashSet<usize>>() == wanted)
            .cloned()
    }
}

// Parse a draughts FEN like "W:W31-50:B1-20" or
// "W:W15,19,K24:B5,8,K30".  Returns the position (rotated so the side
// to move is uppercase) and the colour of the side to move.
pub fn parse_fen(fen: &str) -> Result<(Position, usize), ParseError> {
    let bad = || ParseError::BadFen(fen.to_string());
    let trimmed = fen.trim().trim_end_matches('.');
    let mut parts = trimmed.split(':');

    let side = match parts.next() {
        Some("W") => COLOR_WHITE,
        Some("B") => COLOR_BLACK,
        _ => return Err(bad()),
    };

    let mut b = [pieces::EMPTY; board::BOARD_SIZE];
    b[0] = pieces::OFFBOARD;
    b[51] = pieces::OFFBOARD;
    let mut groups = 0;
    for group in parts {
        let group = group.trim();
        let (man, king, items) = if let Some(rest) = group.strip_prefix('W') {
            (pieces::MAN, pieces::KING, rest)
        } else if let Some(rest) = group.strip_prefix('B') {
            (pieces::OPP_MAN, pieces::OPP_KING, rest)
        } else {
            return Err(bad());
        };
        groups += 1;
        for item in items.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            if !FEN_ITEM.is_match(item) {
                return Err(bad());
            }
            let (cell, numbers) = match item.strip_prefix('K') {
                Some(rest) => (king, rest),
                None => (man, item),
            };
            let (first, last) = match numbers.split_once('-') {
                Some((a, z)) => (
                    a.parse::<usize>().map_err(|_| bad())?,
                    z.parse::<usize>().map_err(|_| bad())?,
                ),
                None => {
                    let s = numbers.parse::<usize>().map_err(|_| bad())?;
                    (s, s)
                }
            };
            if first < 1 || last > 50 || first > last {
                return Err(bad());
            }
            for s in first..=last {
                b[s] = cell;
            }
        }
    }
    if groups != 2 {
        return Err(bad());
    }

    let pos = Position { board: b, score: evaluate::eval_pos(&b) };
    if side == COLOR_BLACK {
        Ok((pos.rotate(), COLOR_BLACK))
    } else {
        Ok((pos, COLOR_WHITE))
    }
}

// Render a position back to FEN, from the absolute point of view
pub fn render_fen(pos: &Position, color: usize) -> String {
    let b = if color == COLOR_WHITE { pos.board } else { board::rotated(&pos.board) };
    let side = if color == COLOR_WHITE { "W" } else { "B" };
    let mut whites = Vec::new();
    let mut blacks = Vec::new();
    for s in 1..=50 {
        match b[s] {
            pieces::MAN => whites.push(s.to_string()),
            pieces::KING => whites.push(format!("K{}", s)),
            pieces::OPP_MAN => blacks.push(s.to_string()),
            pieces::OPP_KING => blacks.push(format!("K{}", s)),
            _ => {}
        }
    }
    format!("{}:W{}:B{}", side, whites.join(","), blacks.join(","))
}

// Render the board as a text grid in absolute orientation (White at
// the bottom, square 1 top left)
pub fn render_board(pos: &Position, color: usize) -> String {
    let b = if color == COLOR_WHITE { pos.board } else { board::rotated(&pos.board) };
    let mut out = String::new();
    for row in 0..10 {
        if row % 2 == 0 {
            out.push_str("   ");
        }
        for col in 0..5 {
            let s = row * 5 + col + 1;
            out.push(' ');
            out.push(b[s] as char);
            out.push_str("    ");
        }
        out.push('\n');
    }
    out
}

// Render a principal variation as alternating-colour move notation
// followed by the score at the start of the line
pub fn render_pv(start_color: usize, line: &[PvNode]) -> String {
    let mut parts = Vec::new();
    let mut color = start_color;
    for node in line {
        if let Some(m) = &node.mv {
            parts.push(render_move(color, m));
        }
        color = 1 - color;
    }
    if let Some(first) = line.first() {
        parts.push(format!("(score {})", first.score));
    }
    parts.join(" ")
}

// =====================================
//             UNIT TESTS
// =====================================
