//! This module contains the opening book: a frequency-weighted table
//! of positions reached by known opening lines, probed before the
//! default search.
//!
//! A book file is plain UTF-8 text with one opening per line, moves
//! separated by whitespace and optionally prefixed with a move number
//! ("1.32-28 19-23 2.38-32 ...").  Every line is replayed from the
//! starting position; the board key AFTER each move gets an entry
//! whose frequency counts how many lines pass through it.  Probing a
//! position means looking up the key each legal move would lead to.

use rand::Rng;

use crate::moves::{Move, MoveTable};
use crate::pieces::COLOR_WHITE;
use crate::play;
use crate::position::Position;
use crate::tt::{TransTable, TABLE_SIZE};

#[derive(Clone, Debug)]
pub struct BookEntry {

    // Number of book lines passing through this position
    pub freq: u32,
}

// How a move is picked when several legal moves stay in book
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {

    // Pick a random in-book move (the default)
    Random,

    // Always pick the move with the highest frequency
    HighestFrequency,
}

pub struct OpeningBook {

    // Book entries keyed by post-move board
    table: TransTable<BookEntry>,

    // Candidate selection strategy
    selection: Selection,
}

impl OpeningBook {

    pub fn new() -> OpeningBook {
        OpeningBook {
            table: TransTable::new(TABLE_SIZE),
            selection: Selection::Random,
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    // Read a book file, replacing the current book.  A missing file
    // is reported and leaves the book empty; a bad move is reported
    // and aborts its line, the rest of the file still loads.  Returns
    // (lines read, positions stored).
    pub fn read_file(&mut self, path: &str, moves: &mut MoveTable) -> (usize, usize) {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => {
                eprintln!("Opening book not available: {}", path);
                return (0, 0);
            }
        };
        println!("Reading opening book <{}> ....", path);
        self.table.clear();
        let mut line_count = 0;
        let mut move_count = 0;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            line_count += 1;
            move_count += self.add_line(line, moves);
        }
        println!(
            "Opening book read: {} lines and {} positions",
            line_count, move_count
        );
        (line_count, move_count)
    }

    // Replay one opening line from the starting position, storing an
    // entry after every move.  Returns the number of moves added.
    fn add_line(&mut self, line: &str, moves: &mut MoveTable) -> usize {
        let mut pos = Position::initial();
        let mut color = COLOR_WHITE;
        let mut added = 0;
        for token in line.split_whitespace() {
            let steps = match play::parse_move(color, token) {
                Ok(steps) => steps,
                Err(err) => {
                    eprintln!("Opening book: {} in line '{}'", err, line);
                    break;
                }
            };
            let legal = moves.gen(&pos.board);
            let m = match play::match_move(&legal, &steps) {
                Some(m) => m,
                None => {
                    eprintln!("Opening book: illegal move '{}' in line '{}'", token, line);
                    break;
                }
            };
            pos = pos.do_move(&m);
            let freq = match self.table.probe(&pos.key()) {
                Some(entry) => entry.freq + 1,
                None => 1,
            };
            self.table.store(pos.key(), BookEntry { freq });
            color = 1 - color;
            added += 1;
        }
        added
    }

    // Probe the book: collect the legal moves whose resulting
    // position is in book and pick one according to the selection
    // strategy.
    pub fn search_move(&self, pos: &Position, moves: &mut MoveTable) -> Option<Move> {
        if self.table.is_empty() {
            return None;
        }
        let mut candidates: Vec<(Move, u32)> = Vec::new();
        for m in moves.gen(&pos.board) {
            let next = pos.do_move(&m);
            if let Some(entry) = self.table.probe(&next.key()) {
                candidates.push((m, entry.freq));
            }
        }
        if candidates.is_empty() {
            return None;
        }
        match self.selection {
            Selection::HighestFrequency => {
                candidates.sort_by_key(|&(_, freq)| std::cmp::Reverse(freq));
                Some(candidates.swap_remove(0).0)
            }
            Selection::Random => {
                let mut rng = rand::thread_rng();
                let pick = rng.gen_range(0..candidates.len());
                Some(candidates.swap_remove(pick).0)
            }
        }
    }
}

// =====================================
//             UNIT TESTS
// =====================================
