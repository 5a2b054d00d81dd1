//! This module contains the three search strategies of the engine.
//!
//! 1. MTD-bi: iterative deepening around a null-window `bound` probe,
//!    bisecting on the score.  This is the default search.
//! 2. Forced variation: a minimax that only follows lines where every
//!    opponent reply is a capture.  Much faster than a full search on
//!    dedicated combination problems.
//! 3. Plain alpha-beta with aspiration windows, kept as a reference
//!    strategy.
//!
//! Each strategy has its own transposition table; all of them share
//! the move-list memo, the PST-based move ordering and the opening
//! book owned by the engine.  Search effort is budgeted in nodes: the
//! budget is checked between deepening iterations, so a search may
//! overrun it by one sweep.

use std::cmp::Reverse;
use std::collections::HashSet;

use crate::board::Board;
use crate::book::OpeningBook;
use crate::moves;
use crate::moves::{Move, MoveTable};
use crate::position::Position;
use crate::tt::{TransTable, TABLE_SIZE};

// Scores at or beyond this value are decisive: the game is won (or,
// negated, lost).  It exceeds any possible material evaluation.
pub const MATE_VALUE: i32 = 90000;

// Default node budget for a search
pub const MAX_NODES: u64 = 1000;

// Aspiration window half-width for search_ab
const AB_WINDOW: i32 = 50;

// Transposition entry of the MTD-bi search.  Whether the stored score
// failed high or low is implicit in score vs gamma.
#[derive(Clone, Debug)]
pub struct EntryTp {
    pub depth: i32,
    pub score: i32,
    pub gamma: i32,
    pub mv: Option<Move>,
}

// Transposition entry of the forced-variation search
#[derive(Clone, Debug)]
pub struct EntryPvf {
    pub depth: i32,
    pub score: i32,
    pub mv: Option<Move>,
}

// Transposition entry of the alpha-beta search
#[derive(Clone, Debug)]
pub struct EntryAb {
    pub depth: i32,
    pub score: i32,
    pub mv: Option<Move>,
}

// Common view of the three entry kinds, enough to walk a principal
// variation out of any of the tables.
pub trait PvSource {
    fn score(&self) -> i32;
    fn pv_move(&self) -> Option<&Move>;
}

impl PvSource for EntryTp {
    fn score(&self) -> i32 {
        self.score
    }
    fn pv_move(&self) -> Option<&Move> {
        self.mv.as_ref()
    }
}

impl PvSource for EntryPvf {
    fn score(&self) -> i32 {
        self.score
    }
    fn pv_move(&self) -> Option<&Move> {
        self.mv.as_ref()
    }
}

impl PvSource for EntryAb {
    fn score(&self) -> i32 {
        self.score
    }
    fn pv_move(&self) -> Option<&Move> {
        self.mv.as_ref()
    }
}

// One step of a principal variation
pub struct PvNode {
    pub pos: Position,
    pub score: i32,
    pub mv: Option<Move>,
}

// Walk the principal variation from a position by repeated table
// lookups.  A set of seen keys guards against transposition cycles;
// the walk also ends on a missing entry or an entry without a move
// (the latter is still emitted, it carries the final score).
pub fn gen_pv<E: PvSource>(pos: &Position, table: &TransTable<E>) -> Vec<PvNode> {
    let mut seen: HashSet<Board> = HashSet::new();
    let mut line = Vec::new();
    let mut current = pos.clone();
    loop {
        let key = current.key();
        if seen.contains(&key) {
            break;
        }
        let entry = match table.probe(&key) {
            Some(e) => e,
            None => break,
        };
        match entry.pv_move() {
            None => {
                line.push(PvNode { pos: current, score: entry.score(), mv: None });
                break;
            }
            Some(m) => {
                let m = m.clone();
                let next = current.do_move(&m);
                line.push(PvNode { pos: current, score: entry.score(), mv: Some(m) });
                seen.insert(key);
                current = next;
            }
        }
    }
    line
}

// The engine: the three transposition tables, the move memo, the
// opening book and the node counter of the running search.  All state
// is owned here; nothing is global.
pub struct SearchEngine {

    // Transposition table of the MTD-bi search
    pub tp: TransTable<EntryTp>,

    // Transposition table of the forced-variation search
    pub tpf: TransTable<EntryPvf>,

    // Transposition table of the alpha-beta search
    pub tpab: TransTable<EntryAb>,

    // Memoised legal-move lists
    pub moves: MoveTable,

    // Opening book, probed before the default search
    pub book: OpeningBook,

    // Nodes visited by the current search
    nodes: u64,
}

impl SearchEngine {

    pub fn new() -> SearchEngine {
        SearchEngine {
            tp: TransTable::new(TABLE_SIZE),
            tpf: TransTable::new(TABLE_SIZE),
            tpab: TransTable::new(TABLE_SIZE),
            moves: MoveTable::new(),
            book: OpeningBook::new(),
            nodes: 0,
        }
    }

    // Forget everything searched so far (the opening book stays).
    // Tables are NOT flushed between searches by default; callers use
    // this between unrelated games.
    pub fn reset(&mut self) {
        self.tp.clear();
        self.tpf.clear();
        self.tpab.clear();
        self.moves.clear();
        self.nodes = 0;
    }

    // The legal moves of a position, through the memo
    pub fn legal(&mut self, pos: &Position) -> Vec<Move> {
        self.moves.gen(&pos.board)
    }

    // Load an opening book file; a missing file leaves the book empty
    pub fn load_book(&mut self, path: &str) -> (usize, usize) {
        self.book.read_file(path, &mut self.moves)
    }

    // Nodes visited by the last search
    pub fn node_count(&self) -> u64 {
        self.nodes
    }

    // Null-window alpha-beta with memory: [alpha, beta] = [gamma-1,
    // gamma].  Gamma is a guess of the exact score; children are cut
    // off as soon as the real score reaches it.  Fail-soft: the return
    // value may fall outside the window.
    fn bound(&mut self, pos: &Position, gamma: i32, depth: i32) -> i32 {
        self.nodes += 1;

        // The stored result settles this node if it was searched at
        // least this deep and its fail direction agrees with our
        // window.
        let key = pos.key();
        let entry = self.tp.probe(&key).cloned();
        if let Some(e) = &entry {
            if depth <= e.depth
                && ((e.score < e.gamma && e.score < gamma)
                    || (e.score >= e.gamma && e.score >= gamma))
            {
                return e.score;
            }
        }

        // Stop searching if the game is already decided
        if pos.score.abs() >= MATE_VALUE {
            return pos.score;
        }

        // NULL MOVE HEURISTIC.  Give the opponent a free shot; if the
        // position still exceeds gamma, searching our own moves would
        // exceed it as well.
        if depth >= 4 && !moves::has_capture(&pos.board) {
            let r = if depth > 8 { 3 } else { 2 };
            let nullscore = -self.bound(&pos.rotate(), 1 - gamma, depth - 1 - r);
            if nullscore >= gamma {
                return nullscore;
            }
        }

        // QUIESCENCE: evaluate only once the horizon is reached AND
        // the position has no capture hanging.
        if depth <= 0 && !moves::has_capture(&pos.board) {
            return pos.score;
        }

        // Order moves by their immediate evaluation delta to provoke
        // early cut-offs.
        let mut move_list = self.moves.gen(&pos.board);
        move_list.sort_by_key(|m| Reverse(pos.eval_move(m)));

        let mut best = -MATE_VALUE;
        let mut best_move: Option<Move> = None;
        for m in &move_list {
            let score = -self.bound(&pos.do_move(m), 1 - gamma, depth - 1);
            if score > best {
                best = score;
                best_move = Some(m.clone());
            }
            if score >= gamma {
                break;
            }
        }

        // Store fail-high results, preferring deeper ones: those are
        // the entries the principal variation is rebuilt from.
        let replace = match &entry {
            None => true,
            Some(e) => depth >= e.depth && best >= gamma,
        };
        if replace {
            self.tp.store(key, EntryTp { depth, score: best, gamma, mv: best_move });
        }

        best
    }

    // Iterative deepening MTD-bi search: at each depth, binary-search
    // the score with null-window probes.  Returns the best move found
    // and its score; the move is None if the root has no entry.
    pub fn search(&mut self, pos: &Position, max_nodes: u64) -> (Option<Move>, i32) {
        if let Some(m) = self.book.search_move(pos, &mut self.moves) {
            println!("Move from opening book");
            self.tp.store(
                pos.key(),
                EntryTp { depth: 0, score: pos.score, gamma: 0, mv: Some(m.clone()) },
            );
            return (Some(m), pos.score);
        }

        self.nodes = 0;
        println!("thinking ....   max nodes: {}", max_nodes);
        println!("{:>8} {:>8} {:>8} {:>8}", "depth", "nodes", "gamma", "score");

        let mut score = pos.score;
        // The depth is capped so the endgame cannot blow the stack
        for depth in 1..99 {
            // Binary search on the score of the position.  Entries
            // pulled from the transposition table may break the
            // invariant lower <= score <= upper, hence the margin in
            // the loop condition.
            let (mut lower, mut upper) = (-MATE_VALUE, MATE_VALUE);
            let mut gamma = 0;
            while lower < upper - 3 {
                gamma = (lower + upper + 1).div_euclid(2);
                score = self.bound(pos, gamma, depth);
                if score >= gamma {
                    lower = score;
                } else {
                    upper = score;
                }
            }

            println!("{:>8} {:>8} {:>8} {:>8}", depth, self.nodes, gamma, score);

            // Stop deepening when the budget is spent or the game is
            // decided.
            if self.nodes >= max_nodes || score.abs() >= MATE_VALUE {
                break;
            }
        }

        match self.tp.probe(&pos.key()) {
            Some(e) => (e.mv.clone(), e.score),
            None => (None, score),
        }
    }

    // Fail-soft negamax restricted to forced lines.  The root side
    // only plays captures or moves that leave the opponent with a
    // capture; the opponent only plays captures.  When no move
    // survives the filter the line cannot be forced further and the
    // position evaluates as it stands.
    fn minimax_pvf(&mut self, pos: &Position, depth: i32, player: usize) -> i32 {
        self.nodes += 1;

        let key = pos.key();
        let entry = self.tpf.probe(&key).cloned();
        if let Some(e) = &entry {
            if depth <= e.depth {
                return e.score;
            }
        }

        // QUIESCENCE as in the main search
        if depth <= 0 && !moves::has_capture(&pos.board) {
            return pos.score;
        }

        let move_list = self.moves.gen(&pos.board);
        let mut best = -MATE_VALUE;
        let mut best_move: Option<Move> = None;
        let mut considered = 0;
        for m in &move_list {
            let child = pos.do_move(m);
            if player == 0 && !m.is_capture() && !moves::has_capture(&child.board) {
                // Only look at moves that lead to a capture for the
                // opponent; own captures are always inspected.
                continue;
            }
            if player == 1 && !m.is_capture() {
                continue;
            }
            considered += 1;
            let score = -self.minimax_pvf(&child, depth - 1, 1 - player);
            if score > best {
                best = score;
                best_move = Some(m.clone());
            }
        }

        if considered == 0 {
            // No move keeps the opponent forced
            return pos.score;
        }

        let replace = match &entry {
            None => true,
            Some(e) => depth > e.depth,
        };
        if replace {
            self.tpf.store(key, EntryPvf { depth, score: best, mv: best_move });
        }

        best
    }

    // Iterative deepening of the forced-variation search
    pub fn search_pvf(&mut self, pos: &Position, max_nodes: u64) -> (Option<Move>, i32) {
        self.nodes = 0;
        println!("thinking ....   max nodes: {}", max_nodes);
        println!("{:>8} {:>8} {:>8}", "depth", "nodes", "score");

        let mut best = pos.score;
        for depth in 1..99 {
            best = self.minimax_pvf(pos, depth, 0);

            println!("{:>8} {:>8} {:>8}", depth, self.nodes, best);

            if self.nodes >= max_nodes {
                break;
            }
        }

        match self.tpf.probe(&pos.key()) {
            Some(e) => (e.mv.clone(), best),
            None => (None, best),
        }
    }

    // Fail-soft alpha-beta with explicit player sides: player 0
    // maximises, player 1 minimises, the score always reads from the
    // root side's perspective.
    fn alphabeta(
        &mut self,
        pos: &Position,
        alpha: i32,
        beta: i32,
        depth_left: i32,
        player: usize,
    ) -> i32 {
        self.nodes += 1;

        let key = pos.key();
        let entry = self.tpab.probe(&key).cloned();
        if let Some(e) = &entry {
            if depth_left <= e.depth {
                return e.score;
            }
        }

        if pos.score.abs() >= MATE_VALUE {
            return pos.score;
        }

        // NULL MOVE HEURISTIC, against beta for the maximiser and
        // against alpha for the minimiser
        if depth_left >= 4 && !moves::has_capture(&pos.board) {
            let r = if depth_left > 8 { 3 } else { 2 };
            let nullscore =
                self.alphabeta(&pos.rotate(), alpha, alpha + 1, depth_left - 1 - r, 1 - player);
            if player == 0 && nullscore >= beta {
                return beta;
            }
            if player == 1 && nullscore <= alpha {
                return alpha;
            }
        }

        let mut move_list = self.moves.gen(&pos.board);
        move_list.sort_by_key(|m| Reverse(pos.eval_move(m)));

        let best_value;
        let mut best_move: Option<Move> = None;
        if player == 0 {
            // QUIESCENCE
            if depth_left <= 0 && !moves::has_capture(&pos.board) {
                return pos.score;
            }
            let mut best = -MATE_VALUE;
            let mut alpha_max = alpha;
            for m in &move_list {
                let score = self.alphabeta(&pos.do_move(m), alpha_max, beta, depth_left - 1, 1);
                if score > best {
                    best = score;
                    best_move = Some(m.clone());
                }
                alpha_max = alpha_max.max(best);
                if alpha_max >= beta {
                    break;
                }
            }
            best_value = best;
        } else {
            // QUIESCENCE, negated: pos.score is the mover's view and
            // the mover here is the opponent
            if depth_left <= 0 && !moves::has_capture(&pos.board) {
                return -pos.score;
            }
            let mut best = MATE_VALUE;
            let mut beta_min = beta;
            for m in &move_list {
                let score = self.alphabeta(&pos.do_move(m), alpha, beta_min, depth_left - 1, 0);
                if score < best {
                    best = score;
                    best_move = Some(m.clone());
                }
                beta_min = beta_min.min(best);
                if beta_min <= alpha {
                    break;
                }
            }
            best_value = best;
        }

        let replace = match &entry {
            None => true,
            Some(e) => depth_left > e.depth,
        };
        if replace {
            self.tpab.store(key, EntryAb { depth: depth_left, score: best_value, mv: best_move });
        }

        best_value
    }

    // Iterative deepening alpha-beta enhanced with aspiration windows:
    // search with a narrow window around the previous score, and fall
    // back to the full window at the same depth when the score lands
    // outside it.
    pub fn search_ab(&mut self, pos: &Position, max_nodes: u64) -> (Option<Move>, i32) {
        self.nodes = 0;
        println!("thinking ....   max nodes: {}", max_nodes);
        println!(
            "{:>8} {:>8} {:>8} {:>8} {:>8}",
            "depth", "nodes", "score", "alpha", "beta"
        );

        let (mut alpha, mut beta) = (-MATE_VALUE, MATE_VALUE);
        let mut depth_left = 1;
        let mut score = pos.score;
        while depth_left < 99 {
            score = self.alphabeta(pos, alpha, beta, depth_left, 0);

            println!(
                "{:>8} {:>8} {:>8} {:>8} {:>8}",
                depth_left, self.nodes, score, alpha, beta
            );

            if self.nodes >= max_nodes || score.abs() >= MATE_VALUE {
                break;
            }

            if score <= alpha || score >= beta {
                // Fail low/high: re-search the same depth with the
                // full window.
                alpha = -MATE_VALUE;
                beta = MATE_VALUE;
                continue;
            }

            alpha = score - AB_WINDOW;
            beta = score + AB_WINDOW;
            depth_left += 1;
        }

        match self.tpab.probe(&pos.key()) {
            Some(e) => (e.mv.clone(), e.score),
            None => (None, score),
        }
    }
}

// =====================================
//             UNIT TESTS
// =====================================

#[cfg(test)]
mod tests {

    use super::*;
    use crate::play;

    fn position(fen: &str) -> Position {
        play::parse_fen(fen).unwrap().0
    }

    #[test]
    fn test_search_finds_the_winning_capture() {
        let mut engine = SearchEngine::new();
        let pos = position("W:W28:B23");
        let (mv, score) = engine.search(&pos, 1000);
        let mv = mv.unwrap();
        assert_eq!(mv.steps, vec![28, 19]);
        assert_eq!(mv.takes, vec![23]);
        assert!(score >= MATE_VALUE);
    }

    #[test]
    fn test_search_on_initial_position_keeps_score_modest() {
        let mut engine = SearchEngine::new();
        let pos = Position::initial();
        let (mv, score) = engine.search(&pos, 1000);
        assert!(mv.is_some());
        assert!(score.abs() < MATE_VALUE);
        assert!(engine.node_count() >= 1000);
    }

    #[test]
    fn test_search_with_no_legal_move_returns_none() {
        // Lone opponent king, no own pieces: the mover has no move
        let mut engine = SearchEngine::new();
        let pos = position("W:W:BK5");
        let (mv, score) = engine.search(&pos, 100);
        assert!(mv.is_none());
        assert!(score <= -MATE_VALUE);
    }

    #[test]
    fn test_forced_variation_finds_the_two_for_one_shot() {
        // 33-29 forces 24x33, after which 38x29x18 wins both men
        let mut engine = SearchEngine::new();
        let pos = position("W:W33,34,38:B23,24");
        let (mv, score) = engine.search_pvf(&pos, 1000);
        let mv = mv.unwrap();
        assert_eq!(mv.steps, vec![33, 29]);
        assert!(mv.takes.is_empty());
        assert!(score > 1500);
    }

    #[test]
    fn test_mtd_bi_agrees_on_the_combination() {
        let mut engine = SearchEngine::new();
        let pos = position("W:W33,34,38:B23,24");
        let (mv, score) = engine.search(&pos, 10000);
        let mv = mv.unwrap();
        assert_eq!(mv.steps, vec![33, 29]);
        assert!(score > 1500);
    }

    #[test]
    fn test_alphabeta_agrees_on_the_combination() {
        let mut engine = SearchEngine::new();
        let pos = position("W:W33,34,38:B23,24");
        let (mv, score) = engine.search_ab(&pos, 10000);
        let mv = mv.unwrap();
        assert_eq!(mv.steps, vec![33, 29]);
        assert!(score > 1500);
    }

    #[test]
    fn test_gen_pv_walks_the_line() {
        let mut engine = SearchEngine::new();
        let pos = position("W:W28:B23");
        engine.search(&pos, 1000);
        let line = gen_pv(&pos, &engine.tp);
        assert!(!line.is_empty());
        let first = line[0].mv.as_ref().unwrap();
        assert_eq!(first.steps, vec![28, 19]);
        // The line ends: either on a terminal entry without a move or
        // by running out of entries.
        assert!(line.len() <= 3);
    }

    #[test]
    fn test_tp_depth_never_decreases_on_replacement() {
        let mut engine = SearchEngine::new();
        let pos = position("W:W33,34,38:B23,24");
        engine.search(&pos, 500);
        let depth_first = engine.tp.probe(&pos.key()).map(|e| e.depth).unwrap_or(0);
        engine.search(&pos, 2000);
        let depth_second = engine.tp.probe(&pos.key()).map(|e| e.depth).unwrap_or(0);
        assert!(depth_second >= depth_first);
    }
}
