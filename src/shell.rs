//! This module implements the interactive console shell.
//!
//! The shell is a thin adapter: it parses commands from stdin, keeps
//! track of which colour the side to move really is (the engine core
//! only knows the rotated view), and drives the engine through its
//! public API.

use std::io;

use crate::moves::Move;
use crate::pieces::{COLOR_BLACK, COLOR_WHITE};
use crate::play;
use crate::position::Position;
use crate::search;
use crate::search::SearchEngine;

pub struct Shell {

    // The engine
    engine: SearchEngine,

    // Current position, rotated so the side to move is uppercase
    pos: Position,

    // Colour of the side to move, for parsing and rendering
    color: usize,

    // Node budget per search
    max_nodes: u64,
}

impl Shell {

    pub fn new() -> Shell {
        Shell {
            engine: SearchEngine::new(),
            pos: Position::initial(),
            color: COLOR_WHITE,
            max_nodes: search::MAX_NODES,
        }
    }

    // The main command processing loop
    pub fn main_loop(&mut self) {
        loop {
            let mut line = String::new();
            match io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            match tokens[0] {
                "q" | "quit" => break,
                "new" => self.new_command(),
                "fen" => self.fen_command(&tokens),
                "p" => print!("{}", play::render_board(&self.pos, self.color)),
                "eval" => println!("score: {}", self.pos.score),
                "legal" => self.legal_command(),
                "m" => self.move_command(&tokens),
                "go" => self.go_command(),
                "pvf" => self.pvf_command(),
                "ab" => self.ab_command(),
                "pv" => self.pv_command(),
                "nodes" => self.nodes_command(&tokens),
                "book" => self.book_command(&tokens),
                "h" | "help" => self.help_command(),
                _ => println!("Unknown command (try 'h' for help)"),
            }
        }
    }

    fn help_command(&self) {
        println!("Commands:");
        println!("  new          start a new game");
        println!("  fen <fen>    set the position from FEN");
        println!("  p            print the board");
        println!("  eval         print the score of the position");
        println!("  legal        list the legal moves");
        println!("  m <move>     play a move (e.g. m 32-28, m 26x37)");
        println!("  go           search (MTD-bi) and play the best move");
        println!("  pvf          search for a forced variation");
        println!("  ab           search with alpha-beta and aspiration");
        println!("  pv           print the principal variation");
        println!("  nodes <n>    set the search node budget");
        println!("  book <file>  load an opening book");
        println!("  q            quit");
    }

    fn new_command(&mut self) {
        self.pos = Position::initial();
        self.color = COLOR_WHITE;
        self.engine.reset();
        println!("New game; White to move");
    }

    fn fen_command(&mut self, tokens: &[&str]) {
        if tokens.len() < 2 {
            println!("Usage: fen <fen>");
            return;
        }
        match play::parse_fen(tokens[1]) {
            Ok((pos, color)) => {
                self.pos = pos;
                self.color = color;
                print!("{}", play::render_board(&self.pos, self.color));
            }
            Err(err) => println!("{}", err),
        }
    }

    fn legal_command(&mut self) {
        let rendered: Vec<String> = self
            .engine
            .legal(&self.pos)
            .iter()
            .map(|m| play::render_move(self.color, m))
            .collect();
        println!("{}", rendered.join(" "));
    }

    fn move_command(&mut self, tokens: &[&str]) {
        if tokens.len() < 2 {
            println!("Usage: m <move>");
            return;
        }
        let steps = match play::parse_move(self.color, tokens[1]) {
            Ok(steps) => steps,
            Err(err) => {
                println!("{}", err);
                return;
            }
        };
        let legal = self.engine.legal(&self.pos);
        match play::match_move(&legal, &steps) {
            Some(m) => self.play_move(&m),
            None => println!("Illegal move: {}", tokens[1]),
        }
    }

    fn go_command(&mut self) {
        let pos = self.pos.clone();
        let (mv, score) = self.engine.search(&pos, self.max_nodes);
        let line = search::gen_pv(&pos, &self.engine.tp);
        println!("pv: {}", play::render_pv(self.color, &line));
        match mv {
            Some(m) => {
                println!(
                    "best move: {}  score: {}",
                    play::render_move(self.color, &m),
                    score
                );
                self.play_move(&m);
            }
            None => println!("No move found; score: {}", score),
        }
    }

    fn pvf_command(&mut self) {
        let pos = self.pos.clone();
        let (mv, score) = self.engine.search_pvf(&pos, self.max_nodes);
        let line = search::gen_pv(&pos, &self.engine.tpf);
        println!("pv: {}", play::render_pv(self.color, &line));
        match mv {
            Some(m) => println!(
                "forced line starts: {}  score: {}",
                play::render_move(self.color, &m),
                score
            ),
            None => println!("No forced variation found; score: {}", score),
        }
    }

    fn ab_command(&mut self) {
        let pos = self.pos.clone();
        let (mv, score) = self.engine.search_ab(&pos, self.max_nodes);
        let line = search::gen_pv(&pos, &self.engine.tpab);
        println!("pv: {}", play::render_pv(self.color, &line));
        match mv {
            Some(m) => println!(
                "best move: {}  score: {}",
                play::render_move(self.color, &m),
                score
            ),
            None => println!("No move found; score: {}", score),
        }
    }

    fn pv_command(&self) {
        let line = search::gen_pv(&self.pos, &self.engine.tp);
        println!("{}", play::render_pv(self.color, &line));
    }

    fn nodes_command(&mut self, tokens: &[&str]) {
        match tokens.get(1).and_then(|t| t.parse::<u64>().ok()) {
            Some(n) if n > 0 => {
                self.max_nodes = n;
                println!("Node budget: {}", n);
            }
            _ => println!("Usage: nodes <n>"),
        }
    }

    fn book_command(&mut self, tokens: &[&str]) {
        if tokens.len() < 2 {
            println!("Usage: book <file>");
            return;
        }
        self.engine.load_book(tokens[1]);
    }

    // Apply a legal move and hand the turn to the other colour
    fn play_move(&mut self, m: &Move) {
        println!("played: {}", play::render_move(self.color, m));
        self.pos = self.pos.do_move(m);
        self.color = 1 - self.color;
        print!("{}", play::render_board(&self.pos, self.color));
        if self.engine.legal(&self.pos).is_empty() {
            let winner = if self.color == COLOR_BLACK { "White" } else { "Black" };
            println!("No legal moves left: {} wins", winner);
        }
    }
}
