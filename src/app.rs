use anyhow::Result;
use chess_core::engine::config::EngineConfig;
use chess_core::engine::eval::PositionalEvaluator;
use chess_core::engine::search::AlphaBetaEngine;
use chess_core::engine::Searcher;
use chess_core::logic::board::{Color, Position};
use chess_core::logic::game::GameState;
use chess_core::logic::rules::ChessRules;
use log::{debug, info};
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

const HELP: &str = "Enter moves like e2e4 or e7e8q. Commands: fen, eval, new, help, quit.";

enum Command {
    Quit,
    Fen,
    Eval,
    New,
    Help,
    Move(String),
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        Some(match line.to_ascii_lowercase().as_str() {
            "quit" | "exit" => Self::Quit,
            "fen" => Self::Fen,
            "eval" => Self::Eval,
            "new" => Self::New,
            "help" | "?" => Self::Help,
            _ => Self::Move(line.to_string()),
        })
    }
}

/// One human against the engine in a terminal. The engine and its cache live as
/// long as the session; `new` starts over with an empty cache.
pub struct App {
    game: GameState,
    start: Position,
    engine: AlphaBetaEngine<ChessRules>,
    evaluator: PositionalEvaluator,
    engine_color: Color,
    depth: u8,
    reply_delay: Duration,
}

impl App {
    pub fn new(config: EngineConfig, start: Position, engine_color: Color, depth: u8) -> Self {
        let reply_delay = Duration::from_millis(config.reply_delay_ms);
        let config = Arc::new(config);
        Self {
            game: GameState::from_position(start.clone()),
            start,
            engine: AlphaBetaEngine::new(ChessRules, config.clone()),
            evaluator: PositionalEvaluator::new(config),
            engine_color,
            depth,
            reply_delay,
        }
    }

    pub fn run(&mut self, input: impl BufRead, mut out: impl Write) -> Result<()> {
        writeln!(out, "{HELP}")?;
        self.engine_turn(&mut out, false)?;
        self.show(&mut out)?;

        let mut lines = input.lines();
        loop {
            write!(out, "> ")?;
            out.flush()?;
            let Some(line) = lines.next() else {
                break;
            };
            let Some(command) = Command::parse(&line?) else {
                continue;
            };

            match command {
                Command::Quit => break,
                Command::Help => writeln!(out, "{HELP}")?,
                Command::Fen => writeln!(out, "{}", self.game.position.to_fen())?,
                Command::Eval => {
                    let eval = self.evaluator.breakdown(&self.game.position.board.grid());
                    writeln!(
                        out,
                        "material {} positional {} king safety {} total {}",
                        eval.material,
                        eval.positional,
                        eval.king_safety,
                        eval.total()
                    )?;
                }
                Command::New => {
                    self.game = GameState::from_position(self.start.clone());
                    self.engine.clear_cache();
                    info!("new game");
                    self.engine_turn(&mut out, false)?;
                    self.show(&mut out)?;
                }
                Command::Move(text) => {
                    if self.game.is_over() {
                        writeln!(out, "{} Type `new` to play again.", self.game.status_text())?;
                        continue;
                    }
                    if self.game.turn() == self.engine_color {
                        writeln!(out, "Waiting for the engine.")?;
                        continue;
                    }
                    match self.game.play_text(&text) {
                        Ok(mv) => {
                            debug!("human played {mv}");
                            self.show(&mut out)?;
                            self.engine_turn(&mut out, true)?;
                            self.show(&mut out)?;
                        }
                        // the board stays as it was
                        Err(err) => writeln!(out, "{err}")?,
                    }
                }
            }
        }
        Ok(())
    }

    fn engine_turn(&mut self, out: &mut impl Write, after_human: bool) -> Result<()> {
        if self.game.is_over() || self.game.turn() != self.engine_color {
            return Ok(());
        }
        if after_human && !self.reply_delay.is_zero() {
            std::thread::sleep(self.reply_delay);
        }

        let result = self
            .engine
            .search(&self.game.position, self.depth, self.engine_color)?;
        if let Some((mv, stats)) = result {
            self.game.play(&mv)?;
            writeln!(
                out,
                "Engine plays {mv} (score {}, {} nodes, {} cache hits)",
                stats.best_score.unwrap_or_default(),
                stats.nodes,
                stats.cache_hits
            )?;
        }
        Ok(())
    }

    fn show(&self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "\n{}", self.game.position.board)?;
        writeln!(out, "{}", self.game.status_text())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(engine_color: Color) -> App {
        let config = EngineConfig {
            reply_delay_ms: 0,
            ..EngineConfig::default()
        };
        App::new(config, Position::start(), engine_color, 1)
    }

    fn run(app: &mut App, input: &str) -> String {
        let mut out = Vec::new();
        app.run(input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_engine_replies_to_human_move() {
        let mut app = app(Color::Black);
        let out = run(&mut app, "e2e4\nquit\n");
        assert!(out.contains("Engine plays"));
        assert_eq!(app.game.history.len(), 2);
        assert_eq!(app.game.turn(), Color::White);
    }

    #[test]
    fn test_illegal_move_is_rejected() {
        let mut app = app(Color::Black);
        let out = run(&mut app, "e2e5\nfen\n");
        assert!(out.contains("illegal move"));
        assert!(out.contains(chess_core::logic::board::START_FEN));
        assert!(app.game.history.is_empty());
    }

    #[test]
    fn test_engine_opens_as_white() {
        let mut app = app(Color::White);
        run(&mut app, "new\n");
        assert_eq!(app.game.history.len(), 1);
        assert_eq!(app.game.turn(), Color::Black);
    }

    #[test]
    fn test_eval_command() {
        let mut app = app(Color::Black);
        let out = run(&mut app, "eval\n");
        assert!(out.contains("total 0"));
    }
}
