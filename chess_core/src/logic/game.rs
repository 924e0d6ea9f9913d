use crate::engine::{Move, Rules};
use crate::logic::board::{Color, PieceKind, Position, Square};
use crate::logic::rules::{draw_reason, ChessRules, DrawReason, IllegalMoveError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Occurrences of the same position that end the game.
pub const REPETITION_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Playing,
    Checkmate(Color), // Winner
    Draw(DrawReason),
    ThreefoldRepetition,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveParseError {
    #[error("expected a move like e2e4 or e7e8q, got `{0}`")]
    Format(String),
    #[error("unknown promotion piece `{0}`")]
    Promotion(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error(transparent)]
    Parse(#[from] MoveParseError),
    #[error(transparent)]
    Illegal(#[from] IllegalMoveError),
    #[error("the game is over")]
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub mv: Move,
    pub color: Color,
    pub fen_after: String,
}

/// One game as the host sees it: the current position plus everything needed for
/// repetition and a readable status line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub position: Position,
    pub status: GameStatus,
    pub history: Vec<MoveRecord>,
    repetition_keys: Vec<String>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    #[must_use]
    pub fn new() -> Self {
        Self::from_position(Position::start())
    }

    pub fn from_position(position: Position) -> Self {
        let mut game = Self {
            repetition_keys: vec![position.repetition_key()],
            position,
            status: GameStatus::Playing,
            history: Vec::new(),
        };
        game.update_status();
        game
    }

    pub const fn turn(&self) -> Color {
        self.position.turn
    }

    pub const fn is_over(&self) -> bool {
        !matches!(self.status, GameStatus::Playing)
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.history.last().map(|record| &record.mv)
    }

    /// Plays a legal move for the side to move.
    pub fn play(&mut self, mv: &Move) -> Result<(), GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        let next = ChessRules.apply(&self.position, mv)?;
        let color = self.position.turn;

        self.repetition_keys.push(next.repetition_key());
        self.history.push(MoveRecord {
            mv: *mv,
            color,
            fen_after: next.to_fen(),
        });
        self.position = next;
        self.update_status();
        Ok(())
    }

    /// Parses and plays a coordinate move, returning the move as generated.
    pub fn play_text(&mut self, text: &str) -> Result<Move, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        let mv = parse_move(&self.position, text)?;
        self.play(&mv)?;
        Ok(mv)
    }

    /// How often the current position has occurred, this occurrence included.
    pub fn repetition_count(&self) -> usize {
        let Some(current) = self.repetition_keys.last() else {
            return 0;
        };
        self.repetition_keys
            .iter()
            .filter(|key| *key == current)
            .count()
    }

    fn update_status(&mut self) {
        let rules = ChessRules;
        self.status = if rules.is_checkmate(&self.position) {
            GameStatus::Checkmate(self.position.turn.opposite())
        } else if let Some(reason) = draw_reason(&self.position) {
            GameStatus::Draw(reason)
        } else if self.repetition_count() >= REPETITION_LIMIT {
            GameStatus::ThreefoldRepetition
        } else {
            GameStatus::Playing
        };
    }

    pub fn status_text(&self) -> String {
        let side = self.position.turn.name();
        match self.status {
            GameStatus::Checkmate(_) => format!("Game over, {side} is in checkmate."),
            GameStatus::Draw(_) | GameStatus::ThreefoldRepetition => {
                "Game over, drawn position".to_string()
            }
            GameStatus::Playing => {
                let mut status = format!("{side} to move");
                if ChessRules.is_check(&self.position) {
                    status.push_str(&format!(", {side} is in check"));
                }
                status
            }
        }
    }
}

/// Reads `e2e4` or `e7e8q` and matches it against the legal moves of `position`.
/// A promotion without a piece letter promotes to a queen.
pub fn parse_move(position: &Position, text: &str) -> Result<Move, GameError> {
    let text = text.trim().to_ascii_lowercase();
    let format_error = || MoveParseError::Format(text.clone());

    let (from, rest) = text.split_at_checked(2).ok_or_else(format_error)?;
    let (to, promo) = rest.split_at_checked(2).ok_or_else(format_error)?;
    let from = Square::parse(from).ok_or_else(format_error)?;
    let to = Square::parse(to).ok_or_else(format_error)?;

    let mut promo_chars = promo.chars();
    let promotion = match (promo_chars.next(), promo_chars.next()) {
        (None, _) => None,
        (Some(c), None) => match PieceKind::from_char(c) {
            Some(kind) if PieceKind::PROMOTIONS.contains(&kind) => Some(kind),
            _ => return Err(MoveParseError::Promotion(c).into()),
        },
        (Some(_), Some(_)) => return Err(format_error().into()),
    };

    let candidates: Vec<Move> = ChessRules
        .legal_moves(position)
        .into_iter()
        .filter(|mv| mv.from == from && mv.to == to)
        .collect();
    let wanted = if candidates.iter().any(Move::is_promotion) {
        Some(promotion.unwrap_or(PieceKind::Queen))
    } else {
        promotion
    };

    candidates
        .into_iter()
        .find(|mv| mv.promotion == wanted)
        .ok_or_else(|| {
            IllegalMoveError {
                mv: text.clone(),
                fen: position.to_fen(),
            }
            .into()
        })
}
