use crate::logic::board::{BoardGrid, Color, PieceKind, Square};
use crate::logic::rules::IllegalMoveError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod config;
pub mod eval;
pub mod eval_constants;
pub mod ordering;
pub mod search;
pub mod tt;

#[cfg(test)]
mod bench_test;

/// Centipawns. Positive favors white, negative favors black.
pub type Score = i32;

/// Alpha-beta bound sentinel; no evaluated score ever reaches it.
pub const INFINITY: Score = 1_000_000;

/// Deepest search the engine accepts; requests beyond this are clamped.
pub const MAX_DEPTH: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub const fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    pub const fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    pub const fn is_castle(&self) -> bool {
        matches!(self.piece, PieceKind::King) && self.from.file().abs_diff(self.to.file()) == 2
    }

    /// Same origin, destination and promotion; the derived fields are not compared.
    pub fn same_action(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.to_char())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub depth: u8,
    pub nodes: u64,
    pub cache_hits: u64,
    pub cutoffs: u64,
    pub best_score: Option<Score>,
}

/// Board facts the search needs. The engine never looks past this trait.
pub trait Rules {
    type Position: Clone;

    fn legal_moves(&self, position: &Self::Position) -> Vec<Move>;

    /// Plays a move from [`Rules::legal_moves`]; anything else is an error.
    fn apply(&self, position: &Self::Position, mv: &Move)
        -> Result<Self::Position, IllegalMoveError>;

    /// Every legal move with the position it leads to, in generation order.
    fn successors(
        &self,
        position: &Self::Position,
    ) -> Result<Vec<(Move, Self::Position)>, IllegalMoveError> {
        self.legal_moves(position)
            .into_iter()
            .map(|mv| Ok((mv, self.apply(position, &mv)?)))
            .collect()
    }

    fn is_checkmate(&self, position: &Self::Position) -> bool;

    fn is_check(&self, position: &Self::Position) -> bool;

    fn is_draw(&self, position: &Self::Position) -> bool;

    fn is_game_over(&self, position: &Self::Position) -> bool {
        self.is_checkmate(position) || self.is_draw(position)
    }

    fn side_to_move(&self, position: &Self::Position) -> Color;

    fn board_occupants(&self, position: &Self::Position) -> BoardGrid;

    /// Equal keys must mean interchangeable positions for evaluation and legality.
    fn canonical_key(&self, position: &Self::Position) -> String;
}

pub trait Evaluator {
    fn evaluate(&self, board: &BoardGrid) -> Score;
}

/// Scores a candidate for move ordering. Higher scores are searched first.
pub trait MoveOrderer {
    /// `after` is the position reached by playing `mv`.
    fn score_move<R: Rules>(&self, rules: &R, mv: &Move, after: &R::Position) -> Score;

    fn order_score<R: Rules>(
        &self,
        rules: &R,
        mv: &Move,
        position: &R::Position,
    ) -> Result<Score, IllegalMoveError> {
        let after = rules.apply(position, mv)?;
        Ok(self.score_move(rules, mv, &after))
    }
}

pub trait Searcher<P> {
    fn search(
        &mut self,
        position: &P,
        depth: u8,
        side: Color,
    ) -> Result<Option<(Move, SearchStats)>, IllegalMoveError>;
}
