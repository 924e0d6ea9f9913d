use crate::engine::config::EngineConfig;
use crate::engine::{Move, MoveOrderer, Rules, Score};
use std::sync::Arc;

/// Captures by value difference, then mate, check and promotion bonuses.
pub struct HeuristicOrderer {
    config: Arc<EngineConfig>,
}

impl HeuristicOrderer {
    pub const fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }
}

impl MoveOrderer for HeuristicOrderer {
    fn score_move<R: Rules>(&self, rules: &R, mv: &Move, after: &R::Position) -> Score {
        let mut score = 0;
        if let Some(captured) = mv.captured {
            score += self.config.piece_value(captured) - self.config.piece_value(mv.piece);
        }
        if rules.is_checkmate(after) {
            score += self.config.score_checkmate;
        } else if rules.is_check(after) {
            score += self.config.score_check;
        }
        if mv.is_promotion() {
            score += self.config.score_promotion;
        }
        score
    }
}

/// Leaves candidates in the order the rules produced them.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationOrder;

impl MoveOrderer for GenerationOrder {
    fn score_move<R: Rules>(&self, _rules: &R, _mv: &Move, _after: &R::Position) -> Score {
        0
    }
}
