use crate::engine::config::EngineConfig;
use crate::engine::eval::PositionalEvaluator;
use crate::engine::ordering::HeuristicOrderer;
use crate::engine::tt::{TTFlag, TranspositionCache};
use crate::engine::{
    Evaluator, Move, MoveOrderer, Rules, Score, SearchStats, Searcher, INFINITY, MAX_DEPTH,
};
use crate::logic::board::Color;
use crate::logic::rules::IllegalMoveError;
use log::{debug, trace, warn};
use std::cmp::Reverse;
use std::sync::Arc;

pub struct AlphaBetaEngine<R: Rules, E = PositionalEvaluator, O = HeuristicOrderer> {
    config: Arc<EngineConfig>,
    rules: R,
    evaluator: E,
    orderer: O,
    tt: TranspositionCache,
    stats: SearchStats,
}

impl<R: Rules> AlphaBetaEngine<R> {
    pub fn new(rules: R, config: Arc<EngineConfig>) -> Self {
        let tt = TranspositionCache::from_capacity_setting(config.tt_capacity);
        Self::with_cache(rules, config, tt)
    }

    pub fn with_cache(rules: R, config: Arc<EngineConfig>, tt: TranspositionCache) -> Self {
        Self::with_parts(
            rules,
            PositionalEvaluator::new(config.clone()),
            HeuristicOrderer::new(config.clone()),
            tt,
            config,
        )
    }

    // Swaps the weights. Cached scores were computed with the old ones and are dropped.
    pub fn update_config(&mut self, config: Arc<EngineConfig>) {
        if config.tt_capacity != self.config.tt_capacity {
            self.tt = TranspositionCache::from_capacity_setting(config.tt_capacity);
        } else {
            self.tt.clear();
        }
        self.evaluator = PositionalEvaluator::new(config.clone());
        self.orderer = HeuristicOrderer::new(config.clone());
        self.config = config;
    }
}

impl<R: Rules, E: Evaluator, O: MoveOrderer> AlphaBetaEngine<R, E, O> {
    pub const fn with_parts(
        rules: R,
        evaluator: E,
        orderer: O,
        tt: TranspositionCache,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            config,
            rules,
            evaluator,
            orderer,
            tt,
            stats: SearchStats {
                depth: 0,
                nodes: 0,
                cache_hits: 0,
                cutoffs: 0,
                best_score: None,
            },
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // Counters of the last `best_move` call (or accumulated direct `minimax` calls).
    pub const fn stats(&self) -> SearchStats {
        self.stats
    }

    pub const fn tt(&self) -> &TranspositionCache {
        &self.tt
    }

    pub fn tt_mut(&mut self) -> &mut TranspositionCache {
        &mut self.tt
    }

    // Forget everything learned; call between games.
    pub fn clear_cache(&mut self) {
        self.tt.clear();
    }

    pub fn best_move(
        &mut self,
        position: &R::Position,
        depth: u8,
        side: Color,
    ) -> Result<Option<Move>, IllegalMoveError> {
        Ok(self
            .best_move_with_score(position, depth, side)?
            .map(|(mv, _)| mv))
    }

    // Picks the move that is best for `side`, together with its minimax score.
    // Ties keep the candidate that was searched first.
    pub fn best_move_with_score(
        &mut self,
        position: &R::Position,
        depth: u8,
        side: Color,
    ) -> Result<Option<(Move, Score)>, IllegalMoveError> {
        let depth = depth.clamp(1, MAX_DEPTH);
        self.stats = SearchStats {
            depth,
            ..SearchStats::default()
        };

        let to_move = self.rules.side_to_move(position);
        if to_move != side {
            warn!(
                "searching for {} but {} is to move",
                side.name(),
                to_move.name()
            );
        }

        let children = self.ordered_children(position)?;
        if children.is_empty() {
            debug!("no legal moves for {}", side.name());
            return Ok(None);
        }

        // Root children get the full window so every root score is exact
        let maximizing_child = side == Color::Black;
        let mut best: Option<(Move, Score)> = None;
        for (mv, child) in &children {
            let score = self.minimax(child, depth - 1, -INFINITY, INFINITY, maximizing_child)?;
            trace!("root {mv}: {score}");
            let better = match best {
                None => true,
                Some((_, current)) => match side {
                    Color::White => score > current,
                    Color::Black => score < current,
                },
            };
            if better {
                best = Some((*mv, score));
            }
        }

        self.stats.best_score = best.map(|(_, score)| score);
        if let Some((mv, score)) = best {
            debug!(
                "depth {} best {mv} score {score} nodes {} cache hits {} cutoffs {} tt size {}",
                depth,
                self.stats.nodes,
                self.stats.cache_hits,
                self.stats.cutoffs,
                self.tt.len()
            );
        }
        Ok(best)
    }

    // Fail-soft alpha-beta. Scores are from white's point of view; `maximizing`
    // says whether the side to move in `position` wants a higher score.
    pub fn minimax(
        &mut self,
        position: &R::Position,
        depth: u8,
        mut alpha: Score,
        mut beta: Score,
        maximizing: bool,
    ) -> Result<Score, IllegalMoveError> {
        self.stats.nodes += 1;
        let depth = depth.min(MAX_DEPTH);

        // Horizon or terminal position
        if depth == 0 || self.rules.is_game_over(position) {
            return Ok(self.leaf_score(position));
        }

        let children = self.ordered_children(position)?;
        if children.is_empty() {
            warn!("position has no legal moves but is not over");
            return Ok(self.leaf_score(position));
        }

        let mut best = if maximizing { -INFINITY } else { INFINITY };
        for (_, child) in &children {
            // TT Probe: entries are keyed by the child and stored with this node's depth
            let key = self.rules.canonical_key(child);
            let score = match self.tt.lookup(&key, depth) {
                Some(entry) if entry.usable(alpha, beta) => {
                    self.stats.cache_hits += 1;
                    entry.score
                }
                _ => {
                    // Search the child and record what the window proved
                    let score = self.minimax(child, depth - 1, alpha, beta, !maximizing)?;
                    self.tt
                        .store(key, score, depth, TTFlag::from_window(score, alpha, beta));
                    score
                }
            };

            if maximizing {
                best = best.max(score);
                alpha = alpha.max(score);
            } else {
                best = best.min(score);
                beta = beta.min(score);
            }

            // Alpha-beta cutoff
            if beta <= alpha {
                self.stats.cutoffs += 1;
                trace!("cutoff at depth {depth}: alpha {alpha} beta {beta}");
                break;
            }
        }
        Ok(best)
    }

    fn leaf_score(&self, position: &R::Position) -> Score {
        if self.rules.is_checkmate(position) {
            return match self.rules.side_to_move(position) {
                Color::White => -self.config.mate_score,
                Color::Black => self.config.mate_score,
            };
        }
        self.evaluator
            .evaluate(&self.rules.board_occupants(position))
    }

    // Legal moves paired with the position they lead to, best ordering score first.
    fn ordered_children(
        &self,
        position: &R::Position,
    ) -> Result<Vec<(Move, R::Position)>, IllegalMoveError> {
        let mut scored: Vec<(Score, Move, R::Position)> = self
            .rules
            .successors(position)?
            .into_iter()
            .map(|(mv, child)| (self.orderer.score_move(&self.rules, &mv, &child), mv, child))
            .collect();
        // Stable: equal scores keep generation order
        scored.sort_by_key(|(score, _, _)| Reverse(*score));
        Ok(scored
            .into_iter()
            .map(|(_, mv, child)| (mv, child))
            .collect())
    }
}

impl<R: Rules, E: Evaluator, O: MoveOrderer> Searcher<R::Position> for AlphaBetaEngine<R, E, O> {
    fn search(
        &mut self,
        position: &R::Position,
        depth: u8,
        side: Color,
    ) -> Result<Option<(Move, SearchStats)>, IllegalMoveError> {
        let best = self.best_move(position, depth, side)?;
        Ok(best.map(|mv| (mv, self.stats)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ordering::GenerationOrder;
    use crate::logic::board::Position;
    use crate::logic::rules::ChessRules;

    fn engine() -> AlphaBetaEngine<ChessRules> {
        AlphaBetaEngine::new(ChessRules, Arc::new(EngineConfig::default()))
    }

    #[test]
    fn test_depth_zero_returns_static_eval() {
        let mut engine = engine();
        let pos = Position::start();
        let eval = PositionalEvaluator::new(Arc::new(EngineConfig::default()));
        let expected = eval.evaluate(&pos.board.grid());
        let score = engine
            .minimax(&pos, 0, -INFINITY, INFINITY, true)
            .unwrap();
        assert_eq!(score, expected);
        assert_eq!(engine.stats().nodes, 1);
        assert!(engine.tt().is_empty());
    }

    #[test]
    fn test_checkmated_leaf_scores_mate() {
        let mut engine = engine();
        // fool's mate, white to move and mated
        let pos = Position::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        assert_eq!(
            engine.minimax(&pos, 3, -INFINITY, INFINITY, true).unwrap(),
            -50_000
        );
        assert_eq!(
            engine.minimax(&pos.mirrored(), 3, -INFINITY, INFINITY, false).unwrap(),
            50_000
        );
    }

    #[test]
    fn test_stalemate_leaf_scores_evaluation() {
        let mut engine = engine();
        let pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let eval = PositionalEvaluator::new(Arc::new(EngineConfig::default()));
        assert_eq!(
            engine.minimax(&pos, 2, -INFINITY, INFINITY, false).unwrap(),
            eval.evaluate(&pos.board.grid())
        );
    }

    #[test]
    fn test_no_legal_moves_returns_none() {
        let mut engine = engine();
        let pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(engine.best_move(&pos, 3, Color::Black).unwrap(), None);
        assert_eq!(engine.stats().best_score, None);
    }

    #[test]
    fn test_takes_hanging_queen() {
        let mut engine = engine();
        let pos = Position::from_fen("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let mv = engine.best_move(&pos, 2, Color::White).unwrap().unwrap();
        assert_eq!(mv.to_string(), "e4d5");
    }

    #[test]
    fn test_depth_is_clamped() {
        let mut engine = engine();
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        assert!(engine.best_move(&pos, 0, Color::White).unwrap().is_some());
        assert_eq!(engine.stats().depth, 1);
    }

    #[test]
    fn test_stats_reset_per_call() {
        let mut engine = engine();
        let pos = Position::start();
        engine.best_move(&pos, 2, Color::White).unwrap();
        let first = engine.stats();
        assert!(first.nodes > 20);
        assert_eq!(first.depth, 2);
        assert!(first.best_score.is_some());

        engine.clear_cache();
        engine.best_move(&pos, 2, Color::White).unwrap();
        assert_eq!(engine.stats(), first);
    }

    #[test]
    fn test_searcher_reports_stats() {
        let mut engine = engine();
        let pos = Position::start();
        let (mv, stats) = engine.search(&pos, 1, Color::White).unwrap().unwrap();
        assert!(ChessRules.legal_moves(&pos).iter().any(|m| *m == mv));
        assert_eq!(stats.nodes, 20);
    }

    #[test]
    fn test_generation_order_finds_same_score() {
        let config = Arc::new(EngineConfig::default());
        let pos = Position::from_fen(
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
        )
        .unwrap();

        let mut ordered = engine();
        let mut plain = AlphaBetaEngine::with_parts(
            ChessRules,
            PositionalEvaluator::new(config.clone()),
            GenerationOrder,
            TranspositionCache::unbounded(),
            config,
        );
        let (_, a) = ordered
            .best_move_with_score(&pos, 3, Color::White)
            .unwrap()
            .unwrap();
        let (_, b) = plain
            .best_move_with_score(&pos, 3, Color::White)
            .unwrap()
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_update_config_drops_cache() {
        let mut engine = engine();
        engine.best_move(&Position::start(), 2, Color::White).unwrap();
        assert!(!engine.tt().is_empty());

        let config = EngineConfig {
            tt_capacity: 0,
            ..EngineConfig::default()
        };
        engine.update_config(Arc::new(config));
        assert!(engine.tt().is_empty());
        assert_eq!(engine.tt().capacity(), None);
        assert_eq!(engine.config().tt_capacity, 0);
    }

    #[test]
    fn test_search_survives_max_counters() {
        let mut engine = engine();
        for fen in [
            "4k3/8/8/8/8/8/8/R3K3 w - - 4294967295 1",
            "4k3/8/8/8/8/8/8/R3K3 b - - 0 4294967295",
        ] {
            let pos = Position::from_fen(fen).unwrap();
            let side = pos.turn;
            assert!(engine.best_move(&pos, 2, side).unwrap().is_some(), "{fen}");
        }
    }
}
