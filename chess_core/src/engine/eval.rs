use crate::engine::config::EngineConfig;
use crate::engine::eval_constants::{pst_for, pst_index};
use crate::engine::{Evaluator, Score};
use crate::logic::board::{BoardGrid, Color, PieceKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The three evaluation terms, each already signed from white's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalBreakdown {
    pub material: Score,
    pub positional: Score,
    pub king_safety: Score,
}

impl EvalBreakdown {
    pub const fn total(&self) -> Score {
        self.material + self.positional + self.king_safety
    }
}

pub struct PositionalEvaluator {
    config: Arc<EngineConfig>,
}

impl PositionalEvaluator {
    pub const fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    pub fn breakdown(&self, board: &BoardGrid) -> EvalBreakdown {
        let mut out = EvalBreakdown::default();
        let mut white_king = None;
        let mut black_king = None;

        for (row, cells) in board.iter().enumerate() {
            for (file, cell) in cells.iter().enumerate() {
                let Some(piece) = cell else {
                    continue;
                };
                let is_white = piece.color == Color::White;
                let sign = if is_white { 1 } else { -1 };

                out.material += sign * self.config.piece_value(piece.kind);

                let table = pst_for(piece.kind);
                let bonus = table
                    .get(pst_index(row, file, is_white))
                    .copied()
                    .unwrap_or(0);
                out.positional += sign * bonus;

                if piece.kind == PieceKind::King {
                    if is_white {
                        white_king = Some((row, file));
                    } else {
                        black_king = Some((row, file));
                    }
                }
            }
        }

        out.king_safety = self.king_safety(board, white_king, Color::White)
            - self.king_safety(board, black_king, Color::Black);
        out
    }

    /// Shield and exposure around the king, back-rank bonus and center penalty.
    /// Unsigned: the caller applies the side's sign.
    pub fn king_safety(&self, board: &BoardGrid, king: Option<(usize, usize)>, color: Color) -> Score {
        let Some((row, file)) = king else {
            return 0;
        };
        let mut safety = 0;

        for dr in -1isize..=1 {
            for df in -1isize..=1 {
                if dr == 0 && df == 0 {
                    continue;
                }
                let (Some(r), Some(f)) = (
                    row.checked_add_signed(dr),
                    file.checked_add_signed(df),
                ) else {
                    continue;
                };
                let Some(cell) = board.get(r).and_then(|cells| cells.get(f)) else {
                    continue;
                };
                match cell {
                    Some(piece) if piece.color == color => safety += self.config.king_shield_bonus,
                    Some(_) => {}
                    None => safety -= self.config.king_exposure_penalty,
                }
            }
        }

        if row == color.home_row() {
            safety += self.config.king_back_rank_bonus;
        }
        if (2..=5).contains(&row) && (2..=5).contains(&file) {
            safety -= self.config.king_center_penalty;
        }
        safety
    }
}

impl Evaluator for PositionalEvaluator {
    fn evaluate(&self, board: &BoardGrid) -> Score {
        self.breakdown(board).total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::board::{Piece, Position};

    fn evaluator() -> PositionalEvaluator {
        PositionalEvaluator::new(Arc::new(EngineConfig::default()))
    }

    fn grid(fen: &str) -> BoardGrid {
        Position::from_fen(fen).unwrap().board.grid()
    }

    #[test]
    fn test_start_position_is_balanced() {
        let eval = evaluator();
        let board = Position::start().board.grid();
        assert_eq!(eval.breakdown(&board), EvalBreakdown::default());
        assert_eq!(eval.evaluate(&board), 0);
    }

    #[test]
    fn test_material_counts_for_each_side() {
        let eval = evaluator();
        // white queen vs black rook
        let b = eval.breakdown(&grid("3rk3/8/8/8/8/8/8/3QK3 w - - 0 1"));
        assert_eq!(b.material, 900 - 500);
    }

    #[test]
    fn test_positional_term_reads_flipped_table_for_white() {
        let eval = evaluator();
        // lone white knight on f3: grid (5, 5), table index (7 - 5) * 8 + 5 = 21
        let b = eval.breakdown(&grid("8/8/8/8/8/5N2/8/8 w - - 0 1"));
        assert_eq!(b.positional, 27);
        // lone black knight on f6: grid (2, 5), index 21 read directly
        let b = eval.breakdown(&grid("8/8/5n2/8/8/8/8/8 w - - 0 1"));
        assert_eq!(b.positional, -27);
    }

    #[test]
    fn test_king_safety_terms() {
        let eval = evaluator();
        // corner king on h1, home rank, surrounded by g1, g2, h2
        let board = grid("8/8/8/8/8/8/6PP/6RK w - - 0 1");
        let king = Some((7, 7));
        assert_eq!(eval.king_safety(&board, king, Color::White), 10 * 3 + 20);

        // king on e4: eight empty neighbours, center penalty, no back rank bonus
        let board = grid("8/8/8/8/4K3/8/8/8 w - - 0 1");
        assert_eq!(
            eval.king_safety(&board, Some((4, 4)), Color::White),
            -5 * 8 - 30
        );

        // enemy neighbours neither shield nor expose
        let board = grid("8/8/8/8/8/8/6pp/6pK w - - 0 1");
        assert_eq!(eval.king_safety(&board, Some((7, 7)), Color::White), 20);
    }

    #[test]
    fn test_missing_king_contributes_no_safety() {
        let eval = evaluator();
        let board = grid("8/8/8/8/8/8/8/4K3 w - - 0 1");
        let b = eval.breakdown(&board);
        let white_only = eval.king_safety(&board, Some((7, 4)), Color::White);
        assert_eq!(b.king_safety, white_only);
        assert_eq!(eval.king_safety(&board, None, Color::Black), 0);
    }

    #[test]
    fn test_mirrored_position_negates_score() {
        let eval = evaluator();
        for fen in [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "rnbqkb1r/pp2pppp/3p1n2/8/3NP3/8/PPP2PPP/RNBQKB1R w KQkq - 1 5",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        ] {
            let pos = Position::from_fen(fen).unwrap();
            let original = eval.breakdown(&pos.board.grid());
            let mirrored = eval.breakdown(&pos.mirrored().board.grid());
            assert_eq!(mirrored.material, -original.material, "{fen}");
            assert_eq!(mirrored.positional, -original.positional, "{fen}");
            assert_eq!(mirrored.king_safety, -original.king_safety, "{fen}");
        }
    }

    #[test]
    fn test_config_changes_piece_values() {
        let config = EngineConfig {
            val_pawn: 150,
            ..EngineConfig::default()
        };
        let eval = PositionalEvaluator::new(Arc::new(config));
        let board = grid("8/8/8/8/8/8/P7/8 w - - 0 1");
        let b = eval.breakdown(&board);
        assert_eq!(b.material, 150);
        assert_eq!(
            Some(Piece::new(PieceKind::Pawn, Color::White)),
            board[6][0]
        );
    }
}
