use crate::engine::{Move, Rules};
use crate::logic::board::{Board, BoardGrid, Color, PieceKind, Position, Square};
use crate::logic::generator::{
    legal_moves, legal_successors, make_move, BISHOP_DIRECTIONS, KING_OFFSETS, KNIGHT_OFFSETS,
    ROOK_DIRECTIONS,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Halfmove clock value at which the fifty-move rule ends the game.
pub const FIFTY_MOVE_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal move {mv} in position {fen}")]
pub struct IllegalMoveError {
    pub mv: String,
    pub fen: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawReason {
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
}

/// Checks whether `sq` is attacked by any piece of color `by`.
pub fn is_square_attacked(board: &Board, sq: Square, by: Color) -> bool {
    let has = |target: Option<Square>, kinds: &[PieceKind]| {
        target
            .and_then(|t| board.get(t))
            .is_some_and(|p| p.color == by && kinds.contains(&p.kind))
    };

    // a pawn of `by` attacks one row further along its own direction
    let pawn_row = -by.pawn_direction();
    if has(sq.offset(pawn_row, -1), &[PieceKind::Pawn])
        || has(sq.offset(pawn_row, 1), &[PieceKind::Pawn])
    {
        return true;
    }

    if KNIGHT_OFFSETS
        .iter()
        .any(|&(dr, df)| has(sq.offset(dr, df), &[PieceKind::Knight]))
    {
        return true;
    }

    if KING_OFFSETS
        .iter()
        .any(|&(dr, df)| has(sq.offset(dr, df), &[PieceKind::King]))
    {
        return true;
    }

    let slider_hit = |directions: &[(i8, i8)], kinds: &[PieceKind]| {
        directions.iter().any(|&(dr, df)| {
            let mut current = sq;
            while let Some(next) = current.offset(dr, df) {
                if let Some(piece) = board.get(next) {
                    return piece.color == by && kinds.contains(&piece.kind);
                }
                current = next;
            }
            false
        })
    };

    slider_hit(&ROOK_DIRECTIONS, &[PieceKind::Rook, PieceKind::Queen])
        || slider_hit(&BISHOP_DIRECTIONS, &[PieceKind::Bishop, PieceKind::Queen])
}

/// Checks if `color`'s king is attacked. A side without a king is never in check.
pub fn is_in_check(position: &Position, color: Color) -> bool {
    position
        .board
        .king_square(color)
        .is_some_and(|king| is_square_attacked(&position.board, king, color.opposite()))
}

/// Bare kings, a single minor piece, or bishops that all stand on one square color.
pub fn has_insufficient_material(board: &Board) -> bool {
    let others: Vec<(Square, PieceKind)> = board
        .pieces()
        .filter(|(_, p)| p.kind != PieceKind::King)
        .map(|(sq, p)| (sq, p.kind))
        .collect();

    match others.as_slice() {
        [] => true,
        [(_, PieceKind::Knight | PieceKind::Bishop)] => true,
        [(first, _), ..] => {
            let light = first.is_light();
            others
                .iter()
                .all(|(sq, kind)| *kind == PieceKind::Bishop && sq.is_light() == light)
        }
    }
}

pub fn draw_reason(position: &Position) -> Option<DrawReason> {
    if position.halfmove_clock >= FIFTY_MOVE_LIMIT {
        return Some(DrawReason::FiftyMoveRule);
    }
    if has_insufficient_material(&position.board) {
        return Some(DrawReason::InsufficientMaterial);
    }
    if !is_in_check(position, position.turn) && legal_moves(position).is_empty() {
        return Some(DrawReason::Stalemate);
    }
    None
}

/// Standard chess rules over [`Position`]. Stateless; repetition is tracked by
/// [`crate::logic::game::GameState`], not here.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChessRules;

impl Rules for ChessRules {
    type Position = Position;

    fn legal_moves(&self, position: &Position) -> Vec<Move> {
        legal_moves(position)
    }

    fn apply(&self, position: &Position, mv: &Move) -> Result<Position, IllegalMoveError> {
        let legal = legal_moves(position)
            .into_iter()
            .find(|candidate| candidate.same_action(mv))
            .ok_or_else(|| IllegalMoveError {
                mv: mv.to_string(),
                fen: position.to_fen(),
            })?;
        Ok(make_move(position, &legal))
    }

    fn successors(
        &self,
        position: &Position,
    ) -> Result<Vec<(Move, Position)>, IllegalMoveError> {
        // generated moves are legal already, skip the lookup apply does
        Ok(legal_successors(position))
    }

    fn is_checkmate(&self, position: &Position) -> bool {
        is_in_check(position, position.turn) && legal_moves(position).is_empty()
    }

    fn is_check(&self, position: &Position) -> bool {
        is_in_check(position, position.turn)
    }

    fn is_draw(&self, position: &Position) -> bool {
        draw_reason(position).is_some()
    }

    fn is_game_over(&self, position: &Position) -> bool {
        if position.halfmove_clock >= FIFTY_MOVE_LIMIT
            || has_insufficient_material(&position.board)
        {
            return true;
        }
        legal_moves(position).is_empty()
    }

    fn side_to_move(&self, position: &Position) -> Color {
        position.turn
    }

    fn board_occupants(&self, position: &Position) -> BoardGrid {
        position.board.grid()
    }

    fn canonical_key(&self, position: &Position) -> String {
        position.canonical_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::board::Piece;

    fn find(position: &Position, text: &str) -> Move {
        legal_moves(position)
            .into_iter()
            .find(|m| m.to_string() == text)
            .unwrap()
    }

    #[test]
    fn test_fools_mate_is_checkmate() {
        let rules = ChessRules;
        let mut pos = Position::start();
        for text in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            let mv = find(&pos, text);
            pos = rules.apply(&pos, &mv).unwrap();
        }
        assert!(rules.is_check(&pos));
        assert!(rules.is_checkmate(&pos));
        assert!(!rules.is_draw(&pos));
        assert!(rules.is_game_over(&pos));
    }

    #[test]
    fn test_stalemate_is_draw() {
        let rules = ChessRules;
        let pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(!rules.is_check(&pos));
        assert!(!rules.is_checkmate(&pos));
        assert_eq!(draw_reason(&pos), Some(DrawReason::Stalemate));
        assert!(rules.is_game_over(&pos));
    }

    #[test]
    fn test_insufficient_material() {
        let kings = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let knight = Position::from_fen("4k3/8/8/8/8/8/8/4KN2 w - - 0 1").unwrap();
        let same_bishops = Position::from_fen("4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1").unwrap();
        let rook = Position::from_fen("4k3/8/8/8/8/8/8/4KR2 w - - 0 1").unwrap();
        assert!(has_insufficient_material(&kings.board));
        assert!(has_insufficient_material(&knight.board));
        assert!(has_insufficient_material(&same_bishops.board));
        assert!(!has_insufficient_material(&rook.board));
        assert_eq!(draw_reason(&kings), Some(DrawReason::InsufficientMaterial));
    }

    #[test]
    fn test_fifty_move_rule() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 100 80").unwrap();
        assert_eq!(draw_reason(&pos), Some(DrawReason::FiftyMoveRule));
        assert!(ChessRules.is_game_over(&pos));
    }

    #[test]
    fn test_apply_rejects_move_not_in_legal_list() {
        let pos = Position::start();
        let bogus = Move {
            from: Square::parse("e2").unwrap(),
            to: Square::parse("e5").unwrap(),
            piece: PieceKind::Pawn,
            captured: None,
            promotion: None,
        };
        let err = ChessRules.apply(&pos, &bogus).unwrap_err();
        assert_eq!(err.mv, "e2e5");
        assert_eq!(err.fen, pos.to_fen());
    }

    #[test]
    fn test_square_attacks_by_each_piece() {
        let pos = Position::from_fen("4k3/8/8/3p4/8/5n2/8/R3K3 w - - 0 1").unwrap();
        let board = &pos.board;
        // black pawn d5 attacks c4 and e4
        assert!(is_square_attacked(board, Square::parse("e4").unwrap(), Color::Black));
        assert!(!is_square_attacked(board, Square::parse("d3").unwrap(), Color::Black));
        // knight f3 attacks d4 and e1
        assert!(is_square_attacked(board, Square::parse("d4").unwrap(), Color::Black));
        assert!(is_square_attacked(board, Square::parse("e1").unwrap(), Color::Black));
        // rook a1 sees a8 along the open file
        assert!(is_square_attacked(board, Square::parse("a8").unwrap(), Color::White));
        assert!(is_in_check(&pos, Color::White));
        assert!(!is_in_check(&pos, Color::Black));
    }

    #[test]
    fn test_missing_king_is_never_in_check() {
        let mut pos = Position::from_fen("4k3/8/8/8/8/8/8/r3K3 w - - 0 1").unwrap();
        pos.board.set(Square::parse("e1").unwrap(), None);
        pos.board
            .set(Square::parse("h1").unwrap(), Some(Piece::new(PieceKind::Rook, Color::White)));
        assert!(!is_in_check(&pos, Color::White));
    }

    #[test]
    fn test_successors_match_apply() {
        let rules = ChessRules;
        let pos = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let successors = rules.successors(&pos).unwrap();
        assert_eq!(successors.len(), 48);
        for (mv, next) in &successors {
            assert_eq!(*next, rules.apply(&pos, mv).unwrap(), "{mv}");
        }
        let moves: Vec<Move> = successors.into_iter().map(|(mv, _)| mv).collect();
        assert_eq!(moves, rules.legal_moves(&pos));
    }
}
