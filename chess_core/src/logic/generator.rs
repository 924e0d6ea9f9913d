use crate::engine::Move;
use crate::logic::board::{Color, Piece, PieceKind, Position, Square};
use crate::logic::rules::{is_in_check, is_square_attacked};

pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

pub const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

pub const ROOK_DIRECTIONS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
pub const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

pub struct MoveGenerator<'a> {
    position: &'a Position,
    moves: Vec<Move>,
}

impl<'a> MoveGenerator<'a> {
    pub fn new(position: &'a Position) -> Self {
        Self {
            position,
            moves: Vec::with_capacity(48),
        }
    }

    /// All moves obeying piece movement, ignoring whether the mover's king is left attacked.
    pub fn pseudo_legal(mut self) -> Vec<Move> {
        let turn = self.position.turn;
        let own: Vec<(Square, Piece)> = self
            .position
            .board
            .pieces()
            .filter(|(_, p)| p.color == turn)
            .collect();

        for (from, piece) in own {
            match piece.kind {
                PieceKind::Pawn => self.pawn_moves(from, turn),
                PieceKind::Knight => self.step_moves(from, PieceKind::Knight, &KNIGHT_OFFSETS),
                PieceKind::Bishop => self.slide_moves(from, PieceKind::Bishop, &BISHOP_DIRECTIONS),
                PieceKind::Rook => self.slide_moves(from, PieceKind::Rook, &ROOK_DIRECTIONS),
                PieceKind::Queen => {
                    self.slide_moves(from, PieceKind::Queen, &ROOK_DIRECTIONS);
                    self.slide_moves(from, PieceKind::Queen, &BISHOP_DIRECTIONS);
                }
                PieceKind::King => {
                    self.step_moves(from, PieceKind::King, &KING_OFFSETS);
                    self.castling_moves(from, turn);
                }
            }
        }
        self.moves
    }

    fn push(&mut self, from: Square, to: Square, piece: PieceKind) {
        let captured = self.position.board.get(to).map(|p| p.kind);
        self.moves.push(Move {
            from,
            to,
            piece,
            captured,
            promotion: None,
        });
    }

    /// Adds a move to `to` unless a friendly piece stands there.
    fn push_if_not_friendly(&mut self, from: Square, to: Square, piece: PieceKind) {
        match self.position.board.get(to) {
            Some(target) if target.color == self.position.turn => {}
            _ => self.push(from, to, piece),
        }
    }

    fn step_moves(&mut self, from: Square, piece: PieceKind, offsets: &[(i8, i8)]) {
        for &(dr, df) in offsets {
            if let Some(to) = from.offset(dr, df) {
                self.push_if_not_friendly(from, to, piece);
            }
        }
    }

    fn slide_moves(&mut self, from: Square, piece: PieceKind, directions: &[(i8, i8)]) {
        for &(dr, df) in directions {
            let mut current = from;
            while let Some(to) = current.offset(dr, df) {
                match self.position.board.get(to) {
                    None => self.push(from, to, piece),
                    Some(target) => {
                        if target.color != self.position.turn {
                            self.push(from, to, piece);
                        }
                        break;
                    }
                }
                current = to;
            }
        }
    }

    fn pawn_moves(&mut self, from: Square, turn: Color) {
        let position = self.position;
        let dir = turn.pawn_direction();
        let promotion_row = turn.opposite().home_row();

        if let Some(one) = from.offset(dir, 0) {
            if position.board.is_empty_at(one) {
                self.push_pawn(from, one, None, promotion_row);
                if from.row() == turn.pawn_start_row() {
                    if let Some(two) = from.offset(dir * 2, 0) {
                        if position.board.is_empty_at(two) {
                            self.push(from, two, PieceKind::Pawn);
                        }
                    }
                }
            }
        }

        for df in [-1, 1] {
            let Some(to) = from.offset(dir, df) else {
                continue;
            };
            match position.board.get(to) {
                Some(target) if target.color != turn => {
                    self.push_pawn(from, to, Some(target.kind), promotion_row);
                }
                None if position.en_passant == Some(to) => {
                    self.moves.push(Move {
                        from,
                        to,
                        piece: PieceKind::Pawn,
                        captured: Some(PieceKind::Pawn),
                        promotion: None,
                    });
                }
                _ => {}
            }
        }
    }

    fn push_pawn(
        &mut self,
        from: Square,
        to: Square,
        captured: Option<PieceKind>,
        promotion_row: usize,
    ) {
        if to.row() == promotion_row {
            for promotion in PieceKind::PROMOTIONS {
                self.moves.push(Move {
                    from,
                    to,
                    piece: PieceKind::Pawn,
                    captured,
                    promotion: Some(promotion),
                });
            }
        } else {
            self.moves.push(Move {
                from,
                to,
                piece: PieceKind::Pawn,
                captured,
                promotion: None,
            });
        }
    }

    fn castling_moves(&mut self, from: Square, turn: Color) {
        let row = turn.home_row();
        if Square::new(row, 4) != Some(from) {
            return;
        }
        let position = self.position;
        let rights = position.castling;
        let board = &position.board;
        let enemy = turn.opposite();
        let rook = Some(Piece::new(PieceKind::Rook, turn));
        let empty = |file: usize| Square::new(row, file).is_some_and(|sq| board.is_empty_at(sq));
        let safe = |file: usize| {
            Square::new(row, file).is_some_and(|sq| !is_square_attacked(board, sq, enemy))
        };
        let rook_at = |file: usize| Square::new(row, file).and_then(|sq| board.get(sq)) == rook;

        let mut castles = Vec::with_capacity(2);
        if rights.king_side(turn)
            && rook_at(7)
            && empty(5)
            && empty(6)
            && safe(4)
            && safe(5)
            && safe(6)
        {
            castles.extend(Square::new(row, 6));
        }
        if rights.queen_side(turn)
            && rook_at(0)
            && empty(1)
            && empty(2)
            && empty(3)
            && safe(4)
            && safe(3)
            && safe(2)
        {
            castles.extend(Square::new(row, 2));
        }
        for to in castles {
            self.push(from, to, PieceKind::King);
        }
    }
}

/// Plays `mv` without checking legality. Handles castling, en passant, promotion,
/// rights bookkeeping and both move counters.
pub fn make_move(position: &Position, mv: &Move) -> Position {
    let mut next = position.clone();
    let turn = position.turn;
    let board = &mut next.board;

    let moving = board.take(mv.from);
    let captured = board.take(mv.to);

    if mv.piece == PieceKind::Pawn && captured.is_none() && mv.from.file() != mv.to.file() {
        // en passant: the captured pawn sits beside the origin square
        if let Some(victim) = Square::new(mv.from.row(), mv.to.file()) {
            board.set(victim, None);
        }
    }

    let placed = match mv.promotion {
        Some(kind) => Some(Piece::new(kind, turn)),
        None => moving,
    };
    board.set(mv.to, placed);

    if mv.is_castle() {
        let row = mv.from.row();
        let (rook_from, rook_to) = if mv.to.file() == 6 { (7, 5) } else { (0, 3) };
        if let (Some(rf), Some(rt)) = (Square::new(row, rook_from), Square::new(row, rook_to)) {
            let rook = board.take(rf);
            board.set(rt, rook);
        }
    }

    if mv.piece == PieceKind::King {
        next.castling.clear(turn);
    }
    next.castling.clear_corner(mv.from);
    next.castling.clear_corner(mv.to);

    next.en_passant = None;
    if mv.piece == PieceKind::Pawn && mv.from.row().abs_diff(mv.to.row()) == 2 {
        next.en_passant = Square::new((mv.from.row() + mv.to.row()) / 2, mv.from.file());
    }

    if mv.piece == PieceKind::Pawn || mv.captured.is_some() {
        next.halfmove_clock = 0;
    } else {
        next.halfmove_clock = next.halfmove_clock.saturating_add(1);
    }
    if turn == Color::Black {
        // counters come straight from FEN and may sit at u32::MAX
        next.fullmove_number = next.fullmove_number.saturating_add(1);
    }
    next.turn = turn.opposite();
    next
}

/// Pseudo-legal moves that do not leave the mover's own king attacked.
pub fn legal_moves(position: &Position) -> Vec<Move> {
    let turn = position.turn;
    MoveGenerator::new(position)
        .pseudo_legal()
        .into_iter()
        .filter(|mv| !is_in_check(&make_move(position, mv), turn))
        .collect()
}

// Same filter as legal_moves, keeping the position each move was tested on.
pub fn legal_successors(position: &Position) -> Vec<(Move, Position)> {
    let turn = position.turn;
    MoveGenerator::new(position)
        .pseudo_legal()
        .into_iter()
        .filter_map(|mv| {
            let next = make_move(position, &mv);
            (!is_in_check(&next, turn)).then_some((mv, next))
        })
        .collect()
}
