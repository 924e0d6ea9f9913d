use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;
use std::fmt;
use thiserror::Error;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// Rows of the grid run top to bottom: row 0 is the 8th rank, row 7 the 1st.
pub type BoardGrid = [[Option<Piece>; 8]; 8];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::White => 0,
            Self::Black => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black",
        }
    }

    // Grid row holding this side's pieces at the start of the game.
    pub const fn home_row(self) -> usize {
        match self {
            Self::White => 7,
            Self::Black => 0,
        }
    }

    pub const fn pawn_start_row(self) -> usize {
        match self {
            Self::White => 6,
            Self::Black => 1,
        }
    }

    // Row delta of a single pawn step.
    pub const fn pawn_direction(self) -> i8 {
        match self {
            Self::White => -1,
            Self::Black => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceKind {
    // Promotion choices, strongest first.
    pub const PROMOTIONS: [Self; 4] = [Self::Queen, Self::Rook, Self::Bishop, Self::Knight];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn to_char(self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }

    pub const fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(Self::Pawn),
            'n' => Some(Self::Knight),
            'b' => Some(Self::Bishop),
            'r' => Some(Self::Rook),
            'q' => Some(Self::Queen),
            'k' => Some(Self::King),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    pub const fn fen_char(self) -> char {
        let c = self.kind.to_char();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub const fn from_fen_char(c: char) -> Option<Self> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        match PieceKind::from_char(c) {
            Some(kind) => Some(Self { kind, color }),
            None => None,
        }
    }
}

// Board square, `row * 8 + file` with row 0 being the 8th rank (a8 = 0, h1 = 63).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Square(u8);

impl Square {
    pub const fn new(row: usize, file: usize) -> Option<Self> {
        if row < 8 && file < 8 {
            #[allow(clippy::cast_possible_truncation)]
            let index = (row * 8 + file) as u8; // < 64
            Some(Self(index))
        } else {
            None
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        if index < 64 {
            #[allow(clippy::cast_possible_truncation)]
            let index = index as u8;
            Some(Self(index))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn row(self) -> usize {
        (self.0 / 8) as usize
    }

    pub const fn file(self) -> usize {
        (self.0 % 8) as usize
    }

    // Square reached by moving `dr` rows and `df` files, if still on the board.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    pub const fn offset(self, dr: i8, df: i8) -> Option<Self> {
        // row and file are below 8, so they fit an i8
        let row = self.row() as i8 + dr;
        let file = self.file() as i8 + df;
        if row < 0 || row > 7 || file < 0 || file > 7 {
            None
        } else {
            Self::new(row as usize, file as usize)
        }
    }

    // Same file, rank reflected (a1 <-> a8).
    #[must_use]
    pub const fn flipped(self) -> Self {
        Self((7 - self.0 / 8) * 8 + self.0 % 8)
    }

    pub const fn is_light(self) -> bool {
        (self.row() + self.file()) % 2 == 0
    }

    // Parses algebraic coordinates such as `e4`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut chars = text.chars();
        let file = chars.next()?;
        let rank = chars.next()?;
        if chars.next().is_some() || !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return None;
        }
        let file = file as usize - 'a' as usize;
        let rank = rank as usize - '1' as usize;
        Self::new(7 - rank, file)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = char::from(b'a' + self.0 % 8);
        let rank = char::from(b'8' - self.0 / 8);
        write!(f, "{file}{rank}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    #[serde(with = "BigArray")]
    squares: [Option<Piece>; 64],
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub const fn empty() -> Self {
        Self {
            squares: [None; 64],
        }
    }

    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.squares.get(sq.index()).copied().flatten()
    }

    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        if let Some(slot) = self.squares.get_mut(sq.index()) {
            *slot = piece;
        }
    }

    pub fn take(&mut self, sq: Square) -> Option<Piece> {
        self.squares.get_mut(sq.index()).and_then(Option::take)
    }

    pub fn is_empty_at(&self, sq: Square) -> bool {
        self.get(sq).is_none()
    }

    // Occupied squares in index order (a8 first).
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter_map(|(i, p)| Some((Square::from_index(i)?, (*p)?)))
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.kind == PieceKind::King && p.color == color)
            .map(|(sq, _)| sq)
    }

    pub fn grid(&self) -> BoardGrid {
        let mut grid: BoardGrid = [[None; 8]; 8];
        for (sq, piece) in self.pieces() {
            if let Some(cell) = grid.get_mut(sq.row()).and_then(|r| r.get_mut(sq.file())) {
                *cell = Some(piece);
            }
        }
        grid
    }

    // Colors swapped and ranks flipped.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        let mut out = Self::empty();
        for (sq, piece) in self.pieces() {
            out.set(
                sq.flipped(),
                Some(Piece::new(piece.kind, piece.color.opposite())),
            );
        }
        out
    }

    fn placement_fen(&self) -> String {
        let mut fen = String::new();
        for row in 0..8 {
            let mut empty = 0;
            for file in 0..8 {
                match Square::new(row, file).and_then(|sq| self.get(sq)) {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if row < 7 {
                fen.push('/');
            }
        }
        fen
    }

    fn from_placement(text: &str) -> Result<Self, FenError> {
        let rows: Vec<&str> = text.split('/').collect();
        if rows.len() != 8 {
            return Err(FenError::Placement(text.to_string()));
        }
        let mut board = Self::empty();
        for (row, row_text) in rows.iter().enumerate() {
            let mut file = 0;
            for c in row_text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    #[allow(clippy::cast_possible_truncation)]
                    let skip = skip as usize;
                    file += skip;
                } else {
                    let piece = Piece::from_fen_char(c)
                        .ok_or_else(|| FenError::Placement(text.to_string()))?;
                    let sq = Square::new(row, file)
                        .ok_or_else(|| FenError::Placement(text.to_string()))?;
                    board.set(sq, Some(piece));
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::Placement(text.to_string()));
            }
        }
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..8 {
            write!(f, "{} ", 8 - row)?;
            for file in 0..8 {
                let c = Square::new(row, file)
                    .and_then(|sq| self.get(sq))
                    .map_or('.', Piece::fen_char);
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        write!(f, "   a b c d e f g h")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white_king_side: bool,
    pub white_queen_side: bool,
    pub black_king_side: bool,
    pub black_queen_side: bool,
}

impl CastlingRights {
    pub const ALL: Self = Self {
        white_king_side: true,
        white_queen_side: true,
        black_king_side: true,
        black_queen_side: true,
    };

    pub const fn king_side(self, color: Color) -> bool {
        match color {
            Color::White => self.white_king_side,
            Color::Black => self.black_king_side,
        }
    }

    pub const fn queen_side(self, color: Color) -> bool {
        match color {
            Color::White => self.white_queen_side,
            Color::Black => self.black_queen_side,
        }
    }

    pub fn clear(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_king_side = false;
                self.white_queen_side = false;
            }
            Color::Black => {
                self.black_king_side = false;
                self.black_queen_side = false;
            }
        }
    }

    // Drops the right tied to a rook home corner once that square is vacated or captured on.
    pub fn clear_corner(&mut self, sq: Square) {
        match (sq.row(), sq.file()) {
            (7, 0) => self.white_queen_side = false,
            (7, 7) => self.white_king_side = false,
            (0, 0) => self.black_queen_side = false,
            (0, 7) => self.black_king_side = false,
            _ => {}
        }
    }

    #[must_use]
    pub const fn mirrored(self) -> Self {
        Self {
            white_king_side: self.black_king_side,
            white_queen_side: self.black_queen_side,
            black_king_side: self.white_king_side,
            black_queen_side: self.white_queen_side,
        }
    }

    fn fen(self) -> String {
        let mut s = String::new();
        if self.white_king_side {
            s.push('K');
        }
        if self.white_queen_side {
            s.push('Q');
        }
        if self.black_king_side {
            s.push('k');
        }
        if self.black_queen_side {
            s.push('q');
        }
        if s.is_empty() {
            s.push('-');
        }
        s
    }

    fn parse(text: &str) -> Result<Self, FenError> {
        let mut rights = Self::default();
        if text == "-" {
            return Ok(rights);
        }
        for c in text.chars() {
            match c {
                'K' => rights.white_king_side = true,
                'Q' => rights.white_queen_side = true,
                'k' => rights.black_king_side = true,
                'q' => rights.black_queen_side = true,
                _ => return Err(FenError::Castling(text.to_string())),
            }
        }
        Ok(rights)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("expected at least 4 FEN fields, found {0}")]
    MissingFields(usize),
    #[error("invalid piece placement `{0}`")]
    Placement(String),
    #[error("invalid side to move `{0}`")]
    SideToMove(String),
    #[error("invalid castling rights `{0}`")]
    Castling(String),
    #[error("invalid en passant square `{0}`")]
    EnPassant(String),
    #[error("invalid move counter `{0}`")]
    Counter(String),
}

// Full game state as seen by move generation: placement, side to move, rights and counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub board: Board,
    pub turn: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl Position {
    #[must_use]
    pub fn start() -> Self {
        Self::from_fen(START_FEN).unwrap_or_else(|_| Self::empty(Color::White))
    }

    pub const fn empty(turn: Color) -> Self {
        Self {
            board: Board::empty(),
            turn,
            castling: CastlingRights {
                white_king_side: false,
                white_queen_side: false,
                black_king_side: false,
                black_queen_side: false,
            },
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    // Parses Forsyth-Edwards Notation. The two move counters are optional.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let [placement, side, castling, en_passant, rest @ ..] = fields.as_slice() else {
            return Err(FenError::MissingFields(fields.len()));
        };

        let board = Board::from_placement(placement)?;
        let turn = match *side {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };
        let castling = CastlingRights::parse(castling)?;
        let en_passant = match *en_passant {
            "-" => None,
            text => Some(Square::parse(text).ok_or_else(|| FenError::EnPassant(text.to_string()))?),
        };
        let halfmove_clock = parse_counter(rest.first().copied(), 0)?;
        let fullmove_number = parse_counter(rest.get(1).copied(), 1)?;

        Ok(Self {
            board,
            turn,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    pub fn to_fen(&self) -> String {
        format!("{} {}", self.canonical_key(), self.fullmove_number)
    }

    // FEN without the full-move number. Keeps every field that affects legality
    // or the fifty-move rule, so equal keys mean interchangeable positions.
    pub fn canonical_key(&self) -> String {
        format!("{} {}", self.repetition_key(), self.halfmove_clock)
    }

    // Placement, side, castling and en passant only; used for repetition counting.
    pub fn repetition_key(&self) -> String {
        let side = match self.turn {
            Color::White => 'w',
            Color::Black => 'b',
        };
        let ep = self
            .en_passant
            .map_or_else(|| "-".to_string(), |sq| sq.to_string());
        format!(
            "{} {side} {} {ep}",
            self.board.placement_fen(),
            self.castling.fen()
        )
    }

    // Colors swapped and ranks flipped; the side to move swaps as well.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        Self {
            board: self.board.mirrored(),
            turn: self.turn.opposite(),
            castling: self.castling.mirrored(),
            en_passant: self.en_passant.map(Square::flipped),
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        }
    }
}

fn parse_counter(field: Option<&str>, default: u32) -> Result<u32, FenError> {
    field.map_or(Ok(default), |text| {
        text.parse()
            .map_err(|_| FenError::Counter(text.to_string()))
    })
}
