use std::fmt;

use log::warn;

use crate::movegen::Move;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Piece {
    /// Pieces a pawn may become on the far rank.
    pub const PROMOTIONS: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

    pub fn is_promotion_choice(&self) -> bool {
        Self::PROMOTIONS.contains(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row step of a forward pawn move. White advances toward row 0.
    pub fn pawn_direction(&self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    pub fn pawn_start_row(&self) -> u8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    pub fn promotion_row(&self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// The row holding this color's king and rooks at the start.
    pub fn back_row(&self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }
}

/// A board coordinate. Row 0 is rank 8, row 7 is rank 1; column 0 is the a-file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    /// # Panics
    ///
    /// Panics if either coordinate is outside `0..8`.
    pub const fn new(row: u8, col: u8) -> Self {
        assert!(row < 8 && col < 8, "square coordinates out of range");
        Self { row, col }
    }

    pub fn try_new(row: i8, col: i8) -> Option<Self> {
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    pub fn col(&self) -> u8 {
        self.col
    }

    pub fn offset(&self, d_row: i8, d_col: i8) -> Option<Self> {
        Self::try_new(self.row as i8 + d_row, self.col as i8 + d_col)
    }

    /// True for dark squares (a1, c1, ...).
    pub fn is_dark(&self) -> bool {
        (self.row + self.col) % 2 == 1
    }

    /// All 64 squares in row-major order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |col| Square { row, col }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastleSides {
    pub kingside: bool,
    pub queenside: bool,
}

impl CastleSides {
    pub const BOTH: CastleSides = CastleSides {
        kingside: true,
        queenside: true,
    };
    pub const NONE: CastleSides = CastleSides {
        kingside: false,
        queenside: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub white: CastleSides,
    pub black: CastleSides,
}

impl CastlingRights {
    pub fn all() -> Self {
        Self {
            white: CastleSides::BOTH,
            black: CastleSides::BOTH,
        }
    }

    pub fn none() -> Self {
        Self {
            white: CastleSides::NONE,
            black: CastleSides::NONE,
        }
    }

    pub fn for_color(&self, color: Color) -> CastleSides {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    pub fn for_color_mut(&mut self, color: Color) -> &mut CastleSides {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Drops the right tied to the rook home square `square`, if it is one.
    fn revoke_rook_square(&mut self, color: Color, square: Square) {
        if square.row() != color.back_row() {
            return;
        }
        let sides = self.for_color_mut(color);
        match square.col() {
            0 => sides.queenside = false,
            7 => sides.kingside = false,
            _ => {}
        }
    }
}

/// The most recently executed move, as the executor saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastMove {
    pub mv: Move,
    pub piece: Piece,
    pub color: Color,
    pub captured: Option<Piece>,
}

/// Auxiliary state that the piece placement alone does not capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub en_passant_target: Option<Square>,
    pub castling_rights: CastlingRights,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
    pub last_move: Option<LastMove>,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            en_passant_target: None,
            castling_rights: CastlingRights::all(),
            halfmove_clock: 0,
            fullmove_number: 1,
            last_move: None,
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything that makes two positions the same for repetition purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionKey {
    board: Board,
    side_to_move: Color,
    castling_rights: CastlingRights,
    en_passant_target: Option<Square>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Option<(Piece, Color)>; 8]; 8],
}

const BACK_RANK: [Piece; 8] = [
    Piece::Rook,
    Piece::Knight,
    Piece::Bishop,
    Piece::Queen,
    Piece::King,
    Piece::Bishop,
    Piece::Knight,
    Piece::Rook,
];

impl Board {
    /// The standard starting position.
    pub fn new() -> Self {
        let mut board = Self::empty();
        for (col, &piece) in BACK_RANK.iter().enumerate() {
            board.cells[0][col] = Some((piece, Color::Black));
            board.cells[1][col] = Some((Piece::Pawn, Color::Black));
            board.cells[6][col] = Some((Piece::Pawn, Color::White));
            board.cells[7][col] = Some((piece, Color::White));
        }
        board
    }

    pub fn empty() -> Self {
        Self {
            cells: [[None; 8]; 8],
        }
    }

    /// Returns a copy of the board with `piece` placed on `square`.
    pub fn with_piece(mut self, square: Square, piece: Piece, color: Color) -> Self {
        self.put(square, Some((piece, color)));
        self
    }

    pub fn piece_at(&self, square: Square) -> Option<(Piece, Color)> {
        self.cells[square.row() as usize][square.col() as usize]
    }

    pub fn is_empty_at(&self, square: Square) -> bool {
        self.piece_at(square).is_none()
    }

    pub(crate) fn put(&mut self, square: Square, cell: Option<(Piece, Color)>) {
        self.cells[square.row() as usize][square.col() as usize] = cell;
    }

    fn take(&mut self, square: Square) -> Option<(Piece, Color)> {
        let cell = self.piece_at(square);
        self.put(square, None);
        cell
    }

    /// Pieces of `color` in row-major order.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |square| match self.piece_at(square) {
            Some((piece, c)) if c == color => Some((square, piece)),
            _ => None,
        })
    }

    pub fn occupied(&self) -> impl Iterator<Item = (Square, Piece, Color)> + '_ {
        Square::all().filter_map(move |square| {
            self.piece_at(square)
                .map(|(piece, color)| (square, piece, color))
        })
    }

    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.pieces(color)
            .find(|&(_, piece)| piece == Piece::King)
            .map(|(square, _)| square)
    }

    /// Key for repetition checks. `en_passant_target` should only be set when
    /// the side to move can actually capture there.
    pub(crate) fn position_key(
        &self,
        state: &GameState,
        side_to_move: Color,
        en_passant_target: Option<Square>,
    ) -> PositionKey {
        PositionKey {
            board: *self,
            side_to_move,
            castling_rights: state.castling_rights,
            en_passant_target,
        }
    }

    /// Executes `mv` without checking that it is legal.
    ///
    /// Returns the resulting board and game state; neither input is touched.
    /// An empty source square leaves the position unchanged.
    pub fn make_move(&self, state: &GameState, mv: Move) -> (Board, GameState) {
        let Some((piece, color)) = self.piece_at(mv.from) else {
            warn!("make_move called with empty source square {}", mv.from);
            return (*self, state.clone());
        };

        let mut board = *self;
        let mut next = state.clone();
        let mut captured = self
            .piece_at(mv.to)
            .filter(|&(_, c)| c != color)
            .map(|(p, _)| p);
        let mut placed = piece;
        let mut promotion = None;
        next.en_passant_target = None;

        match piece {
            Piece::Pawn => {
                let dir = color.pawn_direction();
                if state.en_passant_target == Some(mv.to) && mv.from.col() != mv.to.col() {
                    if let Some(victim) = mv.to.offset(-dir, 0) {
                        if matches!(board.piece_at(victim), Some((Piece::Pawn, c)) if c != color) {
                            board.put(victim, None);
                            captured = Some(Piece::Pawn);
                        }
                    }
                }

                let double_step = mv.from.row() == color.pawn_start_row()
                    && mv.from.col() == mv.to.col()
                    && mv.to.row() as i8 == mv.from.row() as i8 + 2 * dir;
                if double_step {
                    next.en_passant_target = mv.from.offset(dir, 0);
                }

                if mv.to.row() == color.promotion_row() {
                    placed = mv
                        .promotion
                        .filter(Piece::is_promotion_choice)
                        .unwrap_or(Piece::Queen);
                    promotion = Some(placed);
                }
            }
            Piece::King => {
                if (mv.to.col() as i8 - mv.from.col() as i8).abs() == 2 {
                    let row = mv.from.row();
                    let (rook_from, rook_to) = if mv.to.col() > mv.from.col() {
                        (Square::new(row, 7), Square::new(row, mv.to.col() - 1))
                    } else {
                        (Square::new(row, 0), Square::new(row, mv.to.col() + 1))
                    };
                    let rook = board.take(rook_from);
                    board.put(rook_to, rook);
                }
                *next.castling_rights.for_color_mut(color) = CastleSides::NONE;
            }
            Piece::Rook => next.castling_rights.revoke_rook_square(color, mv.from),
            _ => {}
        }

        if captured == Some(Piece::Rook) {
            next.castling_rights
                .revoke_rook_square(color.opposite(), mv.to);
        }

        board.put(mv.from, None);
        board.put(mv.to, Some((placed, color)));

        if piece == Piece::Pawn || captured.is_some() {
            next.halfmove_clock = 0;
        } else {
            next.halfmove_clock = next.halfmove_clock.saturating_add(1);
        }
        if color == Color::Black {
            next.fullmove_number = next.fullmove_number.saturating_add(1);
        }
        next.last_move = Some(LastMove {
            mv: Move {
                from: mv.from,
                to: mv.to,
                promotion,
            },
            piece,
            color,
            captured,
        });

        (board, next)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut result = String::new();
        for row in 0..8 {
            for col in 0..8 {
                let piece_char = match self.piece_at(Square::new(row, col)) {
                    Some((piece, color)) => {
                        let c = match piece {
                            Piece::Pawn => 'p',
                            Piece::Knight => 'n',
                            Piece::Bishop => 'b',
                            Piece::Rook => 'r',
                            Piece::Queen => 'q',
                            Piece::King => 'k',
                        };
                        if color == Color::White {
                            c.to_ascii_uppercase()
                        } else {
                            c
                        }
                    }
                    None => '.',
                };
                result.push(piece_char);
                if col < 7 {
                    result.push(' ');
                }
            }
            result.push('\n');
        }
        write!(f, "{}", result)
    }
}
