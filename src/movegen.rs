use log::warn;

use crate::board::{Board, Color, GameState, Piece, PositionKey, Square};
use crate::error::ChessError;

/// A move request: origin, destination and, for pawns reaching the far rank,
/// the piece to promote to (queen when absent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn promoting(from: Square, to: Square, promotion: Piece) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    /// The side to move is in check but has a way out.
    Check,
    Checkmate { winner: Color },
    Stalemate,
    FiftyMoveRule,
    InsufficientMaterial,
    ThreefoldRepetition,
    Resigned { winner: Color },
    DrawAgreed,
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        !matches!(self, GameStatus::Ongoing | GameStatus::Check)
    }

    pub fn winner(&self) -> Option<Color> {
        match self {
            GameStatus::Checkmate { winner } | GameStatus::Resigned { winner } => Some(*winner),
            _ => None,
        }
    }

    pub fn is_draw(&self) -> bool {
        self.is_over() && self.winner().is_none()
    }
}

/// Half-moves without a pawn move or capture after which the game is drawn.
pub const FIFTY_MOVE_PLIES: u32 = 100;

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];
const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

#[derive(Debug, Clone, Default)]
pub struct MoveGenerator {
    /// Also refuse castling out of, through or into check.
    pub strict_castling: bool,
}

impl MoveGenerator {
    pub fn new() -> Self {
        Self {
            strict_castling: false,
        }
    }

    pub fn with_strict_castling(strict_castling: bool) -> Self {
        Self { strict_castling }
    }

    /// Destinations reachable by the piece on `square`, ignoring whether the
    /// mover's king is left in check. Castling and en passant are only offered
    /// when `state` is given.
    pub fn pseudo_legal_moves(
        &self,
        board: &Board,
        square: Square,
        state: Option<&GameState>,
    ) -> Vec<Square> {
        let Some((piece, color)) = board.piece_at(square) else {
            return Vec::new();
        };

        let mut moves = Vec::new();
        match piece {
            Piece::Pawn => self.pawn_moves(board, square, color, state, &mut moves),
            Piece::Rook => self.slide(board, square, color, &ROOK_DIRECTIONS, &mut moves),
            Piece::Bishop => self.slide(board, square, color, &BISHOP_DIRECTIONS, &mut moves),
            Piece::Queen => {
                self.slide(board, square, color, &ROOK_DIRECTIONS, &mut moves);
                self.slide(board, square, color, &BISHOP_DIRECTIONS, &mut moves);
            }
            Piece::Knight => self.step(board, square, color, &KNIGHT_OFFSETS, &mut moves),
            Piece::King => {
                self.step(board, square, color, &KING_OFFSETS, &mut moves);
                if let Some(state) = state {
                    self.castling_moves(board, square, color, state, &mut moves);
                }
            }
        }
        moves
    }

    fn pawn_moves(
        &self,
        board: &Board,
        from: Square,
        color: Color,
        state: Option<&GameState>,
        moves: &mut Vec<Square>,
    ) {
        let dir = color.pawn_direction();

        if let Some(one) = from.offset(dir, 0).filter(|&sq| board.is_empty_at(sq)) {
            moves.push(one);
            if from.row() == color.pawn_start_row() {
                if let Some(two) = from.offset(2 * dir, 0).filter(|&sq| board.is_empty_at(sq)) {
                    moves.push(two);
                }
            }
        }

        for d_col in [-1, 1] {
            let Some(to) = from.offset(dir, d_col) else {
                continue;
            };
            match board.piece_at(to) {
                Some((_, c)) if c != color => moves.push(to),
                Some(_) => {}
                None => {
                    let en_passant = state.and_then(|s| s.en_passant_target) == Some(to);
                    let victim = to
                        .offset(-dir, 0)
                        .and_then(|sq| board.piece_at(sq));
                    if en_passant && victim == Some((Piece::Pawn, color.opposite())) {
                        moves.push(to);
                    }
                }
            }
        }
    }

    fn slide(
        &self,
        board: &Board,
        from: Square,
        color: Color,
        directions: &[(i8, i8)],
        moves: &mut Vec<Square>,
    ) {
        for &(d_row, d_col) in directions {
            let mut current = from.offset(d_row, d_col);
            while let Some(to) = current {
                match board.piece_at(to) {
                    None => moves.push(to),
                    Some((_, c)) => {
                        if c != color {
                            moves.push(to);
                        }
                        break;
                    }
                }
                current = to.offset(d_row, d_col);
            }
        }
    }

    fn step(
        &self,
        board: &Board,
        from: Square,
        color: Color,
        offsets: &[(i8, i8)],
        moves: &mut Vec<Square>,
    ) {
        for &(d_row, d_col) in offsets {
            if let Some(to) = from.offset(d_row, d_col) {
                match board.piece_at(to) {
                    Some((_, c)) if c == color => {}
                    _ => moves.push(to),
                }
            }
        }
    }

    fn castling_moves(
        &self,
        board: &Board,
        from: Square,
        color: Color,
        state: &GameState,
        moves: &mut Vec<Square>,
    ) {
        let row = color.back_row();
        if from != Square::new(row, 4) {
            return;
        }
        let rights = state.castling_rights.for_color(color);
        let enemy = color.opposite();

        // (right held, rook column, squares between king and rook, king path, king target)
        let sides: [(bool, u8, &[u8], [u8; 2], u8); 2] = [
            (rights.kingside, 7, &[5, 6][..], [5, 6], 6),
            (rights.queenside, 0, &[1, 2, 3][..], [3, 2], 2),
        ];

        for (allowed, rook_col, between, king_path, target) in sides {
            if !allowed {
                continue;
            }
            if board.piece_at(Square::new(row, rook_col)) != Some((Piece::Rook, color)) {
                continue;
            }
            if !between.iter().all(|&col| board.is_empty_at(Square::new(row, col))) {
                continue;
            }
            if self.strict_castling {
                let passes_attack = self.is_square_under_attack(board, from, enemy)
                    || king_path
                        .iter()
                        .any(|&col| self.is_square_under_attack(board, Square::new(row, col), enemy));
                if passes_attack {
                    continue;
                }
            }
            moves.push(Square::new(row, target));
        }
    }

    /// Whether a piece of `attacker` could capture on `square`.
    pub fn is_square_under_attack(&self, board: &Board, square: Square, attacker: Color) -> bool {
        // Attacking pawns sit one row behind the square from their point of view.
        let pawn_row = -attacker.pawn_direction();
        for d_col in [-1, 1] {
            if let Some(from) = square.offset(pawn_row, d_col) {
                if board.piece_at(from) == Some((Piece::Pawn, attacker)) {
                    return true;
                }
            }
        }

        let hits = |offsets: &[(i8, i8)], piece: Piece| {
            offsets.iter().any(|&(d_row, d_col)| {
                square
                    .offset(d_row, d_col)
                    .map_or(false, |from| board.piece_at(from) == Some((piece, attacker)))
            })
        };
        if hits(&KNIGHT_OFFSETS[..], Piece::Knight) || hits(&KING_OFFSETS[..], Piece::King) {
            return true;
        }

        let ray_hits = |directions: &[(i8, i8)], slider: Piece| {
            directions.iter().any(|&(d_row, d_col)| {
                let mut current = square.offset(d_row, d_col);
                while let Some(sq) = current {
                    if let Some((piece, color)) = board.piece_at(sq) {
                        return color == attacker && (piece == slider || piece == Piece::Queen);
                    }
                    current = sq.offset(d_row, d_col);
                }
                false
            })
        };
        ray_hits(&ROOK_DIRECTIONS[..], Piece::Rook) || ray_hits(&BISHOP_DIRECTIONS[..], Piece::Bishop)
    }

    /// True iff an opposing piece could capture `color`'s king. A board without
    /// that king reports `false`.
    pub fn is_king_in_check(&self, board: &Board, color: Color) -> bool {
        match board.find_king(color) {
            Some(king) => self.is_square_under_attack(board, king, color.opposite()),
            None => {
                warn!("no {:?} king on the board; treating it as not in check", color);
                false
            }
        }
    }

    /// Pseudo-legal destinations that do not leave the mover's king in check.
    pub fn legal_moves(
        &self,
        board: &Board,
        square: Square,
        state: Option<&GameState>,
    ) -> Vec<Square> {
        let Some((_, color)) = board.piece_at(square) else {
            return Vec::new();
        };
        let probe_state = state.cloned().unwrap_or_default();

        self.pseudo_legal_moves(board, square, state)
            .into_iter()
            .filter(|&to| {
                let (after, _) = board.make_move(&probe_state, Move::new(square, to));
                !self.is_king_in_check(&after, color)
            })
            .collect()
    }

    /// Every legal move of `color`, scanning pieces in row-major order.
    /// Promotions are left to the executor's default (queen).
    pub fn legal_moves_for(
        &self,
        board: &Board,
        color: Color,
        state: Option<&GameState>,
    ) -> Vec<Move> {
        board
            .pieces(color)
            .flat_map(|(from, _)| {
                self.legal_moves(board, from, state)
                    .into_iter()
                    .map(move |to| Move::new(from, to))
            })
            .collect()
    }

    pub fn has_legal_move(&self, board: &Board, color: Color, state: Option<&GameState>) -> bool {
        board
            .pieces(color)
            .any(|(from, _)| !self.legal_moves(board, from, state).is_empty())
    }

    /// Checkmate judged from the placement alone. Without a `GameState` the
    /// en passant and castling escapes are unknown, so a check that only an en
    /// passant capture answers is reported as mate. Use
    /// [`MoveGenerator::is_checkmate_in`] when the state is at hand.
    pub fn is_checkmate(&self, board: &Board, color: Color) -> bool {
        self.is_king_in_check(board, color) && !self.has_legal_move(board, color, None)
    }

    pub fn is_checkmate_in(&self, board: &Board, color: Color, state: &GameState) -> bool {
        self.is_king_in_check(board, color) && !self.has_legal_move(board, color, Some(state))
    }

    pub fn is_stalemate(&self, board: &Board, color: Color, state: Option<&GameState>) -> bool {
        !self.is_king_in_check(board, color) && !self.has_legal_move(board, color, state)
    }

    /// Executes `mv` after checking it against the legal move list.
    pub fn apply_move(
        &self,
        board: &Board,
        state: &GameState,
        mv: Move,
    ) -> Result<(Board, GameState), ChessError> {
        if board.piece_at(mv.from).is_none() {
            return Err(ChessError::EmptySquare(mv.from));
        }
        if let Some(promotion) = mv.promotion {
            if !promotion.is_promotion_choice() {
                return Err(ChessError::InvalidPromotion(promotion));
            }
        }
        if !self.legal_moves(board, mv.from, Some(state)).contains(&mv.to) {
            return Err(ChessError::IllegalMove {
                from: mv.from,
                to: mv.to,
            });
        }
        Ok(board.make_move(state, mv))
    }

    /// Repetition key for the position. The en passant target only counts when
    /// a pawn of `side_to_move` can legally capture onto it.
    pub fn position_key(&self, board: &Board, state: &GameState, side_to_move: Color) -> PositionKey {
        let en_passant_target = state.en_passant_target.filter(|&target| {
            board.pieces(side_to_move).any(|(from, piece)| {
                piece == Piece::Pawn
                    && from.col() != target.col()
                    && self.legal_moves(board, from, Some(state)).contains(&target)
            })
        });
        board.position_key(state, side_to_move, en_passant_target)
    }

    pub fn is_fifty_move_rule(&self, state: &GameState) -> bool {
        state.halfmove_clock >= FIFTY_MOVE_PLIES
    }

    /// `history` holds every position of the game so far, the current one last.
    pub fn is_threefold_repetition(&self, history: &[PositionKey]) -> bool {
        history.last().map_or(false, |current| {
            history.iter().filter(|&key| key == current).count() >= 3
        })
    }

    pub fn is_insufficient_material(&self, board: &Board) -> bool {
        let minors = |color: Color| -> Option<Vec<(Square, Piece)>> {
            let pieces: Vec<_> = board
                .pieces(color)
                .filter(|&(_, piece)| piece != Piece::King)
                .collect();
            let only_minors = pieces
                .iter()
                .all(|&(_, piece)| matches!(piece, Piece::Knight | Piece::Bishop));
            only_minors.then_some(pieces)
        };

        let (Some(white), Some(black)) = (minors(Color::White), minors(Color::Black)) else {
            return false;
        };

        match (white.as_slice(), black.as_slice()) {
            ([], []) | ([_], []) | ([], [_]) => true,
            ([(white_sq, Piece::Bishop)], [(black_sq, Piece::Bishop)]) => {
                white_sq.is_dark() == black_sq.is_dark()
            }
            ([_], [_]) => true,
            _ => false,
        }
    }

    /// Status of the game for `side_to_move`. Checkmate and stalemate take
    /// precedence over the draw rules.
    pub fn game_status(
        &self,
        board: &Board,
        state: &GameState,
        side_to_move: Color,
        history: &[PositionKey],
    ) -> GameStatus {
        let in_check = self.is_king_in_check(board, side_to_move);

        if !self.has_legal_move(board, side_to_move, Some(state)) {
            return if in_check {
                GameStatus::Checkmate {
                    winner: side_to_move.opposite(),
                }
            } else {
                GameStatus::Stalemate
            };
        }

        if self.is_insufficient_material(board) {
            return GameStatus::InsufficientMaterial;
        }
        if self.is_fifty_move_rule(state) {
            return GameStatus::FiftyMoveRule;
        }
        if self.is_threefold_repetition(history) {
            return GameStatus::ThreefoldRepetition;
        }

        if in_check {
            GameStatus::Check
        } else {
            GameStatus::Ongoing
        }
    }
}
