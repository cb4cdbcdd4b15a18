use crate::board::{Board, Color, Piece, Square};
use crate::movegen::MoveGenerator;

/// Static position scorer. Scores are in tenths of a pawn-unit, positive when
/// the position favours the evaluating color.
pub struct Evaluator {
    // Piece values
    pub pawn_value: i32,
    pub knight_value: i32,
    pub bishop_value: i32,
    pub rook_value: i32,
    pub queen_value: i32,
    pub king_value: i32,

    // Positional bonuses, indexed [row][col] from white's side of the board
    pub pawn_position_bonus: [[i32; 8]; 8],
    pub knight_position_bonus: [[i32; 8]; 8],
    pub bishop_position_bonus: [[i32; 8]; 8],
    pub rook_position_bonus: [[i32; 8]; 8],
    pub queen_position_bonus: [[i32; 8]; 8],
    pub king_position_bonus: [[i32; 8]; 8],

    pub mate_score: i32,
    pub check_bonus: i32,
    pub center_bonus: i32,

    move_generator: MoveGenerator,
}

const CENTER: [Square; 4] = [
    Square::new(3, 3),
    Square::new(3, 4),
    Square::new(4, 3),
    Square::new(4, 4),
];

impl Evaluator {
    pub fn new() -> Self {
        Self {
            pawn_value: 100,
            knight_value: 300,
            bishop_value: 300,
            rook_value: 500,
            queen_value: 900,
            king_value: 9000,

            // Rewards advancement and the two centre files
            pawn_position_bonus: [
                [0, 0, 0, 0, 0, 0, 0, 0],
                [50, 50, 50, 50, 50, 50, 50, 50],
                [10, 10, 20, 30, 30, 20, 10, 10],
                [5, 5, 10, 25, 25, 10, 5, 5],
                [0, 0, 0, 20, 20, 0, 0, 0],
                [5, -5, -10, 0, 0, -10, -5, 5],
                [5, 10, 10, -20, -20, 10, 10, 5],
                [0, 0, 0, 0, 0, 0, 0, 0],
            ],

            knight_position_bonus: [
                [-50, -40, -30, -30, -30, -30, -40, -50],
                [-40, -20, 0, 0, 0, 0, -20, -40],
                [-30, 0, 10, 15, 15, 10, 0, -30],
                [-30, 5, 15, 20, 20, 15, 5, -30],
                [-30, 0, 15, 20, 20, 15, 0, -30],
                [-30, 5, 10, 15, 15, 10, 5, -30],
                [-40, -20, 0, 5, 5, 0, -20, -40],
                [-50, -40, -30, -30, -30, -30, -40, -50],
            ],

            bishop_position_bonus: [
                [-20, -10, -10, -10, -10, -10, -10, -20],
                [-10, 0, 0, 0, 0, 0, 0, -10],
                [-10, 0, 5, 10, 10, 5, 0, -10],
                [-10, 5, 5, 10, 10, 5, 5, -10],
                [-10, 0, 10, 10, 10, 10, 0, -10],
                [-10, 10, 10, 10, 10, 10, 10, -10],
                [-10, 5, 0, 0, 0, 0, 5, -10],
                [-20, -10, -10, -10, -10, -10, -10, -20],
            ],

            rook_position_bonus: [
                [0, 0, 0, 0, 0, 0, 0, 0],
                [5, 10, 10, 10, 10, 10, 10, 5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [0, 0, 0, 5, 5, 0, 0, 0],
            ],

            queen_position_bonus: [
                [-20, -10, -10, -5, -5, -10, -10, -20],
                [-10, 0, 0, 0, 0, 0, 0, -10],
                [-10, 0, 5, 5, 5, 5, 0, -10],
                [-5, 0, 5, 5, 5, 5, 0, -5],
                [0, 0, 5, 5, 5, 5, 0, -5],
                [-10, 5, 5, 5, 5, 5, 0, -10],
                [-10, 0, 5, 0, 0, 0, 0, -10],
                [-20, -10, -10, -5, -5, -10, -10, -20],
            ],

            // Keeps the king home and prefers the castled corners
            king_position_bonus: [
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-20, -30, -30, -40, -40, -30, -30, -20],
                [-10, -20, -20, -20, -20, -20, -20, -10],
                [20, 20, 0, 0, 0, 0, 20, 20],
                [20, 30, 10, 0, 0, 10, 30, 20],
            ],

            mate_score: 100_000,
            check_bonus: 500,
            center_bonus: 50,

            move_generator: MoveGenerator::new(),
        }
    }

    /// Scores `board` from `color`'s point of view. A checkmate on either side
    /// overrides everything else. Mate is judged from the placement alone, so
    /// a check answered only by an en passant capture scores as mate.
    pub fn evaluate(&self, board: &Board, color: Color) -> i32 {
        let opponent = color.opposite();
        let own_check = self.move_generator.is_king_in_check(board, color);
        let opponent_check = self.move_generator.is_king_in_check(board, opponent);

        if opponent_check && !self.move_generator.has_legal_move(board, opponent, None) {
            return self.mate_score;
        }
        if own_check && !self.move_generator.has_legal_move(board, color, None) {
            return -self.mate_score;
        }

        let mut score = 0;
        for (square, piece, piece_color) in board.occupied() {
            let value = self.piece_value(piece, piece_color, square);
            score += if piece_color == color { value } else { -value };
        }

        if opponent_check {
            score += self.check_bonus;
        }
        if own_check {
            score -= self.check_bonus;
        }

        for square in CENTER {
            if let Some((_, piece_color)) = board.piece_at(square) {
                score += if piece_color == color {
                    self.center_bonus
                } else {
                    -self.center_bonus
                };
            }
        }

        score
    }

    pub fn material_value(&self, piece: Piece) -> i32 {
        match piece {
            Piece::Pawn => self.pawn_value,
            Piece::Knight => self.knight_value,
            Piece::Bishop => self.bishop_value,
            Piece::Rook => self.rook_value,
            Piece::Queen => self.queen_value,
            Piece::King => self.king_value,
        }
    }

    /// Material plus positional bonus; black reads the tables mirrored.
    fn piece_value(&self, piece: Piece, color: Color, square: Square) -> i32 {
        let row = match color {
            Color::White => square.row() as usize,
            Color::Black => 7 - square.row() as usize,
        };
        let col = square.col() as usize;

        let position_bonus = match piece {
            Piece::Pawn => self.pawn_position_bonus[row][col],
            Piece::Knight => self.knight_position_bonus[row][col],
            Piece::Bishop => self.bishop_position_bonus[row][col],
            Piece::Rook => self.rook_position_bonus[row][col],
            Piece::Queen => self.queen_position_bonus[row][col],
            Piece::King => self.king_position_bonus[row][col],
        };

        self.material_value(piece) + position_bonus
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
