use log::{debug, trace};

use crate::board::{Board, Color, GameState, Piece, PositionKey, Square};
use crate::error::ChessError;
use crate::movegen::{GameStatus, Move, MoveGenerator};
use crate::notation::{move_notation, parse_fen, to_fen};
use crate::search::{Difficulty, ScoredMove, Search};

/// One executed move, as shown in a move list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub color: Color,
    pub piece: Piece,
    pub from: Square,
    pub to: Square,
    pub captured: Option<Piece>,
    pub promotion: Option<Piece>,
    pub is_castling: bool,
    pub is_en_passant: bool,
    pub gives_check: bool,
    pub is_checkmate: bool,
    pub notation: String,
}

/// A game in progress: the one authoritative position plus everything the
/// draw rules and the move list need.
pub struct Game {
    board: Board,
    state: GameState,
    side_to_move: Color,
    history: Vec<PositionKey>,
    moves: Vec<MoveRecord>,
    move_generator: MoveGenerator,
    concluded: Option<GameStatus>,
}

impl Game {
    pub fn new() -> Self {
        Self::from_position(Board::new(), GameState::new(), Color::White)
    }

    pub fn from_position(board: Board, state: GameState, side_to_move: Color) -> Self {
        let move_generator = MoveGenerator::new();
        let history = vec![move_generator.position_key(&board, &state, side_to_move)];
        Self {
            board,
            state,
            side_to_move,
            history,
            moves: Vec::new(),
            move_generator,
            concluded: None,
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let (board, state, side_to_move) = parse_fen(fen)?;
        Ok(Self::from_position(board, state, side_to_move))
    }

    pub fn with_move_generator(mut self, move_generator: MoveGenerator) -> Self {
        self.move_generator = move_generator;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    pub fn fen(&self) -> String {
        to_fen(&self.board, &self.state, self.side_to_move)
    }

    /// Destinations for the piece on `square`, empty unless it belongs to the
    /// side to move.
    pub fn legal_moves_from(&self, square: Square) -> Vec<Square> {
        match self.board.piece_at(square) {
            Some((_, color)) if color == self.side_to_move => {
                self.move_generator
                    .legal_moves(&self.board, square, Some(&self.state))
            }
            _ => Vec::new(),
        }
    }

    pub fn status(&self) -> GameStatus {
        if let Some(status) = self.concluded {
            return status;
        }
        self.move_generator
            .game_status(&self.board, &self.state, self.side_to_move, &self.history)
    }

    pub fn play(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Result<MoveRecord, ChessError> {
        if self.status().is_over() {
            return Err(ChessError::GameOver);
        }
        match self.board.piece_at(from) {
            None => return Err(ChessError::EmptySquare(from)),
            Some((_, color)) if color != self.side_to_move => {
                return Err(ChessError::WrongTurn(self.side_to_move))
            }
            Some(_) => {}
        }

        let mv = Move {
            from,
            to,
            promotion,
        };
        let (board, state) = self.move_generator.apply_move(&self.board, &self.state, mv)?;
        let record = self.record(&board, &state, mv);

        self.board = board;
        self.state = state;
        self.side_to_move = self.side_to_move.opposite();
        let key = self
            .move_generator
            .position_key(&self.board, &self.state, self.side_to_move);
        self.history.push(key);
        trace!("{:?} played {}", record.color, record.notation);

        let status = self.status();
        if status.is_over() {
            debug!("game over after {}: {:?}", record.notation, status);
        }
        self.moves.push(record.clone());
        Ok(record)
    }

    /// The engine's choice for the side to move, or `None` once the game is over.
    pub fn best_move(&self, search: &mut Search, difficulty: Difficulty) -> Option<ScoredMove> {
        if self.status().is_over() {
            return None;
        }
        search.find_best_move(&self.board, &self.state, self.side_to_move, difficulty)
    }

    pub fn play_best_move(
        &mut self,
        search: &mut Search,
        difficulty: Difficulty,
    ) -> Result<MoveRecord, ChessError> {
        let best = self
            .best_move(search, difficulty)
            .ok_or(ChessError::GameOver)?;
        self.play(best.mv.from, best.mv.to, best.mv.promotion)
    }

    pub fn resign(&mut self, color: Color) -> Result<GameStatus, ChessError> {
        self.conclude(GameStatus::Resigned {
            winner: color.opposite(),
        })
    }

    pub fn agree_draw(&mut self) -> Result<GameStatus, ChessError> {
        self.conclude(GameStatus::DrawAgreed)
    }

    fn conclude(&mut self, status: GameStatus) -> Result<GameStatus, ChessError> {
        if self.status().is_over() {
            return Err(ChessError::GameOver);
        }
        debug!("game concluded: {:?}", status);
        self.concluded = Some(status);
        Ok(status)
    }

    fn record(&self, board: &Board, state: &GameState, mv: Move) -> MoveRecord {
        let (piece, color) = match state.last_move {
            Some(last) => (last.piece, last.color),
            None => (Piece::Pawn, self.side_to_move),
        };
        let captured = state.last_move.and_then(|last| last.captured);
        let promotion = state.last_move.and_then(|last| last.mv.promotion);

        let is_castling =
            piece == Piece::King && (mv.to.col() as i8 - mv.from.col() as i8).abs() == 2;
        let is_en_passant = piece == Piece::Pawn
            && mv.from.col() != mv.to.col()
            && self.board.is_empty_at(mv.to);

        let opponent = color.opposite();
        let gives_check = self.move_generator.is_king_in_check(board, opponent);
        let is_checkmate = self.move_generator.is_checkmate_in(board, opponent, state);

        let mut record = MoveRecord {
            color,
            piece,
            from: mv.from,
            to: mv.to,
            captured,
            promotion,
            is_castling,
            is_en_passant,
            gives_check,
            is_checkmate,
            notation: String::new(),
        };
        record.notation = move_notation(&record);
        record
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn play(game: &mut Game, from: &str, to: &str) -> MoveRecord {
        game.play(sq(from), sq(to), None).unwrap()
    }

    #[test]
    fn test_turns_alternate() {
        let mut game = Game::new();
        assert_eq!(
            game.play(sq("e7"), sq("e5"), None),
            Err(ChessError::WrongTurn(Color::White))
        );
        play(&mut game, "e2", "e4");
        assert_eq!(game.side_to_move(), Color::Black);
        assert_eq!(
            game.play(sq("d2"), sq("d4"), None),
            Err(ChessError::WrongTurn(Color::Black))
        );
        assert_eq!(
            game.play(sq("e4"), sq("e4"), None),
            Err(ChessError::WrongTurn(Color::Black))
        );
    }

    #[test]
    fn test_rejects_illegal_and_empty() {
        let mut game = Game::new();
        assert_eq!(
            game.play(sq("e4"), sq("e5"), None),
            Err(ChessError::EmptySquare(sq("e4")))
        );
        assert_eq!(
            game.play(sq("e2"), sq("e5"), None),
            Err(ChessError::IllegalMove {
                from: sq("e2"),
                to: sq("e5")
            })
        );
        assert_eq!(game.board(), &Board::new());
        assert!(game.moves().is_empty());
    }

    #[test]
    fn test_legal_moves_from_only_for_side_to_move() {
        let game = Game::new();
        let mut knight = game.legal_moves_from(sq("g1"));
        knight.sort();
        assert_eq!(knight, vec![sq("f3"), sq("h3")]);
        assert!(game.legal_moves_from(sq("g8")).is_empty());
        assert!(game.legal_moves_from(sq("e4")).is_empty());
    }

    #[test]
    fn test_fools_mate_notation_and_status() {
        let mut game = Game::new();
        assert_eq!(play(&mut game, "f2", "f3").notation, "f3");
        assert_eq!(play(&mut game, "e7", "e5").notation, "e5");
        assert_eq!(play(&mut game, "g2", "g4").notation, "g4");
        let mate = play(&mut game, "d8", "h4");
        assert_eq!(mate.notation, "Qh4#");
        assert!(mate.is_checkmate);
        assert_eq!(
            game.status(),
            GameStatus::Checkmate {
                winner: Color::Black
            }
        );
        assert_eq!(
            game.play(sq("a2"), sq("a3"), None),
            Err(ChessError::GameOver)
        );
        assert_eq!(game.moves().len(), 4);
    }

    #[test]
    fn test_capture_and_check_notation() {
        let mut game = Game::new();
        play(&mut game, "e2", "e4");
        play(&mut game, "d7", "d5");
        let capture = play(&mut game, "e4", "d5");
        assert_eq!(capture.notation, "exd5");
        assert_eq!(capture.captured, Some(Piece::Pawn));
        play(&mut game, "e7", "e6");
        let check = play(&mut game, "f1", "b5");
        assert_eq!(check.notation, "Bb5+");
        assert_eq!(game.status(), GameStatus::Check);
    }

    #[test]
    fn test_castling_en_passant_and_promotion_records() {
        let mut game = Game::from_fen("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let castle = play(&mut game, "e1", "c1");
        assert!(castle.is_castling);
        assert_eq!(castle.notation, "O-O-O");

        let mut game = Game::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let ep = play(&mut game, "e5", "d6");
        assert!(ep.is_en_passant);
        assert_eq!(ep.captured, Some(Piece::Pawn));
        assert_eq!(ep.notation, "exd6");

        let mut game = Game::from_fen("8/1P2k3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let promo = game
            .play(sq("b7"), sq("b8"), Some(Piece::Knight))
            .unwrap();
        assert_eq!(promo.promotion, Some(Piece::Knight));
        assert_eq!(promo.notation, "b8=N");
        assert_eq!(
            game.board().piece_at(sq("b8")),
            Some((Piece::Knight, Color::White))
        );
    }

    #[test]
    fn test_invalid_promotion_choice() {
        let mut game = Game::from_fen("8/1P2k3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(
            game.play(sq("b7"), sq("b8"), Some(Piece::King)),
            Err(ChessError::InvalidPromotion(Piece::King))
        );
    }

    #[test]
    fn test_resign_and_draw() {
        let mut game = Game::new();
        assert_eq!(
            game.resign(Color::White),
            Ok(GameStatus::Resigned {
                winner: Color::Black
            })
        );
        assert_eq!(game.status().winner(), Some(Color::Black));
        assert_eq!(game.agree_draw(), Err(ChessError::GameOver));
        assert_eq!(
            game.play(sq("e2"), sq("e4"), None),
            Err(ChessError::GameOver)
        );

        let mut game = Game::new();
        assert_eq!(game.agree_draw(), Ok(GameStatus::DrawAgreed));
        assert!(game.status().is_draw());
    }

    #[test]
    fn test_threefold_repetition_by_knight_shuffle() {
        let mut game = Game::new();
        for _ in 0..2 {
            play(&mut game, "g1", "f3");
            play(&mut game, "g8", "f6");
            play(&mut game, "f3", "g1");
            play(&mut game, "f6", "g8");
        }
        assert_eq!(game.status(), GameStatus::ThreefoldRepetition);
        assert_eq!(game.fen(), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 8 5");
    }

    #[test]
    fn test_repetition_ignores_uncapturable_en_passant_target() {
        let mut game = Game::new();
        play(&mut game, "e2", "e4");
        for _ in 0..2 {
            play(&mut game, "g8", "f6");
            play(&mut game, "g1", "f3");
            play(&mut game, "f6", "g8");
            play(&mut game, "f3", "g1");
        }
        assert_eq!(game.status(), GameStatus::ThreefoldRepetition);
    }

    #[test]
    fn test_capturable_en_passant_target_keeps_positions_apart() {
        // After ...d5 the d6 capture is on, so the first position differs from
        // the later ones and two repeats are not enough.
        let mut game = Game::from_fen("4k1n1/3p4/8/4P3/8/8/8/4K1N1 b - - 0 1").unwrap();
        play(&mut game, "d7", "d5");
        for _ in 0..2 {
            play(&mut game, "g1", "f3");
            play(&mut game, "g8", "f6");
            play(&mut game, "f3", "g1");
            play(&mut game, "f6", "g8");
        }
        assert_eq!(game.status(), GameStatus::Ongoing);
        play(&mut game, "g1", "f3");
        assert_eq!(game.status(), GameStatus::ThreefoldRepetition);
    }

    #[test]
    fn test_huge_clocks_do_not_overflow() {
        let game = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 b - - 4294967295 4294967295").unwrap();
        assert_eq!(game.status(), GameStatus::FiftyMoveRule);

        let mut game = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 b - - 0 4294967295").unwrap();
        let record = play(&mut game, "e8", "d8");
        assert_eq!(record.notation, "Kd8");
        assert_eq!(game.state().fullmove_number, u32::MAX);
    }

    #[test]
    fn test_insufficient_material_after_capture() {
        let mut game = Game::from_fen("4k3/8/8/8/8/8/4q3/4K3 w - - 0 1").unwrap();
        let record = play(&mut game, "e1", "e2");
        assert_eq!(record.notation, "Kxe2");
        assert_eq!(game.status(), GameStatus::InsufficientMaterial);
    }

    #[test]
    fn test_strict_castling_game() {
        // The black rook on f8 covers f1, which the king would pass.
        let fen = "4kr2/8/8/8/8/8/8/4K2R w K - 0 1";
        let relaxed = Game::from_fen(fen).unwrap();
        assert!(relaxed.legal_moves_from(sq("e1")).contains(&sq("g1")));

        let strict = Game::from_fen(fen)
            .unwrap()
            .with_move_generator(MoveGenerator::with_strict_castling(true));
        assert!(!strict.legal_moves_from(sq("e1")).contains(&sq("g1")));
    }

    #[test]
    fn test_engine_plays_for_side_to_move() {
        let mut game = Game::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let mut search = Search::new();
        let record = game
            .play_best_move(&mut search, Difficulty::Medium)
            .unwrap();
        assert_eq!(record.notation, "Ra8#");
        assert!(game.best_move(&mut search, Difficulty::Medium).is_none());
        assert_eq!(
            game.play_best_move(&mut search, Difficulty::Easy),
            Err(ChessError::GameOver)
        );
    }
}
