pub mod board;
pub mod error;
pub mod evaluation;
pub mod game;
pub mod movegen;
pub mod notation;
pub mod search;

pub use board::{Board, CastleSides, CastlingRights, Color, GameState, Piece, Square};
pub use error::ChessError;
pub use evaluation::Evaluator;
pub use game::{Game, MoveRecord};
pub use movegen::{GameStatus, Move, MoveGenerator};
pub use search::{Difficulty, ScoredMove, Search, SearchConfig};
