use thiserror::Error;

use crate::board::{Color, Piece, Square};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChessError {
    #[error("'{0}' is not a square on the board")]
    InvalidSquare(String),

    #[error("there is no piece on {0}")]
    EmptySquare(Square),

    #[error("{from}{to} is not a legal move")]
    IllegalMove { from: Square, to: Square },

    #[error("a pawn cannot promote to a {0:?}")]
    InvalidPromotion(Piece),

    #[error("it is {0:?}'s turn to move")]
    WrongTurn(Color),

    #[error("the game is already over")]
    GameOver,

    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("unknown difficulty '{0}', expected easy, medium or hard")]
    InvalidDifficulty(String),
}
