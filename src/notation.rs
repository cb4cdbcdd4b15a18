//! Text forms: square names, move notation and FEN.

use std::fmt;
use std::str::FromStr;

use crate::board::{Board, CastleSides, CastlingRights, Color, GameState, Piece, Square};
use crate::error::ChessError;
use crate::game::MoveRecord;

const FILES: &[u8; 8] = b"abcdefgh";

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let file = FILES[self.col() as usize] as char;
        let rank = 8 - self.row();
        write!(f, "{}{}", file, rank)
    }
}

impl FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ChessError::InvalidSquare(s.to_string());
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(invalid());
        }
        let col = match bytes[0].to_ascii_lowercase() {
            b @ b'a'..=b'h' => b - b'a',
            _ => return Err(invalid()),
        };
        let row = match bytes[1] {
            b @ b'1'..=b'8' => b'8' - b,
            _ => return Err(invalid()),
        };
        Ok(Square::new(row, col))
    }
}

/// Upper-case letter used for `piece` in notation; pawns have none.
pub fn piece_letter(piece: Piece) -> Option<char> {
    match piece {
        Piece::Pawn => None,
        Piece::Knight => Some('N'),
        Piece::Bishop => Some('B'),
        Piece::Rook => Some('R'),
        Piece::Queen => Some('Q'),
        Piece::King => Some('K'),
    }
}

fn fen_char(piece: Piece, color: Color) -> char {
    let c = piece_letter(piece).unwrap_or('P');
    match color {
        Color::White => c,
        Color::Black => c.to_ascii_lowercase(),
    }
}

/// Renders an executed move, e.g. `e4`, `Nf3`, `exd5`, `Qxf7#`, `O-O`, `e8=Q+`.
pub fn move_notation(record: &MoveRecord) -> String {
    let mut notation = String::new();

    if record.is_castling {
        notation.push_str(if record.to.col() > record.from.col() {
            "O-O"
        } else {
            "O-O-O"
        });
    } else {
        if let Some(letter) = piece_letter(record.piece) {
            notation.push(letter);
        }
        if record.captured.is_some() {
            if record.piece == Piece::Pawn {
                notation.push(FILES[record.from.col() as usize] as char);
            }
            notation.push('x');
        }
        notation.push_str(&record.to.to_string());
        if let Some(letter) = record.promotion.and_then(piece_letter) {
            notation.push('=');
            notation.push(letter);
        }
    }

    if record.is_checkmate {
        notation.push('#');
    } else if record.gives_check {
        notation.push('+');
    }
    notation
}

/// Parses a FEN string into a board, its game state and the side to move.
/// The clock fields may be omitted.
pub fn parse_fen(fen: &str) -> Result<(Board, GameState, Color), ChessError> {
    let invalid = |why: &str| ChessError::InvalidFen(format!("{why} in '{fen}'"));
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(invalid("expected at least 4 fields"));
    }

    let mut board = Board::empty();
    let ranks: Vec<&str> = fields[0].split('/').collect();
    if ranks.len() != 8 {
        return Err(invalid("expected 8 ranks"));
    }
    for (row, rank) in ranks.iter().enumerate() {
        let mut col = 0u8;
        for c in rank.chars() {
            if let Some(skip) = c.to_digit(10) {
                if !(1..=8).contains(&skip) {
                    return Err(invalid("bad empty-square count"));
                }
                col = col.saturating_add(skip as u8);
                continue;
            }
            let piece = match c.to_ascii_lowercase() {
                'p' => Piece::Pawn,
                'n' => Piece::Knight,
                'b' => Piece::Bishop,
                'r' => Piece::Rook,
                'q' => Piece::Queen,
                'k' => Piece::King,
                _ => return Err(invalid("unknown piece")),
            };
            let color = if c.is_ascii_uppercase() {
                Color::White
            } else {
                Color::Black
            };
            if col >= 8 {
                return Err(invalid("rank too long"));
            }
            board = board.with_piece(Square::new(row as u8, col), piece, color);
            col += 1;
        }
        if col != 8 {
            return Err(invalid("rank has the wrong length"));
        }
    }

    let side = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        _ => return Err(invalid("bad side to move")),
    };

    let mut castling_rights = CastlingRights::none();
    if fields[2] != "-" {
        for c in fields[2].chars() {
            match c {
                'K' => castling_rights.white.kingside = true,
                'Q' => castling_rights.white.queenside = true,
                'k' => castling_rights.black.kingside = true,
                'q' => castling_rights.black.queenside = true,
                _ => return Err(invalid("bad castling field")),
            }
        }
    }

    let en_passant_target = match fields[3] {
        "-" => None,
        square => Some(
            square
                .parse::<Square>()
                .map_err(|_| invalid("bad en passant square"))?,
        ),
    };

    let halfmove_clock = match fields.get(4) {
        Some(n) => n.parse().map_err(|_| invalid("bad halfmove clock"))?,
        None => 0,
    };
    let fullmove_number = match fields.get(5) {
        Some(n) => n.parse().map_err(|_| invalid("bad fullmove number"))?,
        None => 1,
    };

    let state = GameState {
        en_passant_target,
        castling_rights,
        halfmove_clock,
        fullmove_number,
        last_move: None,
    };
    Ok((board, state, side))
}

pub fn to_fen(board: &Board, state: &GameState, side_to_move: Color) -> String {
    let mut fen = String::new();
    for row in 0..8 {
        let mut empty = 0;
        for col in 0..8 {
            match board.piece_at(Square::new(row, col)) {
                Some((piece, color)) => {
                    if empty > 0 {
                        fen.push_str(&empty.to_string());
                        empty = 0;
                    }
                    fen.push(fen_char(piece, color));
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

    fen.push(' ');
    fen.push(match side_to_move {
        Color::White => 'w',
        Color::Black => 'b',
    });

    fen.push(' ');
    let rights = &state.castling_rights;
    let mut castling = String::new();
    for (sides, kingside, queenside) in [(rights.white, 'K', 'Q'), (rights.black, 'k', 'q')] {
        let CastleSides {
            kingside: k,
            queenside: q,
        } = sides;
        if k {
            castling.push(kingside);
        }
        if q {
            castling.push(queenside);
        }
    }
    if castling.is_empty() {
        castling.push('-');
    }
    fen.push_str(&castling);

    fen.push(' ');
    match state.en_passant_target {
        Some(square) => fen.push_str(&square.to_string()),
        None => fen.push('-'),
    }

    fen.push_str(&format!(
        " {} {}",
        state.halfmove_clock, state.fullmove_number
    ));
    fen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::Move;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_square_names() {
        assert_eq!(Square::new(0, 0).to_string(), "a8");
        assert_eq!(Square::new(7, 7).to_string(), "h1");
        assert_eq!(Square::new(4, 4).to_string(), "e4");
        assert_eq!("e4".parse::<Square>().unwrap(), Square::new(4, 4));
        assert_eq!("A1".parse::<Square>().unwrap(), Square::new(7, 0));
    }

    #[test]
    fn test_bad_square_names() {
        for name in ["", "e", "e9", "i1", "e44", "11"] {
            assert_eq!(
                name.parse::<Square>(),
                Err(ChessError::InvalidSquare(name.to_string()))
            );
        }
    }

    #[test]
    fn test_start_position_fen() {
        let (board, state, side) = parse_fen(START_FEN).unwrap();
        assert_eq!(board, Board::new());
        assert_eq!(state, GameState::new());
        assert_eq!(side, Color::White);
        assert_eq!(to_fen(&board, &state, side), START_FEN);
    }

    #[test]
    fn test_fen_after_move() {
        let e2: Square = "e2".parse().unwrap();
        let e4: Square = "e4".parse().unwrap();
        let (board, state) = Board::new().make_move(&GameState::new(), Move::new(e2, e4));
        assert_eq!(
            to_fen(&board, &state, Color::Black),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
    }

    #[test]
    fn test_fen_without_clocks() {
        let (_, state, side) = parse_fen("4k3/8/8/8/8/8/8/4K3 b - -").unwrap();
        assert_eq!(side, Color::Black);
        assert_eq!(state.castling_rights, CastlingRights::none());
        assert_eq!(state.halfmove_clock, 0);
        assert_eq!(state.fullmove_number, 1);
    }

    #[test]
    fn test_invalid_fen() {
        for fen in [
            "",
            "8/8/8/8/8/8/8 w - -",
            "9/8/8/8/8/8/8/8 w - -",
            "4k3/8/8/8/08/8/8/4K3 w - -",
            "4k3/8/8/8/404/8/8/4K3 w - -",
            "4k3/8/8/8/8/8/8/4K3 x - -",
            "4k3/8/8/8/8/8/8/4X3 w - -",
            "4k3/8/8/8/8/8/8/4K3 w Z -",
            "4k3/8/8/8/8/8/8/4K3 w - z9",
        ] {
            assert!(matches!(parse_fen(fen), Err(ChessError::InvalidFen(_))), "{fen}");
        }
    }
}
