//! FEN parsing collaborator (§6).
//!
//! Parses six whitespace-separated fields; missing tail fields default
//! to half-move clock `0` and full-move number `1`. A failed parse never
//! touches the caller's existing position.

use crate::board::movegen::is_square_attacked;
use crate::board::state::BoardState;
use crate::board::types::{castle_bits, Piece, PieceKind, Square, CASTLE_ALL};
use crate::error::FenError;

pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN string into a fully populated [`BoardState`] with hashes
/// computed and `inCheck` set.
pub fn parse_fen(fen: &str) -> Result<BoardState, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(FenError::TooFewParts { found: parts.len() });
    }

    let mut board = BoardState::empty();
    for (rank_from_top, rank_str) in parts[0].split('/').enumerate() {
        if rank_from_top >= 8 {
            return Err(FenError::BadRankWidth {
                rank: rank_from_top,
                files: 9,
            });
        }
        let rank = 7 - rank_from_top as u8;
        let mut file = 0u8;
        for c in rank_str.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as u8;
            } else {
                if file >= 8 {
                    return Err(FenError::BadRankWidth {
                        rank: rank_from_top,
                        files: file as usize + 1,
                    });
                }
                let is_white = c.is_ascii_uppercase();
                let kind = PieceKind::from_char(c).ok_or(FenError::InvalidPiece { ch: c })?;
                board.place_piece(Square::from_file_rank(file, rank), Piece::new(is_white, kind));
                file += 1;
            }
        }
        if file != 8 {
            return Err(FenError::BadRankWidth {
                rank: rank_from_top,
                files: file as usize,
            });
        }
    }

    let white_to_move = match parts[1] {
        "w" => true,
        "b" => false,
        other => {
            return Err(FenError::InvalidSideToMove {
                found: other.to_string(),
            })
        }
    };
    board.set_side_to_move(white_to_move);

    let mut castle_rights = 0u8;
    if parts[2] != "-" {
        for c in parts[2].chars() {
            let (king_bit, queen_bit) = castle_bits(c.is_ascii_uppercase());
            match c {
                'K' | 'k' => castle_rights |= king_bit,
                'Q' | 'q' => castle_rights |= queen_bit,
                _ => return Err(FenError::InvalidCastling { ch: c }),
            }
        }
    }
    debug_assert!(castle_rights <= CASTLE_ALL);
    board.set_castle_rights(castle_rights);

    let en_passant_file = if parts[3] == "-" {
        8
    } else {
        let sq: Square = parts[3]
            .parse()
            .map_err(|_| FenError::InvalidEnPassant {
                found: parts[3].to_string(),
            })?;
        sq.file()
    };
    board.set_en_passant_file(en_passant_file);

    if let Some(half_move) = parts.get(4) {
        board.set_half_move_clock(half_move.parse().unwrap_or(0));
    }
    if let Some(turn) = parts.get(5) {
        board.set_turn_count(turn.parse().unwrap_or(1));
    }

    let in_check = is_square_attacked(&board, board.king_square(white_to_move), !white_to_move);
    board.finish_setup(in_check);
    Ok(board)
}

/// Render a [`BoardState`] back to FEN notation.
#[must_use]
pub fn to_fen(board: &BoardState) -> String {
    let mut ranks = Vec::with_capacity(8);
    for rank in (0..8u8).rev() {
        let mut row = String::new();
        let mut empty = 0u8;
        for file in 0..8u8 {
            let sq = Square::from_file_rank(file, rank);
            let piece = board.piece_at(sq);
            if piece.is_none() {
                empty += 1;
            } else {
                if empty > 0 {
                    row.push_str(&empty.to_string());
                    empty = 0;
                }
                row.push(piece.to_fen_char());
            }
        }
        if empty > 0 {
            row.push_str(&empty.to_string());
        }
        ranks.push(row);
    }

    let active = if board.white_to_move() { "w" } else { "b" };
    let mut castling = String::new();
    if board.castle_rights() & crate::board::types::CASTLE_WHITE_KING != 0 {
        castling.push('K');
    }
    if board.castle_rights() & crate::board::types::CASTLE_WHITE_QUEEN != 0 {
        castling.push('Q');
    }
    if board.castle_rights() & crate::board::types::CASTLE_BLACK_KING != 0 {
        castling.push('k');
    }
    if board.castle_rights() & crate::board::types::CASTLE_BLACK_QUEEN != 0 {
        castling.push('q');
    }
    if castling.is_empty() {
        castling.push('-');
    }

    let ep = if board.en_passant_file() >= 8 {
        "-".to_string()
    } else {
        let rank = if board.white_to_move() { 5 } else { 2 };
        Square::from_file_rank(board.en_passant_file(), rank).to_string()
    };

    format!(
        "{} {} {} {} {} {}",
        ranks.join("/"),
        active,
        castling,
        ep,
        board.half_move_clock(),
        board.turn_count()
    )
}
