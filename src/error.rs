//! Error types shared across the board and parsing layers.

use std::fmt;

/// Failure modes for FEN parsing (§6, §7 "Malformed FEN").
///
/// A failed parse never mutates the caller's existing position; the
/// caller simply discards the `Err` and keeps whatever `BoardState` it
/// already had.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    /// Fewer than four whitespace-separated fields were supplied.
    TooFewParts { found: usize },
    /// A rank in the board field named too many or too few files.
    BadRankWidth { rank: usize, files: usize },
    /// A character in the board field wasn't a piece letter or digit.
    InvalidPiece { ch: char },
    /// The side-to-move field wasn't `w` or `b`.
    InvalidSideToMove { found: String },
    /// A castling-rights character wasn't one of `KQkq` or `-`.
    InvalidCastling { ch: char },
    /// The en-passant field wasn't `-` or a valid square.
    InvalidEnPassant { found: String },
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::TooFewParts { found } => {
                write!(f, "FEN must have at least 4 fields, found {found}")
            }
            FenError::BadRankWidth { rank, files } => {
                write!(f, "rank {rank} names {files} files, expected 8")
            }
            FenError::InvalidPiece { ch } => write!(f, "invalid piece character '{ch}' in FEN"),
            FenError::InvalidSideToMove { found } => {
                write!(f, "invalid side to move '{found}', expected 'w' or 'b'")
            }
            FenError::InvalidCastling { ch } => {
                write!(f, "invalid castling character '{ch}' in FEN")
            }
            FenError::InvalidEnPassant { found } => {
                write!(f, "invalid en passant square '{found}' in FEN")
            }
        }
    }
}

impl std::error::Error for FenError {}

/// Failure modes for parsing a square from algebraic notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    InvalidNotation { notation: String },
}

impl fmt::Display for SquareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquareError::InvalidNotation { notation } => {
                write!(f, "invalid square notation '{notation}'")
            }
        }
    }
}

impl std::error::Error for SquareError {}
