//! Piece encoding (§3.1).
//!
//! Pieces are encoded 1..=12 with color in the low bit and type in the
//! upper bits: `(piece + 1) & 1` yields a white indicator, and
//! `(piece >> 1) - white_indicator` yields a 0..6 type index
//! (pawn..king). Piece `0` is the sentinel "none".

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 0..6 piece-type index, pawn..king, matching §3.1's derivation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PieceKind {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceKind {
    #[must_use]
    pub(crate) const fn from_index(idx: u8) -> Self {
        match idx {
            0 => PieceKind::Pawn,
            1 => PieceKind::Knight,
            2 => PieceKind::Bishop,
            3 => PieceKind::Rook,
            4 => PieceKind::Queen,
            _ => PieceKind::King,
        }
    }

    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn to_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

/// A packed `(color, type)` piece code, 1..=12, with `0` meaning "no
/// piece" (§3.1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Piece(pub(crate) u8);

impl Piece {
    pub const NONE: Piece = Piece(0);

    #[inline]
    #[must_use]
    pub const fn new(is_white: bool, kind: PieceKind) -> Self {
        let type_idx = kind as u8;
        Piece(2 * type_idx + if is_white { 2 } else { 1 })
    }

    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        Piece(code)
    }

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// `(piece + 1) & 1` — 1 when white, 0 when black. Meaningless for
    /// `NONE`.
    #[inline]
    #[must_use]
    pub(crate) const fn white_indicator(self) -> u8 {
        (self.0 + 1) & 1
    }

    #[inline]
    #[must_use]
    pub const fn is_white(self) -> bool {
        self.white_indicator() == 1
    }

    #[inline]
    #[must_use]
    pub const fn kind(self) -> PieceKind {
        let idx = (self.0 >> 1) - self.white_indicator();
        PieceKind::from_index(idx)
    }

    #[must_use]
    pub fn to_fen_char(self) -> char {
        let c = self.kind().to_char();
        if self.is_white() {
            c.to_ascii_uppercase()
        } else {
            c
        }
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "Piece::NONE")
        } else {
            write!(f, "Piece({})", self.to_fen_char())
        }
    }
}
