//! Zobrist hashing tables (§4.3, component B).
//!
//! Hashes are incrementally maintained by `board::apply`; a full
//! recomputation (used after FEN load, and in tests as the invariant-3
//! oracle) walks every set bit of every piece bitboard plus castling
//! bits, en-passant file, and side to move.

use once_cell::sync::Lazy;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::board::types::{Piece, PieceKind, Square, CASTLE_ALL};

/// "No en-passant file" sentinel used in the differential index (§3.2,
/// §4.3).
pub const NO_EP_FILE: u8 = 8;

pub struct ZobristTables {
    /// One key per `(piece code 1..=12, square)`; index 0 is unused.
    piece_square: [[u64; 64]; 13],
    pub side_to_move: u64,
    /// One key per en-passant file, 0..8.
    en_passant_file: [u64; 8],
    /// `deltaEnpassant[oldFile*9 + newFile]` XORs old file off and new
    /// file on in a single lookup (§4.3).
    delta_en_passant: [u64; 81],
    /// `deltaCastleRights[oldMask ^ newMask]`, 16 entries (§4.3).
    delta_castle_rights: [u64; 16],
    /// Combined king+rook travel key per castling side: `[WK, WQ, BK, BQ]`.
    pub castle_combined: [u64; 4],
}

impl ZobristTables {
    fn generate() -> Self {
        let mut rng = StdRng::seed_from_u64(0x5A6B_0721_1988_u64);

        let mut piece_square = [[0u64; 64]; 13];
        for row in piece_square.iter_mut().skip(1) {
            for key in row.iter_mut() {
                *key = rng.gen();
            }
        }

        let side_to_move = rng.gen();

        let mut en_passant_file = [0u64; 8];
        for key in &mut en_passant_file {
            *key = rng.gen();
        }

        let mut delta_en_passant = [0u64; 81];
        for old in 0..9usize {
            for new in 0..9usize {
                let old_key = if old < 8 { en_passant_file[old] } else { 0 };
                let new_key = if new < 8 { en_passant_file[new] } else { 0 };
                delta_en_passant[old * 9 + new] = old_key ^ new_key;
            }
        }

        let mut castle_right_bit = [0u64; 4];
        for key in &mut castle_right_bit {
            *key = rng.gen();
        }

        let mut delta_castle_rights = [0u64; 16];
        for (mask, slot) in delta_castle_rights.iter_mut().enumerate() {
            let mut key = 0u64;
            for (bit, right_key) in castle_right_bit.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    key ^= right_key;
                }
            }
            *slot = key;
        }

        // `[WK, WQ, BK, BQ]`: XOR of the king's and rook's piece-square
        // keys at their home and destination squares, so that applying it
        // reproduces exactly what a full recomputation would see after the
        // king and rook bitboards move.
        let travel_key = |king: (u8, u8), rook: (u8, u8), white: bool| -> u64 {
            let king_code = Piece::new(white, PieceKind::King).code() as usize;
            let rook_code = Piece::new(white, PieceKind::Rook).code() as usize;
            piece_square[king_code][king.0 as usize]
                ^ piece_square[king_code][king.1 as usize]
                ^ piece_square[rook_code][rook.0 as usize]
                ^ piece_square[rook_code][rook.1 as usize]
        };
        let castle_combined = [
            travel_key((4, 6), (7, 5), true),
            travel_key((4, 2), (0, 3), true),
            travel_key((60, 62), (63, 61), false),
            travel_key((60, 58), (56, 59), false),
        ];

        ZobristTables {
            piece_square,
            side_to_move,
            en_passant_file,
            delta_en_passant,
            delta_castle_rights,
            castle_combined,
        }
    }

    #[inline]
    #[must_use]
    pub fn piece_square_key(&self, piece: Piece, sq: Square) -> u64 {
        debug_assert!(!piece.is_none());
        self.piece_square[piece.code() as usize][sq.index()]
    }

    #[inline]
    #[must_use]
    pub fn en_passant_key(&self, file: u8) -> u64 {
        if file >= 8 {
            0
        } else {
            self.en_passant_file[file as usize]
        }
    }

    /// XOR to turn off `old_file`'s en-passant key and turn on
    /// `new_file`'s, where either side may be `NO_EP_FILE` (8).
    #[inline]
    #[must_use]
    pub fn delta_en_passant(&self, old_file: u8, new_file: u8) -> u64 {
        self.delta_en_passant[old_file as usize * 9 + new_file as usize]
    }

    /// XOR delta between two castling-rights bitmasks.
    #[inline]
    #[must_use]
    pub fn delta_castle_rights(&self, old_mask: u8, new_mask: u8) -> u64 {
        debug_assert!(old_mask <= CASTLE_ALL && new_mask <= CASTLE_ALL);
        self.delta_castle_rights[(old_mask ^ new_mask) as usize]
    }

    /// Full recomputation from a raw position description, used by FEN
    /// loading and as the invariant-3/4 test oracle.
    #[must_use]
    pub fn recompute(
        &self,
        pieces: impl Iterator<Item = (Square, Piece)>,
        white_to_move: bool,
        castle_rights: u8,
        en_passant_file: u8,
    ) -> u64 {
        let mut hash = 0u64;
        for (sq, piece) in pieces {
            hash ^= self.piece_square_key(piece, sq);
        }
        if !white_to_move {
            hash ^= self.side_to_move;
        }
        hash ^= self.delta_castle_rights(0, castle_rights);
        hash ^= self.en_passant_key(en_passant_file);
        hash
    }
}

pub static ZOBRIST: Lazy<ZobristTables> = Lazy::new(ZobristTables::generate);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::types::PieceKind;

    #[test]
    fn delta_en_passant_is_self_inverse() {
        let z = &*ZOBRIST;
        let a = z.delta_en_passant(NO_EP_FILE, 3);
        let b = z.delta_en_passant(3, NO_EP_FILE);
        assert_eq!(a, b, "toggling file 3 on then off returns the same XOR");
    }

    #[test]
    fn delta_castle_rights_self_inverse_roundtrip() {
        let z = &*ZOBRIST;
        let delta = z.delta_castle_rights(CASTLE_ALL, 0);
        let hash = delta ^ z.delta_castle_rights(0, CASTLE_ALL);
        assert_eq!(hash, 0);
    }

    #[test]
    fn piece_square_keys_are_distinct() {
        let z = &*ZOBRIST;
        let a = z.piece_square_key(Piece::new(true, PieceKind::Pawn), Square::new(0));
        let b = z.piece_square_key(Piece::new(true, PieceKind::Pawn), Square::new(1));
        assert_ne!(a, b);
    }
}
