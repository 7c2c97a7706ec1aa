//! `BoardState`: bitboard position plus incremental hashes (§3.2).

use crate::board::types::{Bitboard, Piece, PieceKind, Square, CASTLE_ALL};
use crate::zobrist::{NO_EP_FILE, ZOBRIST};

/// Bitboard position, derived occupancies, and the four incrementally
/// maintained Zobrist hashes.
///
/// Mutated only through [`crate::board::apply::partial_apply_white`] /
/// `partial_apply_black` followed by `finish_apply_white` /
/// `finish_apply_black` (or [`BoardState::apply_null_move`]); everything
/// else is read-only derived state.
#[derive(Clone, Debug)]
pub struct BoardState {
    /// Indexed by piece code, `1..=12`; index `0` is unused.
    piece_bb: [Bitboard; 13],
    white_pieces: Bitboard,
    black_pieces: Bitboard,
    all_pieces: Bitboard,
    white_king_square: Square,
    black_king_square: Square,
    castle_rights: u8,
    /// `0..8` if legal en passant is possible, `8` ("none") otherwise.
    en_passant_file: u8,
    white_to_move: bool,
    in_check: bool,
    half_move_clock: u8,
    turn_count: u32,
    piece_count: u32,
    hash: u64,
    pawn_hash: u64,
    white_material_hash: u64,
    black_material_hash: u64,
}

impl BoardState {
    /// An empty board: no pieces, white to move, no castling rights, no
    /// en passant. Callers build a real position on top of this via
    /// [`BoardState::place_piece`] followed by [`BoardState::finish_setup`],
    /// which is how `board::fen` constructs positions.
    #[must_use]
    pub fn empty() -> Self {
        BoardState {
            piece_bb: [Bitboard::EMPTY; 13],
            white_pieces: Bitboard::EMPTY,
            black_pieces: Bitboard::EMPTY,
            all_pieces: Bitboard::EMPTY,
            white_king_square: Square::new(0),
            black_king_square: Square::new(0),
            castle_rights: 0,
            en_passant_file: NO_EP_FILE,
            white_to_move: true,
            in_check: false,
            half_move_clock: 0,
            turn_count: 1,
            piece_count: 0,
            hash: 0,
            pawn_hash: 0,
            white_material_hash: 0,
            black_material_hash: 0,
        }
    }

    /// Place a piece on an otherwise-untouched square during setup
    /// (FEN parsing or the standard starting position). Does not update
    /// hashes; call [`BoardState::finish_setup`] once all pieces, side to
    /// move, castling rights, and en-passant file are in place.
    pub fn place_piece(&mut self, sq: Square, piece: Piece) {
        debug_assert!(!piece.is_none());
        self.piece_bb[piece.code() as usize].set(sq);
        if piece.is_white() {
            self.white_pieces.set(sq);
        } else {
            self.black_pieces.set(sq);
        }
        self.all_pieces.set(sq);
        if piece.kind() == PieceKind::King {
            if piece.is_white() {
                self.white_king_square = sq;
            } else {
                self.black_king_square = sq;
            }
        }
        self.piece_count += 1;
    }

    pub fn set_side_to_move(&mut self, white_to_move: bool) {
        self.white_to_move = white_to_move;
    }

    #[inline]
    pub(crate) fn flip_side_to_move(&mut self) {
        self.white_to_move = !self.white_to_move;
    }

    pub fn set_castle_rights(&mut self, rights: u8) {
        debug_assert!(rights <= CASTLE_ALL);
        self.castle_rights = rights;
    }

    pub fn set_en_passant_file(&mut self, file: u8) {
        self.en_passant_file = file;
    }

    pub fn set_half_move_clock(&mut self, clock: u8) {
        self.half_move_clock = clock;
    }

    pub fn set_turn_count(&mut self, turn_count: u32) {
        self.turn_count = turn_count;
    }

    /// Recompute all four hashes from the current piece layout and flip
    /// `inCheck` via the supplied probe. Called once setup is complete
    /// (§4.3 "full recomputation... used after FEN load").
    pub fn finish_setup(&mut self, in_check: bool) {
        self.hash = self.recompute_hash();
        self.pawn_hash = self.recompute_pawn_hash();
        self.white_material_hash = self.recompute_material_hash(true);
        self.black_material_hash = self.recompute_material_hash(false);
        self.in_check = in_check;
    }

    fn all_placed_pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        (1u8..=12).flat_map(move |code| {
            let piece = Piece::from_code(code);
            self.piece_bb[code as usize].iter().map(move |sq| (sq, piece))
        })
    }

    fn recompute_hash(&self) -> u64 {
        ZOBRIST.recompute(
            self.all_placed_pieces(),
            self.white_to_move,
            self.castle_rights,
            self.en_passant_file,
        )
    }

    fn recompute_pawn_hash(&self) -> u64 {
        let mut hash = 0u64;
        for (sq, piece) in self.all_placed_pieces() {
            if piece.kind() == PieceKind::Pawn {
                hash ^= ZOBRIST.piece_square_key(piece, sq);
            }
        }
        hash
    }

    fn recompute_material_hash(&self, white: bool) -> u64 {
        let mut hash = 0u64;
        for (sq, piece) in self.all_placed_pieces() {
            if piece.kind() != PieceKind::Pawn && piece.kind() != PieceKind::King && piece.is_white() == white {
                hash ^= ZOBRIST.piece_square_key(piece, sq);
            }
        }
        hash
    }

    #[inline]
    #[must_use]
    pub fn piece_bb(&self, code: u8) -> Bitboard {
        self.piece_bb[code as usize]
    }

    #[inline]
    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Piece {
        for code in 1u8..=12 {
            if self.piece_bb[code as usize].has(sq) {
                return Piece::from_code(code);
            }
        }
        Piece::NONE
    }

    #[inline]
    #[must_use]
    pub fn white_pieces(&self) -> Bitboard {
        self.white_pieces
    }

    #[inline]
    #[must_use]
    pub fn black_pieces(&self) -> Bitboard {
        self.black_pieces
    }

    #[inline]
    #[must_use]
    pub fn all_pieces(&self) -> Bitboard {
        self.all_pieces
    }

    #[inline]
    #[must_use]
    pub fn occupied_by(&self, white: bool) -> Bitboard {
        if white {
            self.white_pieces
        } else {
            self.black_pieces
        }
    }

    #[inline]
    pub(crate) fn piece_bb_mut(&mut self, code: u8) -> &mut Bitboard {
        &mut self.piece_bb[code as usize]
    }

    #[inline]
    pub(crate) fn color_bb_mut(&mut self, white: bool) -> &mut Bitboard {
        if white {
            &mut self.white_pieces
        } else {
            &mut self.black_pieces
        }
    }

    #[inline]
    pub(crate) fn recompute_all_pieces(&mut self) {
        self.all_pieces = self.white_pieces | self.black_pieces;
    }

    #[inline]
    pub(crate) fn set_king_square(&mut self, white: bool, sq: Square) {
        if white {
            self.white_king_square = sq;
        } else {
            self.black_king_square = sq;
        }
    }

    #[inline]
    pub(crate) fn decrement_piece_count(&mut self) {
        self.piece_count -= 1;
    }

    #[inline]
    pub(crate) fn xor_hash(&mut self, delta: u64) {
        self.hash ^= delta;
    }

    #[inline]
    pub(crate) fn xor_pawn_hash(&mut self, delta: u64) {
        self.pawn_hash ^= delta;
    }

    #[inline]
    pub(crate) fn xor_material_hash(&mut self, white: bool, delta: u64) {
        if white {
            self.white_material_hash ^= delta;
        } else {
            self.black_material_hash ^= delta;
        }
    }

    #[inline]
    pub(crate) fn set_in_check(&mut self, in_check: bool) {
        self.in_check = in_check;
    }

    #[inline]
    pub(crate) fn increment_turn_count(&mut self) {
        self.turn_count += 1;
    }

    #[inline]
    #[must_use]
    pub fn king_square(&self, white: bool) -> Square {
        if white {
            self.white_king_square
        } else {
            self.black_king_square
        }
    }

    #[inline]
    #[must_use]
    pub fn castle_rights(&self) -> u8 {
        self.castle_rights
    }

    #[inline]
    #[must_use]
    pub fn en_passant_file(&self) -> u8 {
        self.en_passant_file
    }

    #[inline]
    #[must_use]
    pub fn white_to_move(&self) -> bool {
        self.white_to_move
    }

    #[inline]
    #[must_use]
    pub fn in_check(&self) -> bool {
        self.in_check
    }

    #[inline]
    #[must_use]
    pub fn half_move_clock(&self) -> u8 {
        self.half_move_clock
    }

    #[inline]
    #[must_use]
    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    #[inline]
    #[must_use]
    pub fn piece_count(&self) -> u32 {
        self.piece_count
    }

    #[inline]
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    #[must_use]
    pub fn pawn_hash(&self) -> u64 {
        self.pawn_hash
    }

    #[inline]
    #[must_use]
    pub fn white_material_hash(&self) -> u64 {
        self.white_material_hash
    }

    #[inline]
    #[must_use]
    pub fn black_material_hash(&self) -> u64 {
        self.black_material_hash
    }

    /// Full from-scratch hash recomputation, used by invariant-3 tests
    /// as the oracle against the incrementally maintained `hash` field.
    #[must_use]
    pub fn recompute_hash_from_scratch(&self) -> u64 {
        self.recompute_hash()
    }

    /// Full from-scratch pawn-hash recomputation, the oracle against the
    /// incrementally maintained `pawn_hash` field.
    #[must_use]
    pub fn recompute_pawn_hash_from_scratch(&self) -> u64 {
        self.recompute_pawn_hash()
    }

    /// Full from-scratch per-color material-hash recomputation, the
    /// oracle against the incrementally maintained
    /// `white_material_hash`/`black_material_hash` fields.
    #[must_use]
    pub fn recompute_material_hash_from_scratch(&self, white: bool) -> u64 {
        self.recompute_material_hash(white)
    }

    /// Standard chess starting position.
    #[must_use]
    pub fn startpos() -> Self {
        crate::board::fen::parse_fen(crate::board::fen::STARTPOS_FEN)
            .expect("startpos FEN is well-formed")
    }

    /// `king + <=2 knights vs king` or `king + <=1 minor vs king + <=1 minor`,
    /// with no pawns, rooks, or queens on the board (§6).
    #[must_use]
    pub fn insufficient_mating_material(&self) -> bool {
        let pawns = self.piece_bb(Piece::new(true, PieceKind::Pawn).code())
            | self.piece_bb(Piece::new(false, PieceKind::Pawn).code());
        let rooks = self.piece_bb(Piece::new(true, PieceKind::Rook).code())
            | self.piece_bb(Piece::new(false, PieceKind::Rook).code());
        let queens = self.piece_bb(Piece::new(true, PieceKind::Queen).code())
            | self.piece_bb(Piece::new(false, PieceKind::Queen).code());
        if !pawns.is_empty() || !rooks.is_empty() || !queens.is_empty() {
            return false;
        }

        let white_knights = self.piece_bb(Piece::new(true, PieceKind::Knight).code()).popcount();
        let black_knights = self.piece_bb(Piece::new(false, PieceKind::Knight).code()).popcount();
        let white_bishops = self.piece_bb(Piece::new(true, PieceKind::Bishop).code()).popcount();
        let black_bishops = self.piece_bb(Piece::new(false, PieceKind::Bishop).code()).popcount();

        let white_minors = white_knights + white_bishops;
        let black_minors = black_knights + black_bishops;

        if white_bishops == 0 && black_bishops == 0 {
            // king + <=2 knights vs king
            return (white_minors == 0 && black_knights <= 2)
                || (black_minors == 0 && white_knights <= 2);
        }

        white_minors <= 1 && black_minors <= 1
    }

    /// Flip side to move, XOR the side-to-move key, clear any live
    /// en-passant file, and reset the half-move clock, per `applyNullMove`
    /// (§4.2 "Null move"). The caller (search) is responsible for undoing
    /// this; `inCheck` is set to `false`.
    pub fn apply_null_move(&mut self) {
        self.hash ^= ZOBRIST.side_to_move;
        self.hash ^= ZOBRIST.delta_en_passant(self.en_passant_file, NO_EP_FILE);
        self.en_passant_file = NO_EP_FILE;
        self.white_to_move = !self.white_to_move;
        self.half_move_clock = 0;
        self.in_check = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_occupancy_invariant() {
        let board = BoardState::startpos();
        assert_eq!(board.all_pieces(), board.white_pieces() | board.black_pieces());
        assert!((board.white_pieces() & board.black_pieces()).is_empty());
        assert_eq!(board.piece_count(), 32);
    }

    #[test]
    fn null_move_twice_restores_hash_and_clears_en_passant() {
        let mut board = BoardState::startpos();
        board.en_passant_file = 4;
        let original_hash = board.hash;
        board.hash ^= ZOBRIST.delta_en_passant(NO_EP_FILE, 4);

        board.apply_null_move();
        assert_eq!(board.en_passant_file, NO_EP_FILE);
        board.apply_null_move();

        assert_eq!(board.hash, original_hash);
        assert_eq!(board.en_passant_file, NO_EP_FILE);
    }

    #[test]
    fn lone_kings_and_king_plus_pawn_are_not_confused() {
        let mut board = BoardState::empty();
        board.place_piece(Square::new(4), Piece::new(true, PieceKind::King));
        board.place_piece(Square::new(60), Piece::new(false, PieceKind::King));
        assert!(board.insufficient_mating_material());

        board.place_piece(Square::new(12), Piece::new(true, PieceKind::Pawn));
        assert!(!board.insufficient_mating_material());
    }

    /// Scenario S3 (§8): a lone rook is sufficient mating material.
    #[test]
    fn lone_rook_is_sufficient_mating_material() {
        let board = crate::board::fen::parse_fen("8/8/8/8/8/4k3/8/R3K3 w Q - 0 1").unwrap();
        assert!(!board.insufficient_mating_material());
    }
}
