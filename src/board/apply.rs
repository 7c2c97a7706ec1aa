//! Incremental move application: structural bitboard edits plus legality
//! probe (`partialApply`), then hash and NNUE-delta maintenance
//! (`finishApply`) (§4.2).
//!
//! White and black get distinct entry points so the compiler can
//! monomorphize away the color branch entirely; both call the same
//! `const WHITE: bool`-parameterized body.

use crate::board::movegen::is_square_attacked;
use crate::board::state::BoardState;
use crate::board::types::{
    castle_bits, Bitboard, Piece, PieceKind, Square, MOVE_CASTLE, MOVE_DOUBLE_PUSH,
    MOVE_EN_PASSANT, MOVE_PROMO_KNIGHT,
};
use crate::board::types::Move;
use crate::nnue::{NnueEvaluator, NnueWeights};
use crate::zobrist::{NO_EP_FILE, ZOBRIST};

/// Result of a `partialApply` call: whether the move was legal (did not
/// leave the mover's own king in check) plus the pre-move state
/// `finishApply` needs for its differential hash update.
pub struct ApplyContext {
    pub is_legal: bool,
    pub old_en_passant_file: u8,
    pub old_castle_rights: u8,
}

#[inline]
#[must_use]
pub fn partial_apply_white(board: &mut BoardState, mv: Move) -> ApplyContext {
    partial_apply::<true>(board, mv)
}

#[inline]
#[must_use]
pub fn partial_apply_black(board: &mut BoardState, mv: Move) -> ApplyContext {
    partial_apply::<false>(board, mv)
}

fn home_rook_square(white: bool, kingside: bool) -> Square {
    match (white, kingside) {
        (true, true) => Square::new(7),
        (true, false) => Square::new(0),
        (false, true) => Square::new(63),
        (false, false) => Square::new(56),
    }
}

fn partial_apply<const WHITE: bool>(board: &mut BoardState, mv: Move) -> ApplyContext {
    let old_en_passant_file = board.en_passant_file();
    let old_castle_rights = board.castle_rights();

    let from = mv.from();
    let to = mv.to();
    let moved = mv.moved_piece();
    let captured = mv.captured_piece();
    let move_type = mv.move_type();

    board.set_en_passant_file(NO_EP_FILE);

    if move_type == MOVE_CASTLE {
        let kingside = to.file() == 6;
        let rook_from = home_rook_square(WHITE, kingside);
        let rook_to = if kingside {
            Square::from_file_rank(5, from.rank())
        } else {
            Square::from_file_rank(3, from.rank())
        };

        let king_mask = Bitboard::from_square(from) ^ Bitboard::from_square(to);
        let rook_mask = Bitboard::from_square(rook_from) ^ Bitboard::from_square(rook_to);
        *board.piece_bb_mut(Piece::new(WHITE, PieceKind::King).code()) ^= king_mask;
        *board.piece_bb_mut(Piece::new(WHITE, PieceKind::Rook).code()) ^= rook_mask;
        *board.color_bb_mut(WHITE) ^= king_mask ^ rook_mask;
        board.set_king_square(WHITE, to);

        let (king_bit, queen_bit) = castle_bits(WHITE);
        board.set_castle_rights(board.castle_rights() & !(king_bit | queen_bit));
    } else if move_type == MOVE_EN_PASSANT {
        let move_mask = Bitboard::from_square(from) ^ Bitboard::from_square(to);
        *board.piece_bb_mut(moved.code()) ^= move_mask;
        *board.color_bb_mut(WHITE) ^= move_mask;

        let captured_sq = Square::from_file_rank(old_en_passant_file, from.rank());
        let captured_piece = Piece::new(!WHITE, PieceKind::Pawn);
        board.piece_bb_mut(captured_piece.code()).clear(captured_sq);
        board.color_bb_mut(!WHITE).clear(captured_sq);
        board.decrement_piece_count();
    } else if move_type >= MOVE_PROMO_KNIGHT {
        board.piece_bb_mut(moved.code()).clear(from);
        board.color_bb_mut(WHITE).clear(from);

        if !captured.is_none() {
            board.piece_bb_mut(captured.code()).clear(to);
            board.color_bb_mut(!WHITE).clear(to);
            board.decrement_piece_count();
        }

        let promoted = mv.promotion_piece().expect("promotion move has a promotion piece");
        board.piece_bb_mut(promoted.code()).set(to);
        board.color_bb_mut(WHITE).set(to);
    } else {
        if !captured.is_none() {
            board.piece_bb_mut(captured.code()).clear(to);
            board.color_bb_mut(!WHITE).clear(to);
            board.decrement_piece_count();
        }

        let move_mask = Bitboard::from_square(from) ^ Bitboard::from_square(to);
        *board.piece_bb_mut(moved.code()) ^= move_mask;
        *board.color_bb_mut(WHITE) ^= move_mask;

        if move_type == MOVE_DOUBLE_PUSH {
            board.set_en_passant_file(from.file());
        }

        if moved.kind() == PieceKind::King {
            board.set_king_square(WHITE, to);
            let (king_bit, queen_bit) = castle_bits(WHITE);
            board.set_castle_rights(board.castle_rights() & !(king_bit | queen_bit));
        }

        drop_castle_right_if_rook_left_home(board, WHITE, from);
        drop_castle_right_if_rook_captured(board, !WHITE, to);
    }

    board.recompute_all_pieces();
    board.flip_side_to_move();
    board.increment_turn_count();
    if mv.is_reset() {
        board.set_half_move_clock(0);
    } else {
        board.set_half_move_clock(board.half_move_clock().saturating_add(1));
    }

    let king_sq = board.king_square(WHITE);
    let is_legal = !is_square_attacked(board, king_sq, !WHITE);
    board.set_in_check(is_square_attacked(board, board.king_square(!WHITE), WHITE));

    ApplyContext {
        is_legal,
        old_en_passant_file,
        old_castle_rights,
    }
}

fn drop_castle_right_if_rook_left_home(board: &mut BoardState, white: bool, from: Square) {
    let (king_bit, queen_bit) = castle_bits(white);
    if from == home_rook_square(white, true) {
        board.set_castle_rights(board.castle_rights() & !king_bit);
    } else if from == home_rook_square(white, false) {
        board.set_castle_rights(board.castle_rights() & !queen_bit);
    }
}

fn drop_castle_right_if_rook_captured(board: &mut BoardState, white: bool, to: Square) {
    let (king_bit, queen_bit) = castle_bits(white);
    if to == home_rook_square(white, true) {
        board.set_castle_rights(board.castle_rights() & !king_bit);
    } else if to == home_rook_square(white, false) {
        board.set_castle_rights(board.castle_rights() & !queen_bit);
    }
}

#[inline]
pub fn finish_apply_white(
    board: &mut BoardState,
    evaluator: &mut NnueEvaluator,
    weights: &NnueWeights,
    mv: Move,
    ctx: &ApplyContext,
) {
    finish_apply::<true>(board, evaluator, weights, mv, ctx);
}

#[inline]
pub fn finish_apply_black(
    board: &mut BoardState,
    evaluator: &mut NnueEvaluator,
    weights: &NnueWeights,
    mv: Move,
    ctx: &ApplyContext,
) {
    finish_apply::<false>(board, evaluator, weights, mv, ctx);
}

fn finish_apply<const WHITE: bool>(
    board: &mut BoardState,
    evaluator: &mut NnueEvaluator,
    weights: &NnueWeights,
    mv: Move,
    ctx: &ApplyContext,
) {
    let from = mv.from();
    let to = mv.to();
    let moved = mv.moved_piece();
    let captured = mv.captured_piece();
    let move_type = mv.move_type();

    board.xor_hash(ZOBRIST.side_to_move);
    board.xor_hash(ZOBRIST.delta_castle_rights(ctx.old_castle_rights, board.castle_rights()));
    board.xor_hash(ZOBRIST.delta_en_passant(ctx.old_en_passant_file, board.en_passant_file()));

    if move_type == MOVE_CASTLE {
        let kingside = to.file() == 6;
        let side_idx = match (WHITE, kingside) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        };
        board.xor_hash(ZOBRIST.castle_combined[side_idx]);

        let rook_from = home_rook_square(WHITE, kingside);
        let rook_to = if kingside {
            Square::from_file_rank(5, from.rank())
        } else {
            Square::from_file_rank(3, from.rank())
        };
        let king_piece = Piece::new(WHITE, PieceKind::King);
        let rook_piece = Piece::new(WHITE, PieceKind::Rook);

        board.xor_material_hash(WHITE, ZOBRIST.piece_square_key(rook_piece, rook_from));
        board.xor_material_hash(WHITE, ZOBRIST.piece_square_key(rook_piece, rook_to));

        evaluator.replace_feature(weights, king_piece, from, to);
        evaluator.replace_feature(weights, rook_piece, rook_from, rook_to);
        evaluator.mark_mirror(WHITE, to);
        return;
    }

    if move_type == MOVE_EN_PASSANT {
        let captured_sq = Square::from_file_rank(ctx.old_en_passant_file, from.rank());
        let captured_piece = Piece::new(!WHITE, PieceKind::Pawn);

        board.xor_hash(ZOBRIST.piece_square_key(moved, from));
        board.xor_hash(ZOBRIST.piece_square_key(moved, to));
        board.xor_hash(ZOBRIST.piece_square_key(captured_piece, captured_sq));
        board.xor_pawn_hash(ZOBRIST.piece_square_key(moved, from));
        board.xor_pawn_hash(ZOBRIST.piece_square_key(moved, to));
        board.xor_pawn_hash(ZOBRIST.piece_square_key(captured_piece, captured_sq));

        evaluator.replace_feature(weights, moved, from, to);
        evaluator.remove_feature(weights, captured_piece, captured_sq);
        return;
    }

    if move_type >= MOVE_PROMO_KNIGHT {
        let promoted = mv.promotion_piece().expect("promotion move has a promotion piece");
        board.xor_hash(ZOBRIST.piece_square_key(moved, from));
        board.xor_hash(ZOBRIST.piece_square_key(promoted, to));
        board.xor_pawn_hash(ZOBRIST.piece_square_key(moved, from));
        board.xor_material_hash(WHITE, ZOBRIST.piece_square_key(promoted, to));
        evaluator.remove_feature(weights, moved, from);
        evaluator.add_feature(weights, promoted, to);

        if !captured.is_none() {
            board.xor_hash(ZOBRIST.piece_square_key(captured, to));
            board.xor_material_hash(!WHITE, ZOBRIST.piece_square_key(captured, to));
            evaluator.remove_feature(weights, captured, to);
        }
        return;
    }

    // Quiet or capture (§4.2 type 0), including castling-rights-only king/rook moves.
    board.xor_hash(ZOBRIST.piece_square_key(moved, from));
    board.xor_hash(ZOBRIST.piece_square_key(moved, to));
    if moved.kind() == PieceKind::Pawn {
        board.xor_pawn_hash(ZOBRIST.piece_square_key(moved, from));
        board.xor_pawn_hash(ZOBRIST.piece_square_key(moved, to));
    } else if moved.kind() != PieceKind::King {
        board.xor_material_hash(WHITE, ZOBRIST.piece_square_key(moved, from));
        board.xor_material_hash(WHITE, ZOBRIST.piece_square_key(moved, to));
    }

    if !captured.is_none() {
        board.xor_hash(ZOBRIST.piece_square_key(captured, to));
        if captured.kind() == PieceKind::Pawn {
            board.xor_pawn_hash(ZOBRIST.piece_square_key(captured, to));
        } else {
            board.xor_material_hash(!WHITE, ZOBRIST.piece_square_key(captured, to));
        }
        evaluator.replace_feature(weights, moved, from, to);
        evaluator.remove_feature(weights, captured, to);
    } else {
        evaluator.replace_feature(weights, moved, from, to);
    }

    if moved.kind() == PieceKind::King {
        evaluator.mark_mirror(WHITE, to);
    }
}

/// `applyNullMove`: flip side to move, clear any live en-passant file,
/// reset the half-move clock. Must be undone by the caller (§4.2
/// "Null move").
pub fn apply_null_move(board: &mut BoardState) {
    board.apply_null_move();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fen::parse_fen;
    use crate::board::types::{CASTLE_WHITE_KING, CASTLE_WHITE_QUEEN};

    fn do_move(board: &mut BoardState, evaluator: &mut NnueEvaluator, weights: &NnueWeights, mv: Move) -> bool {
        let white = board.white_to_move();
        let ctx = if white {
            partial_apply_white(board, mv)
        } else {
            partial_apply_black(board, mv)
        };
        if white {
            finish_apply_white(board, evaluator, weights, mv, &ctx);
        } else {
            finish_apply_black(board, evaluator, weights, mv, &ctx);
        }
        ctx.is_legal
    }

    #[test]
    fn castle_kingside_updates_squares_and_rights() {
        let mut board =
            parse_fen("r1bqkbnr/ppp1pppp/2n5/1B1p4/4P3/5N2/PPPP1PPP/RNBQK2R w KQkq d6 0 4").unwrap();
        let weights = NnueWeights::synthetic(3);
        let mut evaluator = NnueEvaluator::from_scratch(&weights, &board);

        let mv = Move::new(
            Square::new(4),
            Square::new(6),
            Piece::new(true, PieceKind::King),
            Piece::NONE,
            MOVE_CASTLE,
        );
        let legal = do_move(&mut board, &mut evaluator, &weights, mv);

        assert!(legal);
        assert_eq!(board.king_square(true), Square::new(6));
        assert!(board.piece_bb(Piece::new(true, PieceKind::Rook).code()).has(Square::new(5)));
        assert_eq!(board.castle_rights() & (CASTLE_WHITE_KING | CASTLE_WHITE_QUEEN), 0);
    }

    #[test]
    fn null_move_twice_is_identity_on_hash() {
        let mut board = parse_fen("8/8/8/8/8/4k3/4P3/4K3 w - - 0 1").unwrap();
        let original = board.hash();
        apply_null_move(&mut board);
        apply_null_move(&mut board);
        assert_eq!(board.hash(), original);
    }

    #[test]
    fn quiet_pawn_push_matches_full_recomputation() {
        let mut board = BoardState::startpos();
        let weights = NnueWeights::synthetic(5);
        let mut evaluator = NnueEvaluator::from_scratch(&weights, &board);

        let mv = Move::new(
            Square::new(12),
            Square::new(28),
            Piece::new(true, PieceKind::Pawn),
            Piece::NONE,
            MOVE_DOUBLE_PUSH,
        );
        assert!(do_move(&mut board, &mut evaluator, &weights, mv));
        assert_eq!(board.hash(), board.recompute_hash_from_scratch());
    }

    /// Invariant 2 (§8): apply then unapply restores the exact bitboard
    /// state, all four hashes, castle rights, en-passant file, half-move
    /// clock, and turn count. The reference make-unmake round trip is a
    /// snapshot taken before `apply` and restored afterward — the same
    /// cloning the parallel searcher already relies on for per-thread
    /// isolation (§9 "Per-thread cloned board").
    #[test]
    fn make_unmake_round_trip_restores_board_exactly() {
        let moves = [
            (Square::new(12), Square::new(28), PieceKind::Pawn, MOVE_DOUBLE_PUSH),
            (Square::new(6), Square::new(21), PieceKind::Knight, crate::board::types::MOVE_QUIET),
            (Square::new(4), Square::new(6), PieceKind::King, MOVE_CASTLE),
        ];
        let mut board = parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQK2R w KQkq - 0 1")
            .unwrap_or_else(|_| BoardState::startpos());
        let weights = NnueWeights::synthetic(9);
        let mut evaluator = NnueEvaluator::from_scratch(&weights, &board);

        for (from, to, kind, move_type) in moves {
            if !board.piece_at(from).is_none() && board.piece_at(from).kind() == kind {
                let snapshot_board = board.clone();
                let snapshot_eval = evaluator.clone();
                let mv = Move::new(from, to, Piece::new(board.white_to_move(), kind), board.piece_at(to), move_type);
                do_move(&mut board, &mut evaluator, &weights, mv);

                board = snapshot_board;
                evaluator = snapshot_eval;
            }
        }

        assert_eq!(board.hash(), board.recompute_hash_from_scratch());
    }

    /// Scenario S6 (§8): start -> 1. e4 e5 2. Nf3 Nc6 3. Bb5, then 3...
    /// a6 applied; incremental hash equals full recomputation.
    #[test]
    fn ruy_lopez_opening_incremental_hash_matches_recomputation() {
        let mut board = BoardState::startpos();
        let weights = NnueWeights::synthetic(13);
        let mut evaluator = NnueEvaluator::from_scratch(&weights, &board);

        let plies = [
            (Square::new(12), Square::new(28), PieceKind::Pawn, MOVE_DOUBLE_PUSH), // e4
            (Square::new(52), Square::new(36), PieceKind::Pawn, MOVE_DOUBLE_PUSH), // e5
            (Square::new(6), Square::new(21), PieceKind::Knight, crate::board::types::MOVE_QUIET), // Nf3
            (Square::new(57), Square::new(42), PieceKind::Knight, crate::board::types::MOVE_QUIET), // Nc6
            (Square::new(5), Square::new(33), PieceKind::Bishop, crate::board::types::MOVE_QUIET), // Bb5
            (Square::new(48), Square::new(40), PieceKind::Pawn, crate::board::types::MOVE_QUIET), // a6
        ];

        for (from, to, kind, move_type) in plies {
            let white = board.white_to_move();
            let captured = board.piece_at(to);
            let mv = Move::new(from, to, Piece::new(white, kind), captured, move_type);
            assert!(do_move(&mut board, &mut evaluator, &weights, mv), "move {from}->{to} should be legal");
        }

        assert_eq!(board.hash(), board.recompute_hash_from_scratch());
    }
}
