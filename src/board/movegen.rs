//! Pseudo-legal move generation (§6 "Move generator (collaborator)").
//!
//! `spec.md` treats the generator as an external pure function and
//! explicitly places its algorithmic quality out of scope; this module
//! is the in-tree stand-in needed because no external move-generator
//! crate exists to depend on. No magic bitboards, no move ordering, no
//! staged/capture-only generation beyond the `only_captures` filter.

use crate::board::apply::{partial_apply_black, partial_apply_white};
use crate::board::state::BoardState;
use crate::board::types::{
    Bitboard, Move, MoveList, Piece, PieceKind, Square, MOVE_CASTLE, MOVE_DOUBLE_PUSH,
    MOVE_EN_PASSANT, MOVE_PROMO_BISHOP, MOVE_PROMO_KNIGHT, MOVE_PROMO_QUEEN, MOVE_PROMO_ROOK,
    MOVE_QUIET,
};

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2),
];
const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1),
];
const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

fn offset(sq: Square, df: i8, dr: i8) -> Option<Square> {
    let file = sq.file() as i8 + df;
    let rank = sq.rank() as i8 + dr;
    if (0..8).contains(&file) && (0..8).contains(&rank) {
        Some(Square::from_file_rank(file as u8, rank as u8))
    } else {
        None
    }
}

fn ray_attacks(board: &BoardState, from: Square, dirs: &[(i8, i8); 4]) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    for &(df, dr) in dirs {
        let mut cur = from;
        while let Some(next) = offset(cur, df, dr) {
            bb.set(next);
            if board.all_pieces().has(next) {
                break;
            }
            cur = next;
        }
    }
    bb
}

fn pawn_attack_targets(sq: Square, white: bool) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    let dr = if white { 1 } else { -1 };
    for df in [-1i8, 1] {
        if let Some(to) = offset(sq, df, dr) {
            bb.set(to);
        }
    }
    bb
}

/// True if `sq` is attacked by any piece of color `by_white`, used both
/// as the legality probe inside `partialApply` and to set `inCheck` after
/// FEN loading.
#[must_use]
pub fn is_square_attacked(board: &BoardState, sq: Square, by_white: bool) -> bool {
    let pawn_attackers_from = pawn_attack_targets(sq, !by_white);
    if pawn_attackers_from.has_any(board.piece_bb(Piece::new(by_white, PieceKind::Pawn).code())) {
        return true;
    }
    for &(df, dr) in &KNIGHT_OFFSETS {
        if let Some(from) = offset(sq, df, dr) {
            if board.piece_bb(Piece::new(by_white, PieceKind::Knight).code()).has(from) {
                return true;
            }
        }
    }
    for &(df, dr) in &KING_OFFSETS {
        if let Some(from) = offset(sq, df, dr) {
            if board.piece_bb(Piece::new(by_white, PieceKind::King).code()).has(from) {
                return true;
            }
        }
    }
    let bishop_rays = ray_attacks(board, sq, &BISHOP_DIRS);
    let diag_attackers = board.piece_bb(Piece::new(by_white, PieceKind::Bishop).code())
        | board.piece_bb(Piece::new(by_white, PieceKind::Queen).code());
    if bishop_rays.has_any(diag_attackers) {
        return true;
    }
    let rook_rays = ray_attacks(board, sq, &ROOK_DIRS);
    let straight_attackers = board.piece_bb(Piece::new(by_white, PieceKind::Rook).code())
        | board.piece_bb(Piece::new(by_white, PieceKind::Queen).code());
    rook_rays.has_any(straight_attackers)
}

impl Bitboard {
    fn has_any(self, other: Bitboard) -> bool {
        !(self & other).is_empty()
    }
}

fn push_pseudo_legal(board: &BoardState, moves: &mut MoveList, mv: Move) {
    let legal = if board.white_to_move() {
        let mut probe = board.clone();
        partial_apply_white(&mut probe, mv).is_legal
    } else {
        let mut probe = board.clone();
        partial_apply_black(&mut probe, mv).is_legal
    };
    if legal {
        moves.push(mv);
    }
}

fn add_promotions(board: &BoardState, moves: &mut MoveList, from: Square, to: Square, moved: Piece, captured: Piece) {
    for move_type in [MOVE_PROMO_KNIGHT, MOVE_PROMO_BISHOP, MOVE_PROMO_ROOK, MOVE_PROMO_QUEEN] {
        push_pseudo_legal(board, moves, Move::new(from, to, moved, captured, move_type));
    }
}

/// Append every pseudo-legal move (filtered to legal by the same probe
/// `partialApply` uses) for the side to move. `only_captures` restricts
/// generation to captures and promotions, matching the collaborator
/// contract of §6.
pub fn generate(board: &BoardState, moves: &mut MoveList, only_captures: bool) {
    let white = board.white_to_move();
    let own = board.occupied_by(white);
    let enemy = board.occupied_by(!white);
    let occupied = board.all_pieces();

    generate_pawn_moves(board, moves, white, only_captures);

    let leaper_kinds: [(PieceKind, &[(i8, i8)]); 2] =
        [(PieceKind::Knight, &KNIGHT_OFFSETS), (PieceKind::King, &KING_OFFSETS)];
    for (kind, offsets) in leaper_kinds {
        let piece = Piece::new(white, kind);
        for from in board.piece_bb(piece.code()).iter() {
            for &(df, dr) in offsets {
                if let Some(to) = offset(from, df, dr) {
                    if own.has(to) {
                        continue;
                    }
                    let captured = if enemy.has(to) { board.piece_at(to) } else { Piece::NONE };
                    if only_captures && captured.is_none() {
                        continue;
                    }
                    push_pseudo_legal(board, moves, Move::new(from, to, piece, captured, MOVE_QUIET));
                }
            }
        }
    }

    for (kind, dirs) in [(PieceKind::Bishop, &BISHOP_DIRS), (PieceKind::Rook, &ROOK_DIRS)] {
        generate_slider(board, moves, white, kind, dirs, only_captures);
    }
    generate_slider_queen(board, moves, white, only_captures);

    if !only_captures {
        generate_castles(board, moves, white, occupied);
    }
}

fn generate_slider(
    board: &BoardState,
    moves: &mut MoveList,
    white: bool,
    kind: PieceKind,
    dirs: &[(i8, i8); 4],
    only_captures: bool,
) {
    let own = board.occupied_by(white);
    let enemy = board.occupied_by(!white);
    let piece = Piece::new(white, kind);
    for from in board.piece_bb(piece.code()).iter() {
        for &(df, dr) in dirs {
            let mut cur = from;
            while let Some(to) = offset(cur, df, dr) {
                if own.has(to) {
                    break;
                }
                let captured = if enemy.has(to) { board.piece_at(to) } else { Piece::NONE };
                if !(only_captures && captured.is_none()) {
                    push_pseudo_legal(board, moves, Move::new(from, to, piece, captured, MOVE_QUIET));
                }
                if !captured.is_none() {
                    break;
                }
                cur = to;
            }
        }
    }
}

fn generate_slider_queen(board: &BoardState, moves: &mut MoveList, white: bool, only_captures: bool) {
    let own = board.occupied_by(white);
    let enemy = board.occupied_by(!white);
    let piece = Piece::new(white, PieceKind::Queen);
    let all_dirs = BISHOP_DIRS.iter().chain(ROOK_DIRS.iter());
    for from in board.piece_bb(piece.code()).iter() {
        for &(df, dr) in all_dirs.clone() {
            let mut cur = from;
            while let Some(to) = offset(cur, df, dr) {
                if own.has(to) {
                    break;
                }
                let captured = if enemy.has(to) { board.piece_at(to) } else { Piece::NONE };
                if !(only_captures && captured.is_none()) {
                    push_pseudo_legal(board, moves, Move::new(from, to, piece, captured, MOVE_QUIET));
                }
                if !captured.is_none() {
                    break;
                }
                cur = to;
            }
        }
    }
}

fn generate_pawn_moves(board: &BoardState, moves: &mut MoveList, white: bool, only_captures: bool) {
    let own = board.occupied_by(white);
    let enemy = board.occupied_by(!white);
    let occupied = board.all_pieces();
    let piece = Piece::new(white, PieceKind::Pawn);
    let start_rank = if white { 1 } else { 6 };
    let promo_rank = if white { 7 } else { 0 };
    let dr: i8 = if white { 1 } else { -1 };

    for from in board.piece_bb(piece.code()).iter() {
        if let Some(one) = offset(from, 0, dr) {
            if !occupied.has(one) {
                if !only_captures {
                    if one.rank() == promo_rank {
                        add_promotions(board, moves, from, one, piece, Piece::NONE);
                    } else {
                        push_pseudo_legal(board, moves, Move::new(from, one, piece, Piece::NONE, MOVE_QUIET));
                    }
                }
                if from.rank() == start_rank {
                    if let Some(two) = offset(one, 0, dr) {
                        if !occupied.has(two) && !only_captures {
                            push_pseudo_legal(
                                board,
                                moves,
                                Move::new(from, two, piece, Piece::NONE, MOVE_DOUBLE_PUSH),
                            );
                        }
                    }
                }
            }
        }

        for df in [-1i8, 1] {
            if let Some(to) = offset(from, df, dr) {
                if enemy.has(to) {
                    let captured = board.piece_at(to);
                    if to.rank() == promo_rank {
                        add_promotions(board, moves, from, to, piece, captured);
                    } else {
                        push_pseudo_legal(board, moves, Move::new(from, to, piece, captured, MOVE_QUIET));
                    }
                } else if !own.has(to)
                    && board.en_passant_file() < 8
                    && to.file() == board.en_passant_file()
                    && to.rank() == if white { 5 } else { 2 }
                {
                    push_pseudo_legal(
                        board,
                        moves,
                        Move::new(from, to, piece, Piece::new(!white, PieceKind::Pawn), MOVE_EN_PASSANT),
                    );
                }
            }
        }
    }
}

fn generate_castles(board: &BoardState, moves: &mut MoveList, white: bool, occupied: Bitboard) {
    use crate::board::types::{CASTLE_BLACK_KING, CASTLE_BLACK_QUEEN, CASTLE_WHITE_KING, CASTLE_WHITE_QUEEN};
    let (king_bit, queen_bit) = if white {
        (CASTLE_WHITE_KING, CASTLE_WHITE_QUEEN)
    } else {
        (CASTLE_BLACK_KING, CASTLE_BLACK_QUEEN)
    };
    let rank = if white { 0 } else { 7 };
    let king_from = Square::from_file_rank(4, rank);
    let king_piece = Piece::new(white, PieceKind::King);

    if board.castle_rights() & king_bit != 0 {
        let f = Square::from_file_rank(5, rank);
        let g = Square::from_file_rank(6, rank);
        if !occupied.has(f)
            && !occupied.has(g)
            && !is_square_attacked(board, king_from, !white)
            && !is_square_attacked(board, f, !white)
        {
            push_pseudo_legal(board, moves, Move::new(king_from, g, king_piece, Piece::NONE, MOVE_CASTLE));
        }
    }
    if board.castle_rights() & queen_bit != 0 {
        let d = Square::from_file_rank(3, rank);
        let c = Square::from_file_rank(2, rank);
        let b = Square::from_file_rank(1, rank);
        if !occupied.has(d)
            && !occupied.has(c)
            && !occupied.has(b)
            && !is_square_attacked(board, king_from, !white)
            && !is_square_attacked(board, d, !white)
        {
            push_pseudo_legal(board, moves, Move::new(king_from, c, king_piece, Piece::NONE, MOVE_CASTLE));
        }
    }
}
