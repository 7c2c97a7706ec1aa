//! Dual-perspective accumulator, mirror refresh, and forward pass (§4.4).

use crate::board::state::BoardState;
use crate::board::types::{Piece, Square};

use super::weights::{output_bucket, NnueWeights};
use super::{simd, COLOR_STRIDE, HIDDEN_SIZE, PIECE_STRIDE, SCALE};

/// 64-byte-aligned accumulator storage (§3.3, §5 "Memory"): the widest
/// SIMD lane this crate dispatches to is AVX2's 256 bits.
#[repr(align(64))]
#[derive(Clone)]
struct Accumulator([i16; HIDDEN_SIZE]);

impl Accumulator {
    fn filled_with(bias: &[i16; HIDDEN_SIZE]) -> Self {
        Accumulator(*bias)
    }
}

/// The two perspectives' feature indices for a `(piece, square)` pair,
/// reflecting the mirror state of each side (§4.4).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FeaturePair {
    pub white: usize,
    pub black: usize,
}

/// `colorOffset*ColorStride + typeOffset*PieceStride + squareOffset` for
/// both perspectives at once. The white accumulator sees `square`
/// verbatim (file-mirrored if `white_mirrored`); the black accumulator
/// sees `square` vertically flipped (additionally file-mirrored if
/// `black_mirrored`), with the color bit flipped relative to white's.
#[must_use]
pub fn feature_indices(piece: Piece, sq: Square, white_mirrored: bool, black_mirrored: bool) -> FeaturePair {
    FeaturePair {
        white: feature_index_for(piece, sq, true, white_mirrored),
        black: feature_index_for(piece, sq, false, black_mirrored),
    }
}

fn feature_index_for(piece: Piece, sq: Square, perspective_white: bool, mirrored: bool) -> usize {
    let oriented = if perspective_white { sq } else { sq.flip_rank() };
    let oriented = if mirrored { oriented.mirror_file() } else { oriented };
    let color_offset = usize::from(piece.is_white() != perspective_white);
    color_offset * COLOR_STRIDE + (piece.kind() as usize) * PIECE_STRIDE + oriented.index()
}

/// Owns both perspective accumulators plus the lazy mirror-refresh state
/// (§3.3). Each `BoardState` that is actively being evaluated pairs with
/// exactly one of these; cloning deep-copies both accumulators.
#[derive(Clone)]
pub struct NnueEvaluator {
    white_acc: Accumulator,
    black_acc: Accumulator,
    white_mirrored: bool,
    black_mirrored: bool,
    should_white_mirrored: bool,
    should_black_mirrored: bool,
}

impl NnueEvaluator {
    /// Build an evaluator with both accumulators filled from scratch for
    /// `board` (`fillAccumulators`, used by invariant-5 tests as the
    /// from-scratch oracle).
    #[must_use]
    pub fn from_scratch(weights: &NnueWeights, board: &BoardState) -> Self {
        let white_mirrored = board.king_square(true).is_mirrored_half();
        let black_mirrored = board.king_square(false).is_mirrored_half();
        let mut evaluator = NnueEvaluator {
            white_acc: Accumulator::filled_with(&weights.feature_bias),
            black_acc: Accumulator::filled_with(&weights.feature_bias),
            white_mirrored,
            black_mirrored,
            should_white_mirrored: white_mirrored,
            should_black_mirrored: black_mirrored,
        };
        evaluator.refresh_white(weights, board);
        evaluator.refresh_black(weights, board);
        evaluator
    }

    fn refresh_white(&mut self, weights: &NnueWeights, board: &BoardState) {
        self.white_mirrored = self.should_white_mirrored;
        self.white_acc = Accumulator::filled_with(&weights.feature_bias);
        for code in 1u8..=12 {
            let piece = Piece::from_code(code);
            for sq in board.piece_bb(code).iter() {
                let idx = feature_index_for(piece, sq, true, self.white_mirrored);
                simd::add_weights(&mut self.white_acc.0, &weights.feature_weights[idx]);
            }
        }
    }

    fn refresh_black(&mut self, weights: &NnueWeights, board: &BoardState) {
        self.black_mirrored = self.should_black_mirrored;
        self.black_acc = Accumulator::filled_with(&weights.feature_bias);
        for code in 1u8..=12 {
            let piece = Piece::from_code(code);
            for sq in board.piece_bb(code).iter() {
                let idx = feature_index_for(piece, sq, false, self.black_mirrored);
                simd::add_weights(&mut self.black_acc.0, &weights.feature_weights[idx]);
            }
        }
    }

    /// Add one feature to both perspective accumulators (§4.4 "Add").
    pub fn add_feature(&mut self, weights: &NnueWeights, piece: Piece, sq: Square) {
        let pair = feature_indices(piece, sq, self.white_mirrored, self.black_mirrored);
        simd::add_weights(&mut self.white_acc.0, &weights.feature_weights[pair.white]);
        simd::add_weights(&mut self.black_acc.0, &weights.feature_weights[pair.black]);
    }

    /// Remove one feature from both perspective accumulators (§4.4 "Subtract").
    pub fn remove_feature(&mut self, weights: &NnueWeights, piece: Piece, sq: Square) {
        let pair = feature_indices(piece, sq, self.white_mirrored, self.black_mirrored);
        simd::sub_weights(&mut self.white_acc.0, &weights.feature_weights[pair.white]);
        simd::sub_weights(&mut self.black_acc.0, &weights.feature_weights[pair.black]);
    }

    /// `acc += W[add] - W[remove]` for a sliding piece within one quiet
    /// move (§4.4 "Replace").
    pub fn replace_feature(
        &mut self,
        weights: &NnueWeights,
        piece: Piece,
        from_sq: Square,
        to_sq: Square,
    ) {
        let add = feature_indices(piece, to_sq, self.white_mirrored, self.black_mirrored);
        let remove = feature_indices(piece, from_sq, self.white_mirrored, self.black_mirrored);
        simd::replace_weights(
            &mut self.white_acc.0,
            &weights.feature_weights[add.white],
            &weights.feature_weights[remove.white],
        );
        simd::replace_weights(
            &mut self.black_acc.0,
            &weights.feature_weights[add.black],
            &weights.feature_weights[remove.black],
        );
    }

    /// Record that a king move may have crossed the mirror boundary for
    /// `white`'s perspective; the actual rebuild is deferred to the next
    /// [`NnueEvaluator::evaluate`] call (lazy reconciliation, §4.4).
    pub fn mark_mirror(&mut self, white: bool, king_sq: Square) {
        let mirrored = king_sq.is_mirrored_half();
        if white {
            self.should_white_mirrored = mirrored;
        } else {
            self.should_black_mirrored = mirrored;
        }
    }

    fn reconcile(&mut self, weights: &NnueWeights, board: &BoardState) {
        if self.white_mirrored != self.should_white_mirrored {
            self.refresh_white(weights, board);
        }
        if self.black_mirrored != self.should_black_mirrored {
            self.refresh_black(weights, board);
        }
    }

    /// Forward pass to a centipawn-like signed score, positive favoring
    /// the side to move (§4.4 "Forward pass"). Reconciles any pending
    /// mirror refresh first.
    #[must_use]
    pub fn evaluate(&mut self, weights: &NnueWeights, board: &BoardState) -> i32 {
        self.reconcile(weights, board);
        debug_assert_eq!(self.white_mirrored, self.should_white_mirrored);
        debug_assert_eq!(self.black_mirrored, self.should_black_mirrored);

        let bucket = output_bucket(board.piece_count());
        let (us_acc, them_acc, us_weights, them_weights) = if board.white_to_move() {
            (
                &self.white_acc.0,
                &self.black_acc.0,
                &weights.output_weights_us[bucket],
                &weights.output_weights_them[bucket],
            )
        } else {
            (
                &self.black_acc.0,
                &self.white_acc.0,
                &weights.output_weights_us[bucket],
                &weights.output_weights_them[bucket],
            )
        };

        let sum = simd::crelu_dot(us_acc, us_weights) + simd::crelu_dot(them_acc, them_weights);
        const Q: i32 = 255 * 64;
        (sum + weights.output_bias[bucket]) * SCALE / Q
    }
}
