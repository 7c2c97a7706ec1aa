//! NNUE evaluation: static weight tables, dual-perspective accumulators,
//! mirror refresh, and the `CReLU` forward pass (§3.3, §4.4).
//!
//! Architecture: `768 -> 256`, two perspectives, `B = 8` output buckets.

pub mod accumulator;
pub mod simd;
pub mod weights;

pub use accumulator::{feature_indices, FeaturePair, NnueEvaluator};
pub use weights::{output_bucket, NnueWeights};

/// Squares per piece type, per perspective.
pub const PIECE_STRIDE: usize = 64;
/// `6 piece types * 64 squares`.
pub const COLOR_STRIDE: usize = 6 * PIECE_STRIDE;
/// `2 colors * ColorStride`.
pub const NUM_FEATURES: usize = 2 * COLOR_STRIDE;
/// Hidden layer width, `L1` (retained from the teacher's network, §3.3).
pub const HIDDEN_SIZE: usize = 256;
/// Number of output-bucket heads, `B` (§4.4).
pub const OUTPUT_BUCKETS: usize = 8;
/// Evaluation scale factor.
pub const SCALE: i32 = 400;
