//! Static NNUE weight tables (component A).
//!
//! On-disk network loading is an external collaborator (§1); this module
//! owns only the in-memory layout and a reader-based loader plus a
//! deterministic synthetic generator used to exercise the accumulator and
//! forward-pass math in tests without shipping a trained weight file.

use std::io::{self, Read};

use super::{HIDDEN_SIZE, NUM_FEATURES, OUTPUT_BUCKETS};

/// Feature transformer weights, per-bucket output weights/bias.
///
/// Mirrors the teacher's `NnueNetwork` (`board/nnue/network.rs`) shape,
/// generalized to `B` output buckets (one `(us, them)` weight pair and
/// bias per bucket, §4.4).
pub struct NnueWeights {
    pub feature_bias: [i16; HIDDEN_SIZE],
    pub feature_weights: Box<[[i16; HIDDEN_SIZE]; NUM_FEATURES]>,
    pub output_weights_us: Box<[[i16; HIDDEN_SIZE]; OUTPUT_BUCKETS]>,
    pub output_weights_them: Box<[[i16; HIDDEN_SIZE]; OUTPUT_BUCKETS]>,
    pub output_bias: [i32; OUTPUT_BUCKETS],
}

impl NnueWeights {
    /// Load from any reader: feature weights, feature bias, then per-bucket
    /// `(us, them)` output weights and bias, all little-endian.
    pub fn load<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut feature_weights = Box::new([[0i16; HIDDEN_SIZE]; NUM_FEATURES]);
        for row in feature_weights.iter_mut() {
            read_i16_row(reader, row)?;
        }

        let mut feature_bias = [0i16; HIDDEN_SIZE];
        read_i16_row(reader, &mut feature_bias)?;

        let mut output_weights_us = Box::new([[0i16; HIDDEN_SIZE]; OUTPUT_BUCKETS]);
        let mut output_weights_them = Box::new([[0i16; HIDDEN_SIZE]; OUTPUT_BUCKETS]);
        let mut output_bias = [0i32; OUTPUT_BUCKETS];
        for bucket in 0..OUTPUT_BUCKETS {
            read_i16_row(reader, &mut output_weights_us[bucket])?;
            read_i16_row(reader, &mut output_weights_them[bucket])?;
            let mut buf = [0u8; 4];
            reader.read_exact(&mut buf)?;
            output_bias[bucket] = i32::from_le_bytes(buf);
        }

        Ok(NnueWeights {
            feature_bias,
            feature_weights,
            output_weights_us,
            output_weights_them,
            output_bias,
        })
    }

    /// Deterministic weights for tests and benches: no trained network is
    /// shipped in this crate, so evaluation correctness is tested against
    /// this fixed pseudo-random network rather than real playing strength.
    #[must_use]
    pub fn synthetic(seed: u64) -> Self {
        use rand::prelude::*;
        use rand::rngs::StdRng;

        let mut rng = StdRng::seed_from_u64(seed);
        let small = |rng: &mut StdRng| rng.gen_range(-64..=64i16);

        let mut feature_weights = Box::new([[0i16; HIDDEN_SIZE]; NUM_FEATURES]);
        for row in feature_weights.iter_mut() {
            for w in row.iter_mut() {
                *w = small(&mut rng);
            }
        }

        let mut feature_bias = [0i16; HIDDEN_SIZE];
        for b in &mut feature_bias {
            *b = small(&mut rng);
        }

        let mut output_weights_us = Box::new([[0i16; HIDDEN_SIZE]; OUTPUT_BUCKETS]);
        let mut output_weights_them = Box::new([[0i16; HIDDEN_SIZE]; OUTPUT_BUCKETS]);
        let mut output_bias = [0i32; OUTPUT_BUCKETS];
        for bucket in 0..OUTPUT_BUCKETS {
            for w in output_weights_us[bucket].iter_mut() {
                *w = small(&mut rng);
            }
            for w in output_weights_them[bucket].iter_mut() {
                *w = small(&mut rng);
            }
            output_bias[bucket] = rng.gen_range(-1000..=1000);
        }

        NnueWeights {
            feature_bias,
            feature_weights,
            output_weights_us,
            output_weights_them,
            output_bias,
        }
    }
}

fn read_i16_row<R: Read>(reader: &mut R, row: &mut [i16; HIDDEN_SIZE]) -> io::Result<()> {
    for slot in row.iter_mut() {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf)?;
        *slot = i16::from_le_bytes(buf);
    }
    Ok(())
}

/// Output bucket for a position with `piece_count` pieces on the board
/// (§4.4): `(pieceCount - 2) / ceil(32 / B)`.
#[inline]
#[must_use]
pub fn output_bucket(piece_count: u32) -> usize {
    let step = 32_u32.div_ceil(OUTPUT_BUCKETS as u32);
    let piece_count = piece_count.max(2);
    (((piece_count - 2) / step) as usize).min(OUTPUT_BUCKETS - 1)
}
