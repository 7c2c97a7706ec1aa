//! SIMD-dispatched accumulator kernels (§4.4, §9 "Heavy SIMD inner loops").
//!
//! The spec requires the *numerics* — 16-bit saturating accumulation,
//! `CReLU` clamp to `[0, 255]`, dot product into 32-bit lanes — not any
//! specific instruction set; portable and SIMD paths must agree exactly,
//! which `tests::crelu_dot_matches_scalar` checks.

use super::HIDDEN_SIZE;

const QA: i16 = 255;

/// Saturating `acc += weights`, descending-index iteration per §4.4.
#[inline]
pub fn add_weights(acc: &mut [i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) {
    #[cfg(target_arch = "aarch64")]
    {
        unsafe { add_weights_neon(acc, weights) }
    }
    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    {
        unsafe { add_weights_avx2(acc, weights) }
    }
    #[cfg(all(target_arch = "x86_64", not(target_feature = "avx2")))]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe { add_weights_avx2(acc, weights) }
        } else {
            add_weights_scalar(acc, weights)
        }
    }
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        add_weights_scalar(acc, weights)
    }
}

/// Saturating `acc -= weights`.
#[inline]
pub fn sub_weights(acc: &mut [i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) {
    #[cfg(target_arch = "aarch64")]
    {
        unsafe { sub_weights_neon(acc, weights) }
    }
    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    {
        unsafe { sub_weights_avx2(acc, weights) }
    }
    #[cfg(all(target_arch = "x86_64", not(target_feature = "avx2")))]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe { sub_weights_avx2(acc, weights) }
        } else {
            sub_weights_scalar(acc, weights)
        }
    }
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        sub_weights_scalar(acc, weights)
    }
}

/// `acc += add - remove` in one pass, for a sliding piece within a
/// single quiet move (§4.4 "Replace").
#[inline]
pub fn replace_weights(
    acc: &mut [i16; HIDDEN_SIZE],
    add: &[i16; HIDDEN_SIZE],
    remove: &[i16; HIDDEN_SIZE],
) {
    add_weights(acc, add);
    sub_weights(acc, remove);
}

/// `Σ clamp(acc[i], 0, 255) * weights[i]`, the `CReLU` dot product
/// feeding the forward pass's output bucket (§4.4).
#[inline]
#[must_use]
pub fn crelu_dot(acc: &[i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) -> i32 {
    #[cfg(target_arch = "aarch64")]
    {
        unsafe { crelu_dot_neon(acc, weights) }
    }
    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    {
        unsafe { crelu_dot_avx2(acc, weights) }
    }
    #[cfg(all(target_arch = "x86_64", not(target_feature = "avx2")))]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe { crelu_dot_avx2(acc, weights) }
        } else {
            crelu_dot_scalar(acc, weights)
        }
    }
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        crelu_dot_scalar(acc, weights)
    }
}

// ============================================================================
// Scalar fallback
// ============================================================================

#[cfg_attr(
    not(any(
        test,
        not(any(target_arch = "x86_64", target_arch = "aarch64")),
        all(target_arch = "x86_64", not(target_feature = "avx2"))
    )),
    allow(dead_code)
)]
#[inline]
fn add_weights_scalar(acc: &mut [i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) {
    for i in 0..HIDDEN_SIZE {
        acc[i] = acc[i].saturating_add(weights[i]);
    }
}

#[cfg_attr(
    not(any(
        test,
        not(any(target_arch = "x86_64", target_arch = "aarch64")),
        all(target_arch = "x86_64", not(target_feature = "avx2"))
    )),
    allow(dead_code)
)]
#[inline]
fn sub_weights_scalar(acc: &mut [i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) {
    for i in 0..HIDDEN_SIZE {
        acc[i] = acc[i].saturating_sub(weights[i]);
    }
}

#[cfg_attr(
    not(any(
        test,
        not(any(target_arch = "x86_64", target_arch = "aarch64")),
        all(target_arch = "x86_64", not(target_feature = "avx2"))
    )),
    allow(dead_code)
)]
#[inline]
fn crelu_dot_scalar(acc: &[i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) -> i32 {
    let mut sum = 0i32;
    for i in 0..HIDDEN_SIZE {
        let clamped = i32::from(acc[i]).clamp(0, i32::from(QA));
        sum += clamped * i32::from(weights[i]);
    }
    sum
}

// ============================================================================
// NEON (aarch64)
// ============================================================================

#[cfg(target_arch = "aarch64")]
unsafe fn add_weights_neon(acc: &mut [i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) {
    use std::arch::aarch64::{vld1q_s16, vqaddq_s16, vst1q_s16};

    let acc_ptr = acc.as_mut_ptr();
    let weights_ptr = weights.as_ptr();
    for i in (0..HIDDEN_SIZE).step_by(8) {
        let a = vld1q_s16(acc_ptr.add(i));
        let w = vld1q_s16(weights_ptr.add(i));
        vst1q_s16(acc_ptr.add(i), vqaddq_s16(a, w));
    }
}

#[cfg(target_arch = "aarch64")]
unsafe fn sub_weights_neon(acc: &mut [i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) {
    use std::arch::aarch64::{vld1q_s16, vqsubq_s16, vst1q_s16};

    let acc_ptr = acc.as_mut_ptr();
    let weights_ptr = weights.as_ptr();
    for i in (0..HIDDEN_SIZE).step_by(8) {
        let a = vld1q_s16(acc_ptr.add(i));
        let w = vld1q_s16(weights_ptr.add(i));
        vst1q_s16(acc_ptr.add(i), vqsubq_s16(a, w));
    }
}

#[cfg(target_arch = "aarch64")]
unsafe fn crelu_dot_neon(acc: &[i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) -> i32 {
    use std::arch::aarch64::{
        vaddq_s64, vdupq_n_s16, vdupq_n_s64, vget_high_s16, vget_high_s32, vget_low_s16,
        vget_low_s32, vgetq_lane_s64, vld1q_s16, vmaxq_s16, vminq_s16, vmovl_s16, vmovl_s32,
        vmulq_s32,
    };

    let acc_ptr = acc.as_ptr();
    let weights_ptr = weights.as_ptr();

    let zero = vdupq_n_s16(0);
    let qa = vdupq_n_s16(QA);
    let mut sum0 = vdupq_n_s64(0);
    let mut sum1 = vdupq_n_s64(0);

    for i in (0..HIDDEN_SIZE).step_by(8) {
        let a = vld1q_s16(acc_ptr.add(i));
        let w = vld1q_s16(weights_ptr.add(i));

        let clamped = vminq_s16(vmaxq_s16(a, zero), qa);
        let clamped_lo = vmovl_s16(vget_low_s16(clamped));
        let clamped_hi = vmovl_s16(vget_high_s16(clamped));

        let w_lo = vmovl_s16(vget_low_s16(w));
        let w_hi = vmovl_s16(vget_high_s16(w));

        let prod_lo = vmulq_s32(clamped_lo, w_lo);
        let prod_hi = vmulq_s32(clamped_hi, w_hi);

        sum0 = vaddq_s64(sum0, vmovl_s32(vget_low_s32(prod_lo)));
        sum0 = vaddq_s64(sum0, vmovl_s32(vget_high_s32(prod_lo)));
        sum1 = vaddq_s64(sum1, vmovl_s32(vget_low_s32(prod_hi)));
        sum1 = vaddq_s64(sum1, vmovl_s32(vget_high_s32(prod_hi)));
    }

    let total = vaddq_s64(sum0, sum1);
    (vgetq_lane_s64(total, 0) + vgetq_lane_s64(total, 1)) as i32
}

// ============================================================================
// AVX2 (x86_64)
// ============================================================================

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn add_weights_avx2(acc: &mut [i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) {
    use std::arch::x86_64::*;

    let acc_ptr = acc.as_mut_ptr();
    let weights_ptr = weights.as_ptr();
    for i in (0..HIDDEN_SIZE).step_by(16) {
        let a = _mm256_loadu_si256(acc_ptr.add(i) as *const __m256i);
        let w = _mm256_loadu_si256(weights_ptr.add(i) as *const __m256i);
        _mm256_storeu_si256(acc_ptr.add(i) as *mut __m256i, _mm256_adds_epi16(a, w));
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn sub_weights_avx2(acc: &mut [i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) {
    use std::arch::x86_64::*;

    let acc_ptr = acc.as_mut_ptr();
    let weights_ptr = weights.as_ptr();
    for i in (0..HIDDEN_SIZE).step_by(16) {
        let a = _mm256_loadu_si256(acc_ptr.add(i) as *const __m256i);
        let w = _mm256_loadu_si256(weights_ptr.add(i) as *const __m256i);
        _mm256_storeu_si256(acc_ptr.add(i) as *mut __m256i, _mm256_subs_epi16(a, w));
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn crelu_dot_avx2(acc: &[i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) -> i32 {
    use std::arch::x86_64::*;

    let acc_ptr = acc.as_ptr();
    let weights_ptr = weights.as_ptr();

    let zero = _mm256_setzero_si256();
    let qa = _mm256_set1_epi16(QA);

    let mut sum_lo = _mm256_setzero_si256();
    let mut sum_hi = _mm256_setzero_si256();

    for i in (0..HIDDEN_SIZE).step_by(16) {
        let a = _mm256_loadu_si256(acc_ptr.add(i) as *const __m256i);
        let w = _mm256_loadu_si256(weights_ptr.add(i) as *const __m256i);

        let clamped = _mm256_min_epi16(_mm256_max_epi16(a, zero), qa);

        let c_lo = _mm256_unpacklo_epi16(clamped, zero);
        let c_hi = _mm256_unpackhi_epi16(clamped, zero);

        let w_lo = _mm256_unpacklo_epi16(w, _mm256_cmpgt_epi16(zero, w));
        let w_hi = _mm256_unpackhi_epi16(w, _mm256_cmpgt_epi16(zero, w));

        let prod_lo = _mm256_mullo_epi32(c_lo, w_lo);
        let prod_hi = _mm256_mullo_epi32(c_hi, w_hi);

        sum_lo = _mm256_add_epi64(
            sum_lo,
            _mm256_cvtepi32_epi64(_mm256_extracti128_si256(prod_lo, 0)),
        );
        sum_lo = _mm256_add_epi64(
            sum_lo,
            _mm256_cvtepi32_epi64(_mm256_extracti128_si256(prod_lo, 1)),
        );
        sum_hi = _mm256_add_epi64(
            sum_hi,
            _mm256_cvtepi32_epi64(_mm256_extracti128_si256(prod_hi, 0)),
        );
        sum_hi = _mm256_add_epi64(
            sum_hi,
            _mm256_cvtepi32_epi64(_mm256_extracti128_si256(prod_hi, 1)),
        );
    }

    let total = _mm256_add_epi64(sum_lo, sum_hi);
    let mut result = [0i64; 4];
    _mm256_storeu_si256(result.as_mut_ptr() as *mut __m256i, total);
    (result[0] + result[1] + result[2] + result[3]) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_sub_weights_roundtrips() {
        let mut acc = [100i16; HIDDEN_SIZE];
        let weights = [50i16; HIDDEN_SIZE];
        add_weights(&mut acc, &weights);
        assert!(acc.iter().all(|&v| v == 150));
        sub_weights(&mut acc, &weights);
        assert!(acc.iter().all(|&v| v == 100));
    }

    #[test]
    fn add_weights_saturates() {
        let mut acc = [i16::MAX - 10; HIDDEN_SIZE];
        let weights = [20i16; HIDDEN_SIZE];
        add_weights(&mut acc, &weights);
        assert!(acc.iter().all(|&v| v == i16::MAX));
    }

    #[test]
    fn crelu_dot_matches_scalar() {
        let acc: [i16; HIDDEN_SIZE] = std::array::from_fn(|i| (i as i16 % 300) - 50);
        let weights: [i16; HIDDEN_SIZE] = std::array::from_fn(|i| ((i as i16) % 200) - 100);

        assert_eq!(crelu_dot_scalar(&acc, &weights), crelu_dot(&acc, &weights));
    }
}
