use std::arch::x86_64::*;

use super::sse4;
use crate::{simd_utils, ReductionTaps, INTERPOLATE_SHIFT};

const SHIFT: i32 = INTERPOLATE_SHIFT as i32;

/// # Safety
/// `src` must hold `taps.len()` rows of `dst.len()` bytes
/// and the CPU must support AVX2.
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn reduce_vertical(
    dst: &mut [u8],
    src: &[u8],
    row_stride: usize,
    taps: &ReductionTaps,
) {
    let coeffs = taps.mantissas();
    let last_row = (coeffs.len() - 1) * row_stride;
    let src_ptr = src.as_ptr();
    let mut src_x: usize = 0;

    let initial = _mm256_set1_epi32(ReductionTaps::rounding_bias());
    let zero = _mm256_setzero_si256();

    // Eight groups of 4 bytes in one register
    let mut dst_chunks_32 = dst.chunks_exact_mut(32);
    for dst_chunk in &mut dst_chunks_32 {
        let mut sss = [initial; 4];

        let coeffs_chunks = coeffs.chunks_exact(2);
        let coeffs_reminder = coeffs_chunks.remainder();

        for (i, two_coeffs) in coeffs_chunks.enumerate() {
            let row1 = src_ptr.add(2 * i * row_stride + src_x);
            let row2 = src_ptr.add((2 * i + 1) * row_stride + src_x);

            // Load two coefficients at once
            let mmk = simd_utils::mm256_load_and_clone_i16x2(two_coeffs);

            let source1 = simd_utils::loadu_si256(row1); // top line
            let source2 = simd_utils::loadu_si256(row2); // bottom line
            madd_32_columns(&mut sss, source1, source2, mmk);
        }

        if let Some(&k) = coeffs_reminder.first() {
            let mmk = _mm256_set1_epi32(k as i32);
            let source1 = simd_utils::loadu_si256(src_ptr.add(last_row + src_x)); // top line
            madd_32_columns(&mut sss, source1, zero, mmk);
        }

        // Packing works inside of 128-bit lanes, so order of bytes is kept
        let lo = _mm256_packs_epi32(
            _mm256_srai_epi32::<SHIFT>(sss[0]),
            _mm256_srai_epi32::<SHIFT>(sss[1]),
        );
        let hi = _mm256_packs_epi32(
            _mm256_srai_epi32::<SHIFT>(sss[2]),
            _mm256_srai_epi32::<SHIFT>(sss[3]),
        );
        let dst_ptr = dst_chunk.as_mut_ptr() as *mut __m256i;
        _mm256_storeu_si256(dst_ptr, _mm256_packus_epi16(lo, hi));

        src_x += 32;
    }

    // Less than 32 bytes left, 128-bit registers are enough
    sse4::reduce_remainder(
        dst_chunks_32.into_remainder(),
        src_ptr.add(src_x),
        row_stride,
        taps,
    );
}

/// Interleaves 32 bytes of the top and bottom lines and adds their
/// weighted sums to four groups of 8 sums.
#[inline(always)]
unsafe fn madd_32_columns(sss: &mut [__m256i; 4], top: __m256i, bottom: __m256i, mmk: __m256i) {
    let zero = _mm256_setzero_si256();
    let halves = [
        _mm256_unpacklo_epi8(top, bottom),
        _mm256_unpackhi_epi8(top, bottom),
    ];
    for (pair, source) in sss.chunks_exact_mut(2).zip(halves) {
        let pix = _mm256_unpacklo_epi8(source, zero);
        pair[0] = _mm256_add_epi32(pair[0], _mm256_madd_epi16(pix, mmk));
        let pix = _mm256_unpackhi_epi8(source, zero);
        pair[1] = _mm256_add_epi32(pair[1], _mm256_madd_epi16(pix, mmk));
    }
}
