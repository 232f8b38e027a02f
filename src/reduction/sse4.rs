use std::arch::x86_64::*;

use super::native;
use crate::{simd_utils, ReductionTaps, INTERPOLATE_SHIFT};

const SHIFT: i32 = INTERPOLATE_SHIFT as i32;

/// # Safety
/// `src` must hold `taps.len()` rows of `dst.len()` bytes
/// and the CPU must support SSE4.1.
#[target_feature(enable = "sse4.1")]
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

    let initial = _mm_set1_epi32(ReductionTaps::rounding_bias());
    let zero = _mm_setzero_si128();

    // Eight groups of 4 bytes, two 128-bit loads per row
    let mut dst_chunks_32 = dst.chunks_exact_mut(32);
    for dst_chunk in &mut dst_chunks_32 {
        let mut sss = [initial; 8];

        let coeffs_chunks = coeffs.chunks_exact(2);
        let coeffs_reminder = coeffs_chunks.remainder();

        for (i, two_coeffs) in coeffs_chunks.enumerate() {
            let row1 = src_ptr.add(2 * i * row_stride + src_x);
            let row2 = src_ptr.add((2 * i + 1) * row_stride + src_x);

            // Load two coefficients at once
            let mmk = simd_utils::mm_load_and_clone_i16x2(two_coeffs);

            let source1 = simd_utils::loadu_si128(row1); // top line
            let source2 = simd_utils::loadu_si128(row2); // bottom line
            madd_16_columns(&mut sss[..4], source1, source2, mmk);

            let source1 = simd_utils::loadu_si128(row1.add(16)); // top line
            let source2 = simd_utils::loadu_si128(row2.add(16)); // bottom line
            madd_16_columns(&mut sss[4..], source1, source2, mmk);
        }

        if let Some(&k) = coeffs_reminder.first() {
            let row = src_ptr.add(last_row + src_x);
            let mmk = _mm_set1_epi32(k as i32);

            madd_16_columns(&mut sss[..4], simd_utils::loadu_si128(row), zero, mmk);
            madd_16_columns(&mut sss[4..], simd_utils::loadu_si128(row.add(16)), zero, mmk);
        }

        let dst_ptr = dst_chunk.as_mut_ptr() as *mut __m128i;
        _mm_storeu_si128(dst_ptr, pack_16_columns(&sss[..4]));
        _mm_storeu_si128(dst_ptr.add(1), pack_16_columns(&sss[4..]));

        src_x += 32;
    }

    reduce_remainder(dst_chunks_32.into_remainder(), src_ptr.add(src_x), row_stride, taps);
}

/// Reduces less than 32 columns: blocks of 8 and 4 bytes,
/// the last 1..=3 bytes one by one.
///
/// # Safety
/// `src` must hold `taps.len()` rows of `dst.len()` bytes
/// and the CPU must support SSE4.1.
#[inline]
#[target_feature(enable = "sse4.1")]
pub(super) unsafe fn reduce_remainder(
    mut dst_u8: &mut [u8],
    src_ptr: *const u8,
    row_stride: usize,
    taps: &ReductionTaps,
) {
    let coeffs = taps.mantissas();
    let last_row = (coeffs.len() - 1) * row_stride;
    let mut src_x: usize = 0;

    let initial = _mm_set1_epi32(ReductionTaps::rounding_bias());
    let zero = _mm_setzero_si128();

    // Two groups, 64-bit loads
    let mut dst_chunks_8 = dst_u8.chunks_exact_mut(8);
    for dst_chunk in &mut dst_chunks_8 {
        let mut sss = [initial; 2]; // left and right halves

        let coeffs_chunks = coeffs.chunks_exact(2);
        let coeffs_reminder = coeffs_chunks.remainder();

        for (i, two_coeffs) in coeffs_chunks.enumerate() {
            let row1 = src_ptr.add(2 * i * row_stride + src_x);
            let row2 = src_ptr.add((2 * i + 1) * row_stride + src_x);
            // Load two coefficients at once
            let mmk = simd_utils::mm_load_and_clone_i16x2(two_coeffs);

            let source1 = simd_utils::loadl_epi64(row1); // top line
            let source2 = simd_utils::loadl_epi64(row2); // bottom line
            madd_8_columns(&mut sss, _mm_unpacklo_epi8(source1, source2), mmk);
        }

        if let Some(&k) = coeffs_reminder.first() {
            let mmk = _mm_set1_epi32(k as i32);
            let source1 = simd_utils::loadl_epi64(src_ptr.add(last_row + src_x)); // top line
            madd_8_columns(&mut sss, _mm_unpacklo_epi8(source1, zero), mmk);
        }

        let packed = _mm_packs_epi32(
            _mm_srai_epi32::<SHIFT>(sss[0]),
            _mm_srai_epi32::<SHIFT>(sss[1]),
        );
        let dst_ptr = dst_chunk.as_mut_ptr() as *mut __m128i;
        _mm_storel_epi64(dst_ptr, _mm_packus_epi16(packed, packed));

        src_x += 8;
    }

    // One group
    dst_u8 = dst_chunks_8.into_remainder();
    let mut dst_chunks_4 = dst_u8.chunks_exact_mut(4);
    if let Some(dst_chunk) = dst_chunks_4.next() {
        let sss = reduce_group(src_ptr.add(src_x), row_stride, coeffs, initial);
        simd_utils::store_epi32_as_u8x4(sss, dst_chunk.as_mut_ptr());

        src_x += 4;
    }

    dst_u8 = dst_chunks_4.into_remainder();
    if !dst_u8.is_empty() {
        native::reduce_tail(src_ptr.add(src_x), dst_u8, 0, row_stride, taps);
    }
}

/// Adds products of 8 interleaved pairs of samples by pair of mantissas
/// to two groups of 4 sums.
#[inline(always)]
unsafe fn madd_8_columns(sss: &mut [__m128i], source: __m128i, mmk: __m128i) {
    let zero = _mm_setzero_si128();
    let pix = _mm_unpacklo_epi8(source, zero);
    sss[0] = _mm_add_epi32(sss[0], _mm_madd_epi16(pix, mmk));
    let pix = _mm_unpackhi_epi8(source, zero);
    sss[1] = _mm_add_epi32(sss[1], _mm_madd_epi16(pix, mmk));
}

/// Interleaves 16 bytes of the top and bottom lines and adds their
/// weighted sums to four groups of 4 sums.
#[inline(always)]
unsafe fn madd_16_columns(sss: &mut [__m128i], top: __m128i, bottom: __m128i, mmk: __m128i) {
    madd_8_columns(&mut sss[..2], _mm_unpacklo_epi8(top, bottom), mmk);
    madd_8_columns(&mut sss[2..4], _mm_unpackhi_epi8(top, bottom), mmk);
}

/// Shifts four groups of sums and narrows them into 16 bytes.
#[inline(always)]
unsafe fn pack_16_columns(sss: &[__m128i]) -> __m128i {
    let lo = _mm_packs_epi32(
        _mm_srai_epi32::<SHIFT>(sss[0]),
        _mm_srai_epi32::<SHIFT>(sss[1]),
    );
    let hi = _mm_packs_epi32(
        _mm_srai_epi32::<SHIFT>(sss[2]),
        _mm_srai_epi32::<SHIFT>(sss[3]),
    );
    _mm_packus_epi16(lo, hi)
}

/// Sums one group of 4 bytes and shifts the sums.
#[inline]
#[target_feature(enable = "sse4.1")]
unsafe fn reduce_group(
    src: *const u8,
    row_stride: usize,
    coeffs: &[i16],
    initial: __m128i,
) -> __m128i {
    let mut sss = initial;

    let coeffs_chunks = coeffs.chunks_exact(2);
    let coeffs_reminder = coeffs_chunks.remainder();

    for (i, two_coeffs) in coeffs_chunks.enumerate() {
        // Load two coefficients at once
        let two_coeffs = simd_utils::mm_load_and_clone_i16x2(two_coeffs);

        let row1 = simd_utils::mm_cvtsi32_si128_from_u8(src.add(2 * i * row_stride)); // top line
        let row2 = simd_utils::mm_cvtsi32_si128_from_u8(src.add((2 * i + 1) * row_stride)); // bottom line

        let pixels_u8 = _mm_unpacklo_epi8(row1, row2);
        let pixels_i16 = _mm_unpacklo_epi8(pixels_u8, _mm_setzero_si128());
        sss = _mm_add_epi32(sss, _mm_madd_epi16(pixels_i16, two_coeffs));
    }

    if let Some(&k) = coeffs_reminder.first() {
        let row = src.add((coeffs.len() - 1) * row_stride);
        let pix = simd_utils::mm_cvtepu8_epi32_from_u8(row);
        let mmk = _mm_set1_epi32(k as i32);
        sss = _mm_add_epi32(sss, _mm_madd_epi16(pix, mmk));
    }

    _mm_srai_epi32::<SHIFT>(sss)
}
