//! Hand-written SSE4.1 kernel with saturating 16-bit accumulators.
//!
//! `pmaddwd` products of every pair of taps are narrowed to `i16` with
//! saturation and summed with `paddsw`. While every partial sum fits into
//! `i16` (see [TapSet::fits_i16_accumulator]) the result equals the one of
//! the 32-bit kernels. Otherwise the accumulator saturates earlier than
//! the final clamp does, and the output may differ.
//!
//! Rows are processed by blocks of 16 columns with full 128-bit loads,
//! then by blocks of 8 and 2 columns, and the last column alone.
use std::arch::x86_64::*;

use crate::simd_utils;
use crate::{Rect, Region, RegionMut, TapSet};

/// The rounding bias `1 << (exponent - 1)` must fit into `i16`.
pub(crate) const MAX_EXPONENT: u32 = 15;

/// # Safety
/// Regions must pass `check_safety_conditions()` for given arguments,
/// `taps.exponent()` must not exceed [MAX_EXPONENT] and
/// the CPU must support SSE4.1.
#[target_feature(enable = "sse4.1")]
pub(crate) unsafe fn convolve(
    out: &mut RegionMut,
    input: &Region,
    rect: Rect,
    ne: usize,
    taps: &TapSet,
) {
    debug_assert!(taps.exponent() <= MAX_EXPONENT);

    let src_ptr = input.as_ptr();
    let dst_ptr = out.as_mut_ptr();

    for y in rect.top..rect.bottom() {
        let p = src_ptr.add(input.address(rect.left, y));
        let q = dst_ptr.add(out.address(rect.left, y));
        convolve_row(p, q, ne, taps);
    }
}

#[inline]
#[target_feature(enable = "sse4.1")]
unsafe fn convolve_row(p: *const u8, q: *mut u8, ne: usize, taps: &TapSet) {
    let offsets = taps.offsets();
    let mantissas = taps.mantissas();
    let shift = simd_utils::shift_count(taps.exponent());
    let initial = _mm_set1_epi16(taps.rounding_bias() as i16);
    let output_offset = _mm_set1_epi16(taps.output_offset() as i16);
    let zero = _mm_setzero_si128();

    let coeffs_chunks = mantissas.chunks_exact(2);
    let coeffs_reminder = coeffs_chunks.remainder();
    let last_offset = offsets[offsets.len() - 1] as isize;

    let mut x: usize = 0;

    // 16 columns, full 128-bit loads
    while x + 16 <= ne {
        let src = p.add(x);
        let mut sss0 = initial; // left half
        let mut sss1 = initial; // right half

        for (two_coeffs, two_offsets) in coeffs_chunks.clone().zip(offsets.chunks_exact(2)) {
            // Load two coefficients at once
            let mmk = simd_utils::mm_load_and_clone_i16x2(two_coeffs);

            let source1 = simd_utils::loadu_si128(src.offset(two_offsets[0] as isize)); // top line
            let source2 = simd_utils::loadu_si128(src.offset(two_offsets[1] as isize)); // bottom line

            let source = _mm_unpacklo_epi8(source1, source2);
            sss0 = madd_adds_epi16(sss0, source, mmk, zero);
            let source = _mm_unpackhi_epi8(source1, source2);
            sss1 = madd_adds_epi16(sss1, source, mmk, zero);
        }
        if let Some(&k) = coeffs_reminder.first() {
            let mmk = _mm_set1_epi32(k as i32);
            let source1 = simd_utils::loadu_si128(src.offset(last_offset)); // top line

            let source = _mm_unpacklo_epi8(source1, zero);
            sss0 = madd_adds_epi16(sss0, source, mmk, zero);
            let source = _mm_unpackhi_epi8(source1, zero);
            sss1 = madd_adds_epi16(sss1, source, mmk, zero);
        }

        // The final 16->8 conversion
        sss0 = _mm_adds_epi16(_mm_sra_epi16(sss0, shift), output_offset);
        sss1 = _mm_adds_epi16(_mm_sra_epi16(sss1, shift), output_offset);
        _mm_storeu_si128(q.add(x) as *mut __m128i, _mm_packus_epi16(sss0, sss1));

        x += 16;
    }

    // 8 columns, 64-bit loads
    while x + 8 <= ne {
        let src = p.add(x);
        let sss = accumulate_partial(src, taps, initial, zero, simd_utils::loadl_epi64);
        let sss = _mm_adds_epi16(_mm_sra_epi16(sss, shift), output_offset);
        _mm_storel_epi64(q.add(x) as *mut __m128i, _mm_packus_epi16(sss, sss));
        x += 8;
    }

    // 2 columns, 16-bit loads
    while x + 2 <= ne {
        let src = p.add(x);
        let sss = accumulate_partial(
            src,
            taps,
            initial,
            zero,
            simd_utils::mm_cvtsi16_si128_from_u8,
        );
        let sss = _mm_adds_epi16(_mm_sra_epi16(sss, shift), output_offset);
        let packed = _mm_packus_epi16(sss, sss);
        (q.add(x) as *mut u16).write_unaligned(_mm_extract_epi16::<0>(packed) as u16);
        x += 2;
    }

    // Last column, one byte
    if x < ne {
        let src = p.add(x);
        let sss = accumulate_partial(src, taps, initial, zero, load_one_u8);
        let sss = _mm_adds_epi16(_mm_sra_epi16(sss, shift), output_offset);
        *q.add(x) = _mm_cvtsi128_si32(_mm_packus_epi16(sss, sss)) as u8;
    }
}

/// Accumulates up to 8 columns loaded by `load` into `i16` lanes.
#[inline(always)]
unsafe fn accumulate_partial(
    src: *const u8,
    taps: &TapSet,
    initial: __m128i,
    zero: __m128i,
    load: unsafe fn(*const u8) -> __m128i,
) -> __m128i {
    let offsets = taps.offsets();
    let coeffs_chunks = taps.mantissas().chunks_exact(2);
    let coeffs_reminder = coeffs_chunks.remainder();
    let mut sss = initial;

    for (two_coeffs, two_offsets) in coeffs_chunks.zip(offsets.chunks_exact(2)) {
        // Load two coefficients at once
        let mmk = simd_utils::mm_load_and_clone_i16x2(two_coeffs);

        let source1 = load(src.offset(two_offsets[0] as isize)); // top line
        let source2 = load(src.offset(two_offsets[1] as isize)); // bottom line

        let source = _mm_unpacklo_epi8(source1, source2);
        sss = madd_adds_epi16(sss, source, mmk, zero);
    }
    if let Some(&k) = coeffs_reminder.first() {
        let mmk = _mm_set1_epi32(k as i32);
        let source1 = load(src.offset(offsets[offsets.len() - 1] as isize));
        let source = _mm_unpacklo_epi8(source1, zero);
        sss = madd_adds_epi16(sss, source, mmk, zero);
    }
    sss
}

/// Multiplies 8 interleaved pairs of samples by pair of mantissas and
/// adds the sums to 8 `i16` lanes of `acc` with saturation.
#[inline(always)]
unsafe fn madd_adds_epi16(acc: __m128i, source: __m128i, mmk: __m128i, zero: __m128i) -> __m128i {
    let pix = _mm_unpacklo_epi8(source, zero);
    let lo = _mm_madd_epi16(pix, mmk);
    let pix = _mm_unpackhi_epi8(source, zero);
    let hi = _mm_madd_epi16(pix, mmk);
    _mm_adds_epi16(acc, _mm_packs_epi32(lo, hi))
}

#[inline(always)]
unsafe fn load_one_u8(ptr: *const u8) -> __m128i {
    _mm_cvtsi32_si128(*ptr as i32)
}
