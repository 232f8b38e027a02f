use std::arch::x86_64::*;

use super::Backend;
use crate::simd_utils;

/// Four `i32` lanes of SSE4.1 register.
///
/// `pmaddwd` multiplies interleaved top/bottom samples by packed pair of
/// mantissas and adds products horizontally, so one accumulator is enough.
pub(crate) struct Sse41;

impl Backend for Sse41 {
    const LANES: usize = 4;

    type Acc = __m128i;
    type Pix = __m128i;
    type Coef = __m128i;

    #[inline(always)]
    unsafe fn splat(v: i32) -> __m128i {
        _mm_set1_epi32(v)
    }

    #[inline(always)]
    unsafe fn coef_pair(top: i16, bottom: i16) -> __m128i {
        _mm_set1_epi32(simd_utils::pack_i16x2(top, bottom))
    }

    #[inline(always)]
    unsafe fn coef_single(k: i16) -> __m128i {
        _mm_set1_epi32(k as i32)
    }

    #[inline(always)]
    unsafe fn load_pair(top: *const u8, bottom: *const u8) -> __m128i {
        let top = simd_utils::mm_cvtsi32_si128_from_u8(top);
        let bottom = simd_utils::mm_cvtsi32_si128_from_u8(bottom);
        _mm_cvtepu8_epi16(_mm_unpacklo_epi8(top, bottom))
    }

    #[inline(always)]
    unsafe fn load_single(ptr: *const u8) -> __m128i {
        simd_utils::mm_cvtepu8_epi32_from_u8(ptr)
    }

    #[inline(always)]
    unsafe fn mul_acc(acc: __m128i, pix: __m128i, coef: __m128i) -> __m128i {
        _mm_add_epi32(acc, _mm_madd_epi16(pix, coef))
    }

    #[inline(always)]
    unsafe fn merge(acc: __m128i) -> __m128i {
        acc
    }

    #[inline(always)]
    unsafe fn shift_right(acc: __m128i, shift: u32) -> __m128i {
        _mm_sra_epi32(acc, simd_utils::shift_count(shift))
    }

    #[inline(always)]
    unsafe fn add(a: __m128i, b: __m128i) -> __m128i {
        _mm_add_epi32(a, b)
    }

    #[inline(always)]
    unsafe fn store_u8(acc: __m128i, dst: *mut u8) {
        simd_utils::store_epi32_as_u8x4(acc, dst);
    }
}
