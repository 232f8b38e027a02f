use std::arch::x86_64::*;

use super::Backend;
use crate::simd_utils;

/// Eight `i32` lanes of AVX2 register.
pub(crate) struct Avx2;

impl Backend for Avx2 {
    const LANES: usize = 8;

    type Acc = __m256i;
    type Pix = __m256i;
    type Coef = __m256i;

    #[inline(always)]
    unsafe fn splat(v: i32) -> __m256i {
        _mm256_set1_epi32(v)
    }

    #[inline(always)]
    unsafe fn coef_pair(top: i16, bottom: i16) -> __m256i {
        _mm256_set1_epi32(simd_utils::pack_i16x2(top, bottom))
    }

    #[inline(always)]
    unsafe fn coef_single(k: i16) -> __m256i {
        _mm256_set1_epi32(k as i32)
    }

    #[inline(always)]
    unsafe fn load_pair(top: *const u8, bottom: *const u8) -> __m256i {
        let top = simd_utils::loadl_epi64(top);
        let bottom = simd_utils::loadl_epi64(bottom);
        // Zero-extension across 128-bit lanes keeps samples in order,
        // unlike `_mm256_unpack*`.
        _mm256_cvtepu8_epi16(_mm_unpacklo_epi8(top, bottom))
    }

    #[inline(always)]
    unsafe fn load_single(ptr: *const u8) -> __m256i {
        _mm256_cvtepu8_epi32(simd_utils::loadl_epi64(ptr))
    }

    #[inline(always)]
    unsafe fn mul_acc(acc: __m256i, pix: __m256i, coef: __m256i) -> __m256i {
        _mm256_add_epi32(acc, _mm256_madd_epi16(pix, coef))
    }

    #[inline(always)]
    unsafe fn merge(acc: __m256i) -> __m256i {
        acc
    }

    #[inline(always)]
    unsafe fn shift_right(acc: __m256i, shift: u32) -> __m256i {
        _mm256_sra_epi32(acc, simd_utils::shift_count(shift))
    }

    #[inline(always)]
    unsafe fn add(a: __m256i, b: __m256i) -> __m256i {
        _mm256_add_epi32(a, b)
    }

    #[inline(always)]
    unsafe fn store_u8(acc: __m256i, dst: *mut u8) {
        let lo = _mm256_castsi256_si128(acc);
        let hi = _mm256_extracti128_si256::<1>(acc);
        let v = _mm_packs_epi32(lo, hi);
        let v = _mm_packus_epi16(v, v);
        _mm_storel_epi64(dst as *mut __m128i, v);
    }
}
