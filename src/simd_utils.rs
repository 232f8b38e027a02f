use std::arch::x86_64::*;

#[cfg(feature = "fixed_isa")]
#[inline(always)]
pub unsafe fn loadu_si128(ptr: *const u8) -> __m128i {
    _mm_loadu_si128(ptr as *const __m128i)
}

#[cfg(feature = "fixed_isa")]
#[inline(always)]
pub unsafe fn loadu_si256(ptr: *const u8) -> __m256i {
    _mm256_loadu_si256(ptr as *const __m256i)
}

/// Loads 8 bytes into the lower half of register.
#[inline(always)]
pub unsafe fn loadl_epi64(ptr: *const u8) -> __m128i {
    _mm_loadl_epi64(ptr as *const __m128i)
}

/// Loads 4 bytes into the lowest lane of register.
#[inline(always)]
pub unsafe fn mm_cvtsi32_si128_from_u8(ptr: *const u8) -> __m128i {
    _mm_cvtsi32_si128((ptr as *const i32).read_unaligned())
}

/// Loads 2 bytes into the lowest lane of register.
#[cfg(feature = "fixed_isa")]
#[inline(always)]
pub unsafe fn mm_cvtsi16_si128_from_u8(ptr: *const u8) -> __m128i {
    _mm_cvtsi32_si128((ptr as *const u16).read_unaligned() as i32)
}

/// Loads 4 bytes and zero-extends them into four `i32` lanes.
#[inline(always)]
pub unsafe fn mm_cvtepu8_epi32_from_u8(ptr: *const u8) -> __m128i {
    _mm_cvtepu8_epi32(mm_cvtsi32_si128_from_u8(ptr))
}

/// Packs two mantissas into `i32` lane: `top` into lower half, `bottom` into upper one.
#[inline(always)]
pub fn pack_i16x2(top: i16, bottom: i16) -> i32 {
    (top as u16 as u32 | ((bottom as u16 as u32) << 16)) as i32
}

#[cfg(feature = "fixed_isa")]
#[inline(always)]
pub unsafe fn mm_load_and_clone_i16x2(two_coeffs: &[i16]) -> __m128i {
    debug_assert!(two_coeffs.len() >= 2);
    _mm_set1_epi32(pack_i16x2(two_coeffs[0], two_coeffs[1]))
}

#[cfg(feature = "fixed_isa")]
#[inline(always)]
pub unsafe fn mm256_load_and_clone_i16x2(two_coeffs: &[i16]) -> __m256i {
    debug_assert!(two_coeffs.len() >= 2);
    _mm256_set1_epi32(pack_i16x2(two_coeffs[0], two_coeffs[1]))
}

/// Shift count for `_mm_sra_*`/`_mm256_sra_*` instructions.
#[inline(always)]
pub unsafe fn shift_count(shift: u32) -> __m128i {
    _mm_cvtsi32_si128(shift as i32)
}

/// Narrows four `i32` lanes into `u8` with saturation and stores 4 bytes.
#[inline(always)]
pub unsafe fn store_epi32_as_u8x4(v: __m128i, dst: *mut u8) {
    let v = _mm_packs_epi32(v, v);
    let v = _mm_packus_epi16(v, v);
    (dst as *mut i32).write_unaligned(_mm_cvtsi128_si32(v));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_two_mantissas() {
        assert_eq!(pack_i16x2(1, 0), 1);
        assert_eq!(pack_i16x2(-1, 0), 0xFFFF);
        assert_eq!(pack_i16x2(0, 1), 0x1_0000);
        assert_eq!(pack_i16x2(-2, -1), -2);
    }
}
