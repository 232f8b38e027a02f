use std::arch::aarch64::*;

use super::Backend;
use crate::neon_utils;

/// Four `i32` lanes of Neon register.
///
/// Neon has no fused pair multiply-add, so samples of every row are
/// promoted to `i16` separately and accumulated with `vmlal`.
/// Nothing has to be merged afterward.
pub(crate) struct Neon;

impl Backend for Neon {
    const LANES: usize = 4;

    type Acc = int32x4_t;
    type Pix = (int16x4_t, int16x4_t);
    type Coef = (i16, i16);

    #[inline(always)]
    unsafe fn splat(v: i32) -> int32x4_t {
        vdupq_n_s32(v)
    }

    #[inline(always)]
    unsafe fn coef_pair(top: i16, bottom: i16) -> Self::Coef {
        (top, bottom)
    }

    #[inline(always)]
    unsafe fn coef_single(k: i16) -> Self::Coef {
        (k, 0)
    }

    #[inline(always)]
    unsafe fn load_pair(top: *const u8, bottom: *const u8) -> Self::Pix {
        (
            neon_utils::load_u8x4_as_i16x4(top),
            neon_utils::load_u8x4_as_i16x4(bottom),
        )
    }

    #[inline(always)]
    unsafe fn load_single(ptr: *const u8) -> Self::Pix {
        (neon_utils::load_u8x4_as_i16x4(ptr), vdup_n_s16(0))
    }

    #[inline(always)]
    unsafe fn mul_acc(acc: int32x4_t, pix: Self::Pix, coef: Self::Coef) -> int32x4_t {
        let acc = vmlal_n_s16(acc, pix.0, coef.0);
        vmlal_n_s16(acc, pix.1, coef.1)
    }

    #[inline(always)]
    unsafe fn merge(acc: int32x4_t) -> int32x4_t {
        acc
    }

    #[inline(always)]
    unsafe fn shift_right(acc: int32x4_t, shift: u32) -> int32x4_t {
        vshlq_s32(acc, vdupq_n_s32(-(shift as i32)))
    }

    #[inline(always)]
    unsafe fn add(a: int32x4_t, b: int32x4_t) -> int32x4_t {
        vaddq_s32(a, b)
    }

    #[inline(always)]
    unsafe fn store_u8(acc: int32x4_t, dst: *mut u8) {
        neon_utils::store_i32x4_as_u8x4(acc, dst);
    }
}
