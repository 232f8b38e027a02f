use std::arch::aarch64::*;

/// Loads 4 bytes into the lower half of register.
#[inline(always)]
pub unsafe fn load_u8x4(ptr: *const u8) -> uint8x8_t {
    let v = (ptr as *const u32).read_unaligned();
    vcreate_u8(v as u64)
}

/// Loads 4 bytes and zero-extends them into four `i16` lanes.
#[inline(always)]
pub unsafe fn load_u8x4_as_i16x4(ptr: *const u8) -> int16x4_t {
    let v = vmovl_u8(load_u8x4(ptr));
    vreinterpret_s16_u16(vget_low_u16(v))
}

/// Narrows four `i32` lanes into `u8` with saturation and stores 4 bytes.
#[inline(always)]
pub unsafe fn store_i32x4_as_u8x4(v: int32x4_t, dst: *mut u8) {
    let v_u16 = vqmovun_s32(v);
    let v_u8 = vqmovn_u16(vcombine_u16(v_u16, v_u16));
    let bytes = vget_lane_u32::<0>(vreinterpret_u32_u8(v_u8));
    (dst as *mut u32).write_unaligned(bytes);
}
