use super::native;
use crate::simd::{self, Backend};
use crate::{CpuExtensions, ReductionTaps, INTERPOLATE_SHIFT};

pub(crate) fn reduce_vertical(
    dst: &mut [u8],
    src: &[u8],
    ne: usize,
    row_stride: usize,
    taps: &ReductionTaps,
    cpu_extensions: CpuExtensions,
) {
    let dst = &mut dst[..ne];
    match cpu_extensions {
        #[cfg(target_arch = "x86_64")]
        CpuExtensions::Avx2 => unsafe { reduce_avx2(dst, src, row_stride, taps) },
        #[cfg(target_arch = "x86_64")]
        CpuExtensions::Sse4_1 => unsafe { reduce_sse41(dst, src, row_stride, taps) },
        #[cfg(target_arch = "aarch64")]
        CpuExtensions::Neon => unsafe { reduce_neon(dst, src, row_stride, taps) },
        CpuExtensions::None => unsafe {
            reduce_row::<simd::Emu128>(dst, src, row_stride, taps)
        },
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn reduce_avx2(dst: &mut [u8], src: &[u8], row_stride: usize, taps: &ReductionTaps) {
    reduce_row::<simd::Avx2>(dst, src, row_stride, taps);
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse4.1")]
unsafe fn reduce_sse41(dst: &mut [u8], src: &[u8], row_stride: usize, taps: &ReductionTaps) {
    reduce_row::<simd::Sse41>(dst, src, row_stride, taps);
}

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn reduce_neon(dst: &mut [u8], src: &[u8], row_stride: usize, taps: &ReductionTaps) {
    reduce_row::<simd::Neon>(dst, src, row_stride, taps);
}

/// # Safety
/// `src` must hold `taps.len()` rows of `dst.len()` bytes
/// and the CPU must support instructions used by `B`.
#[inline(always)]
unsafe fn reduce_row<B: Backend>(
    dst: &mut [u8],
    src: &[u8],
    row_stride: usize,
    taps: &ReductionTaps,
) {
    let ne = dst.len();
    let coeffs = taps.mantissas();
    let initial = B::splat(ReductionTaps::rounding_bias());
    let src_ptr = src.as_ptr();
    let dst_ptr = dst.as_mut_ptr();

    let mut x = 0;
    while x + B::LANES <= ne {
        let mut sum = initial;
        let src = src_ptr.add(x);

        let coeffs_chunks = coeffs.chunks_exact(2);
        let coeffs_reminder = coeffs_chunks.remainder();
        for (i, two_coeffs) in coeffs_chunks.enumerate() {
            let mmk = B::coef_pair(two_coeffs[0], two_coeffs[1]);
            let pix = B::load_pair(
                src.add(2 * i * row_stride),       // top line
                src.add((2 * i + 1) * row_stride), // bottom line
            );
            sum = B::mul_acc(sum, pix, mmk);
        }
        if let Some(&k) = coeffs_reminder.first() {
            let last_row = src.add((coeffs.len() - 1) * row_stride);
            sum = B::mul_acc(sum, B::load_single(last_row), B::coef_single(k));
        }

        sum = B::shift_right(B::merge(sum), INTERPOLATE_SHIFT);
        B::store_u8(sum, dst_ptr.add(x));

        x += B::LANES;
    }

    native::reduce_tail(src_ptr, dst, x, row_stride, taps);
}
