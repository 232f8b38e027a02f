use crate::ReductionTaps;

pub(crate) fn reduce_vertical(
    dst: &mut [u8],
    src: &[u8],
    ne: usize,
    row_stride: usize,
    taps: &ReductionTaps,
) {
    for (x, dst) in dst[..ne].iter_mut().enumerate() {
        let mut acc = ReductionTaps::rounding_bias();
        for (i, &k) in taps.mantissas().iter().enumerate() {
            acc += k as i32 * src[i * row_stride + x] as i32;
        }
        *dst = ReductionTaps::finish(acc);
    }
}

/// Reduces columns `start..dst.len()`. Used for columns left over
/// by vector kernels.
///
/// # Safety
/// `src + i * row_stride + x` must be readable for every column `x`
/// and every tap `i`.
#[inline(always)]
pub(crate) unsafe fn reduce_tail(
    src: *const u8,
    dst: &mut [u8],
    start: usize,
    row_stride: usize,
    taps: &ReductionTaps,
) {
    for (x, dst) in dst.iter_mut().enumerate().skip(start) {
        let mut acc = ReductionTaps::rounding_bias();
        for (i, &k) in taps.mantissas().iter().enumerate() {
            let pix = *src.add(i * row_stride + x);
            acc += k as i32 * pix as i32;
        }
        *dst = ReductionTaps::finish(acc);
    }
}
