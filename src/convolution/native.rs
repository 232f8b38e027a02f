//! Scalar reference implementation. Every vector kernel must
//! reproduce its output for tap sets which fit the kernel accumulator.
use crate::{Rect, Region, RegionMut, TapSet};

pub(crate) fn convolve(out: &mut RegionMut, input: &Region, rect: Rect, ne: usize, taps: &TapSet) {
    let src = input.buffer();
    for y in rect.top..rect.bottom() {
        let p = input.address(rect.left, y);
        let q = out.address(rect.left, y);
        let dst_row = &mut out.buffer_mut()[q..q + ne];
        for (x, dst) in dst_row.iter_mut().enumerate() {
            let mut acc = taps.rounding_bias();
            for (&offset, &k) in taps.offsets().iter().zip(taps.mantissas()) {
                let index = (p + x) as isize + offset as isize;
                acc += k as i32 * src[index as usize] as i32;
            }
            *dst = taps.finish(acc);
        }
    }
}

/// Convolves columns `start..end` of one row, addressed by raw pointers.
/// Used for columns left over by vector kernels.
///
/// # Safety
/// `p + x + offset` must be readable and `q + x` writable
/// for every `x` in `start..end` and every offset of `taps`.
#[inline(always)]
pub(crate) unsafe fn convolve_tail(
    p: *const u8,
    q: *mut u8,
    start: usize,
    end: usize,
    taps: &TapSet,
) {
    for x in start..end {
        let mut acc = taps.rounding_bias();
        for (&offset, &k) in taps.offsets().iter().zip(taps.mantissas()) {
            let src = p.offset(x as isize + offset as isize);
            acc += k as i32 * (*src as i32);
        }
        *q.add(x) = taps.finish(acc);
    }
}
