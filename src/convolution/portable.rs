//! Vector kernel written once against [Backend] and compiled
//! for every supported instruction set.
use super::native;
use crate::simd::{self, Backend};
use crate::{CpuExtensions, Rect, Region, RegionMut, TapSet};

pub(crate) fn convolve(
    out: &mut RegionMut,
    input: &Region,
    rect: Rect,
    ne: usize,
    taps: &TapSet,
    cpu_extensions: CpuExtensions,
) {
    match cpu_extensions {
        #[cfg(target_arch = "x86_64")]
        CpuExtensions::Avx2 => unsafe { convolve_avx2(out, input, rect, ne, taps) },
        #[cfg(target_arch = "x86_64")]
        CpuExtensions::Sse4_1 => unsafe { convolve_sse41(out, input, rect, ne, taps) },
        #[cfg(target_arch = "aarch64")]
        CpuExtensions::Neon => unsafe { convolve_neon(out, input, rect, ne, taps) },
        CpuExtensions::None => unsafe {
            convolve_rows::<simd::Emu128>(out, input, rect, ne, taps)
        },
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn convolve_avx2(out: &mut RegionMut, input: &Region, rect: Rect, ne: usize, taps: &TapSet) {
    convolve_rows::<simd::Avx2>(out, input, rect, ne, taps);
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse4.1")]
unsafe fn convolve_sse41(
    out: &mut RegionMut,
    input: &Region,
    rect: Rect,
    ne: usize,
    taps: &TapSet,
) {
    convolve_rows::<simd::Sse41>(out, input, rect, ne, taps);
}

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn convolve_neon(out: &mut RegionMut, input: &Region, rect: Rect, ne: usize, taps: &TapSet) {
    convolve_rows::<simd::Neon>(out, input, rect, ne, taps);
}

/// # Safety
/// Regions must pass `check_safety_conditions()` for given arguments and
/// the CPU must support instructions used by `B`.
#[inline(always)]
unsafe fn convolve_rows<B: Backend>(
    out: &mut RegionMut,
    input: &Region,
    rect: Rect,
    ne: usize,
    taps: &TapSet,
) {
    let offsets = taps.offsets();
    let mantissas = taps.mantissas();
    let exponent = taps.exponent();
    let initial = B::splat(taps.rounding_bias());
    let output_offset = B::splat(taps.output_offset());

    let src_ptr = input.as_ptr();
    let dst_ptr = out.as_mut_ptr();

    for y in rect.top..rect.bottom() {
        let p = src_ptr.add(input.address(rect.left, y));
        let q = dst_ptr.add(out.address(rect.left, y));

        let mut x = 0;
        while x + B::LANES <= ne {
            let mut sum = initial;
            let src = p.add(x);

            // Two taps per multiply-accumulate
            let coeffs_chunks = mantissas.chunks_exact(2);
            let coeffs_reminder = coeffs_chunks.remainder();
            for (two_coeffs, two_offsets) in coeffs_chunks.zip(offsets.chunks_exact(2)) {
                let mmk = B::coef_pair(two_coeffs[0], two_coeffs[1]);
                let pix = B::load_pair(
                    src.offset(two_offsets[0] as isize), // top line
                    src.offset(two_offsets[1] as isize), // bottom line
                );
                sum = B::mul_acc(sum, pix, mmk);
            }
            if let Some(&k) = coeffs_reminder.first() {
                let offset = offsets[offsets.len() - 1];
                let pix = B::load_single(src.offset(offset as isize));
                sum = B::mul_acc(sum, pix, B::coef_single(k));
            }

            // The final 32->8 conversion
            sum = B::merge(sum);
            sum = B::add(B::shift_right(sum, exponent), output_offset);
            B::store_u8(sum, q.add(x));

            x += B::LANES;
        }

        // `ne` was not a multiple of the vector length
        native::convolve_tail(p, q, x, ne, taps);
    }
}
