//! Weighted sum of `n` consecutive rows into one output row,
//! rounded and scaled down by [INTERPOLATE_SHIFT](crate::INTERPOLATE_SHIFT).
use crate::{CpuExtensions, Implementation, ReductionTaps};

#[cfg(all(target_arch = "x86_64", feature = "fixed_isa"))]
mod avx2;
pub(crate) mod native;
pub(crate) mod portable;
#[cfg(all(target_arch = "x86_64", feature = "fixed_isa"))]
mod sse4;

pub(crate) fn reduce_vertical(
    dst: &mut [u8],
    src: &[u8],
    ne: usize,
    row_stride: usize,
    taps: &ReductionTaps,
    cpu_extensions: CpuExtensions,
    implementation: Implementation,
) {
    if ne == 0 {
        return;
    }
    check_safety_conditions(dst, src, ne, row_stride, taps);

    match implementation {
        Implementation::Reference => native::reduce_vertical(dst, src, ne, row_stride, taps),
        #[cfg(all(target_arch = "x86_64", feature = "fixed_isa"))]
        Implementation::FixedIsa => match cpu_extensions {
            CpuExtensions::Avx2 => unsafe {
                avx2::reduce_vertical(&mut dst[..ne], src, row_stride, taps)
            },
            CpuExtensions::Sse4_1 => unsafe {
                sse4::reduce_vertical(&mut dst[..ne], src, row_stride, taps)
            },
            CpuExtensions::None => {
                portable::reduce_vertical(dst, src, ne, row_stride, taps, cpu_extensions)
            }
        },
        _ => portable::reduce_vertical(dst, src, ne, row_stride, taps, cpu_extensions),
    }
}

fn check_safety_conditions(
    dst: &[u8],
    src: &[u8],
    ne: usize,
    row_stride: usize,
    taps: &ReductionTaps,
) {
    assert!(
        dst.len() >= ne,
        "Destination row has {} bytes, {} required",
        dst.len(),
        ne
    );
    let required = (taps.len() - 1)
        .checked_mul(row_stride)
        .and_then(|v| v.checked_add(ne));
    assert!(
        required.is_some_and(|v| v <= src.len()),
        "{} rows with stride {} and width {} are out of the source buffer of {} bytes",
        taps.len(),
        row_stride,
        ne,
        src.len()
    );
}
