//! General 2D convolution over a sparse set of taps.
use crate::{CpuExtensions, Implementation, Rect, Region, RegionMut, TapSet};

pub(crate) mod native;
pub(crate) mod portable;
#[cfg(all(target_arch = "x86_64", feature = "fixed_isa"))]
pub(crate) mod sse4;

pub(crate) fn convolve(
    out: &mut RegionMut,
    input: &Region,
    rect: Rect,
    ne: usize,
    taps: &TapSet,
    cpu_extensions: CpuExtensions,
    implementation: Implementation,
) {
    if rect.height == 0 || ne == 0 {
        return;
    }
    check_safety_conditions(out, input, rect, ne, taps);

    match implementation {
        Implementation::Reference => native::convolve(out, input, rect, ne, taps),
        #[cfg(all(target_arch = "x86_64", feature = "fixed_isa"))]
        Implementation::FixedIsa if taps.exponent() <= sse4::MAX_EXPONENT => unsafe {
            sse4::convolve(out, input, rect, ne, taps)
        },
        _ => portable::convolve(out, input, rect, ne, taps, cpu_extensions),
    }
}

/// Kernels read and write through raw pointers without bounds checks.
/// Every byte they may touch is verified here once per call.
fn check_safety_conditions(
    out: &RegionMut,
    input: &Region,
    rect: Rect,
    ne: usize,
    taps: &TapSet,
) {
    let last_y = rect.bottom() - 1;

    let first_q = out.try_address(rect.left, rect.top);
    let last_q = out.try_address(rect.left, last_y);
    assert!(
        first_q.is_some() && last_q.is_some_and(|q| q + ne <= out.buffer().len()),
        "Rows {}..{} of width {} are out of the destination region {:?}",
        rect.top,
        rect.bottom(),
        ne,
        out.valid()
    );

    let (min_offset, max_offset) = taps.offset_range();
    let first_p = input.try_address(rect.left, rect.top);
    let last_p = input.try_address(rect.left, last_y);
    let in_bounds = match (first_p, last_p) {
        (Some(first), Some(last)) => {
            let lowest = first as i64 + min_offset as i64;
            let highest = last as i64 + ne as i64 - 1 + max_offset as i64;
            lowest >= 0 && highest < input.buffer().len() as i64
        }
        _ => false,
    };
    assert!(
        in_bounds,
        "Offsets {}..={} of taps reach out of the source region {:?}",
        min_offset,
        max_offset,
        input.valid()
    );
}
