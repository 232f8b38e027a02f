use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

use fast_int_convolution::{Rect, ReductionTaps, Region, RegionMut, TapSet};
use testing::{exact_kernels, kernels_name};


#[quickcheck]
fn convolution_kernels_agree(
    pixels: Vec<u8>,
    mantissas: Vec<i8>,
    exponent: u8,
    output_offset: i8,
) -> TestResult {
    let width = pixels.len();
    let exponent = exponent as u32 % 16 + 1;
    if width < 3 || mantissas.is_empty() || mantissas.len() > width - 2 {
        return TestResult::discard();
    }
    // Horizontal taps centred on the current byte
    let half = (mantissas.len() / 2) as i32;
    let offsets: Vec<i32> = (0..mantissas.len() as i32).map(|i| i - half).collect();
    let mantissas: Vec<i16> = mantissas.into_iter().map(|m| m as i16).collect();
    let taps = TapSet::new(offsets, mantissas, exponent, output_offset as i32).unwrap();

    let (min_offset, max_offset) = taps.offset_range();
    let left = -min_offset;
    let ne = (width as i32 - max_offset - left) as usize;
    if ne == 0 {
        return TestResult::discard();
    }
    let valid = Rect::new(0, 0, width as u32, 1);
    let input = Region::from_slice(valid, 1, &pixels).unwrap();
    let rect = Rect::new(left, 0, ne as u32, 1);

    let mut expected = RegionMut::new(valid, 1).unwrap();
    testing::reference_kernels().convolve(&mut expected, &input, rect, ne, &taps);

    for kernels in exact_kernels(&taps) {
        let mut out = RegionMut::new(valid, 1).unwrap();
        kernels.convolve(&mut out, &input, rect, ne, &taps);
        if out.buffer() != expected.buffer() {
            return TestResult::error(format!("{} differs", kernels_name(&kernels)));
        }
    }
    TestResult::passed()
}

#[quickcheck]
fn reduction_kernels_agree(pixels: Vec<u8>, mantissas: Vec<i16>) -> TestResult {
    let rows = mantissas.len();
    if rows == 0 || rows > 8 || pixels.len() < rows {
        return TestResult::discard();
    }
    // Keep the sum inside of i32
    let mantissas: Vec<i16> = mantissas.into_iter().map(|m| m / 4).collect();
    let taps = ReductionTaps::new(mantissas).unwrap();
    let row_stride = pixels.len() / rows;
    let ne = row_stride;

    let mut expected = vec![0u8; ne];
    testing::reference_kernels().reduce_vertical(&mut expected, &pixels, ne, row_stride, &taps);

    for kernels in testing::all_kernels() {
        let mut dst = vec![0u8; ne];
        kernels.reduce_vertical(&mut dst, &pixels, ne, row_stride, &taps);
        if dst != expected {
            return TestResult::error(format!("{} differs", kernels_name(&kernels)));
        }
    }
    TestResult::passed()
}
