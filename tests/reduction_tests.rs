use fast_int_convolution::{ReductionTaps, INTERPOLATE_SCALE};
use testing::{all_kernels, interesting_widths, kernels_name, noise};


const SENTINEL: u8 = 0xAA;

fn reduce(
    kernels: &fast_int_convolution::Kernels,
    src: &[u8],
    ne: usize,
    row_stride: usize,
    taps: &ReductionTaps,
) -> Vec<u8> {
    // One extra byte to check that nothing is written after `ne`
    let mut dst = vec![SENTINEL; ne + 1];
    kernels.reduce_vertical(&mut dst, src, ne, row_stride, taps);
    assert_eq!(dst[ne], SENTINEL, "{}", kernels_name(kernels));
    dst.truncate(ne);
    dst
}

#[test]
fn single_row_with_unit_weight_is_copied() {
    let taps = ReductionTaps::new(vec![INTERPOLATE_SCALE as i16]).unwrap();
    for ne in interesting_widths() {
        let src = noise(ne, ne as u32);
        for kernels in all_kernels() {
            let res = reduce(&kernels, &src, ne, ne, &taps);
            assert_eq!(res, src, "{} ne={}", kernels_name(&kernels), ne);
        }
    }
}

#[test]
fn all_kernels_match_reference() {
    let tap_sets = [
        vec![2048, 2048],
        vec![1365, 1366, 1365],
        vec![-512, 2560, 2560, -512],
        vec![300, 700, 1100, 900, 696, 400],
        vec![4096, -4096, 2048, 1024, 1024],
    ];
    let reference = testing::reference_kernels();
    for mantissas in tap_sets {
        let taps = ReductionTaps::new(mantissas).unwrap();
        for ne in interesting_widths() {
            let row_stride = ne + 5;
            let src = noise(row_stride * taps.len(), ne as u32 + 1);
            let expected = reduce(&reference, &src, ne, row_stride, &taps);
            for kernels in all_kernels() {
                let res = reduce(&kernels, &src, ne, row_stride, &taps);
                assert_eq!(
                    res,
                    expected,
                    "{} ne={} taps={:?}",
                    kernels_name(&kernels),
                    ne,
                    taps.mantissas()
                );
            }
        }
    }
}

#[test]
fn box_filter_is_close_to_mean() {
    let ne = 77;
    for factor in 1..=5usize {
        let weights = vec![1. / factor as f64; factor];
        let taps = ReductionTaps::from_weights(&weights).unwrap();
        let src = noise(ne * factor, factor as u32);
        for kernels in all_kernels() {
            let res = reduce(&kernels, &src, ne, ne, &taps);
            for (x, &value) in res.iter().enumerate() {
                let mean = (0..factor).map(|i| src[i * ne + x] as f64).sum::<f64>() / factor as f64;
                assert!(
                    (value as f64 - mean).abs() <= 1.,
                    "{} factor={} x={}: {} vs {}",
                    kernels_name(&kernels),
                    factor,
                    x,
                    value,
                    mean
                );
            }
        }
    }
}

#[test]
fn exact_halves_round_up() {
    let taps = ReductionTaps::new(vec![2048, 2048]).unwrap();
    let ne = 40;
    let mut src = vec![0u8; ne * 2];
    for x in 0..ne {
        src[x] = x as u8;
        src[ne + x] = x as u8 + 1;
    }
    let expected: Vec<u8> = (0..ne).map(|x| x as u8 + 1).collect();
    for kernels in all_kernels() {
        assert_eq!(reduce(&kernels, &src, ne, ne, &taps), expected);
    }
}

#[test]
fn output_is_saturated() {
    let ne = 45;
    let src = vec![200u8; ne * 2];
    let positive = ReductionTaps::new(vec![4096, 4096]).unwrap();
    let negative = ReductionTaps::new(vec![-4096, 2048]).unwrap();
    for kernels in all_kernels() {
        assert!(reduce(&kernels, &src, ne, ne, &positive).iter().all(|&v| v == 255));
        assert!(reduce(&kernels, &src, ne, ne, &negative).iter().all(|&v| v == 0));
    }
}

#[test]
fn result_does_not_depend_on_alignment() {
    let ne = 61;
    let taps = ReductionTaps::new(vec![1000, 2096, 1000]).unwrap();
    let src = noise(ne * 3, 9);
    for kernels in all_kernels() {
        let expected = reduce(&kernels, &src, ne, ne, &taps);
        for shift in 1..8 {
            let mut shifted = vec![0u8; shift];
            shifted.extend_from_slice(&src);
            let res = reduce(&kernels, &shifted[shift..], ne, ne, &taps);
            assert_eq!(res, expected, "{} shift={}", kernels_name(&kernels), shift);
        }
    }
}

#[test]
#[should_panic]
fn source_is_too_short() {
    let taps = ReductionTaps::new(vec![2048, 2048]).unwrap();
    let src = [0u8; 19];
    let mut dst = [0u8; 10];
    fast_int_convolution::reduce_vertical(&mut dst, &src, 10, 10, &taps);
}

#[test]
#[should_panic]
fn destination_is_too_short() {
    let taps = ReductionTaps::new(vec![4096]).unwrap();
    let src = [0u8; 10];
    let mut dst = [0u8; 9];
    fast_int_convolution::reduce_vertical(&mut dst, &src, 10, 10, &taps);
}
