use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use fast_int_convolution::{
    CpuExtensions, Implementation, Kernels, Rect, ReductionTaps, Region, RegionMut, TapSet,
};

const WIDTH: u32 = 1920;
const HEIGHT: u32 = 1080;

fn cpu_ext_into_str(cpu_extensions: CpuExtensions) -> &'static str {
    match cpu_extensions {
        CpuExtensions::None => "native",
        #[cfg(target_arch = "x86_64")]
        CpuExtensions::Sse4_1 => "sse41",
        #[cfg(target_arch = "x86_64")]
        CpuExtensions::Avx2 => "avx2",
        #[cfg(target_arch = "aarch64")]
        CpuExtensions::Neon => "neon",
    }
}

fn kernels_list() -> Vec<Kernels> {
    let mut res = vec![];
    for &cpu_extensions in CpuExtensions::all() {
        for implementation in [
            Implementation::Reference,
            Implementation::Portable,
            Implementation::FixedIsa,
        ] {
            if let Ok(kernels) = Kernels::new(cpu_extensions, implementation) {
                res.push(kernels);
            }
        }
    }
    res
}

fn get_src_buffer(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + i / 13) as u8).collect()
}

fn bench_convolution(c: &mut Criterion) {
    let valid = Rect::new(0, 0, WIDTH, HEIGHT);
    let bands = 3;
    let src = get_src_buffer(WIDTH as usize * HEIGHT as usize * bands);
    let input = Region::from_slice(valid, bands, &src).unwrap();
    let mut out = RegionMut::new(valid, bands).unwrap();

    #[rustfmt::skip]
    let mask = [
        1, 2, 1,
        2, 4, 2,
        1, 2, 1,
    ];
    let taps = TapSet::from_mask(3, 3, &mask, input.stride(), bands, 4, 0).unwrap();
    let rect = valid.shrink(1, 1);
    let ne = rect.width as usize * bands;

    let mut group = c.benchmark_group("Convolution 3x3 RGB");
    group.sample_size(20);
    for kernels in kernels_list() {
        let id = BenchmarkId::new(
            format!("{:?}", kernels.implementation()),
            cpu_ext_into_str(kernels.cpu_extensions()),
        );
        group.bench_function(id, |bencher| {
            bencher.iter(|| kernels.convolve(&mut out, &input, rect, ne, &taps))
        });
    }
    group.finish();
}

fn bench_reduction(c: &mut Criterion) {
    let ne = WIDTH as usize * 4;
    let taps = ReductionTaps::new(vec![-256, 1280, 2304, 1280, -256, -256]).unwrap();
    let src = get_src_buffer(ne * taps.len());
    let mut dst = vec![0u8; ne];

    let mut group = c.benchmark_group("Vertical reduction RGBA");
    group.sample_size(50);
    for kernels in kernels_list() {
        let id = BenchmarkId::new(
            format!("{:?}", kernels.implementation()),
            cpu_ext_into_str(kernels.cpu_extensions()),
        );
        group.bench_function(id, |bencher| {
            bencher.iter(|| kernels.reduce_vertical(&mut dst, &src, ne, ne, &taps))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_convolution, bench_reduction);
criterion_main!(benches);
