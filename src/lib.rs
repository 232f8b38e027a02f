#![doc = include_str!("../README.md")]
//!
//! ## Feature flags
#![doc = document_features::document_features!()]

pub use cpu_extensions::CpuExtensions;
pub use dispatch::{convolve, reduce_vertical, Implementation, Kernels};
pub use errors::*;
pub use region::{Layout, Rect, Region, RegionMut};
pub use taps::{ReductionTaps, TapSet, INTERPOLATE_SCALE, INTERPOLATE_SHIFT};

mod convolution;
mod cpu_extensions;
mod dispatch;
mod errors;
mod reduction;
mod region;
mod simd;
mod taps;

cfg_if::cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        mod simd_utils;
    } else if #[cfg(target_arch = "aarch64")] {
        mod neon_utils;
    }
}
