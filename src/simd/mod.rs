//! Minimal set of SIMD primitives used by the portable kernels.
//!
//! Every backend processes [Backend::LANES] output samples at once with
//! 32-bit accumulators. Kernels are written once against this trait and
//! instantiated per backend inside a function compiled with the matching
//! `target_feature`.
pub(crate) use emu128::Emu128;
#[cfg(target_arch = "x86_64")]
pub(crate) use avx2::Avx2;
#[cfg(target_arch = "aarch64")]
pub(crate) use neon::Neon;
#[cfg(target_arch = "x86_64")]
pub(crate) use sse41::Sse41;

#[cfg(target_arch = "x86_64")]
mod avx2;
mod emu128;
#[cfg(target_arch = "aarch64")]
mod neon;
#[cfg(target_arch = "x86_64")]
mod sse41;

pub(crate) trait Backend {
    /// Count of 32-bit lanes in the accumulator.
    const LANES: usize;

    /// `LANES` signed 32-bit sums.
    type Acc: Copy;
    /// `LANES` samples of one or two source rows, widened
    /// to the layout expected by [Backend::mul_acc].
    type Pix: Copy;
    /// One or two mantissas prepared for [Backend::mul_acc].
    type Coef: Copy;

    unsafe fn splat(v: i32) -> Self::Acc;

    /// Packs two mantissas applied to the "top" and "bottom" samples
    /// returned by [Backend::load_pair].
    unsafe fn coef_pair(top: i16, bottom: i16) -> Self::Coef;

    unsafe fn coef_single(k: i16) -> Self::Coef;

    /// Loads `LANES` bytes from each pointer.
    unsafe fn load_pair(top: *const u8, bottom: *const u8) -> Self::Pix;

    /// Loads `LANES` bytes.
    unsafe fn load_single(ptr: *const u8) -> Self::Pix;

    /// Widening multiply-accumulate of samples by mantissas.
    unsafe fn mul_acc(acc: Self::Acc, pix: Self::Pix, coef: Self::Coef) -> Self::Acc;

    /// Folds partial accumulators of backends which keep separate sums
    /// for the top and bottom samples. Must be called before
    /// [Backend::shift_right].
    unsafe fn merge(acc: Self::Acc) -> Self::Acc;

    /// Arithmetic shift right of every lane.
    unsafe fn shift_right(acc: Self::Acc, shift: u32) -> Self::Acc;

    unsafe fn add(a: Self::Acc, b: Self::Acc) -> Self::Acc;

    /// Narrows lanes into `u8` with saturation and stores `LANES` bytes.
    unsafe fn store_u8(acc: Self::Acc, dst: *mut u8);
}
