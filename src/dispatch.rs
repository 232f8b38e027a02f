use std::sync::OnceLock;

use crate::{
    convolution, reduction, CpuExtensions, Rect, ReductionTaps, Region, RegionMut, TapSet,
    UnsupportedKernelError,
};

/// Family of kernels used by [Kernels].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Implementation {
    /// Scalar code, the source of truth for all other kernels.
    Reference,
    /// Vector kernels written once and compiled for every
    /// [CpuExtensions] variant. Reproduce [Implementation::Reference]
    /// bit for bit.
    #[default]
    Portable,
    /// Hand-written x86_64 kernels.
    ///
    /// Convolution uses SSE4.1 with saturating 16-bit accumulators. It gives
    /// the exact result only for taps with
    /// [TapSet::fits_i16_accumulator] returning `true`. Taps with exponent
    /// greater than 15 are processed by the portable kernel.
    ///
    /// Reduction uses AVX2 or SSE4.1 code, depending on selected
    /// CPU extensions.
    FixedIsa,
}

impl Implementation {
    /// Returns `true` if the implementation can be used
    /// together with given CPU extensions.
    pub fn is_available_with(&self, cpu_extensions: CpuExtensions) -> bool {
        match self {
            Self::Reference | Self::Portable => true,
            #[cfg(all(target_arch = "x86_64", feature = "fixed_isa"))]
            Self::FixedIsa => matches!(
                cpu_extensions,
                CpuExtensions::Sse4_1 | CpuExtensions::Avx2
            ),
            #[cfg(not(all(target_arch = "x86_64", feature = "fixed_isa")))]
            Self::FixedIsa => {
                let _ = cpu_extensions;
                false
            }
        }
    }
}

/// Set of kernels selected for some CPU.
///
/// # Examples
///
/// ```
/// use fast_int_convolution::{Kernels, Rect, Region, RegionMut, TapSet};
///
/// let src = [0u8, 0, 255, 0, 0];
/// let input = Region::from_slice(Rect::new(0, 0, 5, 1), 1, &src).unwrap();
/// let mut out = RegionMut::new(Rect::new(0, 0, 5, 1), 1).unwrap();
/// let taps = TapSet::new(vec![-1, 0, 1], vec![1, 2, 1], 2, 0).unwrap();
///
/// Kernels::detected().convolve(&mut out, &input, Rect::new(1, 0, 3, 1), 3, &taps);
/// assert_eq!(out.buffer(), &[0, 64, 128, 64, 0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernels {
    cpu_extensions: CpuExtensions,
    implementation: Implementation,
}

impl Default for Kernels {
    fn default() -> Self {
        *Self::detected()
    }
}

impl Kernels {
    /// Creates set of kernels for given CPU extensions.
    pub fn new(
        cpu_extensions: CpuExtensions,
        implementation: Implementation,
    ) -> Result<Self, UnsupportedKernelError> {
        if !cpu_extensions.is_supported() {
            return Err(UnsupportedKernelError::CpuExtensions(cpu_extensions));
        }
        if !implementation.is_available_with(cpu_extensions) {
            return Err(UnsupportedKernelError::Implementation {
                implementation,
                cpu_extensions,
            });
        }
        Ok(Self {
            cpu_extensions,
            implementation,
        })
    }

    /// Best kernels for the current CPU. The CPU is probed once per process.
    pub fn detected() -> &'static Kernels {
        static DETECTED: OnceLock<Kernels> = OnceLock::new();
        DETECTED.get_or_init(|| {
            let cpu_extensions = CpuExtensions::default();
            let kernels = Self {
                cpu_extensions,
                implementation: Implementation::default(),
            };
            log::debug!(
                "Selected {:?} kernels with {:?} CPU extensions",
                kernels.implementation,
                kernels.cpu_extensions
            );
            kernels
        })
    }

    #[inline]
    pub fn cpu_extensions(&self) -> CpuExtensions {
        self.cpu_extensions
    }

    #[inline]
    pub fn implementation(&self) -> Implementation {
        self.implementation
    }

    /// Convolves `ne` bytes of every row of `rect`, starting from
    /// the pixel `(rect.left, y)`, and writes results to
    /// the same positions of `out`.
    ///
    /// Only `rect.left`, `rect.top` and `rect.height` are used for
    /// addressing, `ne` is the count of output bytes per row.
    ///
    /// # Panics
    ///
    /// If any row of `rect` lies outside of `out`, or any tap of any
    /// output byte reads outside of the `input` buffer.
    pub fn convolve(
        &self,
        out: &mut RegionMut,
        input: &Region,
        rect: Rect,
        ne: usize,
        taps: &TapSet,
    ) {
        convolution::convolve(
            out,
            input,
            rect,
            ne,
            taps,
            self.cpu_extensions,
            self.implementation,
        );
    }

    /// Writes to `dst[x]` weighted sum of `src[x + i * row_stride]`
    /// for `x` in `0..ne` and `i` in `0..taps.len()`.
    ///
    /// # Panics
    ///
    /// If `dst` is shorter than `ne` bytes or `src` is shorter than
    /// `(taps.len() - 1) * row_stride + ne` bytes.
    pub fn reduce_vertical(
        &self,
        dst: &mut [u8],
        src: &[u8],
        ne: usize,
        row_stride: usize,
        taps: &ReductionTaps,
    ) {
        reduction::reduce_vertical(
            dst,
            src,
            ne,
            row_stride,
            taps,
            self.cpu_extensions,
            self.implementation,
        );
    }
}

/// [Kernels::convolve] with kernels detected for the current CPU.
pub fn convolve(out: &mut RegionMut, input: &Region, rect: Rect, ne: usize, taps: &TapSet) {
    Kernels::detected().convolve(out, input, rect, ne, taps);
}

/// [Kernels::reduce_vertical] with kernels detected for the current CPU.
pub fn reduce_vertical(
    dst: &mut [u8],
    src: &[u8],
    ne: usize,
    row_stride: usize,
    taps: &ReductionTaps,
) {
    Kernels::detected().reduce_vertical(dst, src, ne, row_stride, taps);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detected_kernels_are_valid() {
        let kernels = *Kernels::detected();
        assert_eq!(
            Kernels::new(kernels.cpu_extensions(), kernels.implementation()),
            Ok(kernels)
        );
        assert_eq!(Kernels::default(), kernels);
    }

    #[test]
    fn reference_and_portable_are_always_available() {
        for &cpu_extensions in CpuExtensions::all() {
            assert!(Implementation::Reference.is_available_with(cpu_extensions));
            assert!(Implementation::Portable.is_available_with(cpu_extensions));
        }
        assert!(!Implementation::FixedIsa.is_available_with(CpuExtensions::None));
        assert_eq!(
            Kernels::new(CpuExtensions::None, Implementation::FixedIsa),
            Err(UnsupportedKernelError::Implementation {
                implementation: Implementation::FixedIsa,
                cpu_extensions: CpuExtensions::None,
            })
        );
    }
}
