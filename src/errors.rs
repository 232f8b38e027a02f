use thiserror::Error;

use crate::{CpuExtensions, Implementation};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionError {
    #[error("Size of buffer is smaller than required")]
    InvalidBufferSize,
    #[error("Stride of rows is smaller than width of row in bytes")]
    InvalidStride,
    #[error("Count of bands must be greater than zero")]
    ZeroBands,
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TapSetError {
    #[error("Set of taps is empty")]
    Empty,
    #[error("Count of offsets ({offsets}) don't match to count of mantissas ({mantissas})")]
    LengthMismatch { offsets: usize, mantissas: usize },
    #[error("Exponent {0} is out of the range [1, 30]")]
    ExponentOutOfRange(u32),
    #[error("Output offset {0} is out of the range of i16")]
    OutputOffsetOutOfRange(i32),
    #[error("Count of mantissas don't match to size of the mask")]
    InvalidMaskSize,
    #[error("Weight {0} can't be represented as mantissa of reduction tap")]
    InvalidWeight(f64),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedKernelError {
    #[error("CPU extensions {0:?} are not supported by this CPU")]
    CpuExtensions(CpuExtensions),
    #[error("Implementation {implementation:?} is not available with CPU extensions {cpu_extensions:?}")]
    Implementation {
        implementation: Implementation,
        cpu_extensions: CpuExtensions,
    },
}
