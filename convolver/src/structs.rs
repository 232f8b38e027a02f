use anyhow::{anyhow, Result};
use fast_int_convolution as fic;

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
pub enum Kernel {
    /// Plain scalar code.
    Reference,
    /// Vector kernels compiled for the selected CPU extensions.
    /// Give exactly the same result as `reference`.
    Portable,
    /// Hand-written SSE4.1/AVX2 kernels. Convolution accumulates sums
    /// in 16-bit integers with saturation, so big masks may give
    /// a different result.
    FixedIsa,
}

impl From<Kernel> for fic::Implementation {
    fn from(kernel: Kernel) -> Self {
        match kernel {
            Kernel::Reference => fic::Implementation::Reference,
            Kernel::Portable => fic::Implementation::Portable,
            Kernel::FixedIsa => fic::Implementation::FixedIsa,
        }
    }
}

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
pub enum Cpu {
    None,
    #[value(name = "sse4.1")]
    Sse41,
    Avx2,
    Neon,
}

impl TryFrom<Cpu> for fic::CpuExtensions {
    type Error = anyhow::Error;

    fn try_from(cpu: Cpu) -> Result<Self> {
        match cpu {
            Cpu::None => Ok(fic::CpuExtensions::None),
            #[cfg(target_arch = "x86_64")]
            Cpu::Sse41 => Ok(fic::CpuExtensions::Sse4_1),
            #[cfg(target_arch = "x86_64")]
            Cpu::Avx2 => Ok(fic::CpuExtensions::Avx2),
            #[cfg(target_arch = "aarch64")]
            Cpu::Neon => Ok(fic::CpuExtensions::Neon),
            #[allow(unreachable_patterns)]
            _ => Err(anyhow!(
                "CPU extensions {:?} don't exist on this architecture",
                cpu
            )),
        }
    }
}

impl Kernel {
    pub fn is_fixed_isa(&self) -> bool {
        matches!(self, Self::FixedIsa)
    }
}
