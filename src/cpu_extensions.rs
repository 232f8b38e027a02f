/// SIMD extension of CPU.
/// Specific variants depend on target architecture.
/// Look at source code to see all available variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuExtensions {
    None,
    #[cfg(target_arch = "x86_64")]
    /// SIMD extension of x86_64 architecture
    Sse4_1,
    #[cfg(target_arch = "x86_64")]
    /// SIMD extension of x86_64 architecture
    Avx2,
    #[cfg(target_arch = "aarch64")]
    /// SIMD extension of Arm64 architecture
    Neon,
}

impl CpuExtensions {
    /// Returns `true` if your CPU support the extension.
    pub fn is_supported(&self) -> bool {
        match self {
            #[cfg(target_arch = "x86_64")]
            Self::Avx2 => has_avx2(),
            #[cfg(target_arch = "x86_64")]
            Self::Sse4_1 => has_sse41(),
            #[cfg(target_arch = "aarch64")]
            Self::Neon => has_neon(),
            Self::None => true,
        }
    }

    /// All variants available on the target architecture,
    /// supported by current CPU or not.
    pub fn all() -> &'static [CpuExtensions] {
        #[cfg(target_arch = "x86_64")]
        const ALL: &[CpuExtensions] = &[
            CpuExtensions::None,
            CpuExtensions::Sse4_1,
            CpuExtensions::Avx2,
        ];
        #[cfg(target_arch = "aarch64")]
        const ALL: &[CpuExtensions] = &[CpuExtensions::None, CpuExtensions::Neon];
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        const ALL: &[CpuExtensions] = &[CpuExtensions::None];
        ALL
    }
}

impl Default for CpuExtensions {
    #[cfg(target_arch = "x86_64")]
    fn default() -> Self {
        if has_avx2() {
            Self::Avx2
        } else if has_sse41() {
            Self::Sse4_1
        } else {
            Self::None
        }
    }

    #[cfg(target_arch = "aarch64")]
    fn default() -> Self {
        if has_neon() {
            Self::Neon
        } else {
            Self::None
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    fn default() -> Self {
        Self::None
    }
}

#[cfg(target_arch = "x86_64")]
fn has_avx2() -> bool {
    std::is_x86_feature_detected!("avx2")
}

#[cfg(target_arch = "x86_64")]
fn has_sse41() -> bool {
    std::is_x86_feature_detected!("sse4.1")
}

#[cfg(target_arch = "aarch64")]
fn has_neon() -> bool {
    std::arch::is_aarch64_feature_detected!("neon")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_supported() {
        assert!(CpuExtensions::default().is_supported());
        assert!(CpuExtensions::None.is_supported());
    }

    #[test]
    fn all_contains_default() {
        assert!(CpuExtensions::all().contains(&CpuExtensions::default()));
    }
}
