// Runtime check for AES acceleration behind the fixed-key scheme.

use tracing::warn;

#[inline]
pub fn hardware_aes_available() -> bool {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        is_x86_feature_detected!("aes")
    }

    #[cfg(target_arch = "aarch64")]
    {
        std::arch::is_aarch64_feature_detected!("aes")
    }

    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
    {
        false
    }
}

/// Whether the fixed-key permutation was compiled against AES-NI.
#[inline]
pub const fn aes_ni_compiled() -> bool {
    cfg!(all(
        any(target_arch = "x86", target_arch = "x86_64"),
        target_feature = "aes",
        target_feature = "sse2"
    ))
}

/// Warn when rows are about to be sealed with the software AES path.
pub fn warn_if_software_aes() {
    if !aes_ni_compiled() {
        if hardware_aes_available() {
            warn!(
                "AES-NI is available but not enabled at compile time; build with -C target-feature=+aes,+sse2"
            );
        } else {
            warn!("AES hardware acceleration not detected; using software AES (not constant-time)");
        }
    }
}
