//! Fixed-key AES-128 permutation `π` used by [`super::AesFixedKeyScheme`].
//!
//! The AES-NI path is compiled when the target enables the `aes` and `sse2`
//! features; otherwise the `aes` crate is used.

/// Public, arbitrary key of the fixed permutation.
pub const FIXED_KEY: [u8; 16] = [0x42; 16];

#[cfg(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    target_feature = "aes",
    target_feature = "sse2"
))]
pub(crate) mod aes_ni_impl {
    #[cfg(target_arch = "x86")]
    use core::arch::x86::*;
    #[cfg(target_arch = "x86_64")]
    use core::arch::x86_64::*;
    use core::mem::MaybeUninit;
    use std::sync::OnceLock;

    use super::FIXED_KEY;

    /// AES-128 round keys (11 x 128-bit)
    pub struct Aes128 {
        round_keys: [__m128i; 11],
    }

    // Round keys are plain data; the type is only built once AES-NI is known to exist.
    unsafe impl Send for Aes128 {}
    unsafe impl Sync for Aes128 {}

    impl Aes128 {
        /// Build from a 128-bit key (uses AES-NI key schedule).
        pub fn new(key: [u8; 16]) -> Option<Self> {
            if !is_x86_feature_detected!("aes") {
                return None;
            }
            // Safety: guarded by is_x86_feature_detected!("aes")
            let round_keys = unsafe { expand_key_128(key) };
            Some(Self { round_keys })
        }

        /// Encrypt a single 16-byte block with AES-NI.
        ///
        /// # Safety
        ///
        /// Requires AES-NI and SSE2. The constructor checks for AES-NI.
        #[inline]
        #[target_feature(enable = "aes,sse2")]
        pub unsafe fn encrypt_block(&self, block: [u8; 16]) -> [u8; 16] {
            unsafe {
                let mut state = _mm_loadu_si128(block.as_ptr() as *const __m128i);
                state = _mm_xor_si128(state, self.round_keys[0]);
                // Rounds 1..=9
                for r in 1..10 {
                    state = _mm_aesenc_si128(state, self.round_keys[r]);
                }
                // Final round
                state = _mm_aesenclast_si128(state, self.round_keys[10]);

                let mut out = [0u8; 16];
                _mm_storeu_si128(out.as_mut_ptr() as *mut __m128i, state);
                out
            }
        }
    }

    static AES128_STATIC: OnceLock<Aes128> = OnceLock::new();

    #[inline(always)]
    fn get_or_init_static_cipher() -> &'static Aes128 {
        // Compiled only when target features include AES+SSE2; avoid runtime checks.
        AES128_STATIC.get_or_init(|| {
            Aes128::new(FIXED_KEY).expect("AES-NI unavailable despite compile-time target features")
        })
    }

    /// Expand AES-128 key into 11 round keys using AES-NI.
    /// Safety: requires AES-NI.
    #[target_feature(enable = "aes,sse2")]
    unsafe fn expand_key_128(key_bytes: [u8; 16]) -> [__m128i; 11] {
        unsafe {
            let mut rk: [MaybeUninit<__m128i>; 11] = MaybeUninit::uninit().assume_init();

            let mut tmp = _mm_loadu_si128(key_bytes.as_ptr() as *const __m128i);
            rk[0].as_mut_ptr().write(tmp);

            macro_rules! expand_round {
                ($idx:expr, $rcon:expr) => {{
                    let mut keygen = _mm_aeskeygenassist_si128(tmp, $rcon);
                    keygen = _mm_shuffle_epi32(keygen, 0xff);
                    let mut t = _mm_slli_si128(tmp, 4);
                    tmp = _mm_xor_si128(tmp, t);
                    t = _mm_slli_si128(t, 4);
                    tmp = _mm_xor_si128(tmp, t);
                    t = _mm_slli_si128(t, 4);
                    tmp = _mm_xor_si128(tmp, t);
                    tmp = _mm_xor_si128(tmp, keygen);
                    rk[$idx].as_mut_ptr().write(tmp);
                }};
            }

            expand_round!(1, 0x01);
            expand_round!(2, 0x02);
            expand_round!(3, 0x04);
            expand_round!(4, 0x08);
            expand_round!(5, 0x10);
            expand_round!(6, 0x20);
            expand_round!(7, 0x40);
            expand_round!(8, 0x80);
            expand_round!(9, 0x1B);
            expand_round!(10, 0x36);

            core::mem::transmute::<_, [__m128i; 11]>(rk)
        }
    }

    /// Apply the fixed-key permutation to one block.
    #[inline(always)]
    pub fn permute_block(block: [u8; 16]) -> [u8; 16] {
        let cipher = get_or_init_static_cipher();
        // Safety: the static cipher is only built when AES-NI is present
        unsafe { cipher.encrypt_block(block) }
    }
}

#[cfg(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    target_feature = "aes",
    target_feature = "sse2"
))]
pub use aes_ni_impl::permute_block;

// Fallback (no AES-NI at compile-time): software AES implementation backed by aes crate.
#[cfg(not(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    target_feature = "aes",
    target_feature = "sse2"
)))]
pub(crate) mod aes_ni_unavailable {
    use std::sync::OnceLock;

    use aes::{
        Aes128,
        cipher::{BlockEncrypt, KeyInit, generic_array::GenericArray},
    };

    use super::FIXED_KEY;

    static AES128_STATIC: OnceLock<Aes128> = OnceLock::new();

    #[inline(always)]
    fn get_or_init_static_cipher() -> &'static Aes128 {
        AES128_STATIC.get_or_init(|| Aes128::new(&GenericArray::from(FIXED_KEY)))
    }

    /// Apply the fixed-key permutation to one block.
    #[inline(always)]
    pub fn permute_block(block: [u8; 16]) -> [u8; 16] {
        let cipher = get_or_init_static_cipher();
        let mut b = GenericArray::from(block);
        cipher.encrypt_block(&mut b);
        b.into()
    }
}

#[cfg(not(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    target_feature = "aes",
    target_feature = "sse2"
)))]
pub use aes_ni_unavailable::permute_block;
