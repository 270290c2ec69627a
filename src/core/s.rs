use std::{
    fmt,
    ops::{BitXor, BitXorAssign},
};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Size of a wire key in bytes
pub const S_SIZE: usize = 16;

/// A wire key.
///
/// The least-significant bit of the last byte is the key's signal bit: for a
/// wire with permutation bit `s`, the key encoding value `b` carries `s ^ b`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct S(pub [u8; S_SIZE]);

impl S {
    pub const ZERO: S = S([0u8; S_SIZE]);

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self(rng.random())
    }

    /// Random key whose embedded signal bit is forced to `signal_bit`.
    pub fn random_with_signal_bit(rng: &mut impl Rng, signal_bit: bool) -> Self {
        Self::random(rng).with_signal_bit(signal_bit)
    }

    #[inline(always)]
    pub fn signal_bit(&self) -> bool {
        self.0[S_SIZE - 1] & 1 == 1
    }

    #[must_use]
    pub fn with_signal_bit(mut self, signal_bit: bool) -> Self {
        self.0[S_SIZE - 1] = (self.0[S_SIZE - 1] & !1) | signal_bit as u8;
        self
    }

    #[inline(always)]
    pub fn to_bytes(&self) -> [u8; S_SIZE] {
        self.0
    }

    #[inline(always)]
    pub fn from_bytes(bytes: [u8; S_SIZE]) -> Self {
        Self(bytes)
    }

    /// Build a key from an exact-length slice.
    pub fn try_from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; S_SIZE]>::try_from(bytes).ok().map(Self)
    }

    pub fn to_u128(&self) -> u128 {
        u128::from_be_bytes(self.0)
    }

    /// Multiplication by `x` in GF(2^128) with the GCM reduction polynomial,
    /// reading the key as a big-endian integer.
    #[must_use]
    pub fn double(&self) -> Self {
        let v = self.to_u128();
        let carry = v >> 127;
        Self(((v << 1) ^ (carry * 0x87)).to_be_bytes())
    }
}

impl fmt::Debug for S {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S({})", self.to_hex())
    }
}

impl fmt::Display for S {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl BitXor for &S {
    type Output = S;

    fn bitxor(self, rhs: Self) -> Self::Output {
        let mut out = *self;
        out ^= rhs;
        out
    }
}

impl BitXor<&S> for S {
    type Output = S;

    fn bitxor(mut self, rhs: &S) -> Self::Output {
        self ^= rhs;
        self
    }
}

impl BitXorAssign<&S> for S {
    fn bitxor_assign(&mut self, rhs: &S) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a ^= b;
        }
    }
}

impl AsRef<[u8]> for S {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; S_SIZE]> for S {
    fn from(bytes: [u8; S_SIZE]) -> Self {
        Self(bytes)
    }
}
