//! Row addressing shared by garbling, evaluation and verification.

use super::{GateError, GateId};

/// Width of the gate number and of each masked bit inside a tweak.
pub const TWEAK_WORD: usize = 4;

/// Largest arity a tweak of `tweak_size` bytes can address.
pub const fn max_arity(tweak_size: usize) -> usize {
    (tweak_size / TWEAK_WORD).saturating_sub(1)
}

pub(crate) fn check_capacity(
    gate: GateId,
    arity: usize,
    tweak_size: usize,
) -> Result<(), GateError> {
    if arity > max_arity(tweak_size) {
        return Err(GateError::ArityExceedsTweak {
            gate,
            arity,
            tweak_size,
        });
    }
    Ok(())
}

/// Plain input bits of `row`, MSB first: bit `i` is `(row >> (n-1-i)) & 1`.
pub fn row_bits(row: usize, arity: usize) -> impl Iterator<Item = bool> {
    (0..arity).map(move |i| (row >> (arity - 1 - i)) & 1 == 1)
}

/// Permuted position `Σ masked_i · 2^(n-1-i)`.
pub fn position(masked: &[bool]) -> usize {
    masked
        .iter()
        .fold(0usize, |acc, bit| (acc << 1) | *bit as usize)
}

/// Gate number as a big-endian `u32`, then each masked bit as a big-endian
/// `u32`, zero padded to `tweak_size`.
///
/// The caller has checked capacity with [`check_capacity`].
pub fn tweak(gate: GateId, masked: &[bool], tweak_size: usize) -> Vec<u8> {
    let mut out = vec![0u8; tweak_size];
    out[..TWEAK_WORD].copy_from_slice(&gate.to_be_bytes());
    for (chunk, bit) in out[TWEAK_WORD..].chunks_exact_mut(TWEAK_WORD).zip(masked) {
        chunk.copy_from_slice(&(*bit as u32).to_be_bytes());
    }
    out
}
