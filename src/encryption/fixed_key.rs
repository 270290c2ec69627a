use super::{Error, MultiKey, MultiKeyEncryptionScheme, SchemeKind, aes_ni, check_keys};
use crate::core::s::{S, S_SIZE};

/// Tweakable encryption built on a fixed-key AES permutation `π`.
///
/// The `n` input keys are combined as `K = 2^n·k_0 ⊕ ... ⊕ 2·k_{n-1}` in
/// GF(2^128), so the key order is significant. The pad block `j` is `π(X_j) ⊕ X_j` with
/// `X_0 = K ⊕ T` and `X_{j+1} = 2·X_j`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AesFixedKeyScheme;

impl AesFixedKeyScheme {
    pub fn new() -> Self {
        Self
    }
}

impl MultiKeyEncryptionScheme for AesFixedKeyScheme {
    const KIND: SchemeKind = SchemeKind::AesFixedKey;

    fn generate_multi_key(&self, keys: &[&[u8]]) -> Result<MultiKey, Error> {
        check_keys(keys, self.key_size())?;

        let mut combined = S::ZERO;
        for key in keys {
            let key = S::try_from_slice(key).ok_or(Error::InvalidKey {
                expected: S_SIZE,
                actual: key.len(),
            })?;
            // earlier keys pick up one extra doubling per later key
            combined = combined.double() ^ &key;
        }

        Ok(MultiKey::new(combined.double().to_bytes().to_vec()))
    }

    fn keystream(&self, key: &MultiKey, tweak: &[u8], pad: &mut [u8]) {
        let mut x = [0u8; S_SIZE];
        for (x, (k, t)) in x.iter_mut().zip(key.material().iter().zip(tweak)) {
            *x = k ^ t;
        }
        let mut x = S(x);

        for chunk in pad.chunks_mut(S_SIZE) {
            let block = S(aes_ni::permute_block(x.to_bytes())) ^ &x;
            chunk.copy_from_slice(&block.0[..chunk.len()]);
            x = x.double();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::trng;

    #[test]
    fn multi_key_weights_follow_position() {
        let mut rng = trng();
        let k0 = S::random(&mut rng);
        let k1 = S::random(&mut rng);

        let expected = k0.double().double() ^ &k1.double();
        let scheme = AesFixedKeyScheme::new();
        let key = scheme.generate_multi_key(&[&k0.0, &k1.0]).unwrap();

        assert_eq!(key.material(), expected.0);
    }

    #[test]
    fn pad_blocks_differ() {
        let scheme = AesFixedKeyScheme::new();
        let key = scheme.generate_multi_key(&[&[3u8; S_SIZE]]).unwrap();
        let mut pad = [0u8; 2 * S_SIZE];
        scheme.keystream(&key, &[0u8; 16], &mut pad);

        assert_ne!(pad[..S_SIZE], pad[S_SIZE..]);
    }
}
