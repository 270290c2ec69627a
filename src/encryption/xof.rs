use super::{DEFAULT_TWEAK_SIZE, Error, MultiKey, MultiKeyEncryptionScheme, SchemeKind, check_keys};

const DOMAIN: &[u8] = b"garbled-gates/blake3-row/v1";

/// Tweakable encryption using BLAKE3 in XOF mode as a keyed pad generator.
///
/// The pad is `BLAKE3(domain ‖ key count ‖ k_0 ‖ ... ‖ k_{n-1} ‖ tweak)`
/// extended to the cipher size. The tweak width is configurable.
#[derive(Clone, Copy, Debug)]
pub struct Blake3Scheme {
    tweak_size: usize,
}

impl Default for Blake3Scheme {
    fn default() -> Self {
        Self::new()
    }
}

impl Blake3Scheme {
    pub fn new() -> Self {
        Self {
            tweak_size: DEFAULT_TWEAK_SIZE,
        }
    }

    /// The tweak must fit the 4-byte gate number plus at least one 4-byte
    /// masked bit, in whole 4-byte words.
    pub fn with_tweak_size(tweak_size: usize) -> Result<Self, Error> {
        if tweak_size < 8 || tweak_size % 4 != 0 {
            return Err(Error::UnsupportedTweakSize(tweak_size));
        }
        Ok(Self { tweak_size })
    }
}

impl MultiKeyEncryptionScheme for Blake3Scheme {
    const KIND: SchemeKind = SchemeKind::Blake3;

    fn tweak_size(&self) -> usize {
        self.tweak_size
    }

    fn generate_multi_key(&self, keys: &[&[u8]]) -> Result<MultiKey, Error> {
        check_keys(keys, self.key_size())?;

        let mut material = Vec::with_capacity(4 + keys.len() * self.key_size());
        material.extend_from_slice(&(keys.len() as u32).to_be_bytes());
        for key in keys {
            material.extend_from_slice(key);
        }
        Ok(MultiKey::new(material))
    }

    fn keystream(&self, key: &MultiKey, tweak: &[u8], pad: &mut [u8]) {
        let mut hasher = blake3::Hasher::new();
        hasher.update(DOMAIN);
        hasher.update(key.material());
        hasher.update(tweak);
        hasher.finalize_xof().fill(pad);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tweak_size_must_be_word_aligned() {
        assert_eq!(
            Blake3Scheme::with_tweak_size(10).unwrap_err(),
            Error::UnsupportedTweakSize(10)
        );
        assert_eq!(
            Blake3Scheme::with_tweak_size(4).unwrap_err(),
            Error::UnsupportedTweakSize(4)
        );
        assert_eq!(Blake3Scheme::with_tweak_size(24).unwrap().tweak_size(), 24);
    }

    #[test]
    fn tweak_changes_pad() {
        let scheme = Blake3Scheme::new();
        let key = scheme.generate_multi_key(&[&[9u8; 16]]).unwrap();

        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        scheme.keystream(&key, &[0u8; 16], &mut a);
        scheme.keystream(&key, &[1u8; 16], &mut b);
        assert_ne!(a, b);
    }
}
