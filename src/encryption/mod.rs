//! Tweakable multi-key encryption used to seal garbled table rows.
//!
//! A scheme is stateless and shared between threads. The key/tweak state the
//! row operations need lives in a short-lived [`CipherSession`], one per gate
//! operation, so garbling and evaluation stay pure per gate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ErrorKind, core::s::S_SIZE};

pub mod aes_ni;
mod fixed_key;
mod xof;

pub use fixed_key::AesFixedKeyScheme;
pub use xof::Blake3Scheme;

/// Tweak width used unless a scheme is configured otherwise: one 4-byte gate
/// number plus up to three 4-byte masked input bits.
pub const DEFAULT_TWEAK_SIZE: usize = 16;

/// Authentication tag appended to every row: a keyed BLAKE3 hash of the
/// encrypted payload, truncated.
pub const TAG_SIZE: usize = 16;

/// Keystream bytes past the payload pad that key the row tag.
pub const MAC_KEY_SIZE: usize = blake3::KEY_LEN;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid key: expected {expected} bytes, got {actual}")]
    InvalidKey { expected: usize, actual: usize },
    #[error("Multi-key requires at least one key")]
    EmptyMultiKey,
    #[error("Key not set")]
    KeyNotSet,
    #[error("Tweak not set")]
    TweakNotSet,
    #[error("Invalid tweak: expected {expected} bytes, got {actual}")]
    InvalidTweak { expected: usize, actual: usize },
    #[error("Tweak size {0} is not supported by this scheme")]
    UnsupportedTweakSize(usize),
    #[error("Plaintext too long: {actual} bytes, limit is {limit}")]
    PlaintextTooLong { actual: usize, limit: usize },
    #[error("Ciphertext too long: {actual} bytes, cipher size is {expected}")]
    CiphertextTooLong { actual: usize, expected: usize },
    #[error("Ciphertext too short: {actual} bytes, cipher size is {expected}")]
    CiphertextTooShort { actual: usize, expected: usize },
    #[error("Decrypted row failed the integrity check")]
    IntegrityCheckFailed,
}
pub type CipherError = Error;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::KeyNotSet | Error::TweakNotSet | Error::UnsupportedTweakSize(_) => {
                ErrorKind::Configuration
            }
            Error::IntegrityCheckFailed => ErrorKind::CryptoFailure,
            Error::InvalidKey { .. }
            | Error::EmptyMultiKey
            | Error::InvalidTweak { .. }
            | Error::PlaintextTooLong { .. }
            | Error::CiphertextTooLong { .. }
            | Error::CiphertextTooShort { .. } => ErrorKind::MalformedInput,
        }
    }
}

/// Shipped scheme implementations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemeKind {
    AesFixedKey,
    Blake3,
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemeKind::AesFixedKey => f.write_str("aes-fixed-key"),
            SchemeKind::Blake3 => f.write_str("blake3"),
        }
    }
}

/// Key material derived from the ordered input keys of one garbled row.
#[derive(Clone, PartialEq, Eq)]
pub struct MultiKey(Vec<u8>);

impl MultiKey {
    pub(crate) fn new(material: Vec<u8>) -> Self {
        Self(material)
    }

    pub(crate) fn material(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for MultiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // key material stays out of logs
        write!(f, "MultiKey({} bytes)", self.0.len())
    }
}

/// Tweakable multi-key symmetric encryption with a fixed ciphertext size.
pub trait MultiKeyEncryptionScheme: Clone + Send + Sync + fmt::Debug {
    const KIND: SchemeKind;

    fn key_size(&self) -> usize {
        S_SIZE
    }

    /// Size of every ciphertext, and therefore of every garbled table row.
    fn cipher_size(&self) -> usize {
        S_SIZE + TAG_SIZE
    }

    fn tweak_size(&self) -> usize {
        DEFAULT_TWEAK_SIZE
    }

    fn generate_multi_key(&self, keys: &[&[u8]]) -> Result<MultiKey, Error>;

    /// Fill `pad` (any length) with the keystream for `key` and `tweak`.
    fn keystream(&self, key: &MultiKey, tweak: &[u8], pad: &mut [u8]);

    fn session(&self) -> CipherSession<'_, Self> {
        CipherSession::new(self)
    }
}

pub(crate) fn check_keys(keys: &[&[u8]], key_size: usize) -> Result<(), Error> {
    if keys.is_empty() {
        return Err(Error::EmptyMultiKey);
    }
    match keys.iter().find(|key| key.len() != key_size) {
        Some(key) => Err(Error::InvalidKey {
            expected: key_size,
            actual: key.len(),
        }),
        None => Ok(()),
    }
}

/// Keyed and tweaked view of a scheme.
#[derive(Debug)]
pub struct CipherSession<'s, E: MultiKeyEncryptionScheme> {
    scheme: &'s E,
    key: Option<MultiKey>,
    tweak: Option<Vec<u8>>,
}

impl<'s, E: MultiKeyEncryptionScheme> CipherSession<'s, E> {
    pub fn new(scheme: &'s E) -> Self {
        Self {
            scheme,
            key: None,
            tweak: None,
        }
    }

    pub fn set_key(&mut self, key: MultiKey) {
        self.key = Some(key);
    }

    pub fn set_tweak(&mut self, tweak: &[u8]) -> Result<(), Error> {
        let expected = self.scheme.tweak_size();
        if tweak.len() != expected {
            return Err(Error::InvalidTweak {
                expected,
                actual: tweak.len(),
            });
        }
        self.tweak = Some(tweak.to_vec());
        Ok(())
    }

    pub fn cipher_size(&self) -> usize {
        self.scheme.cipher_size()
    }

    fn payload_len(&self) -> usize {
        self.scheme.cipher_size() - TAG_SIZE
    }

    /// Payload pad followed by the tag key.
    fn pad(&self) -> Result<(Vec<u8>, [u8; MAC_KEY_SIZE]), Error> {
        let key = self.key.as_ref().ok_or(Error::KeyNotSet)?;
        let tweak = self.tweak.as_ref().ok_or(Error::TweakNotSet)?;

        let payload_len = self.payload_len();
        let mut pad = vec![0u8; payload_len + MAC_KEY_SIZE];
        self.scheme.keystream(key, tweak, &mut pad);

        let mut mac_key = [0u8; MAC_KEY_SIZE];
        mac_key.copy_from_slice(&pad[payload_len..]);
        pad.truncate(payload_len);
        Ok((pad, mac_key))
    }

    fn tag(mac_key: &[u8; MAC_KEY_SIZE], sealed_payload: &[u8]) -> [u8; TAG_SIZE] {
        let hash = blake3::keyed_hash(mac_key, sealed_payload);
        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(&hash.as_bytes()[..TAG_SIZE]);
        tag
    }

    /// Encrypt `plaintext` (at most `cipher_size - TAG_SIZE` bytes) into
    /// `out`, which must be exactly `cipher_size` bytes long. The tag is
    /// computed over the encrypted payload.
    pub fn encrypt_into(&self, plaintext: &[u8], out: &mut [u8]) -> Result<(), Error> {
        let limit = self.payload_len();
        if plaintext.len() > limit {
            return Err(Error::PlaintextTooLong {
                actual: plaintext.len(),
                limit,
            });
        }
        check_cipher_len(out.len(), self.scheme.cipher_size())?;

        let (pad, mac_key) = self.pad()?;
        let (payload, tag) = out.split_at_mut(limit);
        payload.copy_from_slice(&pad);
        for (o, p) in payload.iter_mut().zip(plaintext) {
            *o ^= p;
        }
        tag.copy_from_slice(&Self::tag(&mac_key, payload));
        Ok(())
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, Error> {
        let mut out = vec![0u8; self.scheme.cipher_size()];
        self.encrypt_into(plaintext, &mut out)?;
        Ok(out)
    }

    /// Check the tag of a `cipher_size` ciphertext, then return its
    /// `cipher_size - TAG_SIZE` payload bytes.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
        check_cipher_len(ciphertext.len(), self.scheme.cipher_size())?;

        let (mut out, mac_key) = self.pad()?;
        let (sealed, tag) = ciphertext.split_at(self.payload_len());
        if Self::tag(&mac_key, sealed)[..] != *tag {
            return Err(Error::IntegrityCheckFailed);
        }

        for (o, c) in out.iter_mut().zip(sealed) {
            *o ^= c;
        }
        Ok(out)
    }
}

fn check_cipher_len(actual: usize, expected: usize) -> Result<(), Error> {
    match actual {
        a if a > expected => Err(Error::CiphertextTooLong {
            actual: a,
            expected,
        }),
        a if a < expected => Err(Error::CiphertextTooShort {
            actual: a,
            expected,
        }),
        _ => Ok(()),
    }
}
