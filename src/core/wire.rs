use std::{fmt, ops::Deref};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{ErrorKind, S};

/// Errors that can occur during wire operations
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Wire with the given ID was not found
    #[error("Wire with id {0} not found")]
    WireNotFound(WireId),
    /// Wire with the given ID is already initialized
    #[error("Wire with id {0} already initialized")]
    WireAlreadyInitialized(WireId),
    /// The keys of a wire do not embed `s` and `s ^ 1`
    #[error("Wire {wire} keys do not match signal bit {signal_bit}")]
    InconsistentSignalBit { wire: WireId, signal_bit: bool },
    /// Both keys of a wire are equal
    #[error("Wire {0} has identical 0- and 1-keys")]
    IdenticalKeys(WireId),
}
pub type WireError = Error;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::MalformedInput
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireId(pub usize);

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for WireId {
    type Target = usize;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<usize> for WireId {
    fn from(v: usize) -> Self {
        WireId(v)
    }
}

/// Both keys of a wire: `label0` encodes `false`, `label1` encodes `true`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarbledWire {
    pub label0: S,
    pub label1: S,
}

impl GarbledWire {
    pub fn new(label0: S, label1: S) -> Self {
        GarbledWire { label0, label1 }
    }

    /// Issue a fresh pair of keys for a wire with permutation bit `signal_bit`.
    ///
    /// The keys differ in their embedded signal bit, so they are always distinct.
    pub fn random(rng: &mut impl Rng, signal_bit: bool) -> Self {
        GarbledWire {
            label0: S::random_with_signal_bit(rng, signal_bit),
            label1: S::random_with_signal_bit(rng, !signal_bit),
        }
    }

    pub fn select(&self, bit: bool) -> S {
        match bit {
            false => self.label0,
            true => self.label1,
        }
    }

    /// The wire's permutation bit, as embedded in the 0-key.
    pub fn signal_bit(&self) -> bool {
        self.label0.signal_bit()
    }

    /// Plain value encoded by `key`, if it is one of the two keys.
    pub fn decode(&self, key: &S) -> Option<bool> {
        if *key == self.label0 {
            Some(false)
        } else if *key == self.label1 {
            Some(true)
        } else {
            None
        }
    }
}

mod wire_key_store {
    use std::collections::{HashMap, hash_map::Entry};

    use super::{GarbledWire, WireError, WireId};

    /// Keys and signal bit of a single wire.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct WireKeys {
        pub keys: GarbledWire,
        pub signal_bit: bool,
    }

    /// Per-wire key pairs and permutation bits, filled during garbling.
    #[derive(Debug, Default, Clone)]
    pub struct WireKeyStore {
        wires: HashMap<WireId, WireKeys>,
    }

    impl WireKeyStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_capacity(capacity: usize) -> Self {
            Self {
                wires: HashMap::with_capacity(capacity),
            }
        }

        pub fn get(&self, wire_id: WireId) -> Result<&WireKeys, WireError> {
            self.wires
                .get(&wire_id)
                .ok_or(WireError::WireNotFound(wire_id))
        }

        pub fn keys(&self, wire_id: WireId) -> Result<&GarbledWire, WireError> {
            self.get(wire_id).map(|w| &w.keys)
        }

        pub fn signal_bit(&self, wire_id: WireId) -> Result<bool, WireError> {
            self.get(wire_id).map(|w| w.signal_bit)
        }

        /// Register a wire. The keys must embed `signal_bit` and `!signal_bit`.
        pub fn init(
            &mut self,
            wire_id: WireId,
            keys: GarbledWire,
            signal_bit: bool,
        ) -> Result<&WireKeys, WireError> {
            if keys.label0 == keys.label1 {
                return Err(WireError::IdenticalKeys(wire_id));
            }
            if keys.label0.signal_bit() != signal_bit || keys.label1.signal_bit() == signal_bit {
                return Err(WireError::InconsistentSignalBit {
                    wire: wire_id,
                    signal_bit,
                });
            }

            match self.wires.entry(wire_id) {
                Entry::Occupied(_) => Err(WireError::WireAlreadyInitialized(wire_id)),
                Entry::Vacant(vac) => Ok(vac.insert(WireKeys { keys, signal_bit })),
            }
        }

        pub fn contains(&self, wire_id: WireId) -> bool {
            self.wires.contains_key(&wire_id)
        }

        pub fn size(&self) -> usize {
            self.wires.len()
        }
    }
}
pub use wire_key_store::{WireKeyStore, WireKeys};
