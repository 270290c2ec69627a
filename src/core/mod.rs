use std::fmt;

use serde::{Deserialize, Serialize};

pub mod gate;
pub mod gate_type;
pub mod progress;
pub mod s;
pub mod table;
pub mod wire;

/// Coarse classification shared by every error in the crate.
///
/// None of them are transient: retrying the same operation on the same
/// inputs fails the same way.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A cipher session or driver was used without the required setup.
    Configuration,
    /// Label lists, table sizes or arities that do not fit together.
    MalformedInput,
    /// A decryption did not produce what the caller expected.
    CryptoFailure,
    /// Garbled material that a honest garbler could not have produced.
    CheatAttempt,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration error",
            ErrorKind::MalformedInput => "malformed input",
            ErrorKind::CryptoFailure => "crypto failure",
            ErrorKind::CheatAttempt => "cheat attempt",
        };
        f.write_str(name)
    }
}
