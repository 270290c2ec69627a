use crate::{CipherError, ErrorKind, GateError, GateId, TableError, WireError, WireId};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CircuitError {
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error("Wire {0} is driven more than once")]
    DuplicateWire(WireId),
    #[error("Gate number {0} is used more than once")]
    DuplicateGateNumber(GateId),
    #[error("Gate {gate} reads wire {wire} before it is produced")]
    UnresolvedInput { gate: GateId, wire: WireId },
    #[error("Output wire {0} is neither an input nor produced by a gate")]
    UnknownOutput(WireId),
    #[error("Party {party} does not exist, circuit has {parties}")]
    UnknownParty { party: usize, parties: usize },
    #[error("Party {party} owns {expected} input wires, got {actual} values")]
    InputLengthMismatch {
        party: usize,
        expected: usize,
        actual: usize,
    },
    #[error("No key for input wire {0}")]
    MissingInput(WireId),
    #[error("Garbled circuit has {actual} gates, circuit has {expected}")]
    GateCountMismatch { expected: usize, actual: usize },
    #[error("Expected {expected} output keys, got {actual}")]
    OutputCountMismatch { expected: usize, actual: usize },

    #[error("Output {index}: key is not one of the output wire keys")]
    ForeignOutputKey { index: usize },
    #[error("Output {index}: keys disagree with the translation table")]
    TranslationMismatch { index: usize },
    #[error("Output {index}: verified keys differ from the committed ones")]
    OutputKeysMismatch { index: usize },
    #[error("Output {index}: commitment and translation table decode different values")]
    CommitmentMismatch { index: usize },

    #[error("Configured tweak size {configured} but the scheme uses {scheme}")]
    TweakSizeMismatch { configured: usize, scheme: usize },
    #[error("Thread count must be positive")]
    ZeroThreads,
    #[error("Thread pool: {0}")]
    ThreadPool(String),
    #[error("Circuit description: {0}")]
    Json(String),
}

impl CircuitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CircuitError::Gate(err) => err.kind(),
            CircuitError::Wire(err) => err.kind(),
            CircuitError::Table(err) => err.kind(),
            CircuitError::Cipher(err) => err.kind(),
            CircuitError::ForeignOutputKey { .. }
            | CircuitError::TranslationMismatch { .. }
            | CircuitError::OutputKeysMismatch { .. }
            | CircuitError::CommitmentMismatch { .. } => ErrorKind::CheatAttempt,
            CircuitError::TweakSizeMismatch { .. }
            | CircuitError::ZeroThreads
            | CircuitError::ThreadPool(_) => ErrorKind::Configuration,
            _ => ErrorKind::MalformedInput,
        }
    }
}

impl From<serde_json::Error> for CircuitError {
    fn from(err: serde_json::Error) -> Self {
        CircuitError::Json(err.to_string())
    }
}
