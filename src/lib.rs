pub mod circuit;
pub mod core;
pub mod encryption;
pub mod hw;
pub mod logging;

pub use circuit::{
    ActiveKeys, BooleanCircuit, CircuitCreationValues, CircuitError, CircuitEvaluator,
    CircuitGarbler, CircuitVerifier, Config, GarbledCircuit, LabelCommit, OutputCommitments,
    Parallelism, Seed, translate, translate_committed, verified_translate,
};
pub use encryption::{
    AesFixedKeyScheme, Blake3Scheme, CipherError, CipherSession, MultiKey,
    MultiKeyEncryptionScheme, SchemeKind,
};
pub use logging::init_tracing;

pub use crate::core::{
    ErrorKind,
    gate::{GarbledGate, Gate, GateError, GateId},
    gate_type::GateType,
    s::S,
    table::{GarbledTable, GarbledTables, TableError, TranslationTable},
    wire::{GarbledWire, WireError, WireId, WireKeyStore, WireKeys},
};
