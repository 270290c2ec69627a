use bitvec::{order::Msb0, vec::BitVec};
use serde::{Deserialize, Serialize};

use crate::{CipherError, ErrorKind, GateType, TableError, WireError, WireId};

mod garbling;
pub mod tweak;

pub type GateId = u32;

/// Errors that can occur while building, garbling, evaluating or verifying a gate
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Gate {gate} has no input wires")]
    NoInputs { gate: GateId },
    #[error("Gate {gate} has no output wires")]
    NoOutputs { gate: GateId },
    #[error("Gate {gate} has {arity} inputs, more than any truth table can address")]
    TooManyInputs { gate: GateId, arity: usize },
    #[error("Gate {gate}: truth table has {actual} rows, expected {expected}")]
    TruthTableLength {
        gate: GateId,
        expected: usize,
        actual: usize,
    },
    #[error("Gate {gate}: constant truth tables are not garbled")]
    ConstantTruthTable { gate: GateId },
    #[error("Gate {gate}: {arity} inputs do not fit a {tweak_size}-byte tweak")]
    ArityExceedsTweak {
        gate: GateId,
        arity: usize,
        tweak_size: usize,
    },
    #[error("Gate {gate}: expected {expected} input keys, got {actual}")]
    InputKeyCount {
        gate: GateId,
        expected: usize,
        actual: usize,
    },
    #[error("Gate {gate}: garbled table holds {actual_rows} rows of {actual_row_size} bytes, expected {expected_rows} of {expected_row_size}")]
    TableShape {
        gate: GateId,
        expected_rows: usize,
        expected_row_size: usize,
        actual_rows: usize,
        actual_row_size: usize,
    },
    #[error("Garbled gate number {garbled} does not match gate {plain}")]
    GateNumberMismatch { garbled: GateId, plain: GateId },
    #[error("Gate {gate}: input wires {garbled:?} do not match {plain:?}")]
    InputWiresMismatch {
        gate: GateId,
        garbled: Vec<WireId>,
        plain: Vec<WireId>,
    },
    #[error("Gate {gate}: output wires {garbled:?} do not match {plain:?}")]
    OutputWiresMismatch {
        gate: GateId,
        garbled: Vec<WireId>,
        plain: Vec<WireId>,
    },
    #[error("Gate {gate}: {source}")]
    Cipher {
        gate: GateId,
        #[source]
        source: CipherError,
    },
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("Gate {gate}: row {row} does not decrypt under its input keys")]
    UndecryptableRow { gate: GateId, row: usize },
    #[error("Gate {gate}: rows with truth bit {truth_bit} decrypt to different keys")]
    InconsistentRows { gate: GateId, truth_bit: bool },
    #[error("Gate {gate}: output 0-key and 1-key are identical")]
    DegenerateOutput { gate: GateId },
    #[error("Gate {gate}: output keys carry the same signal bit")]
    CollidingSignalBits { gate: GateId },
}
pub type GateError = Error;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Cipher { source, .. } => source.kind(),
            Error::Wire(err) => err.kind(),
            Error::Table(err) => err.kind(),
            Error::UndecryptableRow { .. }
            | Error::InconsistentRows { .. }
            | Error::DegenerateOutput { .. }
            | Error::CollidingSignalBits { .. } => ErrorKind::CheatAttempt,
            _ => ErrorKind::MalformedInput,
        }
    }

    pub(crate) fn cipher(gate: GateId) -> impl Fn(CipherError) -> Self {
        move |source| Error::Cipher { gate, source }
    }
}

/// A plain gate: ordered inputs, one or more outputs carrying the same value,
/// and a truth table of `2^n` rows indexed MSB-first over the inputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGate", into = "RawGate")]
pub struct Gate {
    gate_number: GateId,
    input_wires: Vec<WireId>,
    output_wires: Vec<WireId>,
    truth_table: BitVec<u8, Msb0>,
}

impl Gate {
    pub fn new(
        gate_number: GateId,
        input_wires: Vec<WireId>,
        output_wires: Vec<WireId>,
        truth_table: impl IntoIterator<Item = bool>,
    ) -> Result<Self, GateError> {
        let gate = gate_number;
        if input_wires.is_empty() {
            return Err(GateError::NoInputs { gate });
        }
        if output_wires.is_empty() {
            return Err(GateError::NoOutputs { gate });
        }

        let arity = input_wires.len();
        let expected = u32::try_from(arity)
            .ok()
            .and_then(|n| 1usize.checked_shl(n))
            .ok_or(GateError::TooManyInputs { gate, arity })?;

        let truth_table: BitVec<u8, Msb0> = truth_table.into_iter().collect();
        if truth_table.len() != expected {
            return Err(GateError::TruthTableLength {
                gate,
                expected,
                actual: truth_table.len(),
            });
        }
        if truth_table.all() || truth_table.not_any() {
            return Err(GateError::ConstantTruthTable { gate });
        }

        Ok(Self {
            gate_number,
            input_wires,
            output_wires,
            truth_table,
        })
    }

    /// Gate computing `gate_type` over `inputs` into a single output wire.
    pub fn from_type(
        gate_type: GateType,
        gate_number: GateId,
        inputs: Vec<WireId>,
        output: WireId,
    ) -> Result<Self, GateError> {
        Self::new(gate_number, inputs, vec![output], gate_type.truth_table())
    }

    pub fn and(gate_number: GateId, a: WireId, b: WireId, c: WireId) -> Result<Self, GateError> {
        Self::from_type(GateType::And, gate_number, vec![a, b], c)
    }

    pub fn xor(gate_number: GateId, a: WireId, b: WireId, c: WireId) -> Result<Self, GateError> {
        Self::from_type(GateType::Xor, gate_number, vec![a, b], c)
    }

    pub fn not(gate_number: GateId, a: WireId, c: WireId) -> Result<Self, GateError> {
        Self::from_type(GateType::Not, gate_number, vec![a], c)
    }

    pub fn gate_number(&self) -> GateId {
        self.gate_number
    }

    pub fn input_wires(&self) -> &[WireId] {
        &self.input_wires
    }

    pub fn output_wires(&self) -> &[WireId] {
        &self.output_wires
    }

    pub fn arity(&self) -> usize {
        self.input_wires.len()
    }

    pub fn rows(&self) -> usize {
        self.truth_table.len()
    }

    pub fn truth_bit(&self, row: usize) -> bool {
        self.truth_table[row]
    }

    /// Plain evaluation on one value per input wire.
    pub fn compute(&self, inputs: &[bool]) -> Result<bool, GateError> {
        if inputs.len() != self.arity() {
            return Err(GateError::InputKeyCount {
                gate: self.gate_number,
                expected: self.arity(),
                actual: inputs.len(),
            });
        }
        Ok(self.truth_table[tweak::position(inputs)])
    }

    /// The public description handed to the evaluator alongside the table.
    pub fn garbled(&self) -> GarbledGate {
        GarbledGate {
            gate_number: self.gate_number,
            input_wires: self.input_wires.clone(),
            output_wires: self.output_wires.clone(),
        }
    }
}

/// Gate metadata without the truth table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarbledGate {
    pub gate_number: GateId,
    pub input_wires: Vec<WireId>,
    pub output_wires: Vec<WireId>,
}

impl GarbledGate {
    pub fn arity(&self) -> usize {
        self.input_wires.len()
    }

    /// Number of rows the garbled table must hold, `usize::MAX` when `2^n`
    /// does not fit (no table can match it).
    pub fn rows(&self) -> usize {
        u32::try_from(self.arity())
            .ok()
            .and_then(|n| 1usize.checked_shl(n))
            .unwrap_or(usize::MAX)
    }
}

/// Serialized form of a [`Gate`]: either an explicit truth table or a named
/// gate type.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawGate {
    gate_number: GateId,
    input_wires: Vec<WireId>,
    output_wires: Vec<WireId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gate_type: Option<GateType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    truth_table: Option<Vec<bool>>,
}

impl TryFrom<RawGate> for Gate {
    type Error = GateError;

    fn try_from(raw: RawGate) -> Result<Self, Self::Error> {
        let truth_table = match (raw.truth_table, raw.gate_type) {
            (Some(table), _) => table,
            (None, Some(gate_type)) => gate_type.truth_table(),
            (None, None) => Vec::new(),
        };
        Gate::new(raw.gate_number, raw.input_wires, raw.output_wires, truth_table)
    }
}

impl From<Gate> for RawGate {
    fn from(gate: Gate) -> Self {
        RawGate {
            gate_number: gate.gate_number,
            input_wires: gate.input_wires,
            output_wires: gate.output_wires,
            gate_type: None,
            truth_table: Some(gate.truth_table.iter().by_vals().collect()),
        }
    }
}

#[cfg(test)]
mod tests;
