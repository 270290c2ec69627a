use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{commitment::OutputCommitments, errors::CircuitError, structure::BooleanCircuit};
use crate::{
    GarbledGate, GarbledTables, GarbledWire, S, TableError, TranslationTable, WireId,
    encryption::{MultiKeyEncryptionScheme, SchemeKind},
};

/// Active key per wire, as held by the evaluator.
pub type ActiveKeys = HashMap<WireId, S>;

/// What the garbler publishes: gate metadata, one table per gate and the
/// translation table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GarbledCircuit {
    scheme: SchemeKind,
    key_size: usize,
    cipher_size: usize,
    gates: Vec<GarbledGate>,
    party_inputs: Vec<Vec<WireId>>,
    output_wires: Vec<WireId>,
    levels: Vec<Vec<usize>>,
    tables: GarbledTables,
    translation: TranslationTable,
}

impl GarbledCircuit {
    pub(crate) fn new(
        circuit: &BooleanCircuit,
        scheme: SchemeKind,
        key_size: usize,
        cipher_size: usize,
        tables: GarbledTables,
        translation: TranslationTable,
    ) -> Self {
        Self {
            scheme,
            key_size,
            cipher_size,
            gates: circuit.gates().iter().map(|g| g.garbled()).collect(),
            party_inputs: circuit.party_inputs().to_vec(),
            output_wires: circuit.output_wires().to_vec(),
            levels: circuit.levels().to_vec(),
            tables,
            translation,
        }
    }

    /// Rebuild a received garbling from the public circuit and the tables
    /// and translation table sent by the garbler. Both are checked against
    /// the circuit's topology and the scheme's row size.
    pub fn from_parts<E: MultiKeyEncryptionScheme>(
        circuit: &BooleanCircuit,
        scheme: &E,
        tables: GarbledTables,
        translation: TranslationTable,
    ) -> Result<Self, CircuitError> {
        let mut garbled = Self::new(
            circuit,
            E::KIND,
            scheme.key_size(),
            scheme.cipher_size(),
            GarbledTables::default(),
            TranslationTable::default(),
        );
        garbled.set_garbled_tables(tables)?;
        garbled.set_translation_table(translation)?;
        Ok(garbled)
    }

    /// [`Self::from_parts`] over the flat wire formats: concatenated tables
    /// in gate order and one `0`/`1` byte per output wire.
    pub fn from_bytes<E: MultiKeyEncryptionScheme>(
        circuit: &BooleanCircuit,
        scheme: &E,
        tables: &[u8],
        translation: &[u8],
    ) -> Result<Self, CircuitError> {
        let row_counts: Vec<usize> = circuit
            .gates()
            .iter()
            .map(|gate| gate.rows())
            .collect();
        let tables = GarbledTables::from_bytes(tables, &row_counts, scheme.cipher_size())?;
        Self::from_parts(circuit, scheme, tables, TranslationTable::from_bytes(translation)?)
    }

    pub fn scheme(&self) -> SchemeKind {
        self.scheme
    }

    pub fn key_size(&self) -> usize {
        self.key_size
    }

    pub fn cipher_size(&self) -> usize {
        self.cipher_size
    }

    pub fn gates(&self) -> &[GarbledGate] {
        &self.gates
    }

    pub(crate) fn levels(&self) -> &[Vec<usize>] {
        &self.levels
    }

    pub fn input_wires(&self, party: usize) -> Result<&[WireId], CircuitError> {
        self.party_inputs
            .get(party)
            .map(Vec::as_slice)
            .ok_or(CircuitError::UnknownParty {
                party,
                parties: self.party_inputs.len(),
            })
    }

    pub fn output_wires(&self) -> &[WireId] {
        &self.output_wires
    }

    /// Rows each gate's table must hold, in gate order.
    pub fn row_counts(&self) -> Vec<usize> {
        self.gates.iter().map(GarbledGate::rows).collect()
    }

    pub fn garbled_tables(&self) -> &GarbledTables {
        &self.tables
    }

    /// Replace every table at once; the layout must fit this topology.
    pub fn set_garbled_tables(&mut self, tables: GarbledTables) -> Result<(), CircuitError> {
        tables.check_layout(&self.row_counts(), self.cipher_size)?;
        self.tables = tables;
        Ok(())
    }

    /// Parse the flat table format for this topology.
    pub fn tables_from_bytes(&self, bytes: &[u8]) -> Result<GarbledTables, CircuitError> {
        Ok(GarbledTables::from_bytes(
            bytes,
            &self.row_counts(),
            self.cipher_size,
        )?)
    }

    pub fn translation_table(&self) -> &TranslationTable {
        &self.translation
    }

    pub fn set_translation_table(
        &mut self,
        translation: TranslationTable,
    ) -> Result<(), CircuitError> {
        if translation.len() != self.output_wires.len() {
            return Err(TableError::TranslationLength {
                expected: self.output_wires.len(),
                actual: translation.len(),
            }
            .into());
        }
        self.translation = translation;
        Ok(())
    }
}

/// Secrets kept by the garbler: both keys of every input and output wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitCreationValues {
    party_inputs: Vec<Vec<WireId>>,
    input_values: HashMap<WireId, GarbledWire>,
    output_values: Vec<GarbledWire>,
    translation: TranslationTable,
}

impl CircuitCreationValues {
    pub(crate) fn new(
        party_inputs: Vec<Vec<WireId>>,
        input_values: HashMap<WireId, GarbledWire>,
        output_values: Vec<GarbledWire>,
        translation: TranslationTable,
    ) -> Self {
        Self {
            party_inputs,
            input_values,
            output_values,
            translation,
        }
    }

    pub fn input_wire_values(&self) -> &HashMap<WireId, GarbledWire> {
        &self.input_values
    }

    /// Both keys of every output wire, in output order.
    pub fn output_wire_values(&self) -> &[GarbledWire] {
        &self.output_values
    }

    pub fn translation_table(&self) -> &TranslationTable {
        &self.translation
    }

    pub fn output_commitments(&self) -> OutputCommitments {
        OutputCommitments::new(&self.output_values)
    }

    /// One key per input wire of `party`, selected by `bits`.
    pub fn garbled_inputs(&self, party: usize, bits: &[bool]) -> Result<ActiveKeys, CircuitError> {
        let wires = self
            .party_inputs
            .get(party)
            .ok_or(CircuitError::UnknownParty {
                party,
                parties: self.party_inputs.len(),
            })?;
        if wires.len() != bits.len() {
            return Err(CircuitError::InputLengthMismatch {
                party,
                expected: wires.len(),
                actual: bits.len(),
            });
        }

        wires
            .iter()
            .zip(bits)
            .map(|(wire, bit)| {
                self.input_values
                    .get(wire)
                    .map(|pair| (*wire, pair.select(*bit)))
                    .ok_or(CircuitError::MissingInput(*wire))
            })
            .collect()
    }
}
