use std::collections::HashMap;

use tracing::{debug, info_span, warn};

use super::{
    CircuitCreationValues, GarbledCircuit,
    config::{Config, Executor},
    errors::CircuitError,
    structure::BooleanCircuit,
};
use crate::{
    GarbledWire, TranslationTable, WireId, core::progress::maybe_log_progress,
    encryption::MultiKeyEncryptionScheme,
};

/// Checks a garbled circuit against the plain circuit it claims to garble,
/// given both keys of every circuit input.
#[derive(Debug)]
pub struct CircuitVerifier<'c, E: MultiKeyEncryptionScheme> {
    circuit: &'c BooleanCircuit,
    scheme: E,
    executor: Executor,
}

fn pair_of(
    pairs: &HashMap<WireId, GarbledWire>,
    wire: WireId,
) -> Result<GarbledWire, CircuitError> {
    pairs.get(&wire).copied().ok_or(CircuitError::MissingInput(wire))
}

impl<'c, E: MultiKeyEncryptionScheme> CircuitVerifier<'c, E> {
    pub fn new(circuit: &'c BooleanCircuit, scheme: E, config: Config) -> Result<Self, CircuitError> {
        config.check_scheme(&scheme)?;
        Ok(Self {
            circuit,
            scheme,
            executor: config.executor()?,
        })
    }

    /// Verify every gate bottom-up and return the key pair of every output
    /// wire, in output order. The translation table is not looked at.
    pub fn internal_verify(
        &self,
        garbled: &GarbledCircuit,
        input_values: &HashMap<WireId, GarbledWire>,
    ) -> Result<Vec<GarbledWire>, CircuitError> {
        let _span = info_span!("verify", scheme = %E::KIND, gates = self.circuit.gates().len())
            .entered();

        let gates = self.circuit.gates();
        if garbled.gates().len() != gates.len() {
            return Err(CircuitError::GateCountMismatch {
                expected: gates.len(),
                actual: garbled.gates().len(),
            });
        }
        let tables = garbled.garbled_tables();
        if tables.len() != gates.len() {
            return Err(CircuitError::GateCountMismatch {
                expected: gates.len(),
                actual: tables.len(),
            });
        }

        let mut pairs: HashMap<WireId, GarbledWire> = HashMap::new();
        for wire in self.circuit.all_input_wires() {
            pairs.insert(wire, pair_of(input_values, wire)?);
        }

        let mut done = 0;
        for level in self.circuit.levels() {
            let level_inputs = level
                .iter()
                .map(|&index| {
                    gates[index]
                        .input_wires()
                        .iter()
                        .map(|wire| pair_of(&pairs, *wire))
                        .collect::<Result<Vec<_>, _>>()
                        .map(|inputs| (index, inputs))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let outputs = self.executor.map_level(&level_inputs, |(index, inputs)| {
                let table = tables.get(*index).ok_or(CircuitError::GateCountMismatch {
                    expected: gates.len(),
                    actual: tables.len(),
                })?;
                garbled.gates()[*index]
                    .verify(&gates[*index], &self.scheme, table, inputs)
                    .map_err(|err| {
                        warn!(gate = gates[*index].gate_number(), %err, "gate rejected");
                        CircuitError::from(err)
                    })
            })?;

            for (index, pair) in level.iter().zip(outputs) {
                for wire in gates[*index].output_wires() {
                    pairs.insert(*wire, pair);
                }
            }

            maybe_log_progress("verified", done, done + level.len());
            done += level.len();
        }

        debug!(wires = pairs.len(), "gates verified");
        self.circuit
            .output_wires()
            .iter()
            .map(|wire| pair_of(&pairs, *wire))
            .collect()
    }

    /// Each output pair must carry the translation bit in its 0-key and the
    /// opposite bit in its 1-key.
    pub fn verify_translation_table(
        &self,
        translation: &TranslationTable,
        outputs: &[GarbledWire],
    ) -> Result<(), CircuitError> {
        if translation.len() != outputs.len() {
            return Err(CircuitError::OutputCountMismatch {
                expected: outputs.len(),
                actual: translation.len(),
            });
        }
        for (index, (bit, pair)) in translation.bits().iter().zip(outputs).enumerate() {
            if pair.label0.signal_bit() != *bit || pair.label1.signal_bit() == *bit {
                return Err(CircuitError::TranslationMismatch { index });
            }
        }
        Ok(())
    }

    /// Full check of an opened garbling: every gate, the translation table,
    /// and the output keys the garbler kept for itself.
    pub fn verify(
        &self,
        garbled: &GarbledCircuit,
        creation: &CircuitCreationValues,
    ) -> Result<Vec<GarbledWire>, CircuitError> {
        let outputs = self.internal_verify(garbled, creation.input_wire_values())?;
        self.verify_translation_table(garbled.translation_table(), &outputs)?;

        let expected = creation.output_wire_values();
        if expected.len() != outputs.len() {
            return Err(CircuitError::OutputCountMismatch {
                expected: outputs.len(),
                actual: expected.len(),
            });
        }
        if let Some(index) = outputs.iter().zip(expected).position(|(a, b)| a != b) {
            return Err(CircuitError::OutputKeysMismatch { index });
        }
        Ok(outputs)
    }
}
