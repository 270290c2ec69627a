use tracing::{debug, info_span};

use super::{
    ActiveKeys, GarbledCircuit,
    config::{Config, Executor},
    errors::CircuitError,
};
use crate::{S, WireId, core::progress::maybe_log_progress, encryption::MultiKeyEncryptionScheme};

/// Evaluates garbled circuits produced under the same scheme.
#[derive(Debug)]
pub struct CircuitEvaluator<E: MultiKeyEncryptionScheme> {
    scheme: E,
    executor: Executor,
}

fn active(keys: &ActiveKeys, wire: WireId) -> Result<S, CircuitError> {
    keys.get(&wire).copied().ok_or(CircuitError::MissingInput(wire))
}

impl<E: MultiKeyEncryptionScheme> CircuitEvaluator<E> {
    pub fn new(scheme: E, config: Config) -> Result<Self, CircuitError> {
        config.check_scheme(&scheme)?;
        Ok(Self {
            scheme,
            executor: config.executor()?,
        })
    }

    /// Walk the gates level by level from one key per circuit input and
    /// return the key of every output wire, in output order.
    pub fn evaluate(
        &self,
        circuit: &GarbledCircuit,
        inputs: &ActiveKeys,
    ) -> Result<Vec<S>, CircuitError> {
        let _span = info_span!("evaluate", scheme = %E::KIND, gates = circuit.gates().len())
            .entered();

        let gates = circuit.gates();
        let tables = circuit.garbled_tables();
        if tables.len() != gates.len() {
            return Err(CircuitError::GateCountMismatch {
                expected: gates.len(),
                actual: tables.len(),
            });
        }

        let mut keys = inputs.clone();
        let mut done = 0;

        for level in circuit.levels() {
            let level_inputs = level
                .iter()
                .map(|&index| {
                    gates[index]
                        .input_wires
                        .iter()
                        .map(|wire| active(&keys, *wire))
                        .collect::<Result<Vec<_>, _>>()
                        .map(|inputs| (index, inputs))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let outputs = self.executor.map_level(&level_inputs, |(index, inputs)| {
                let table = tables.get(*index).ok_or(CircuitError::GateCountMismatch {
                    expected: gates.len(),
                    actual: tables.len(),
                })?;
                Ok::<_, CircuitError>(gates[*index].evaluate(&self.scheme, table, inputs)?)
            })?;

            for (index, key) in level.iter().zip(outputs) {
                for wire in &gates[*index].output_wires {
                    keys.insert(*wire, key);
                }
            }

            maybe_log_progress("evaluated", done, done + level.len());
            done += level.len();
        }

        debug!(wires = keys.len(), "evaluation done");
        circuit
            .output_wires()
            .iter()
            .map(|wire| active(&keys, *wire))
            .collect()
    }
}
