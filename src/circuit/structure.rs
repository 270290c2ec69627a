use std::collections::{HashMap, HashSet, hash_map::Entry};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::errors::CircuitError;
use crate::{Gate, WireId};

/// A boolean circuit: input wires grouped by party, gates in an order where
/// every input is a circuit input or the output of an earlier gate, and the
/// output wires in declared order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCircuit", into = "RawCircuit")]
pub struct BooleanCircuit {
    party_inputs: Vec<Vec<WireId>>,
    gates: Vec<Gate>,
    output_wires: Vec<WireId>,
    /// Gate indices grouped so that every gate of level `l` only reads wires
    /// produced by inputs or by levels `< l`.
    levels: Vec<Vec<usize>>,
}

impl BooleanCircuit {
    pub fn new(
        party_inputs: Vec<Vec<WireId>>,
        gates: Vec<Gate>,
        output_wires: Vec<WireId>,
    ) -> Result<Self, CircuitError> {
        // wire -> depth: inputs are 0, a gate output is one past its deepest input
        let mut depth: HashMap<WireId, usize> = HashMap::new();
        for wire in party_inputs.iter().flatten() {
            if depth.insert(*wire, 0).is_some() {
                return Err(CircuitError::DuplicateWire(*wire));
            }
        }

        let mut gate_numbers = HashSet::with_capacity(gates.len());
        let mut levels: Vec<Vec<usize>> = Vec::new();

        for (index, gate) in gates.iter().enumerate() {
            if !gate_numbers.insert(gate.gate_number()) {
                return Err(CircuitError::DuplicateGateNumber(gate.gate_number()));
            }

            let mut gate_depth = 0;
            for wire in gate.input_wires() {
                let d = depth.get(wire).ok_or(CircuitError::UnresolvedInput {
                    gate: gate.gate_number(),
                    wire: *wire,
                })?;
                gate_depth = gate_depth.max(*d);
            }

            for wire in gate.output_wires() {
                match depth.entry(*wire) {
                    Entry::Occupied(_) => return Err(CircuitError::DuplicateWire(*wire)),
                    Entry::Vacant(vac) => {
                        vac.insert(gate_depth + 1);
                    }
                }
            }

            if levels.len() <= gate_depth {
                levels.resize_with(gate_depth + 1, Vec::new);
            }
            levels[gate_depth].push(index);
        }

        if let Some(wire) = output_wires.iter().find(|w| !depth.contains_key(*w)) {
            return Err(CircuitError::UnknownOutput(*wire));
        }

        debug!(
            parties = party_inputs.len(),
            gates = gates.len(),
            levels = levels.len(),
            outputs = output_wires.len(),
            "circuit built"
        );

        Ok(Self {
            party_inputs,
            gates,
            output_wires,
            levels,
        })
    }

    /// Load an already-parsed circuit description.
    pub fn from_json(json: &str) -> Result<Self, CircuitError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, CircuitError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn levels(&self) -> &[Vec<usize>] {
        &self.levels
    }

    pub fn number_of_parties(&self) -> usize {
        self.party_inputs.len()
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

    pub(crate) fn party_inputs(&self) -> &[Vec<WireId>] {
        &self.party_inputs
    }

    /// Every circuit input, party by party.
    pub fn all_input_wires(&self) -> impl Iterator<Item = WireId> + '_ {
        self.party_inputs.iter().flatten().copied()
    }

    pub fn output_wires(&self) -> &[WireId] {
        &self.output_wires
    }

    /// Plain evaluation, one value per party input wire.
    pub fn compute(&self, inputs: &[Vec<bool>]) -> Result<Vec<bool>, CircuitError> {
        if inputs.len() != self.party_inputs.len() {
            return Err(CircuitError::UnknownParty {
                party: inputs.len(),
                parties: self.party_inputs.len(),
            });
        }

        let mut values: HashMap<WireId, bool> = HashMap::new();
        for (party, (wires, bits)) in self.party_inputs.iter().zip(inputs).enumerate() {
            if wires.len() != bits.len() {
                return Err(CircuitError::InputLengthMismatch {
                    party,
                    expected: wires.len(),
                    actual: bits.len(),
                });
            }
            values.extend(wires.iter().copied().zip(bits.iter().copied()));
        }

        for gate in &self.gates {
            let bits = gate
                .input_wires()
                .iter()
                .map(|w| values.get(w).copied().ok_or(CircuitError::MissingInput(*w)))
                .collect::<Result<Vec<_>, _>>()?;
            let out = gate.compute(&bits)?;
            for wire in gate.output_wires() {
                values.insert(*wire, out);
            }
        }

        self.output_wires
            .iter()
            .map(|w| values.get(w).copied().ok_or(CircuitError::MissingInput(*w)))
            .collect()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawCircuit {
    party_inputs: Vec<Vec<WireId>>,
    gates: Vec<Gate>,
    output_wires: Vec<WireId>,
}

impl TryFrom<RawCircuit> for BooleanCircuit {
    type Error = CircuitError;

    fn try_from(raw: RawCircuit) -> Result<Self, Self::Error> {
        BooleanCircuit::new(raw.party_inputs, raw.gates, raw.output_wires)
    }
}

impl From<BooleanCircuit> for RawCircuit {
    fn from(circuit: BooleanCircuit) -> Self {
        RawCircuit {
            party_inputs: circuit.party_inputs,
            gates: circuit.gates,
            output_wires: circuit.output_wires,
        }
    }
}
