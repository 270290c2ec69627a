use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::{debug, info, info_span};

use super::{
    CircuitCreationValues, GarbledCircuit,
    config::{Config, Executor},
    errors::CircuitError,
    structure::BooleanCircuit,
};
use crate::{
    GarbledTables, GarbledWire, TranslationTable, WireKeyStore,
    core::progress::maybe_log_progress, encryption::{MultiKeyEncryptionScheme, SchemeKind},
    hw,
};

pub type Seed = u64;

/// Garbles one circuit with a fixed scheme and configuration.
#[derive(Debug)]
pub struct CircuitGarbler<'c, E: MultiKeyEncryptionScheme> {
    circuit: &'c BooleanCircuit,
    scheme: E,
    executor: Executor,
}

impl<'c, E: MultiKeyEncryptionScheme> CircuitGarbler<'c, E> {
    pub fn new(circuit: &'c BooleanCircuit, scheme: E, config: Config) -> Result<Self, CircuitError> {
        config.check_scheme(&scheme)?;
        Ok(Self {
            circuit,
            scheme,
            executor: config.executor()?,
        })
    }

    /// Reproducible garbling: the same seed yields the same keys and tables.
    pub fn garble_with_seed(
        &self,
        seed: Seed,
    ) -> Result<(GarbledCircuit, CircuitCreationValues), CircuitError> {
        self.garble(&mut ChaCha20Rng::seed_from_u64(seed))
    }

    pub fn garble(
        &self,
        rng: &mut impl Rng,
    ) -> Result<(GarbledCircuit, CircuitCreationValues), CircuitError> {
        let _span = info_span!("garble", scheme = %E::KIND, gates = self.circuit.gates().len())
            .entered();
        if E::KIND == SchemeKind::AesFixedKey {
            hw::warn_if_software_aes();
        }

        let keys = self.issue_keys(rng)?;
        let tables = self.garble_tables(&keys)?;

        let output_values = self
            .circuit
            .output_wires()
            .iter()
            .map(|wire| keys.keys(*wire).copied())
            .collect::<Result<Vec<_>, _>>()?;
        let translation = TranslationTable::new(
            output_values.iter().map(GarbledWire::signal_bit).collect(),
        );

        let input_values = self
            .circuit
            .all_input_wires()
            .map(|wire| keys.keys(wire).map(|pair| (wire, *pair)))
            .collect::<Result<HashMap<_, _>, _>>()?;

        info!(
            tables = tables.len(),
            bytes = tables.iter().map(|t| t.as_bytes().len()).sum::<usize>(),
            "garbling done"
        );

        let garbled = GarbledCircuit::new(
            self.circuit,
            E::KIND,
            self.scheme.key_size(),
            self.scheme.cipher_size(),
            tables,
            translation.clone(),
        );
        let creation = CircuitCreationValues::new(
            self.circuit.party_inputs().to_vec(),
            input_values,
            output_values,
            translation,
        );
        Ok((garbled, creation))
    }

    /// Draw a signal bit and key pair for every circuit input, then for every
    /// gate in order. All outputs of a gate share one pair.
    fn issue_keys(&self, rng: &mut impl Rng) -> Result<WireKeyStore, CircuitError> {
        let wires = self.circuit.all_input_wires().count()
            + self
                .circuit
                .gates()
                .iter()
                .map(|gate| gate.output_wires().len())
                .sum::<usize>();
        let mut keys = WireKeyStore::with_capacity(wires);

        for wire in self.circuit.all_input_wires() {
            let signal_bit = rng.random();
            keys.init(wire, GarbledWire::random(rng, signal_bit), signal_bit)?;
        }

        for gate in self.circuit.gates() {
            let signal_bit = rng.random();
            let pair = GarbledWire::random(rng, signal_bit);
            for wire in gate.output_wires() {
                keys.init(*wire, pair, signal_bit)?;
            }
        }

        debug!(wires = keys.size(), "keys issued");
        Ok(keys)
    }

    fn garble_tables(&self, keys: &WireKeyStore) -> Result<GarbledTables, CircuitError> {
        let gates = self.circuit.gates();
        let mut tables = vec![None; gates.len()];
        let mut done = 0;

        for level in self.circuit.levels() {
            let garbled = self
                .executor
                .map_level(level, |&index| gates[index].garble(&self.scheme, keys))?;
            for (index, table) in level.iter().zip(garbled) {
                tables[*index] = Some(table);
            }
            maybe_log_progress("garbled", done, done + level.len());
            done += level.len();
        }

        // levels cover every gate exactly once
        Ok(GarbledTables::new(tables.into_iter().flatten().collect()))
    }
}
