use tracing::trace;

use super::{GarbledGate, Gate, GateError, GateId, tweak};
use crate::{
    GarbledWire, S, WireKeyStore,
    core::{s::S_SIZE, table::GarbledTable},
    encryption::{CipherError, CipherSession, MultiKeyEncryptionScheme},
};

/// Key the session with `keys` and the tweak built from `masked`.
fn key_row<E: MultiKeyEncryptionScheme>(
    session: &mut CipherSession<'_, E>,
    scheme: &E,
    gate: GateId,
    keys: &[S],
    masked: &[bool],
) -> Result<(), GateError> {
    let refs: Vec<&[u8]> = keys.iter().map(|key| &key.0[..]).collect();
    let multi_key = scheme
        .generate_multi_key(&refs)
        .map_err(GateError::cipher(gate))?;
    session.set_key(multi_key);
    session
        .set_tweak(&tweak::tweak(gate, masked, scheme.tweak_size()))
        .map_err(GateError::cipher(gate))
}

fn payload_to_key(gate: GateId, payload: Vec<u8>) -> Result<S, GateError> {
    S::try_from_slice(&payload).ok_or(GateError::Cipher {
        gate,
        source: CipherError::InvalidKey {
            expected: S_SIZE,
            actual: payload.len(),
        },
    })
}

fn check_table_shape(
    gate: GateId,
    table: &GarbledTable,
    rows: usize,
    row_size: usize,
) -> Result<(), GateError> {
    if table.rows() != rows || table.row_size() != row_size {
        return Err(GateError::TableShape {
            gate,
            expected_rows: rows,
            expected_row_size: row_size,
            actual_rows: table.rows(),
            actual_row_size: table.row_size(),
        });
    }
    Ok(())
}

impl Gate {
    /// Encrypt the output key of every plain row at its permuted position.
    ///
    /// Reads both keys and the signal bit of every input wire and the keys of
    /// the first output wire from `keys`.
    pub fn garble<E: MultiKeyEncryptionScheme>(
        &self,
        scheme: &E,
        keys: &WireKeyStore,
    ) -> Result<GarbledTable, GateError> {
        let gate = self.gate_number;
        let arity = self.arity();
        tweak::check_capacity(gate, arity, scheme.tweak_size())?;

        let inputs = self
            .input_wires
            .iter()
            .map(|wire_id| keys.get(*wire_id))
            .collect::<Result<Vec<_>, _>>()?;
        let output = keys.keys(self.output_wires[0])?;

        let cipher_size = scheme.cipher_size();
        let mut bytes = vec![0u8; self.rows() * cipher_size];
        let mut session = scheme.session();

        for row in 0..self.rows() {
            let plain: Vec<bool> = tweak::row_bits(row, arity).collect();
            let masked: Vec<bool> = plain
                .iter()
                .zip(&inputs)
                .map(|(v, wire)| v ^ wire.signal_bit)
                .collect();
            let row_keys: Vec<S> = plain
                .iter()
                .zip(&inputs)
                .map(|(v, wire)| wire.keys.select(*v))
                .collect();

            key_row(&mut session, scheme, gate, &row_keys, &masked)?;

            let position = tweak::position(&masked);
            let out = output.select(self.truth_table[row]);
            session
                .encrypt_into(
                    out.as_ref(),
                    &mut bytes[position * cipher_size..(position + 1) * cipher_size],
                )
                .map_err(GateError::cipher(gate))?;
        }

        trace!(gate, rows = self.rows(), "garbled gate");
        Ok(GarbledTable::from_bytes(bytes, cipher_size)?)
    }
}

impl GarbledGate {
    /// Decrypt the single row addressed by the signal bits of `inputs`, one
    /// key per input wire in order. The output signal bit is embedded in the
    /// returned key.
    pub fn evaluate<E: MultiKeyEncryptionScheme>(
        &self,
        scheme: &E,
        table: &GarbledTable,
        inputs: &[S],
    ) -> Result<S, GateError> {
        let gate = self.gate_number;
        if inputs.len() != self.arity() {
            return Err(GateError::InputKeyCount {
                gate,
                expected: self.arity(),
                actual: inputs.len(),
            });
        }
        tweak::check_capacity(gate, self.arity(), scheme.tweak_size())?;
        check_table_shape(gate, table, self.rows(), scheme.cipher_size())?;

        let masked: Vec<bool> = inputs.iter().map(S::signal_bit).collect();
        let position = tweak::position(&masked);

        let mut session = scheme.session();
        key_row(&mut session, scheme, gate, inputs, &masked)?;

        let row = table.row(position).ok_or(GateError::TableShape {
            gate,
            expected_rows: self.rows(),
            expected_row_size: scheme.cipher_size(),
            actual_rows: table.rows(),
            actual_row_size: table.row_size(),
        })?;
        let payload = session.decrypt(row).map_err(GateError::cipher(gate))?;
        payload_to_key(gate, payload)
    }

    /// Check that the table garbles `plain` under the given input key pairs
    /// and return the output key pair it encodes.
    ///
    /// Metadata is compared before anything is decrypted.
    pub fn verify<E: MultiKeyEncryptionScheme>(
        &self,
        plain: &Gate,
        scheme: &E,
        table: &GarbledTable,
        inputs: &[GarbledWire],
    ) -> Result<GarbledWire, GateError> {
        self.check_matches(plain)?;

        let gate = self.gate_number;
        let arity = self.arity();
        if inputs.len() != arity {
            return Err(GateError::InputKeyCount {
                gate,
                expected: arity,
                actual: inputs.len(),
            });
        }
        for (wire, pair) in self.input_wires.iter().zip(inputs) {
            if pair.label0.signal_bit() == pair.label1.signal_bit() {
                return Err(crate::WireError::InconsistentSignalBit {
                    wire: *wire,
                    signal_bit: pair.signal_bit(),
                }
                .into());
            }
        }
        tweak::check_capacity(gate, arity, scheme.tweak_size())?;
        check_table_shape(gate, table, plain.rows(), scheme.cipher_size())?;

        let mut session = scheme.session();
        let mut zero: Option<S> = None;
        let mut one: Option<S> = None;

        for row in 0..plain.rows() {
            let selected: Vec<S> = tweak::row_bits(row, arity)
                .zip(inputs)
                .map(|(v, pair)| pair.select(v))
                .collect();
            let masked: Vec<bool> = selected.iter().map(S::signal_bit).collect();
            let position = tweak::position(&masked);

            key_row(&mut session, scheme, gate, &selected, &masked)?;

            let ciphertext = table
                .row(position)
                .ok_or(GateError::UndecryptableRow { gate, row })?;
            let payload = match session.decrypt(ciphertext) {
                Ok(payload) => payload,
                Err(CipherError::IntegrityCheckFailed) => {
                    return Err(GateError::UndecryptableRow { gate, row });
                }
                Err(err) => return Err(GateError::Cipher { gate, source: err }),
            };
            let key = payload_to_key(gate, payload)?;

            let truth_bit = plain.truth_bit(row);
            let reference = if truth_bit { &mut one } else { &mut zero };
            match *reference {
                Some(expected) if expected != key => {
                    return Err(GateError::InconsistentRows { gate, truth_bit });
                }
                Some(_) => {}
                None => *reference = Some(key),
            }
        }

        // non-constant truth tables guarantee both references are set
        let (Some(zero), Some(one)) = (zero, one) else {
            return Err(GateError::ConstantTruthTable { gate });
        };
        if zero == one {
            return Err(GateError::DegenerateOutput { gate });
        }
        if zero.signal_bit() == one.signal_bit() {
            return Err(GateError::CollidingSignalBits { gate });
        }

        trace!(gate, "verified gate");
        Ok(GarbledWire::new(zero, one))
    }

    fn check_matches(&self, plain: &Gate) -> Result<(), GateError> {
        if self.gate_number != plain.gate_number {
            return Err(GateError::GateNumberMismatch {
                garbled: self.gate_number,
                plain: plain.gate_number,
            });
        }
        if self.input_wires != plain.input_wires {
            return Err(GateError::InputWiresMismatch {
                gate: self.gate_number,
                garbled: self.input_wires.clone(),
                plain: plain.input_wires.clone(),
            });
        }
        if self.output_wires != plain.output_wires {
            return Err(GateError::OutputWiresMismatch {
                gate: self.gate_number,
                garbled: self.output_wires.clone(),
                plain: plain.output_wires.clone(),
            });
        }
        Ok(())
    }
}
