use super::{commitment::OutputCommitments, errors::CircuitError};
use crate::{GarbledWire, S, TranslationTable};

fn check_count(expected: usize, actual: usize) -> Result<(), CircuitError> {
    if expected != actual {
        return Err(CircuitError::OutputCountMismatch { expected, actual });
    }
    Ok(())
}

/// Plain output bits: the embedded signal bit of each output key XOR the
/// wire's translation bit.
pub fn translate(
    output_keys: &[S],
    translation: &TranslationTable,
) -> Result<Vec<bool>, CircuitError> {
    check_count(translation.len(), output_keys.len())?;
    Ok(output_keys
        .iter()
        .zip(translation.bits())
        .map(|(key, bit)| key.signal_bit() ^ bit)
        .collect())
}

/// Decode each output key against both keys of its wire. A key that is
/// neither is a cheat attempt.
pub fn verified_translate(
    output_keys: &[S],
    output_values: &[GarbledWire],
) -> Result<Vec<bool>, CircuitError> {
    check_count(output_values.len(), output_keys.len())?;
    output_keys
        .iter()
        .zip(output_values)
        .enumerate()
        .map(|(index, (key, pair))| {
            pair.decode(key)
                .ok_or(CircuitError::ForeignOutputKey { index })
        })
        .collect()
}

/// Like [`verified_translate`] for an evaluator that only holds hashes of
/// the output keys. The opened value must agree with the translation table.
pub fn translate_committed(
    output_keys: &[S],
    commitments: &OutputCommitments,
    translation: &TranslationTable,
) -> Result<Vec<bool>, CircuitError> {
    let translated = translate(output_keys, translation)?;
    check_count(commitments.len(), output_keys.len())?;

    output_keys
        .iter()
        .zip(commitments.iter())
        .zip(translated)
        .enumerate()
        .map(|(index, ((key, commit), expected))| {
            let value = commit
                .open(key)
                .ok_or(CircuitError::ForeignOutputKey { index })?;
            if value != expected {
                return Err(CircuitError::CommitmentMismatch { index });
            }
            Ok(value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, test_utils::trng};

    #[test]
    fn translate_uses_signal_bits() {
        let mut rng = trng();
        let wires = [
            GarbledWire::random(&mut rng, false),
            GarbledWire::random(&mut rng, true),
        ];
        let table = TranslationTable::new(wires.iter().map(GarbledWire::signal_bit).collect());

        let keys = [wires[0].label1, wires[1].label0];
        assert_eq!(translate(&keys, &table).unwrap(), [true, false]);
        assert_eq!(verified_translate(&keys, &wires).unwrap(), [true, false]);
    }

    #[test]
    fn foreign_key_is_a_cheat_attempt() {
        let mut rng = trng();
        let wires = [GarbledWire::random(&mut rng, true)];
        let err = verified_translate(&[S::random(&mut rng)], &wires).unwrap_err();

        assert_eq!(err, CircuitError::ForeignOutputKey { index: 0 });
        assert_eq!(err.kind(), ErrorKind::CheatAttempt);
    }

    #[test]
    fn committed_translation_cross_checks_table() {
        let mut rng = trng();
        let wires = [GarbledWire::random(&mut rng, false)];
        let commitments = OutputCommitments::new(&wires);
        let honest = TranslationTable::new(vec![false]);

        assert_eq!(
            translate_committed(&[wires[0].label1], &commitments, &honest).unwrap(),
            [true]
        );

        let flipped = TranslationTable::new(vec![true]);
        assert_eq!(
            translate_committed(&[wires[0].label1], &commitments, &flipped),
            Err(CircuitError::CommitmentMismatch { index: 0 })
        );
        assert_eq!(
            translate_committed(&[S::random(&mut rng)], &commitments, &honest)
                .unwrap_err()
                .kind(),
            ErrorKind::CheatAttempt
        );
    }

    #[test]
    fn count_mismatch_is_malformed() {
        let table = TranslationTable::new(vec![true, false]);
        let err = translate(&[S::ZERO], &table).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }
}
