use rand::Rng;

use super::*;
use crate::{
    AesFixedKeyScheme, Blake3Scheme, CipherError, ErrorKind, GarbledWire, MultiKeyEncryptionScheme, S,
    WireKeyStore,
    core::table::GarbledTable,
    test_utils::trng,
};

const GATE_ID: GateId = 7;

const TEST_CASES: [(bool, bool); 4] =
    [(false, false), (false, true), (true, false), (true, true)];

fn create_test_wire_ids() -> (WireId, WireId, WireId) {
    (WireId(0), WireId(1), WireId(2))
}

/// Fresh keys for every input wire and for the output wires of `gate`.
fn issue_keys(gate: &Gate, rng: &mut impl Rng) -> WireKeyStore {
    let mut store = WireKeyStore::new();
    for wire in gate.input_wires() {
        let s = rng.random();
        store.init(*wire, GarbledWire::random(rng, s), s).unwrap();
    }
    let s = rng.random();
    let output = GarbledWire::random(rng, s);
    for wire in gate.output_wires() {
        store.init(*wire, output, s).unwrap();
    }
    store
}

fn input_pairs(gate: &Gate, store: &WireKeyStore) -> Vec<GarbledWire> {
    gate.input_wires()
        .iter()
        .map(|w| *store.keys(*w).unwrap())
        .collect()
}

fn test_gate_e2e<E: MultiKeyEncryptionScheme>(
    scheme: &E,
    gate: Gate,
    expected_fn: fn(bool, bool) -> bool,
    gate_name: &str,
) {
    let mut rng = trng();
    let store = issue_keys(&gate, &mut rng);
    let table = gate.garble(scheme, &store).expect("Garbling should succeed");
    assert_eq!(table.rows(), 4);
    assert_eq!(table.as_bytes().len(), 4 * scheme.cipher_size());

    let (wire_a, wire_b, wire_c) = create_test_wire_ids();
    let a = store.keys(wire_a).unwrap();
    let b = store.keys(wire_b).unwrap();
    let c = store.keys(wire_c).unwrap();
    let garbled = gate.garbled();

    for (input_a, input_b) in TEST_CASES {
        let out = garbled
            .evaluate(scheme, &table, &[a.select(input_a), b.select(input_b)])
            .expect("Evaluation should succeed");

        let expected_output = expected_fn(input_a, input_b);
        assert_eq!(
            c.decode(&out),
            Some(expected_output),
            "Evaluation should be correct for {gate_name}({input_a}, {input_b})"
        );
        assert_eq!(
            out.signal_bit(),
            store.signal_bit(wire_c).unwrap() ^ expected_output
        );
    }

    let verified = garbled
        .verify(&gate, scheme, &table, &input_pairs(&gate, &store))
        .expect("Verification should succeed");
    assert_eq!(&verified, c, "{gate_name} verification recovers the output keys");
}

macro_rules! gate_e2e_tests {
    ($($name:ident: $gate_type:expr, $f:expr;)*) => {
        $(
            #[test]
            fn $name() {
                let (wire_a, wire_b, wire_c) = create_test_wire_ids();
                let gate = Gate::from_type($gate_type, GATE_ID, vec![wire_a, wire_b], wire_c).unwrap();
                test_gate_e2e(&AesFixedKeyScheme::new(), gate.clone(), $f, stringify!($name));
                test_gate_e2e(&Blake3Scheme::new(), gate, $f, stringify!($name));
            }
        )*
    };
}

gate_e2e_tests! {
    test_and_gate: GateType::And, |a, b| a && b;
    test_nand_gate: GateType::Nand, |a, b| !(a && b);
    test_nimp_gate: GateType::Nimp, |a, b| a && !b;
    test_imp_gate: GateType::Imp, |a, b| !a || b;
    test_ncimp_gate: GateType::Ncimp, |a, b| !a && b;
    test_cimp_gate: GateType::Cimp, |a, b| !b || a;
    test_nor_gate: GateType::Nor, |a, b| !(a || b);
    test_or_gate: GateType::Or, |a, b| a || b;
    test_xor_gate: GateType::Xor, |a, b| a ^ b;
    test_xnor_gate: GateType::Xnor, |a, b| !(a ^ b);
}

#[test]
fn test_not_gate() {
    let scheme = AesFixedKeyScheme::new();
    let gate = Gate::not(GATE_ID, WireId(0), WireId(1)).unwrap();
    let store = issue_keys(&gate, &mut trng());
    let table = gate.garble(&scheme, &store).unwrap();
    assert_eq!(table.rows(), 2);

    let a = store.keys(WireId(0)).unwrap();
    let c = store.keys(WireId(1)).unwrap();
    for input in [false, true] {
        let out = gate
            .garbled()
            .evaluate(&scheme, &table, &[a.select(input)])
            .unwrap();
        assert_eq!(c.decode(&out), Some(!input), "NOT({input})");
    }
}

#[test]
fn test_and_rows_follow_signal_bits() {
    let scheme = AesFixedKeyScheme::new();
    let mut rng = trng();
    let (w1, w2, w3) = create_test_wire_ids();
    let gate = Gate::and(GATE_ID, w1, w2, w3).unwrap();

    // s1 = 0, s2 = 1
    let k1 = GarbledWire::random(&mut rng, false);
    let k2 = GarbledWire::random(&mut rng, true);
    let k3 = GarbledWire::random(&mut rng, false);
    let mut store = WireKeyStore::new();
    store.init(w1, k1, false).unwrap();
    store.init(w2, k2, true).unwrap();
    store.init(w3, k3, false).unwrap();

    let table = gate.garble(&scheme, &store).unwrap();

    let open_row = |position: usize, a: S, b: S| {
        let mut session = scheme.session();
        session.set_key(scheme.generate_multi_key(&[&a.0, &b.0]).unwrap());
        session
            .set_tweak(&tweak::tweak(
                GATE_ID,
                &[a.signal_bit(), b.signal_bit()],
                scheme.tweak_size(),
            ))
            .unwrap();
        S::try_from_slice(&session.decrypt(table.row(position).unwrap()).unwrap()).unwrap()
    };

    // plain (1,1) is masked to (1,0)
    assert_eq!(open_row(2, k1.label1, k2.label1), k3.label1);
    assert_eq!(open_row(3, k1.label1, k2.label0), k3.label0);
    assert_eq!(open_row(0, k1.label0, k2.label1), k3.label0);
    assert_eq!(open_row(1, k1.label0, k2.label0), k3.label0);
}

#[test]
fn test_three_input_gate_roundtrip() {
    let scheme = Blake3Scheme::new();
    // majority
    let table: Vec<bool> = (0..8u32).map(|r| r.count_ones() >= 2).collect();
    let gate = Gate::new(
        GATE_ID,
        vec![WireId(0), WireId(1), WireId(2)],
        vec![WireId(3), WireId(4)],
        table,
    )
    .unwrap();

    let store = issue_keys(&gate, &mut trng());
    let garbled_table = gate.garble(&scheme, &store).unwrap();
    let pairs = input_pairs(&gate, &store);
    let out_pair = store.keys(WireId(4)).unwrap();

    for row in 0..8 {
        let bits: Vec<bool> = tweak::row_bits(row, 3).collect();
        let keys: Vec<S> = pairs.iter().zip(&bits).map(|(p, b)| p.select(*b)).collect();
        let out = gate
            .garbled()
            .evaluate(&scheme, &garbled_table, &keys)
            .unwrap();
        assert_eq!(out_pair.decode(&out), Some(gate.compute(&bits).unwrap()));
    }

    assert_eq!(
        gate.garbled()
            .verify(&gate, &scheme, &garbled_table, &pairs)
            .unwrap(),
        *out_pair
    );
}

fn check_byte_flips_rejected<E: MultiKeyEncryptionScheme>(scheme: &E, gate: Gate) {
    let store = issue_keys(&gate, &mut trng());
    let table = gate.garble(scheme, &store).unwrap();
    let pairs = input_pairs(&gate, &store);
    let garbled = gate.garbled();

    for index in 0..table.as_bytes().len() {
        let mut tampered = table.clone();
        tampered.bytes_mut()[index] ^= 0x01;

        let err = garbled
            .verify(&gate, scheme, &tampered, &pairs)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CheatAttempt, "byte {index}: {err}");
    }
}

#[test]
fn test_single_byte_flip_is_rejected() {
    let (wire_a, wire_b, wire_c) = create_test_wire_ids();
    let and = Gate::and(GATE_ID, wire_a, wire_b, wire_c).unwrap();
    let or = Gate::from_type(GateType::Or, GATE_ID, vec![wire_a, wire_b], wire_c).unwrap();
    let xor = Gate::xor(GATE_ID, wire_a, wire_b, wire_c).unwrap();

    check_byte_flips_rejected(&AesFixedKeyScheme::new(), and.clone());
    check_byte_flips_rejected(&Blake3Scheme::new(), and);
    check_byte_flips_rejected(&AesFixedKeyScheme::new(), or);
    check_byte_flips_rejected(&Blake3Scheme::new(), xor);
}

#[test]
fn test_flipped_payload_fails_evaluation() {
    let scheme = AesFixedKeyScheme::new();
    let (wire_a, wire_b, wire_c) = create_test_wire_ids();
    let gate = Gate::and(GATE_ID, wire_a, wire_b, wire_c).unwrap();
    let store = issue_keys(&gate, &mut trng());
    let table = gate.garble(&scheme, &store).unwrap();

    // the single row carrying the 1-key
    let inputs = [
        store.keys(wire_a).unwrap().label1,
        store.keys(wire_b).unwrap().label1,
    ];
    let masked: Vec<bool> = inputs.iter().map(S::signal_bit).collect();
    let start = tweak::position(&masked) * scheme.cipher_size();

    for index in start..start + scheme.cipher_size() {
        let mut tampered = table.clone();
        tampered.bytes_mut()[index] ^= 0x80;

        let err = gate
            .garbled()
            .evaluate(&scheme, &tampered, &inputs)
            .unwrap_err();
        assert_eq!(
            err,
            GateError::Cipher {
                gate: GATE_ID,
                source: CipherError::IntegrityCheckFailed
            },
            "byte {index}"
        );
        assert_eq!(err.kind(), ErrorKind::CryptoFailure);
    }
}

#[test]
fn test_evaluate_with_foreign_key_fails() {
    let scheme = Blake3Scheme::new();
    let mut rng = trng();
    let (wire_a, wire_b, wire_c) = create_test_wire_ids();
    let gate = Gate::from_type(GateType::Or, GATE_ID, vec![wire_a, wire_b], wire_c).unwrap();
    let store = issue_keys(&gate, &mut rng);
    let table = gate.garble(&scheme, &store).unwrap();

    let a = store.keys(wire_a).unwrap().label0;
    let err = gate
        .garbled()
        .evaluate(&scheme, &table, &[a, S::random(&mut rng)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CryptoFailure);
}

#[test]
fn test_metadata_mismatch_rejected_before_decryption() {
    let scheme = AesFixedKeyScheme::new();
    let (wire_a, wire_b, wire_c) = create_test_wire_ids();
    let gate = Gate::and(GATE_ID, wire_a, wire_b, wire_c).unwrap();
    let store = issue_keys(&gate, &mut trng());
    let pairs = input_pairs(&gate, &store);
    // not even a well-formed table
    let junk = GarbledTable::from_bytes(vec![0; 32], 32).unwrap();

    let mut garbled = gate.garbled();
    garbled.gate_number += 1;
    assert_eq!(
        garbled.verify(&gate, &scheme, &junk, &pairs),
        Err(GateError::GateNumberMismatch {
            garbled: GATE_ID + 1,
            plain: GATE_ID
        })
    );

    let mut garbled = gate.garbled();
    garbled.input_wires.reverse();
    let err = garbled.verify(&gate, &scheme, &junk, &pairs).unwrap_err();
    assert!(matches!(err, GateError::InputWiresMismatch { .. }));
    assert_eq!(err.kind(), ErrorKind::MalformedInput);

    let mut garbled = gate.garbled();
    garbled.output_wires.push(WireId(9));
    assert!(matches!(
        garbled.verify(&gate, &scheme, &junk, &pairs),
        Err(GateError::OutputWiresMismatch { .. })
    ));
}

/// Hand-built table for a two-input gate: row `r` seals `sealed(r)`.
fn seal_rows<E: MultiKeyEncryptionScheme>(
    scheme: &E,
    pairs: &[GarbledWire],
    sealed: impl Fn(usize) -> S,
) -> GarbledTable {
    let size = scheme.cipher_size();
    let mut bytes = vec![0u8; 4 * size];
    for row in 0..4 {
        let keys: Vec<S> = tweak::row_bits(row, 2)
            .zip(pairs)
            .map(|(v, p)| p.select(v))
            .collect();
        let masked: Vec<bool> = keys.iter().map(S::signal_bit).collect();
        let position = tweak::position(&masked);

        let mut session = scheme.session();
        session.set_key(scheme.generate_multi_key(&[&keys[0].0, &keys[1].0]).unwrap());
        session
            .set_tweak(&tweak::tweak(GATE_ID, &masked, scheme.tweak_size()))
            .unwrap();
        session
            .encrypt_into(&sealed(row).0, &mut bytes[position * size..(position + 1) * size])
            .unwrap();
    }
    GarbledTable::from_bytes(bytes, size).unwrap()
}

#[test]
fn test_identical_output_keys_rejected() {
    let scheme = AesFixedKeyScheme::new();
    let mut rng = trng();
    let (wire_a, wire_b, wire_c) = create_test_wire_ids();
    let gate = Gate::xor(GATE_ID, wire_a, wire_b, wire_c).unwrap();
    let store = issue_keys(&gate, &mut rng);
    let pairs = input_pairs(&gate, &store);

    // every row seals the same key
    let same = S::random(&mut rng);
    let table = seal_rows(&scheme, &pairs, |_| same);

    assert_eq!(
        gate.garbled().verify(&gate, &scheme, &table, &pairs),
        Err(GateError::DegenerateOutput { gate: GATE_ID })
    );
}

#[test]
fn test_output_keys_with_equal_signal_bits_rejected() {
    let scheme = Blake3Scheme::new();
    let mut rng = trng();
    let (wire_a, wire_b, wire_c) = create_test_wire_ids();
    let gate = Gate::xor(GATE_ID, wire_a, wire_b, wire_c).unwrap();
    let store = issue_keys(&gate, &mut rng);
    let pairs = input_pairs(&gate, &store);

    // distinct keys, both carrying signal bit 1
    let zero = S::random_with_signal_bit(&mut rng, true);
    let one = S::random_with_signal_bit(&mut rng, true);
    assert_ne!(zero, one);
    let table = seal_rows(&scheme, &pairs, |row| {
        if gate.truth_bit(row) { one } else { zero }
    });

    let err = gate
        .garbled()
        .verify(&gate, &scheme, &table, &pairs)
        .unwrap_err();
    assert_eq!(err, GateError::CollidingSignalBits { gate: GATE_ID });
    assert_eq!(err.kind(), ErrorKind::CheatAttempt);
}

#[test]
fn test_arity_bound_by_tweak_width() {
    let wires: Vec<WireId> = (0..4).map(WireId).collect();
    let table: Vec<bool> = (0..16).map(|r| r == 15).collect();
    let gate = Gate::new(GATE_ID, wires, vec![WireId(4)], table).unwrap();
    let store = issue_keys(&gate, &mut trng());

    let err = gate.garble(&AesFixedKeyScheme::new(), &store).unwrap_err();
    assert_eq!(
        err,
        GateError::ArityExceedsTweak {
            gate: GATE_ID,
            arity: 4,
            tweak_size: 16
        }
    );
    assert_eq!(err.kind(), ErrorKind::MalformedInput);

    let wide = Blake3Scheme::with_tweak_size(20).unwrap();
    let table = gate.garble(&wide, &store).unwrap();
    assert_eq!(table.rows(), 16);
}

#[test]
fn test_gate_construction_rules() {
    assert_eq!(
        Gate::new(GATE_ID, vec![], vec![WireId(1)], [true, false]),
        Err(GateError::NoInputs { gate: GATE_ID })
    );
    assert_eq!(
        Gate::new(GATE_ID, vec![WireId(0)], vec![], [true, false]),
        Err(GateError::NoOutputs { gate: GATE_ID })
    );
    assert_eq!(
        Gate::new(GATE_ID, vec![WireId(0), WireId(1)], vec![WireId(2)], [true, false]),
        Err(GateError::TruthTableLength {
            gate: GATE_ID,
            expected: 4,
            actual: 2
        })
    );
    assert_eq!(
        Gate::new(GATE_ID, vec![WireId(0)], vec![WireId(1)], [true, true]),
        Err(GateError::ConstantTruthTable { gate: GATE_ID })
    );
}

#[test]
fn test_wide_garbled_gate_is_rejected_without_overflow() {
    let scheme = Blake3Scheme::new();
    let garbled = GarbledGate {
        gate_number: GATE_ID,
        input_wires: (0..70).map(WireId).collect(),
        output_wires: vec![WireId(70)],
    };
    assert_eq!(garbled.rows(), usize::MAX);

    let table = GarbledTable::from_bytes(vec![0; 32], 32).unwrap();
    let err = garbled
        .evaluate(&scheme, &table, &vec![S::ZERO; 70])
        .unwrap_err();
    assert!(matches!(err, GateError::ArityExceedsTweak { arity: 70, .. }));
}

#[test]
fn test_gate_json_accepts_type_or_table() {
    let by_type: Gate = serde_json::from_str(
        r#"{"gate_number":3,"input_wires":[0,1],"output_wires":[2],"gate_type":"and"}"#,
    )
    .unwrap();
    let by_table: Gate = serde_json::from_str(
        r#"{"gate_number":3,"input_wires":[0,1],"output_wires":[2],"truth_table":[false,false,false,true]}"#,
    )
    .unwrap();
    assert_eq!(by_type, by_table);

    let json = serde_json::to_string(&by_type).unwrap();
    assert_eq!(serde_json::from_str::<Gate>(&json).unwrap(), by_type);

    let err = serde_json::from_str::<Gate>(
        r#"{"gate_number":3,"input_wires":[0,1],"output_wires":[2],"truth_table":[true]}"#,
    );
    assert!(err.is_err());
}
