//! Property tests for the delimited-text codec.
//!
//! Invariants tested:
//! - decode(encode(records)) == records for trimmed, delimiter-free fields
//! - decode never panics, whatever the input

use clinic_core::codec::{
    decode_lab_tests, decode_list, decode_medications, encode_lab_tests, encode_list,
    encode_medications,
};
use clinic_core::{LabTestRecord, MedicationRecord, NonEmptyText, Urgency};
use proptest::prelude::*;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn name() -> impl Strategy<Value = NonEmptyText> {
    "[A-Za-z][A-Za-z0-9 ]{0,12}"
        .prop_map(|s| NonEmptyText::new(s).expect("starts with a letter"))
}

fn field() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 .,/-]{0,16}".prop_map(|s| s.trim().to_string())
}

fn lab_field() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ./-]{0,16}".prop_map(|s| s.trim().to_string())
}

fn medication() -> impl Strategy<Value = MedicationRecord> {
    (
        name(),
        field(),
        field(),
        field(),
        field(),
        prop::option::of(any::<u32>()),
    )
        .prop_map(
            |(medicine_name, dosage, frequency, duration, instructions, quantity)| {
                MedicationRecord {
                    medicine_name,
                    dosage,
                    frequency,
                    duration,
                    instructions,
                    quantity,
                }
            },
        )
}

fn lab_test() -> impl Strategy<Value = LabTestRecord> {
    (
        name(),
        lab_field(),
        prop_oneof![
            Just(Urgency::Routine),
            Just(Urgency::Urgent),
            Just(Urgency::Stat)
        ],
    )
        .prop_map(|(test_name, instructions, urgency)| LabTestRecord {
            test_name,
            instructions,
            urgency,
        })
}

// ── proptest! blocks ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn prop_medications_round_trip(records in prop::collection::vec(medication(), 0..5)) {
        prop_assert_eq!(decode_medications(&encode_medications(&records)), records);
    }

    #[test]
    fn prop_lab_tests_round_trip(records in prop::collection::vec(lab_test(), 0..5)) {
        prop_assert_eq!(decode_lab_tests(&encode_lab_tests(&records)), records);
    }

    #[test]
    fn prop_list_round_trip(entries in prop::collection::vec("[A-Za-z0-9][A-Za-z0-9 ]{0,10}", 0..6)) {
        let entries: Vec<String> = entries.iter().map(|e| e.trim().to_string()).collect();
        prop_assert_eq!(decode_list(&encode_list(&entries)), entries);
    }

    /// Arbitrary text decodes to records with non-blank names.
    #[test]
    fn prop_decode_is_total(text in ".{0,64}") {
        for record in decode_medications(&text) {
            prop_assert!(!record.medicine_name.as_str().trim().is_empty());
        }
        for record in decode_lab_tests(&text) {
            prop_assert!(!record.test_name.as_str().trim().is_empty());
        }
        for entry in decode_list(&text) {
            prop_assert!(!entry.is_empty());
        }
    }
}
