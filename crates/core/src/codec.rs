//! Delimited-text encoding of clinical records.
//!
//! Prescription forms carry structured data through single plain-text fields:
//!
//! - medications: records separated by `;`, fields by `|`:
//!   `medicineName|dosage|frequency|duration|instructions|quantity`
//! - lab tests: records separated by `,`, fields by `|`: `testName|instructions|urgency`
//! - simple lists (symptoms, diagnosis, allergies, ...): entries separated by `,`
//!
//! Decoding never fails. Missing trailing fields become empty (or absent), an unparseable
//! quantity becomes absent, an unknown urgency becomes `Routine`, and records without a name are
//! dropped. Encoding is total and is the left inverse of decoding up to whitespace trimming and
//! omission of empty trailing fields.

use crate::records::{LabTestRecord, MedicationRecord, Urgency};
use clinic_types::NonEmptyText;

const MEDICATION_SEPARATOR: char = ';';
const LAB_TEST_SEPARATOR: char = ',';
const LIST_SEPARATOR: char = ',';
const FIELD_SEPARATOR: char = '|';

/// Decodes a medication field.
pub fn decode_medications(text: &str) -> Vec<MedicationRecord> {
    text.split(MEDICATION_SEPARATOR)
        .filter_map(decode_medication)
        .collect()
}

fn decode_medication(record: &str) -> Option<MedicationRecord> {
    let mut fields = record.split(FIELD_SEPARATOR).map(str::trim);
    let medicine_name = NonEmptyText::non_blank(fields.next()?)?;
    let mut next = || fields.next().unwrap_or_default().to_string();

    let dosage = next();
    let frequency = next();
    let duration = next();
    let instructions = next();
    let quantity = next().parse::<u32>().ok();

    Some(MedicationRecord {
        medicine_name,
        dosage,
        frequency,
        duration,
        instructions,
        quantity,
    })
}

/// Encodes medications; records are joined with `"; "`.
pub fn encode_medications(records: &[MedicationRecord]) -> String {
    records
        .iter()
        .map(|record| {
            let quantity = record.quantity.map(|q| q.to_string()).unwrap_or_default();
            join_fields(
                &[
                    record.medicine_name.as_str(),
                    &record.dosage,
                    &record.frequency,
                    &record.duration,
                    &record.instructions,
                    &quantity,
                ],
                &[MEDICATION_SEPARATOR],
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Decodes a lab-test field.
pub fn decode_lab_tests(text: &str) -> Vec<LabTestRecord> {
    text.split(LAB_TEST_SEPARATOR)
        .filter_map(decode_lab_test)
        .collect()
}

fn decode_lab_test(record: &str) -> Option<LabTestRecord> {
    let mut fields = record.split(FIELD_SEPARATOR).map(str::trim);
    let test_name = NonEmptyText::non_blank(fields.next()?)?;
    let instructions = fields.next().unwrap_or_default().to_string();
    let urgency = Urgency::parse_lenient(fields.next().unwrap_or_default());

    Some(LabTestRecord {
        test_name,
        instructions,
        urgency,
    })
}

/// Encodes lab tests; records are joined with `", "`.
pub fn encode_lab_tests(records: &[LabTestRecord]) -> String {
    records
        .iter()
        .map(|record| {
            join_fields(
                &[
                    record.test_name.as_str(),
                    &record.instructions,
                    record.urgency.as_str(),
                ],
                &[LAB_TEST_SEPARATOR],
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decodes a comma-separated list, trimming entries and dropping blanks.
pub fn decode_list(text: &str) -> Vec<String> {
    text.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Encodes a list with `", "`. Blank entries are omitted.
pub fn encode_list<S: AsRef<str>>(entries: &[S]) -> String {
    entries
        .iter()
        .map(|entry| sanitize(entry.as_ref(), &[LIST_SEPARATOR]))
        .filter(|entry| !entry.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Joins sanitised fields with `|`, dropping empty trailing fields.
fn join_fields(fields: &[&str], record_separators: &[char]) -> String {
    let mut reserved = vec![FIELD_SEPARATOR];
    reserved.extend_from_slice(record_separators);

    let mut cleaned: Vec<String> = fields.iter().map(|f| sanitize(f, &reserved)).collect();
    while cleaned.len() > 1 && cleaned.last().is_some_and(String::is_empty) {
        cleaned.pop();
    }
    cleaned.join(&FIELD_SEPARATOR.to_string())
}

/// Replaces delimiter characters inside a field with spaces and trims it.
fn sanitize(field: &str, reserved: &[char]) -> String {
    field
        .chars()
        .map(|c| if reserved.contains(&c) { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> NonEmptyText {
        NonEmptyText::new(s).expect("non-empty")
    }

    fn paracetamol() -> MedicationRecord {
        MedicationRecord {
            medicine_name: text("Paracetamol"),
            dosage: "500mg".into(),
            frequency: "Twice daily".into(),
            duration: "7 days".into(),
            instructions: "After meals".into(),
            quantity: Some(14),
        }
    }

    #[test]
    fn test_encode_medication_example() {
        assert_eq!(
            encode_medications(&[paracetamol()]),
            "Paracetamol|500mg|Twice daily|7 days|After meals|14"
        );
    }

    #[test]
    fn test_medication_round_trip() {
        let amoxicillin = MedicationRecord {
            instructions: "Take with water, not milk".into(),
            ..MedicationRecord::named(text("Amoxicillin"))
        };
        let records = vec![paracetamol(), amoxicillin];

        assert_eq!(decode_medications(&encode_medications(&records)), records);
    }

    #[test]
    fn test_nameless_medication_is_dropped() {
        let decoded = decode_medications("|500mg|Twice daily|||; Amoxicillin|250mg|||");

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].medicine_name.as_str(), "Amoxicillin");
        assert_eq!(decoded[0].dosage, "250mg");
        assert_eq!(decoded[0].frequency, "");
        assert_eq!(decoded[0].quantity, None);
    }

    #[test]
    fn test_missing_fields_and_bad_quantity() {
        let decoded = decode_medications("Ibuprofen|200mg;Cetirizine|10mg|||| ten ");

        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].dosage, "200mg");
        assert_eq!(decoded[0].frequency, "");
        assert_eq!(decoded[0].instructions, "");
        assert_eq!(decoded[0].quantity, None);
        assert_eq!(decoded[1].quantity, None);
    }

    #[test]
    fn test_empty_text_decodes_to_nothing() {
        assert!(decode_medications("").is_empty());
        assert!(decode_medications(" ; ;").is_empty());
        assert!(decode_lab_tests("").is_empty());
        assert!(decode_list(" , ,").is_empty());
    }

    #[test]
    fn test_unknown_urgency_defaults_to_routine() {
        let decoded = decode_lab_tests("CBC|Fasting|Immediate");

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].test_name.as_str(), "CBC");
        assert_eq!(decoded[0].instructions, "Fasting");
        assert_eq!(decoded[0].urgency, Urgency::Routine);
    }

    #[test]
    fn test_lab_tests_round_trip() {
        let records = vec![
            LabTestRecord {
                test_name: text("CBC"),
                instructions: "Fasting".into(),
                urgency: Urgency::Stat,
            },
            LabTestRecord {
                test_name: text("Lipid panel"),
                instructions: String::new(),
                urgency: Urgency::Routine,
            },
        ];
        let encoded = encode_lab_tests(&records);

        assert_eq!(encoded, "CBC|Fasting|STAT, Lipid panel||Routine");
        assert_eq!(decode_lab_tests(&encoded), records);
    }

    #[test]
    fn test_delimiters_inside_fields_are_neutralised() {
        let record = MedicationRecord {
            instructions: "morning; evening | night".into(),
            ..MedicationRecord::named(text("Metformin"))
        };
        let decoded = decode_medications(&encode_medications(&[record]));

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].instructions, "morning  evening   night");
    }

    #[test]
    fn test_list_codec() {
        let decoded = decode_list(" fever, cough ,, headache ,");
        assert_eq!(decoded, vec!["fever", "cough", "headache"]);
        assert_eq!(encode_list(&decoded), "fever, cough, headache");
        assert_eq!(encode_list(&["a, b", " ", "c"]), "a  b, c");
    }
}
