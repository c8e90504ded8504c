//! Structured clinical records carried inside a prescription.

use clinic_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One prescribed medicine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub medicine_name: NonEmptyText,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl MedicationRecord {
    /// A record with only the medicine name set.
    pub fn named(medicine_name: NonEmptyText) -> Self {
        Self {
            medicine_name,
            dosage: String::new(),
            frequency: String::new(),
            duration: String::new(),
            instructions: String::new(),
            quantity: None,
        }
    }
}

/// How quickly a lab order must be processed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    #[default]
    Routine,
    Urgent,
    #[serde(rename = "STAT")]
    Stat,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Routine => "Routine",
            Urgency::Urgent => "Urgent",
            Urgency::Stat => "STAT",
        }
    }

    /// Lenient parse used by the text codec: unknown or blank values fall back to
    /// [`Urgency::Routine`].
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = String;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "routine" => Ok(Urgency::Routine),
            "urgent" => Ok(Urgency::Urgent),
            "stat" => Ok(Urgency::Stat),
            other => Err(format!("unknown urgency '{}'", other)),
        }
    }
}

/// One lab order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabTestRecord {
    pub test_name: NonEmptyText,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub urgency: Urgency,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_parse_is_case_insensitive() {
        assert_eq!("stat".parse::<Urgency>(), Ok(Urgency::Stat));
        assert_eq!(" URGENT ".parse::<Urgency>(), Ok(Urgency::Urgent));
        assert_eq!(Urgency::parse_lenient("Immediate"), Urgency::Routine);
        assert_eq!(Urgency::parse_lenient(""), Urgency::Routine);
    }

    #[test]
    fn test_medication_with_empty_name_is_rejected() {
        let json = r#"{"medicine_name":"  ","dosage":"500mg"}"#;
        assert!(serde_json::from_str::<MedicationRecord>(json).is_err());
    }

    #[test]
    fn test_lab_test_defaults_to_routine() {
        let record: LabTestRecord =
            serde_json::from_str(r#"{"test_name":"CBC"}"#).expect("valid lab test");
        assert_eq!(record.urgency, Urgency::Routine);
        assert_eq!(
            serde_json::to_string(&Urgency::Stat).expect("serialize"),
            "\"STAT\""
        );
    }
}
