//! Internal implementation of the identifier types.

use crate::{UuidError, UuidResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Canonical document identifier (32 lowercase hex characters, no hyphens).
///
/// Once constructed the contained UUID is guaranteed to be canonical, so it can be used to
/// derive storage paths and compared as a plain string.
///
/// # Construction
/// - [`ShardableUuid::new`] generates a fresh identifier (store-side, on create).
/// - [`ShardableUuid::parse`] validates an externally supplied identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShardableUuid(Uuid);

impl Default for ShardableUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl ShardableUuid {
    /// Generates a new random (v4) identifier in canonical form.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be in canonical form.
    ///
    /// Hyphenated or uppercase forms are rejected rather than normalised, so the same record can
    /// never be addressed by two different strings.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "UUID must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("invalid UUID '{}': {}", input, e)))
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is exactly 32 characters of `0-9a-f`.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent_dir/<s1>/<s2>/<uuid>/` where `s1`/`s2` are the first two pairs of hex
    /// characters of this identifier.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent_dir.join(s1).join(s2).join(&canonical)
    }
}

impl fmt::Display for ShardableUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for ShardableUuid {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShardableUuid::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ShardableUuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ShardableUuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ShardableUuid::parse(&s).map_err(serde::de::Error::custom)
    }
}

const NUMBER_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
const NUMBER_SUFFIX_LEN: usize = 8;

/// A human-readable prescription number.
///
/// Format:
/// `<PREFIX>-YYYYMMDD-HHMMSS-<8 uppercase hex>`
///
/// Example:
/// `RX-20261019-143522-3FA2C1D0`
///
/// The timestamp makes numbers sort by issue time when printed side by side; the random suffix
/// keeps two prescriptions issued in the same second apart.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PrescriptionNumber {
    prefix: String,
    issued_at: DateTime<Utc>,
    suffix: String,
}

impl PrescriptionNumber {
    /// Generates a new number for a prescription issued at `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `prefix` is empty or not ASCII alphanumeric.
    pub fn generate(prefix: &str, issued_at: DateTime<Utc>) -> UuidResult<Self> {
        validate_prefix(prefix)?;
        let suffix = Uuid::new_v4().simple().to_string()[..NUMBER_SUFFIX_LEN].to_ascii_uppercase();
        let issued_at = DateTime::<Utc>::from_timestamp(issued_at.timestamp(), 0).unwrap_or(issued_at);
        Ok(Self {
            prefix: prefix.to_string(),
            issued_at,
            suffix,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Issue time, truncated to whole seconds.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

fn validate_prefix(prefix: &str) -> UuidResult<()> {
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(UuidError::InvalidInput(format!(
            "prescription number prefix must be non-empty ASCII alphanumeric, got: '{}'",
            prefix
        )));
    }
    Ok(())
}

impl fmt::Display for PrescriptionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.prefix,
            self.issued_at.format(NUMBER_TIMESTAMP_FORMAT),
            self.suffix
        )
    }
}

impl FromStr for PrescriptionNumber {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || UuidError::InvalidInput(format!("Invalid prescription number: '{}'", s));

        let mut parts = s.splitn(4, '-');
        let (prefix, date, time, suffix) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(p), Some(d), Some(t), Some(x)) => (p, d, t, x),
                _ => return Err(invalid()),
            };

        validate_prefix(prefix)?;

        let naive = NaiveDateTime::parse_from_str(
            &format!("{}-{}", date, time),
            NUMBER_TIMESTAMP_FORMAT,
        )
        .map_err(|e| {
            UuidError::InvalidInput(format!("Invalid prescription number timestamp '{}': {}", s, e))
        })?;

        let suffix_ok = suffix.len() == NUMBER_SUFFIX_LEN
            && suffix
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'A'..=b'F'));
        if !suffix_ok {
            return Err(invalid());
        }

        Ok(Self {
            prefix: prefix.to_string(),
            issued_at: DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc),
            suffix: suffix.to_string(),
        })
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for PrescriptionNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for PrescriptionNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_generates_canonical_uuid() {
        let id = ShardableUuid::new();
        assert!(ShardableUuid::is_canonical(&id.to_string()));
    }

    #[test]
    fn test_parse_rejects_hyphenated_uuid() {
        let result = ShardableUuid::parse("550e8400-e29b-41d4-a716-446655440000");
        match result {
            Err(UuidError::InvalidInput(msg)) => {
                assert!(msg.contains("32 lowercase hex characters"));
            }
            _ => panic!("Expected InvalidInput error"),
        }
    }

    #[test]
    fn test_parse_rejects_uppercase_and_wrong_length() {
        assert!(ShardableUuid::parse("550E8400E29B41D4A716446655440000").is_err());
        assert!(ShardableUuid::parse("550e8400e29b41d4a71644665544000").is_err());
        assert!(ShardableUuid::parse("").is_err());
    }

    #[test]
    fn test_sharded_dir_structure() {
        let id = ShardableUuid::parse("550e8400e29b41d4a716446655440000").unwrap();
        let sharded = id.sharded_dir(Path::new("/clinic_data/patients"));

        assert_eq!(
            sharded,
            PathBuf::from("/clinic_data/patients/55/0e/550e8400e29b41d4a716446655440000")
        );
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let id = ShardableUuid::parse("550e8400e29b41d4a716446655440000").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"550e8400e29b41d4a716446655440000\"");

        let back: ShardableUuid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<ShardableUuid>("\"not-a-uuid\"").is_err());
    }

    #[test]
    fn test_prescription_number_format() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 14, 35, 22).unwrap();
        let number = PrescriptionNumber::generate("RX", at).expect("prefix is valid");
        let shown = number.to_string();

        assert!(shown.starts_with("RX-20261019-143522-"), "got {}", shown);
        assert_eq!(shown.len(), "RX-20261019-143522-".len() + 8);

        let parsed: PrescriptionNumber = shown.parse().expect("should parse own output");
        assert_eq!(parsed, number);
        assert_eq!(parsed.issued_at(), at);
        assert_eq!(parsed.prefix(), "RX");
    }

    #[test]
    fn test_prescription_number_rejects_bad_prefix() {
        let at = Utc::now();
        assert!(PrescriptionNumber::generate("", at).is_err());
        assert!(PrescriptionNumber::generate("R-X", at).is_err());
    }

    #[test]
    fn test_prescription_number_parse_rejects_garbage() {
        assert!("RX-2026".parse::<PrescriptionNumber>().is_err());
        assert!("RX-20261399-143522-3FA2C1D0"
            .parse::<PrescriptionNumber>()
            .is_err());
        assert!("RX-20261019-143522-3fa2c1d0"
            .parse::<PrescriptionNumber>()
            .is_err());
    }
}
