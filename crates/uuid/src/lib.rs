//! Identifier and sharded-path utilities.
//!
//! Every stored document (hospital, department, doctor, patient, prescription) is keyed by a
//! *canonical* UUID: **32 lowercase hexadecimal characters** (no hyphens). The canonical form
//! keeps path derivation deterministic across the store implementations.
//!
//! This crate provides:
//! - [`ShardableUuid`], a wrapper that guarantees the canonical format once constructed and
//!   derives sharded storage directories from it.
//! - [`PrescriptionNumber`], the human-readable, time-prefixed number printed on a prescription.
//!
//! ## Sharded directory layout
//! For a canonical UUID `u`, documents live under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `clinic_data/patients/55/0e/550e8400e29b41d4a716446655440000/`

mod service;

pub use service::{PrescriptionNumber, ShardableUuid, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
