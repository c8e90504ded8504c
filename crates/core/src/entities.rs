//! Stored entity types.
//!
//! The registry hierarchy is Hospital → Department → Doctor → Patient → Prescription. Every
//! entity below Hospital carries the identifiers of its ancestors; those fields are always derived
//! by [`ReferenceGraph`](crate::graph::ReferenceGraph) and never taken from a caller, which is why
//! each entity is split into its descriptive *details* (caller supplied) and the stored struct
//! (details plus derived ancestors).

use crate::annotation::RasterPayload;
use crate::records::{LabTestRecord, MedicationRecord};
use chrono::{DateTime, NaiveDate, Utc};
use clinic_types::NonEmptyText;
use clinic_uuid::{PrescriptionNumber, ShardableUuid};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of stored entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Hospital,
    Department,
    Doctor,
    Patient,
    Prescription,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Hospital => "hospital",
            EntityKind::Department => "department",
            EntityKind::Doctor => "doctor",
            EntityKind::Patient => "patient",
            EntityKind::Prescription => "prescription",
        }
    }

    /// Name of the directory holding documents of this kind.
    pub fn dir_name(&self) -> &'static str {
        match self {
            EntityKind::Hospital => "hospitals",
            EntityKind::Department => "departments",
            EntityKind::Doctor => "doctors",
            EntityKind::Patient => "patients",
            EntityKind::Prescription => "prescriptions",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type the document store can persist.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Ancestor references held by this document, nearest first.
    fn ancestors(&self) -> Vec<(EntityKind, &ShardableUuid)>;

    /// True if `id` is this document's ancestor of the given kind.
    fn has_ancestor(&self, kind: EntityKind, id: &ShardableUuid) -> bool {
        self.ancestors()
            .into_iter()
            .any(|(k, ancestor)| k == kind && ancestor == id)
    }
}

/// A document together with its store-assigned identity and timestamps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    pub id: ShardableUuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: T,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hospital {
    pub name: NonEmptyText,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
}

impl Document for Hospital {
    const KIND: EntityKind = EntityKind::Hospital;

    fn ancestors(&self) -> Vec<(EntityKind, &ShardableUuid)> {
        Vec::new()
    }
}

/// An outpatient department (OPD) of a hospital.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentDetails {
    pub name: NonEmptyText,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub hospital_id: ShardableUuid,
    #[serde(flatten)]
    pub details: DepartmentDetails,
}

impl Document for Department {
    const KIND: EntityKind = EntityKind::Department;

    fn ancestors(&self) -> Vec<(EntityKind, &ShardableUuid)> {
        vec![(EntityKind::Hospital, &self.hospital_id)]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorDetails {
    pub name: NonEmptyText,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

/// A doctor belongs to exactly one department; the hospital is reached through it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub department_id: ShardableUuid,
    #[serde(flatten)]
    pub details: DoctorDetails,
}

impl Document for Doctor {
    const KIND: EntityKind = EntityKind::Doctor;

    fn ancestors(&self) -> Vec<(EntityKind, &ShardableUuid)> {
        vec![(EntityKind::Department, &self.department_id)]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDetails {
    pub name: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub blood_group: String,
}

/// A registered patient.
///
/// `doctor_id` is the doctor selected at registration; department and hospital are snapshots
/// derived from that doctor at the time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub doctor_id: ShardableUuid,
    pub department_id: ShardableUuid,
    pub hospital_id: ShardableUuid,
    #[serde(flatten)]
    pub details: PatientDetails,
}

impl Document for Patient {
    const KIND: EntityKind = EntityKind::Patient;

    fn ancestors(&self) -> Vec<(EntityKind, &ShardableUuid)> {
        vec![
            (EntityKind::Doctor, &self.doctor_id),
            (EntityKind::Department, &self.department_id),
            (EntityKind::Hospital, &self.hospital_id),
        ]
    }
}

/// Clinical content of a prescription, decoded from a form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrescriptionContent {
    pub chief_complaint: String,
    pub symptoms: Vec<String>,
    pub diagnosis: Vec<String>,
    pub existing_conditions: Vec<String>,
    pub allergies: Vec<String>,
    pub current_medications: Vec<String>,
    pub past_diseases: Vec<String>,
    pub medications: Vec<MedicationRecord>,
    pub lab_tests: Vec<LabTestRecord>,
    pub clinical_notes: String,
    pub advice: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<NaiveDate>,
}

/// One visit record.
///
/// Department and hospital come from the treating doctor, which may differ from the patient's
/// registration doctor (follow-ups can happen in another department).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub number: PrescriptionNumber,
    pub patient_id: ShardableUuid,
    pub doctor_id: ShardableUuid,
    pub department_id: ShardableUuid,
    pub hospital_id: ShardableUuid,
    #[serde(flatten)]
    pub content: PrescriptionContent,
    /// Raster of the handwritten annotation; empty when nothing was drawn.
    #[serde(default)]
    pub annotation: RasterPayload,
}

impl Document for Prescription {
    const KIND: EntityKind = EntityKind::Prescription;

    fn ancestors(&self) -> Vec<(EntityKind, &ShardableUuid)> {
        vec![
            (EntityKind::Patient, &self.patient_id),
            (EntityKind::Doctor, &self.doctor_id),
            (EntityKind::Department, &self.department_id),
            (EntityKind::Hospital, &self.hospital_id),
        ]
    }
}
