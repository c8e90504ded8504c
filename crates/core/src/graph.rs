//! Reference graph derivation.
//!
//! Ancestor identifiers are never taken from callers. A new child is attached to its immediate
//! parent and every other ancestor is found by walking the stored hierarchy upwards:
//!
//! ```text
//! Hospital ← Department ← Doctor ← Patient
//!                           ↑        ↑
//!                           └── Prescription
//! ```
//!
//! A prescription takes department and hospital from its treating doctor, not from its patient.
//!
//! Derivation is read-only, so a failed derivation never leaves a partial write behind.

use crate::entities::{
    Department, Doctor, Document, EntityKind, Hospital, Patient, Prescription, Stored,
};
use crate::error::{ClinicError, ClinicResult};
use crate::store::DocumentStore;
use clinic_uuid::ShardableUuid;

/// The ancestors a child inherits from its immediate parent (the parent included).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AncestorChain {
    pub hospital_id: ShardableUuid,
    pub department_id: Option<ShardableUuid>,
    pub doctor_id: Option<ShardableUuid>,
    pub patient_id: Option<ShardableUuid>,
}

/// Ancestors of a new patient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientChain {
    pub doctor_id: ShardableUuid,
    pub department_id: ShardableUuid,
    pub hospital_id: ShardableUuid,
}

/// Ancestors of a new prescription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrescriptionChain {
    pub patient_id: ShardableUuid,
    pub doctor_id: ShardableUuid,
    pub department_id: ShardableUuid,
    pub hospital_id: ShardableUuid,
}

/// Read-only view of the stored hierarchy.
#[derive(Debug)]
pub struct ReferenceGraph<'a, S> {
    store: &'a S,
}

impl<'a, S: DocumentStore> ReferenceGraph<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Derives the full ancestor chain of a child attached to `parent_id`.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::MissingParent`] if the parent does not exist
    /// - [`ClinicError::CorruptChain`] if the parent exists but one of its own ancestors does not
    /// - [`ClinicError::InvalidInput`] if `parent_kind` cannot have children
    pub fn derive_ancestors(
        &self,
        parent_kind: EntityKind,
        parent_id: &ShardableUuid,
    ) -> ClinicResult<AncestorChain> {
        match parent_kind {
            EntityKind::Hospital => {
                self.require::<Hospital>(parent_id)?;
                Ok(AncestorChain {
                    hospital_id: parent_id.clone(),
                    department_id: None,
                    doctor_id: None,
                    patient_id: None,
                })
            }
            EntityKind::Department => {
                let department = self.require::<Department>(parent_id)?;
                self.expect_exists::<Hospital>(
                    &department.data.hospital_id,
                    EntityKind::Department,
                    parent_id,
                )?;
                Ok(AncestorChain {
                    hospital_id: department.data.hospital_id,
                    department_id: Some(parent_id.clone()),
                    doctor_id: None,
                    patient_id: None,
                })
            }
            EntityKind::Doctor => {
                let doctor = self.require::<Doctor>(parent_id)?;
                let department = self
                    .derive_ancestors(EntityKind::Department, &doctor.data.department_id)
                    .map_err(|e| match e {
                        ClinicError::MissingParent { .. } => ClinicError::CorruptChain {
                            kind: EntityKind::Doctor,
                            id: parent_id.clone(),
                            reason: format!(
                                "department {} does not exist",
                                doctor.data.department_id
                            ),
                        },
                        other => other,
                    })?;
                Ok(AncestorChain {
                    doctor_id: Some(parent_id.clone()),
                    ..department
                })
            }
            EntityKind::Patient => {
                let patient = self.require::<Patient>(parent_id)?;
                Ok(AncestorChain {
                    hospital_id: patient.data.hospital_id,
                    department_id: Some(patient.data.department_id),
                    doctor_id: Some(patient.data.doctor_id),
                    patient_id: Some(parent_id.clone()),
                })
            }
            EntityKind::Prescription => Err(ClinicError::InvalidInput(
                "a prescription cannot be the parent of another entity".into(),
            )),
        }
    }

    /// Ancestors of a patient registered under `doctor_id`.
    pub fn patient_chain(&self, doctor_id: &ShardableUuid) -> ClinicResult<PatientChain> {
        let (department_id, hospital_id) = self.doctor_placement(doctor_id)?;
        Ok(PatientChain {
            doctor_id: doctor_id.clone(),
            department_id,
            hospital_id,
        })
    }

    /// Ancestors of a prescription written by `doctor_id` for `patient_id`.
    ///
    /// Department and hospital follow the doctor. The patient must exist.
    pub fn prescription_chain(
        &self,
        doctor_id: &ShardableUuid,
        patient_id: &ShardableUuid,
    ) -> ClinicResult<PrescriptionChain> {
        let (department_id, hospital_id) = self.doctor_placement(doctor_id)?;
        self.require::<Patient>(patient_id)?;
        Ok(PrescriptionChain {
            patient_id: patient_id.clone(),
            doctor_id: doctor_id.clone(),
            department_id,
            hospital_id,
        })
    }

    /// Checks that a stored patient's ancestors match a live walk from its doctor.
    pub fn verify_patient(&self, patient: &Stored<Patient>) -> ClinicResult<()> {
        let corrupt = |reason: String| ClinicError::CorruptChain {
            kind: EntityKind::Patient,
            id: patient.id.clone(),
            reason,
        };

        let (department_id, hospital_id) = match self.doctor_placement(&patient.data.doctor_id) {
            Ok(placement) => placement,
            Err(
                ClinicError::MissingParent { kind, id }
                | ClinicError::CorruptChain { kind, id, .. },
            ) => {
                return Err(corrupt(format!("{} {} is unreachable", kind, id)));
            }
            Err(e) => return Err(e),
        };

        if department_id != patient.data.department_id {
            return Err(corrupt(format!(
                "stored department {} but doctor belongs to {}",
                patient.data.department_id, department_id
            )));
        }
        if hospital_id != patient.data.hospital_id {
            return Err(corrupt(format!(
                "stored hospital {} but doctor belongs to {}",
                patient.data.hospital_id, hospital_id
            )));
        }
        Ok(())
    }

    /// Checks that a stored prescription's ancestors match a live walk from its doctor and that
    /// its patient still exists.
    pub fn verify_prescription(&self, prescription: &Stored<Prescription>) -> ClinicResult<()> {
        let data = &prescription.data;
        let chain = self
            .prescription_chain(&data.doctor_id, &data.patient_id)
            .map_err(|e| match e {
                ClinicError::MissingParent { kind, id }
                | ClinicError::CorruptChain { kind, id, .. } => ClinicError::CorruptChain {
                    kind: EntityKind::Prescription,
                    id: prescription.id.clone(),
                    reason: format!("{} {} is unreachable", kind, id),
                },
                other => other,
            })?;

        if chain.department_id != data.department_id || chain.hospital_id != data.hospital_id {
            return Err(ClinicError::CorruptChain {
                kind: EntityKind::Prescription,
                id: prescription.id.clone(),
                reason: format!(
                    "stored department {} / hospital {} but doctor belongs to {} / {}",
                    data.department_id, data.hospital_id, chain.department_id, chain.hospital_id
                ),
            });
        }
        Ok(())
    }

    fn doctor_placement(
        &self,
        doctor_id: &ShardableUuid,
    ) -> ClinicResult<(ShardableUuid, ShardableUuid)> {
        let chain = self.derive_ancestors(EntityKind::Doctor, doctor_id)?;
        let department_id = chain.department_id.ok_or_else(|| ClinicError::CorruptChain {
            kind: EntityKind::Doctor,
            id: doctor_id.clone(),
            reason: "no department".into(),
        })?;
        Ok((department_id, chain.hospital_id))
    }

    fn require<T: Document>(&self, id: &ShardableUuid) -> ClinicResult<Stored<T>> {
        self.store
            .get::<T>(id)?
            .ok_or_else(|| ClinicError::MissingParent {
                kind: T::KIND,
                id: id.clone(),
            })
    }

    fn expect_exists<T: Document>(
        &self,
        id: &ShardableUuid,
        child_kind: EntityKind,
        child_id: &ShardableUuid,
    ) -> ClinicResult<()> {
        match self.store.get::<T>(id)? {
            Some(_) => Ok(()),
            None => Err(ClinicError::CorruptChain {
                kind: child_kind,
                id: child_id.clone(),
                reason: format!("{} {} does not exist", T::KIND, id),
            }),
        }
    }
}
