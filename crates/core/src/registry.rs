//! Hospital, department, doctor and patient registration.
//!
//! Creation attaches each entity to its immediate parent and derives the rest of the ancestor
//! chain through [`ReferenceGraph`]. Updates replace descriptive fields only; ancestor ids never
//! change after creation. Deletion is refused while live children still reference the entity.
//!
//! ## Pure Data Operations
//!
//! This module contains **only** data operations. Transport concerns belong in `api-rest` and
//! the CLI.

use crate::entities::{
    Department, DepartmentDetails, Doctor, DoctorDetails, Document, EntityKind, Hospital, Patient,
    PatientDetails, Prescription, Stored,
};
use crate::error::{ClinicError, ClinicResult};
use crate::graph::ReferenceGraph;
use crate::store::DocumentStore;
use clinic_uuid::ShardableUuid;
use std::sync::Arc;

/// Service for registry CRUD over a document store.
#[derive(Debug)]
pub struct RegistryService<S> {
    store: Arc<S>,
}

impl<S> Clone for RegistryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: DocumentStore> RegistryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn graph(&self) -> ReferenceGraph<'_, S> {
        ReferenceGraph::new(&*self.store)
    }

    // ========================================================================
    // HOSPITALS
    // ========================================================================

    pub fn create_hospital(&self, hospital: Hospital) -> ClinicResult<Stored<Hospital>> {
        let stored = self.store.create(hospital)?;
        tracing::info!(id = %stored.id, name = %stored.data.name, "hospital created");
        Ok(stored)
    }

    pub fn hospital(&self, id: &ShardableUuid) -> ClinicResult<Stored<Hospital>> {
        fetch(&*self.store, id)
    }

    pub fn list_hospitals(&self) -> ClinicResult<Vec<Stored<Hospital>>> {
        self.store.list()
    }

    pub fn update_hospital(
        &self,
        id: &ShardableUuid,
        hospital: Hospital,
    ) -> ClinicResult<Stored<Hospital>> {
        replace(&*self.store, id, hospital)
    }

    /// Deletes a hospital that has no departments.
    pub fn delete_hospital(&self, id: &ShardableUuid) -> ClinicResult<()> {
        self.ensure_no_children::<Hospital, Department>(id)?;
        remove::<Hospital, S>(&*self.store, id)
    }

    // ========================================================================
    // DEPARTMENTS
    // ========================================================================

    /// Creates a department under an existing hospital.
    ///
    /// # Errors
    ///
    /// [`ClinicError::MissingParent`] if the hospital does not exist; nothing is written.
    pub fn create_department(
        &self,
        hospital_id: &ShardableUuid,
        details: DepartmentDetails,
    ) -> ClinicResult<Stored<Department>> {
        let chain = self
            .graph()
            .derive_ancestors(EntityKind::Hospital, hospital_id)?;

        let stored = self.store.create(Department {
            hospital_id: chain.hospital_id,
            details,
        })?;
        tracing::info!(id = %stored.id, hospital = %stored.data.hospital_id, "department created");
        Ok(stored)
    }

    pub fn department(&self, id: &ShardableUuid) -> ClinicResult<Stored<Department>> {
        fetch(&*self.store, id)
    }

    pub fn departments_of(
        &self,
        hospital_id: &ShardableUuid,
    ) -> ClinicResult<Vec<Stored<Department>>> {
        self.store
            .list_by_ancestor(EntityKind::Hospital, hospital_id)
    }

    pub fn update_department(
        &self,
        id: &ShardableUuid,
        details: DepartmentDetails,
    ) -> ClinicResult<Stored<Department>> {
        let existing = self.department(id)?;
        replace(
            &*self.store,
            id,
            Department {
                hospital_id: existing.data.hospital_id,
                details,
            },
        )
    }

    /// Deletes a department that has no doctors.
    pub fn delete_department(&self, id: &ShardableUuid) -> ClinicResult<()> {
        self.ensure_no_children::<Department, Doctor>(id)?;
        remove::<Department, S>(&*self.store, id)
    }

    // ========================================================================
    // DOCTORS
    // ========================================================================

    /// Creates a doctor in an existing department.
    pub fn create_doctor(
        &self,
        department_id: &ShardableUuid,
        details: DoctorDetails,
    ) -> ClinicResult<Stored<Doctor>> {
        let chain = self
            .graph()
            .derive_ancestors(EntityKind::Department, department_id)?;
        let department_id = chain.department_id.ok_or_else(|| ClinicError::CorruptChain {
            kind: EntityKind::Department,
            id: department_id.clone(),
            reason: "derivation lost the department".into(),
        })?;

        let stored = self.store.create(Doctor {
            department_id,
            details,
        })?;
        tracing::info!(id = %stored.id, department = %stored.data.department_id, "doctor created");
        Ok(stored)
    }

    pub fn doctor(&self, id: &ShardableUuid) -> ClinicResult<Stored<Doctor>> {
        fetch(&*self.store, id)
    }

    pub fn doctors_of(&self, department_id: &ShardableUuid) -> ClinicResult<Vec<Stored<Doctor>>> {
        self.store
            .list_by_ancestor(EntityKind::Department, department_id)
    }

    pub fn update_doctor(
        &self,
        id: &ShardableUuid,
        details: DoctorDetails,
    ) -> ClinicResult<Stored<Doctor>> {
        let existing = self.doctor(id)?;
        replace(
            &*self.store,
            id,
            Doctor {
                department_id: existing.data.department_id,
                details,
            },
        )
    }

    /// Deletes a doctor that has neither registered patients nor authored prescriptions.
    pub fn delete_doctor(&self, id: &ShardableUuid) -> ClinicResult<()> {
        self.ensure_no_children::<Doctor, Patient>(id)?;
        self.ensure_no_children::<Doctor, Prescription>(id)?;
        remove::<Doctor, S>(&*self.store, id)
    }

    // ========================================================================
    // PATIENTS
    // ========================================================================

    /// Registers a patient under the selected doctor.
    ///
    /// Department and hospital are derived from the doctor; `details` carries no ancestor ids,
    /// so nothing a caller sends can override the derivation.
    pub fn create_patient(
        &self,
        doctor_id: &ShardableUuid,
        details: PatientDetails,
    ) -> ClinicResult<Stored<Patient>> {
        let chain = self.graph().patient_chain(doctor_id)?;

        let stored = self.store.create(Patient {
            doctor_id: chain.doctor_id,
            department_id: chain.department_id,
            hospital_id: chain.hospital_id,
            details,
        })?;
        tracing::info!(
            id = %stored.id,
            doctor = %stored.data.doctor_id,
            department = %stored.data.department_id,
            hospital = %stored.data.hospital_id,
            "patient registered"
        );
        Ok(stored)
    }

    pub fn patient(&self, id: &ShardableUuid) -> ClinicResult<Stored<Patient>> {
        fetch(&*self.store, id)
    }

    pub fn list_patients(&self) -> ClinicResult<Vec<Stored<Patient>>> {
        self.store.list()
    }

    pub fn patients_of(&self, doctor_id: &ShardableUuid) -> ClinicResult<Vec<Stored<Patient>>> {
        self.store.list_by_ancestor(EntityKind::Doctor, doctor_id)
    }

    pub fn update_patient(
        &self,
        id: &ShardableUuid,
        details: PatientDetails,
    ) -> ClinicResult<Stored<Patient>> {
        let existing = self.patient(id)?;
        replace(
            &*self.store,
            id,
            Patient {
                details,
                ..existing.data
            },
        )
    }

    /// Deletes a patient that has no prescriptions.
    pub fn delete_patient(&self, id: &ShardableUuid) -> ClinicResult<()> {
        self.ensure_no_children::<Patient, Prescription>(id)?;
        remove::<Patient, S>(&*self.store, id)
    }

    /// Re-walks a stored patient's chain.
    pub fn verify_patient(&self, id: &ShardableUuid) -> ClinicResult<()> {
        let patient = self.patient(id)?;
        self.graph().verify_patient(&patient)
    }

    fn ensure_no_children<P: Document, C: Document>(&self, id: &ShardableUuid) -> ClinicResult<()> {
        let count = self.store.count_by_ancestor::<C>(P::KIND, id)?;
        if count == 0 {
            return Ok(());
        }
        Err(ClinicError::HasDependents {
            kind: P::KIND,
            id: id.clone(),
            child: C::KIND,
            count,
        })
    }
}

pub(crate) fn fetch<T: Document, S: DocumentStore>(
    store: &S,
    id: &ShardableUuid,
) -> ClinicResult<Stored<T>> {
    store.get::<T>(id)?.ok_or_else(|| ClinicError::NotFound {
        kind: T::KIND,
        id: id.clone(),
    })
}

fn replace<T: Document, S: DocumentStore>(
    store: &S,
    id: &ShardableUuid,
    data: T,
) -> ClinicResult<Stored<T>> {
    let stored = store.update(id, data)?.ok_or_else(|| ClinicError::NotFound {
        kind: T::KIND,
        id: id.clone(),
    })?;
    tracing::info!(id = %stored.id, "{} updated", T::KIND);
    Ok(stored)
}

pub(crate) fn remove<T: Document, S: DocumentStore>(
    store: &S,
    id: &ShardableUuid,
) -> ClinicResult<()> {
    if !store.delete::<T>(id)? {
        return Err(ClinicError::NotFound {
            kind: T::KIND,
            id: id.clone(),
        });
    }
    tracing::info!(id = %id, "{} deleted", T::KIND);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, YamlStore};
    use clinic_types::NonEmptyText;
    use tempfile::TempDir;

    fn text(s: &str) -> NonEmptyText {
        NonEmptyText::new(s).expect("non-empty")
    }

    fn hospital(name: &str) -> Hospital {
        Hospital {
            name: text(name),
            address: String::new(),
            phone: String::new(),
        }
    }

    fn department(name: &str) -> DepartmentDetails {
        DepartmentDetails {
            name: text(name),
            description: String::new(),
        }
    }

    fn doctor(name: &str) -> DoctorDetails {
        DoctorDetails {
            name: text(name),
            specialization: String::new(),
            phone: String::new(),
            email: String::new(),
        }
    }

    fn patient(name: &str) -> PatientDetails {
        PatientDetails {
            name: text(name),
            age: Some(30),
            gender: String::new(),
            phone: String::new(),
            address: String::new(),
            blood_group: String::new(),
        }
    }

    fn registry() -> RegistryService<MemoryStore> {
        RegistryService::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_patient_stores_exactly_the_doctors_chain() {
        let registry = registry();
        let h = registry.create_hospital(hospital("City General")).expect("hospital");
        let d = registry
            .create_department(&h.id, department("Cardiology"))
            .expect("department");
        let dr = registry.create_doctor(&d.id, doctor("Dr Mehta")).expect("doctor");

        let other = registry.create_hospital(hospital("Elsewhere")).expect("hospital");
        assert_ne!(other.id, h.id);

        let p = registry
            .create_patient(&dr.id, patient("Asha Rao"))
            .expect("patient");

        assert_eq!(p.data.doctor_id, dr.id);
        assert_eq!(p.data.department_id, d.id);
        assert_eq!(p.data.hospital_id, h.id);
        registry.verify_patient(&p.id).expect("chain is intact");
    }

    #[test]
    fn test_unknown_doctor_creates_nothing() {
        let registry = registry();
        let err = registry
            .create_patient(&ShardableUuid::new(), patient("Asha Rao"))
            .expect_err("doctor does not exist");

        assert!(matches!(
            err,
            ClinicError::MissingParent {
                kind: EntityKind::Doctor,
                ..
            }
        ));
        assert!(registry.list_patients().expect("list").is_empty());
    }

    #[test]
    fn test_department_requires_hospital() {
        let registry = registry();
        let err = registry
            .create_department(&ShardableUuid::new(), department("Cardiology"))
            .expect_err("hospital does not exist");
        assert!(matches!(
            err,
            ClinicError::MissingParent {
                kind: EntityKind::Hospital,
                ..
            }
        ));
    }

    #[test]
    fn test_update_never_moves_ancestors() {
        let registry = registry();
        let h = registry.create_hospital(hospital("City General")).expect("hospital");
        let d = registry
            .create_department(&h.id, department("Cardiology"))
            .expect("department");
        let dr = registry.create_doctor(&d.id, doctor("Dr Mehta")).expect("doctor");
        let p = registry
            .create_patient(&dr.id, patient("Asha Rao"))
            .expect("patient");

        let updated = registry
            .update_patient(&p.id, patient("Asha R. Rao"))
            .expect("update");

        assert_eq!(updated.data.details.name.as_str(), "Asha R. Rao");
        assert_eq!(updated.data.doctor_id, dr.id);
        assert_eq!(updated.data.department_id, d.id);
        assert_eq!(updated.data.hospital_id, h.id);
        assert_eq!(updated.created_at, p.created_at);
    }

    #[test]
    fn test_delete_refuses_parents_with_children() {
        let registry = registry();
        let h = registry.create_hospital(hospital("City General")).expect("hospital");
        let d = registry
            .create_department(&h.id, department("Cardiology"))
            .expect("department");

        let err = registry.delete_hospital(&h.id).expect_err("has a department");
        match err {
            ClinicError::HasDependents { kind, child, count, .. } => {
                assert_eq!(kind, EntityKind::Hospital);
                assert_eq!(child, EntityKind::Department);
                assert_eq!(count, 1);
            }
            other => panic!("Expected HasDependents, got {:?}", other),
        }

        registry.delete_department(&d.id).expect("no doctors yet");
        registry.delete_hospital(&h.id).expect("no departments left");
        assert!(matches!(
            registry.hospital(&h.id),
            Err(ClinicError::NotFound { .. })
        ));
    }

    #[test]
    fn test_listings_by_parent() {
        let registry = registry();
        let h = registry.create_hospital(hospital("City General")).expect("hospital");
        let cardio = registry
            .create_department(&h.id, department("Cardiology"))
            .expect("department");
        let neuro = registry
            .create_department(&h.id, department("Neurology"))
            .expect("department");
        registry.create_doctor(&cardio.id, doctor("Dr A")).expect("doctor");
        registry.create_doctor(&cardio.id, doctor("Dr B")).expect("doctor");
        registry.create_doctor(&neuro.id, doctor("Dr C")).expect("doctor");

        assert_eq!(registry.departments_of(&h.id).expect("list").len(), 2);
        assert_eq!(registry.doctors_of(&cardio.id).expect("list").len(), 2);
        assert_eq!(registry.doctors_of(&neuro.id).expect("list").len(), 1);
    }

    #[test]
    fn test_registry_over_yaml_store() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let registry = RegistryService::new(Arc::new(YamlStore::new(temp_dir.path())));

        let h = registry.create_hospital(hospital("City General")).expect("hospital");
        let d = registry
            .create_department(&h.id, department("Cardiology"))
            .expect("department");
        let dr = registry.create_doctor(&d.id, doctor("Dr Mehta")).expect("doctor");
        let p = registry
            .create_patient(&dr.id, patient("Asha Rao"))
            .expect("patient");

        let reloaded = registry.patient(&p.id).expect("patient on disk");
        assert_eq!(reloaded, p);
        assert_eq!(registry.patients_of(&dr.id).expect("list").len(), 1);
    }

    #[test]
    fn test_unreadable_child_blocks_parent_delete() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let registry = RegistryService::new(Arc::new(YamlStore::new(temp_dir.path())));

        let h = registry.create_hospital(hospital("City General")).expect("hospital");
        let d = registry
            .create_department(&h.id, department("Cardiology"))
            .expect("department");
        let record = d
            .id
            .sharded_dir(&temp_dir.path().join(EntityKind::Department.dir_name()))
            .join(crate::constants::RECORD_FILENAME);
        std::fs::write(&record, "name: [unterminated").expect("corrupt department record");

        assert!(registry.delete_hospital(&h.id).is_err());
        assert!(registry.hospital(&h.id).is_ok());
    }
}

