//! Prescription assembly.
//!
//! [`PrescriptionAssembler`] merges the three inputs of a visit into one stored
//! [`Prescription`]:
//!
//! 1. the doctor and patient selections, turned into an ancestor chain by [`ReferenceGraph`]
//! 2. the raw form, decoded by the [`codec`](crate::codec)
//! 3. the annotation engine, snapshotted into a raster payload
//!
//! Every step that can fail runs before the single write, so a rejected prescription leaves
//! nothing behind.

use crate::annotation::AnnotationEngine;
use crate::codec::{decode_lab_tests, decode_list, decode_medications};
use crate::config::CoreConfig;
use crate::entities::{EntityKind, Prescription, PrescriptionContent, Stored};
use crate::error::{ClinicError, ClinicResult};
use crate::graph::ReferenceGraph;
use crate::registry::{fetch, remove};
use crate::store::DocumentStore;
use chrono::{NaiveDate, Utc};
use clinic_uuid::{PrescriptionNumber, ShardableUuid};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The prescription form as typed by the user: every structured field is plain delimited text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrescriptionForm {
    pub chief_complaint: String,
    /// Comma-separated.
    pub symptoms: String,
    pub diagnosis: String,
    pub existing_conditions: String,
    pub allergies: String,
    pub current_medications: String,
    pub past_diseases: String,
    /// `name|dosage|frequency|duration|instructions|quantity; ...`
    pub medications: String,
    /// `name|instructions|urgency, ...`
    pub lab_tests: String,
    pub clinical_notes: String,
    pub advice: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<NaiveDate>,
}

impl PrescriptionForm {
    /// Decodes the form. Never fails: malformed text yields defaults or is dropped.
    pub fn decode(&self) -> PrescriptionContent {
        PrescriptionContent {
            chief_complaint: self.chief_complaint.trim().to_string(),
            symptoms: decode_list(&self.symptoms),
            diagnosis: decode_list(&self.diagnosis),
            existing_conditions: decode_list(&self.existing_conditions),
            allergies: decode_list(&self.allergies),
            current_medications: decode_list(&self.current_medications),
            past_diseases: decode_list(&self.past_diseases),
            medications: decode_medications(&self.medications),
            lab_tests: decode_lab_tests(&self.lab_tests),
            clinical_notes: self.clinical_notes.trim().to_string(),
            advice: self.advice.trim().to_string(),
            follow_up_date: self.follow_up_date,
        }
    }
}

/// Builds, revises and removes prescriptions.
#[derive(Debug)]
pub struct PrescriptionAssembler<S> {
    cfg: Arc<CoreConfig>,
    store: Arc<S>,
}

impl<S> Clone for PrescriptionAssembler<S> {
    fn clone(&self) -> Self {
        Self {
            cfg: self.cfg.clone(),
            store: self.store.clone(),
        }
    }
}

impl<S: DocumentStore> PrescriptionAssembler<S> {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<S>) -> Self {
        Self { cfg, store }
    }

    /// Creates a prescription for one visit.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::MissingSelection`] if no doctor or no patient was selected; storage is
    ///   not consulted
    /// - [`ClinicError::MissingParent`] if the doctor or patient does not exist
    /// - [`ClinicError::RasterEncode`] if the annotation cannot be exported
    pub fn assemble(
        &self,
        form: &PrescriptionForm,
        engine: &AnnotationEngine,
        doctor_id: Option<&ShardableUuid>,
        patient_id: Option<&ShardableUuid>,
    ) -> ClinicResult<Stored<Prescription>> {
        let doctor_id = doctor_id.ok_or(ClinicError::MissingSelection("doctor"))?;
        let patient_id = patient_id.ok_or(ClinicError::MissingSelection("patient"))?;

        let chain = ReferenceGraph::new(&*self.store).prescription_chain(doctor_id, patient_id)?;
        let content = form.decode();
        let annotation = engine.snapshot()?;
        let number = PrescriptionNumber::generate(self.cfg.prescription_prefix(), Utc::now())?;

        let stored = self.store.create(Prescription {
            number,
            patient_id: chain.patient_id,
            doctor_id: chain.doctor_id,
            department_id: chain.department_id,
            hospital_id: chain.hospital_id,
            content,
            annotation,
        })?;
        tracing::info!(
            id = %stored.id,
            number = %stored.data.number,
            medications = stored.data.content.medications.len(),
            lab_tests = stored.data.content.lab_tests.len(),
            annotated = !stored.data.annotation.is_empty(),
            "prescription created"
        );
        Ok(stored)
    }

    /// Replaces the clinical content of an existing prescription.
    ///
    /// The id, number and ancestor chain are kept. A blank engine keeps the stored annotation;
    /// to change it, restore the stored payload into the engine and draw on top.
    pub fn revise(
        &self,
        id: &ShardableUuid,
        form: &PrescriptionForm,
        engine: &AnnotationEngine,
    ) -> ClinicResult<Stored<Prescription>> {
        let existing = self.get(id)?;
        let annotation = if engine.is_blank() {
            existing.data.annotation
        } else {
            engine.snapshot()?
        };

        let revised = Prescription {
            content: form.decode(),
            annotation,
            ..existing.data
        };
        let stored = self
            .store
            .update(id, revised)?
            .ok_or_else(|| ClinicError::NotFound {
                kind: EntityKind::Prescription,
                id: id.clone(),
            })?;
        tracing::info!(id = %stored.id, number = %stored.data.number, "prescription revised");
        Ok(stored)
    }

    /// Decodes a form without touching storage.
    pub fn preview(&self, form: &PrescriptionForm) -> PrescriptionContent {
        form.decode()
    }

    pub fn get(&self, id: &ShardableUuid) -> ClinicResult<Stored<Prescription>> {
        fetch(&*self.store, id)
    }

    pub fn for_patient(&self, patient_id: &ShardableUuid) -> ClinicResult<Vec<Stored<Prescription>>> {
        self.store
            .list_by_ancestor(EntityKind::Patient, patient_id)
    }

    pub fn delete(&self, id: &ShardableUuid) -> ClinicResult<()> {
        remove::<Prescription, S>(&*self.store, id)
    }

    /// Re-walks a stored prescription's chain.
    pub fn verify(&self, id: &ShardableUuid) -> ClinicResult<()> {
        let prescription = self.get(id)?;
        ReferenceGraph::new(&*self.store).verify_prescription(&prescription)
    }
}
