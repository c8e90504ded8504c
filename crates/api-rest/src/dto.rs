//! Request and response bodies.
//!
//! Core types are not OpenAPI-aware, so every body is a plain struct here with conversions into
//! and out of `clinic_core`. Structured clinical content is documented as a free-form object.

use clinic_core::{
    Department, DepartmentDetails, Doctor, DoctorDetails, Hospital, NonEmptyText, Patient,
    PatientDetails, Prescription, PrescriptionContent, PrescriptionForm, Stored, Stroke,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

fn required(field: &'static str, value: &str) -> Result<NonEmptyText, String> {
    NonEmptyText::new(value).map_err(|_| format!("{} is required", field))
}

// ============================================================================
// HOSPITALS
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct HospitalReq {
    pub name: String,
    pub address: String,
    pub phone: String,
}

impl HospitalReq {
    pub fn into_hospital(self) -> Result<Hospital, String> {
        Ok(Hospital {
            name: required("name", &self.name)?,
            address: self.address.trim().to_string(),
            phone: self.phone.trim().to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HospitalRes {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Stored<Hospital>> for HospitalRes {
    fn from(stored: Stored<Hospital>) -> Self {
        Self {
            id: stored.id.to_string(),
            name: stored.data.name.into_inner(),
            address: stored.data.address,
            phone: stored.data.phone,
            created_at: stored.created_at.to_rfc3339(),
            updated_at: stored.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListHospitalsRes {
    pub hospitals: Vec<HospitalRes>,
}

// ============================================================================
// DEPARTMENTS
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct DepartmentReq {
    pub name: String,
    pub description: String,
}

impl DepartmentReq {
    pub fn into_details(self) -> Result<DepartmentDetails, String> {
        Ok(DepartmentDetails {
            name: required("name", &self.name)?,
            description: self.description.trim().to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DepartmentRes {
    pub id: String,
    pub hospital_id: String,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Stored<Department>> for DepartmentRes {
    fn from(stored: Stored<Department>) -> Self {
        Self {
            id: stored.id.to_string(),
            hospital_id: stored.data.hospital_id.to_string(),
            name: stored.data.details.name.into_inner(),
            description: stored.data.details.description,
            created_at: stored.created_at.to_rfc3339(),
            updated_at: stored.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListDepartmentsRes {
    pub departments: Vec<DepartmentRes>,
}

// ============================================================================
// DOCTORS
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct DoctorReq {
    pub name: String,
    pub specialization: String,
    pub phone: String,
    pub email: String,
}

impl DoctorReq {
    pub fn into_details(self) -> Result<DoctorDetails, String> {
        Ok(DoctorDetails {
            name: required("name", &self.name)?,
            specialization: self.specialization.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DoctorRes {
    pub id: String,
    pub department_id: String,
    pub name: String,
    pub specialization: String,
    pub phone: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Stored<Doctor>> for DoctorRes {
    fn from(stored: Stored<Doctor>) -> Self {
        let details = stored.data.details;
        Self {
            id: stored.id.to_string(),
            department_id: stored.data.department_id.to_string(),
            name: details.name.into_inner(),
            specialization: details.specialization,
            phone: details.phone,
            email: details.email,
            created_at: stored.created_at.to_rfc3339(),
            updated_at: stored.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListDoctorsRes {
    pub doctors: Vec<DoctorRes>,
}

// ============================================================================
// PATIENTS
// ============================================================================

/// Patient registration or update.
///
/// `hospital_id` and `department_id` are accepted for compatibility with forms that post the
/// whole cascading selection, but they are ignored: both are derived from the doctor.
/// `doctor_id` is ignored on update.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PatientReq {
    pub doctor_id: Option<String>,
    pub department_id: Option<String>,
    pub hospital_id: Option<String>,
    pub name: String,
    pub age: Option<u32>,
    pub gender: String,
    pub phone: String,
    pub address: String,
    pub blood_group: String,
}

impl PatientReq {
    pub fn details(&self) -> Result<PatientDetails, String> {
        Ok(PatientDetails {
            name: required("name", &self.name)?,
            age: self.age,
            gender: self.gender.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(),
            blood_group: self.blood_group.trim().to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientRes {
    pub id: String,
    pub doctor_id: String,
    pub department_id: String,
    pub hospital_id: String,
    pub name: String,
    pub age: Option<u32>,
    pub gender: String,
    pub phone: String,
    pub address: String,
    pub blood_group: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Stored<Patient>> for PatientRes {
    fn from(stored: Stored<Patient>) -> Self {
        let details = stored.data.details;
        Self {
            id: stored.id.to_string(),
            doctor_id: stored.data.doctor_id.to_string(),
            department_id: stored.data.department_id.to_string(),
            hospital_id: stored.data.hospital_id.to_string(),
            name: details.name.into_inner(),
            age: details.age,
            gender: details.gender,
            phone: details.phone,
            address: details.address,
            blood_group: details.blood_group,
            created_at: stored.created_at.to_rfc3339(),
            updated_at: stored.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListPatientsRes {
    pub patients: Vec<PatientRes>,
}

// ============================================================================
// PRESCRIPTIONS
// ============================================================================

/// A new prescription: selections, the typed form and the captured pen strokes.
///
/// Strokes are replayed onto a blank canvas of the configured size to produce the stored raster.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreatePrescriptionReq {
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
    #[schema(value_type = Object)]
    pub form: PrescriptionForm,
    #[schema(value_type = Vec<Object>)]
    pub strokes: Vec<Stroke>,
}

/// A revision of an existing prescription.
///
/// When `annotation` is set it is restored first and `strokes` are drawn on top of it. With
/// neither, the stored annotation is kept.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdatePrescriptionReq {
    #[schema(value_type = Object)]
    pub form: PrescriptionForm,
    #[schema(value_type = Vec<Object>)]
    pub strokes: Vec<Stroke>,
    pub annotation: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PreviewPrescriptionReq {
    #[schema(value_type = Object)]
    pub form: PrescriptionForm,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PreviewPrescriptionRes {
    #[schema(value_type = Object)]
    pub content: PrescriptionContent,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrescriptionRes {
    pub id: String,
    pub number: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub department_id: String,
    pub hospital_id: String,
    #[schema(value_type = Object)]
    pub content: PrescriptionContent,
    /// PNG data URL of the handwritten annotation; empty when nothing was drawn.
    pub annotation: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Stored<Prescription>> for PrescriptionRes {
    fn from(stored: Stored<Prescription>) -> Self {
        let rx = stored.data;
        Self {
            id: stored.id.to_string(),
            number: rx.number.to_string(),
            patient_id: rx.patient_id.to_string(),
            doctor_id: rx.doctor_id.to_string(),
            department_id: rx.department_id.to_string(),
            hospital_id: rx.hospital_id.to_string(),
            content: rx.content,
            annotation: rx.annotation.as_str().to_string(),
            created_at: stored.created_at.to_rfc3339(),
            updated_at: stored.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListPrescriptionsRes {
    pub prescriptions: Vec<PrescriptionRes>,
}
