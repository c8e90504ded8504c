use crate::dto::*;
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use clinic_core::{AnnotationEngine, ClinicError, RasterPayload, ShardableUuid};

fn parse_id(raw: &str) -> Result<ShardableUuid, ApiError> {
    ShardableUuid::parse(raw).map_err(|_| (StatusCode::BAD_REQUEST, format!("invalid id '{}'", raw)))
}

fn parse_selection(raw: Option<&str>) -> Result<Option<ShardableUuid>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_id(raw).map(Some),
        None => Ok(None),
    }
}

fn bad_request(message: String) -> ApiError {
    (StatusCode::BAD_REQUEST, message)
}

/// Maps a core error onto a status code.
///
/// Storage and chain-corruption failures are logged and reported without detail.
pub(crate) fn map_error(context: &'static str, err: ClinicError) -> ApiError {
    let status = match &err {
        ClinicError::InvalidInput(_)
        | ClinicError::MissingSelection(_)
        | ClinicError::Text(_)
        | ClinicError::Uuid(_)
        | ClinicError::RasterDecode(_) => StatusCode::BAD_REQUEST,
        ClinicError::MissingParent { .. } | ClinicError::NotFound { .. } => StatusCode::NOT_FOUND,
        ClinicError::HasDependents { .. } => StatusCode::CONFLICT,
        _ => {
            tracing::error!("{}: {:?}", context, err);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into());
        }
    };
    tracing::debug!(status = %status, "{}: {}", context, err);
    (status, err.to_string())
}

fn engine_with(
    state: &AppState,
    annotation: Option<String>,
    strokes: Vec<clinic_core::Stroke>,
) -> Result<AnnotationEngine, ApiError> {
    let mut engine = state.cfg.canvas().engine();
    if let Some(annotation) = annotation {
        engine
            .restore(&RasterPayload::from_string(annotation))
            .map_err(|e| map_error("restore annotation", e))?;
    }
    engine.replay(strokes);
    Ok(engine)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthRes)
    )
)]
/// Health check endpoint
#[axum::debug_handler]
pub async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "clinic REST API is alive".into(),
    })
}

// ============================================================================
// HOSPITALS
// ============================================================================

#[utoipa::path(
    get,
    path = "/hospitals",
    responses(
        (status = 200, description = "All hospitals", body = ListHospitalsRes),
        (status = 500, description = "Internal server error")
    )
)]
/// List hospitals
#[axum::debug_handler]
pub async fn list_hospitals(State(state): State<AppState>) -> ApiResult<Json<ListHospitalsRes>> {
    let hospitals = state
        .registry
        .list_hospitals()
        .map_err(|e| map_error("list hospitals", e))?;
    Ok(Json(ListHospitalsRes {
        hospitals: hospitals.into_iter().map(HospitalRes::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/hospitals",
    request_body = HospitalReq,
    responses(
        (status = 201, description = "Hospital created", body = HospitalRes),
        (status = 400, description = "Name is missing")
    )
)]
/// Create a hospital
#[axum::debug_handler]
pub async fn create_hospital(
    State(state): State<AppState>,
    Json(req): Json<HospitalReq>,
) -> ApiResult<(StatusCode, Json<HospitalRes>)> {
    let hospital = req.into_hospital().map_err(bad_request)?;
    let stored = state
        .registry
        .create_hospital(hospital)
        .map_err(|e| map_error("create hospital", e))?;
    Ok((StatusCode::CREATED, Json(stored.into())))
}

#[utoipa::path(
    get,
    path = "/hospitals/{id}",
    params(("id" = String, Path, description = "Hospital id")),
    responses(
        (status = 200, description = "Hospital", body = HospitalRes),
        (status = 404, description = "Not found")
    )
)]
/// Get a hospital
#[axum::debug_handler]
pub async fn get_hospital(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<HospitalRes>> {
    let id = parse_id(&id)?;
    let stored = state
        .registry
        .hospital(&id)
        .map_err(|e| map_error("get hospital", e))?;
    Ok(Json(stored.into()))
}

#[utoipa::path(
    put,
    path = "/hospitals/{id}",
    params(("id" = String, Path, description = "Hospital id")),
    request_body = HospitalReq,
    responses(
        (status = 200, description = "Hospital updated", body = HospitalRes),
        (status = 404, description = "Not found")
    )
)]
/// Update a hospital
#[axum::debug_handler]
pub async fn update_hospital(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<HospitalReq>,
) -> ApiResult<Json<HospitalRes>> {
    let id = parse_id(&id)?;
    let hospital = req.into_hospital().map_err(bad_request)?;
    let stored = state
        .registry
        .update_hospital(&id, hospital)
        .map_err(|e| map_error("update hospital", e))?;
    Ok(Json(stored.into()))
}

#[utoipa::path(
    delete,
    path = "/hospitals/{id}",
    params(("id" = String, Path, description = "Hospital id")),
    responses(
        (status = 204, description = "Hospital deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Hospital still has departments")
    )
)]
/// Delete a hospital
#[axum::debug_handler]
pub async fn delete_hospital(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    state
        .registry
        .delete_hospital(&id)
        .map_err(|e| map_error("delete hospital", e))?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// DEPARTMENTS
// ============================================================================

#[utoipa::path(
    get,
    path = "/hospitals/{id}/departments",
    params(("id" = String, Path, description = "Hospital id")),
    responses(
        (status = 200, description = "Departments of the hospital", body = ListDepartmentsRes)
    )
)]
/// List the departments of a hospital
#[axum::debug_handler]
pub async fn list_departments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ListDepartmentsRes>> {
    let id = parse_id(&id)?;
    let departments = state
        .registry
        .departments_of(&id)
        .map_err(|e| map_error("list departments", e))?;
    Ok(Json(ListDepartmentsRes {
        departments: departments.into_iter().map(DepartmentRes::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/hospitals/{id}/departments",
    params(("id" = String, Path, description = "Hospital id")),
    request_body = DepartmentReq,
    responses(
        (status = 201, description = "Department created", body = DepartmentRes),
        (status = 400, description = "Name is missing"),
        (status = 404, description = "Hospital does not exist")
    )
)]
/// Create a department under a hospital
#[axum::debug_handler]
pub async fn create_department(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DepartmentReq>,
) -> ApiResult<(StatusCode, Json<DepartmentRes>)> {
    let hospital_id = parse_id(&id)?;
    let details = req.into_details().map_err(bad_request)?;
    let stored = state
        .registry
        .create_department(&hospital_id, details)
        .map_err(|e| map_error("create department", e))?;
    Ok((StatusCode::CREATED, Json(stored.into())))
}

#[utoipa::path(
    get,
    path = "/departments/{id}",
    params(("id" = String, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department", body = DepartmentRes),
        (status = 404, description = "Not found")
    )
)]
/// Get a department
#[axum::debug_handler]
pub async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DepartmentRes>> {
    let id = parse_id(&id)?;
    let stored = state
        .registry
        .department(&id)
        .map_err(|e| map_error("get department", e))?;
    Ok(Json(stored.into()))
}

#[utoipa::path(
    put,
    path = "/departments/{id}",
    params(("id" = String, Path, description = "Department id")),
    request_body = DepartmentReq,
    responses(
        (status = 200, description = "Department updated", body = DepartmentRes),
        (status = 404, description = "Not found")
    )
)]
/// Update a department
#[axum::debug_handler]
pub async fn update_department(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DepartmentReq>,
) -> ApiResult<Json<DepartmentRes>> {
    let id = parse_id(&id)?;
    let details = req.into_details().map_err(bad_request)?;
    let stored = state
        .registry
        .update_department(&id, details)
        .map_err(|e| map_error("update department", e))?;
    Ok(Json(stored.into()))
}

#[utoipa::path(
    delete,
    path = "/departments/{id}",
    params(("id" = String, Path, description = "Department id")),
    responses(
        (status = 204, description = "Department deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Department still has doctors")
    )
)]
/// Delete a department
#[axum::debug_handler]
pub async fn delete_department(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    state
        .registry
        .delete_department(&id)
        .map_err(|e| map_error("delete department", e))?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// DOCTORS
// ============================================================================

#[utoipa::path(
    get,
    path = "/departments/{id}/doctors",
    params(("id" = String, Path, description = "Department id")),
    responses(
        (status = 200, description = "Doctors of the department", body = ListDoctorsRes)
    )
)]
/// List the doctors of a department
#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ListDoctorsRes>> {
    let id = parse_id(&id)?;
    let doctors = state
        .registry
        .doctors_of(&id)
        .map_err(|e| map_error("list doctors", e))?;
    Ok(Json(ListDoctorsRes {
        doctors: doctors.into_iter().map(DoctorRes::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/departments/{id}/doctors",
    params(("id" = String, Path, description = "Department id")),
    request_body = DoctorReq,
    responses(
        (status = 201, description = "Doctor created", body = DoctorRes),
        (status = 400, description = "Name is missing"),
        (status = 404, description = "Department does not exist")
    )
)]
/// Create a doctor in a department
#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DoctorReq>,
) -> ApiResult<(StatusCode, Json<DoctorRes>)> {
    let department_id = parse_id(&id)?;
    let details = req.into_details().map_err(bad_request)?;
    let stored = state
        .registry
        .create_doctor(&department_id, details)
        .map_err(|e| map_error("create doctor", e))?;
    Ok((StatusCode::CREATED, Json(stored.into())))
}

#[utoipa::path(
    get,
    path = "/doctors/{id}",
    params(("id" = String, Path, description = "Doctor id")),
    responses(
        (status = 200, description = "Doctor", body = DoctorRes),
        (status = 404, description = "Not found")
    )
)]
/// Get a doctor
#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DoctorRes>> {
    let id = parse_id(&id)?;
    let stored = state
        .registry
        .doctor(&id)
        .map_err(|e| map_error("get doctor", e))?;
    Ok(Json(stored.into()))
}

#[utoipa::path(
    put,
    path = "/doctors/{id}",
    params(("id" = String, Path, description = "Doctor id")),
    request_body = DoctorReq,
    responses(
        (status = 200, description = "Doctor updated", body = DoctorRes),
        (status = 404, description = "Not found")
    )
)]
/// Update a doctor
#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DoctorReq>,
) -> ApiResult<Json<DoctorRes>> {
    let id = parse_id(&id)?;
    let details = req.into_details().map_err(bad_request)?;
    let stored = state
        .registry
        .update_doctor(&id, details)
        .map_err(|e| map_error("update doctor", e))?;
    Ok(Json(stored.into()))
}

#[utoipa::path(
    delete,
    path = "/doctors/{id}",
    params(("id" = String, Path, description = "Doctor id")),
    responses(
        (status = 204, description = "Doctor deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Doctor still has patients or prescriptions")
    )
)]
/// Delete a doctor
#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    state
        .registry
        .delete_doctor(&id)
        .map_err(|e| map_error("delete doctor", e))?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// PATIENTS
// ============================================================================

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "All patients", body = ListPatientsRes),
        (status = 500, description = "Internal server error")
    )
)]
/// List patients
#[axum::debug_handler]
pub async fn list_patients(State(state): State<AppState>) -> ApiResult<Json<ListPatientsRes>> {
    let patients = state
        .registry
        .list_patients()
        .map_err(|e| map_error("list patients", e))?;
    Ok(Json(ListPatientsRes {
        patients: patients.into_iter().map(PatientRes::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/doctors/{id}/patients",
    params(("id" = String, Path, description = "Doctor id")),
    responses(
        (status = 200, description = "Patients of the doctor", body = ListPatientsRes)
    )
)]
/// List the patients of a doctor
#[axum::debug_handler]
pub async fn list_doctor_patients(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ListPatientsRes>> {
    let id = parse_id(&id)?;
    let patients = state
        .registry
        .patients_of(&id)
        .map_err(|e| map_error("list doctor patients", e))?;
    Ok(Json(ListPatientsRes {
        patients: patients.into_iter().map(PatientRes::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = PatientReq,
    responses(
        (status = 201, description = "Patient registered", body = PatientRes),
        (status = 400, description = "Doctor not selected or name missing"),
        (status = 404, description = "Doctor does not exist")
    )
)]
/// Register a patient under the selected doctor
#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<PatientReq>,
) -> ApiResult<(StatusCode, Json<PatientRes>)> {
    let doctor_id = parse_selection(req.doctor_id.as_deref())?
        .ok_or_else(|| map_error("create patient", ClinicError::MissingSelection("doctor")))?;
    let details = req.details().map_err(bad_request)?;
    let stored = state
        .registry
        .create_patient(&doctor_id, details)
        .map_err(|e| map_error("create patient", e))?;
    Ok((StatusCode::CREATED, Json(stored.into())))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient", body = PatientRes),
        (status = 404, description = "Not found")
    )
)]
/// Get a patient
#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PatientRes>> {
    let id = parse_id(&id)?;
    let stored = state
        .registry
        .patient(&id)
        .map_err(|e| map_error("get patient", e))?;
    Ok(Json(stored.into()))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    request_body = PatientReq,
    responses(
        (status = 200, description = "Patient updated", body = PatientRes),
        (status = 404, description = "Not found")
    )
)]
/// Update a patient's details; the doctor and its chain never change
#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PatientReq>,
) -> ApiResult<Json<PatientRes>> {
    let id = parse_id(&id)?;
    let details = req.details().map_err(bad_request)?;
    let stored = state
        .registry
        .update_patient(&id, details)
        .map_err(|e| map_error("update patient", e))?;
    Ok(Json(stored.into()))
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 204, description = "Patient deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Patient still has prescriptions")
    )
)]
/// Delete a patient
#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    state
        .registry
        .delete_patient(&id)
        .map_err(|e| map_error("delete patient", e))?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// PRESCRIPTIONS
// ============================================================================

#[utoipa::path(
    get,
    path = "/patients/{id}/prescriptions",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Prescriptions of the patient", body = ListPrescriptionsRes)
    )
)]
/// List the prescriptions of a patient
#[axum::debug_handler]
pub async fn list_prescriptions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ListPrescriptionsRes>> {
    let id = parse_id(&id)?;
    let prescriptions = state
        .assembler
        .for_patient(&id)
        .map_err(|e| map_error("list prescriptions", e))?;
    Ok(Json(ListPrescriptionsRes {
        prescriptions: prescriptions.into_iter().map(PrescriptionRes::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/prescriptions",
    request_body = CreatePrescriptionReq,
    responses(
        (status = 201, description = "Prescription created", body = PrescriptionRes),
        (status = 400, description = "Doctor or patient not selected"),
        (status = 404, description = "Doctor or patient does not exist")
    )
)]
/// Create a prescription from the form and the captured strokes
#[axum::debug_handler]
pub async fn create_prescription(
    State(state): State<AppState>,
    Json(req): Json<CreatePrescriptionReq>,
) -> ApiResult<(StatusCode, Json<PrescriptionRes>)> {
    let doctor_id = parse_selection(req.doctor_id.as_deref())?;
    let patient_id = parse_selection(req.patient_id.as_deref())?;
    let engine = engine_with(&state, None, req.strokes)?;
    let stored = state
        .assembler
        .assemble(&req.form, &engine, doctor_id.as_ref(), patient_id.as_ref())
        .map_err(|e| map_error("create prescription", e))?;
    Ok((StatusCode::CREATED, Json(stored.into())))
}

#[utoipa::path(
    post,
    path = "/prescriptions/preview",
    request_body = PreviewPrescriptionReq,
    responses(
        (status = 200, description = "Decoded clinical content", body = PreviewPrescriptionRes)
    )
)]
/// Decode a form without saving it
#[axum::debug_handler]
pub async fn preview_prescription(
    State(state): State<AppState>,
    Json(req): Json<PreviewPrescriptionReq>,
) -> Json<PreviewPrescriptionRes> {
    Json(PreviewPrescriptionRes {
        content: state.assembler.preview(&req.form),
    })
}

#[utoipa::path(
    get,
    path = "/prescriptions/{id}",
    params(("id" = String, Path, description = "Prescription id")),
    responses(
        (status = 200, description = "Prescription", body = PrescriptionRes),
        (status = 404, description = "Not found")
    )
)]
/// Get a prescription
#[axum::debug_handler]
pub async fn get_prescription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PrescriptionRes>> {
    let id = parse_id(&id)?;
    let stored = state
        .assembler
        .get(&id)
        .map_err(|e| map_error("get prescription", e))?;
    Ok(Json(stored.into()))
}

#[utoipa::path(
    put,
    path = "/prescriptions/{id}",
    params(("id" = String, Path, description = "Prescription id")),
    request_body = UpdatePrescriptionReq,
    responses(
        (status = 200, description = "Prescription revised", body = PrescriptionRes),
        (status = 400, description = "Annotation cannot be decoded"),
        (status = 404, description = "Not found")
    )
)]
/// Revise a prescription's content and annotation
#[axum::debug_handler]
pub async fn update_prescription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePrescriptionReq>,
) -> ApiResult<Json<PrescriptionRes>> {
    let id = parse_id(&id)?;
    let engine = engine_with(&state, req.annotation, req.strokes)?;
    let stored = state
        .assembler
        .revise(&id, &req.form, &engine)
        .map_err(|e| map_error("update prescription", e))?;
    Ok(Json(stored.into()))
}

#[utoipa::path(
    delete,
    path = "/prescriptions/{id}",
    params(("id" = String, Path, description = "Prescription id")),
    responses(
        (status = 204, description = "Prescription deleted"),
        (status = 404, description = "Not found")
    )
)]
/// Delete a prescription
#[axum::debug_handler]
pub async fn delete_prescription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    state
        .assembler
        .delete(&id)
        .map_err(|e| map_error("delete prescription", e))?;
    Ok(StatusCode::NO_CONTENT)
}
