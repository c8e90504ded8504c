//! # API REST
//!
//! REST API for clinic prescription authoring.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//!
//! All clinical and registry rules live in `clinic-core`; handlers only parse, delegate and map
//! errors onto status codes.

#![warn(rust_2018_idioms)]

pub mod dto;
mod handlers;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use clinic_core::config::{
    canvas_dimension_from_env_value, color_from_env_value, data_dir_from_env_value,
    prescription_prefix_from_env_value, storage_mode_from_env_value,
};
use clinic_core::{
    CanvasSettings, CoreConfig, PrescriptionAssembler, RegistryService, StorageMode, StoreBackend,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use handlers::*;

pub(crate) type ApiError = (StatusCode, String);
pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Default listen address when `CLINIC_REST_ADDR` is unset.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Application state for the REST API server
///
/// Every handler shares one store through the registry and the assembler.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    registry: RegistryService<StoreBackend>,
    assembler: PrescriptionAssembler<StoreBackend>,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let store = Arc::new(cfg.open_store());
        Self {
            registry: RegistryService::new(store.clone()),
            assembler: PrescriptionAssembler::new(cfg.clone(), store),
            cfg,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_hospitals,
        create_hospital,
        get_hospital,
        update_hospital,
        delete_hospital,
        list_departments,
        create_department,
        get_department,
        update_department,
        delete_department,
        list_doctors,
        create_doctor,
        get_doctor,
        update_doctor,
        delete_doctor,
        list_patients,
        list_doctor_patients,
        create_patient,
        get_patient,
        update_patient,
        delete_patient,
        list_prescriptions,
        create_prescription,
        preview_prescription,
        get_prescription,
        update_prescription,
        delete_prescription,
    ),
    components(schemas(
        dto::HealthRes,
        dto::HospitalReq,
        dto::HospitalRes,
        dto::ListHospitalsRes,
        dto::DepartmentReq,
        dto::DepartmentRes,
        dto::ListDepartmentsRes,
        dto::DoctorReq,
        dto::DoctorRes,
        dto::ListDoctorsRes,
        dto::PatientReq,
        dto::PatientRes,
        dto::ListPatientsRes,
        dto::CreatePrescriptionReq,
        dto::UpdatePrescriptionReq,
        dto::PreviewPrescriptionReq,
        dto::PreviewPrescriptionRes,
        dto::PrescriptionRes,
        dto::ListPrescriptionsRes,
    ))
)]
pub struct ApiDoc;

/// Builds the application router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/hospitals", get(list_hospitals).post(create_hospital))
        .route(
            "/hospitals/:id",
            get(get_hospital).put(update_hospital).delete(delete_hospital),
        )
        .route(
            "/hospitals/:id/departments",
            get(list_departments).post(create_department),
        )
        .route(
            "/departments/:id",
            get(get_department)
                .put(update_department)
                .delete(delete_department),
        )
        .route(
            "/departments/:id/doctors",
            get(list_doctors).post(create_doctor),
        )
        .route(
            "/doctors/:id",
            get(get_doctor).put(update_doctor).delete(delete_doctor),
        )
        .route("/doctors/:id/patients", get(list_doctor_patients))
        .route("/patients", get(list_patients).post(create_patient))
        .route(
            "/patients/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route("/patients/:id/prescriptions", get(list_prescriptions))
        .route("/prescriptions", post(create_prescription))
        .route("/prescriptions/preview", post(preview_prescription))
        .route(
            "/prescriptions/:id",
            get(get_prescription)
                .put(update_prescription)
                .delete(delete_prescription),
        )
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolves [`CoreConfig`] from the process environment.
///
/// # Environment Variables
/// - `CLINIC_DATA_DIR`: document root for YAML storage (default: `clinic_data`)
/// - `CLINIC_STORE`: `yaml` or `memory` (default: `yaml`)
/// - `CLINIC_CANVAS_WIDTH` / `CLINIC_CANVAS_HEIGHT`: annotation canvas size in pixels
/// - `CLINIC_CANVAS_BACKGROUND`: canvas colour as `#rrggbb`
/// - `CLINIC_RX_PREFIX`: prescription number prefix (default: `RX`)
pub fn config_from_env() -> anyhow::Result<CoreConfig> {
    let env = |key: &str| std::env::var(key).ok();
    let defaults = CanvasSettings::default();

    let storage = storage_mode_from_env_value(env("CLINIC_STORE"))?;
    let data_dir = data_dir_from_env_value(env("CLINIC_DATA_DIR"));
    if storage == StorageMode::Yaml {
        std::fs::create_dir_all(&data_dir)?;
    }

    let canvas = CanvasSettings {
        width: canvas_dimension_from_env_value(env("CLINIC_CANVAS_WIDTH"), defaults.width)?,
        height: canvas_dimension_from_env_value(env("CLINIC_CANVAS_HEIGHT"), defaults.height)?,
        background: color_from_env_value(env("CLINIC_CANVAS_BACKGROUND"), defaults.background)?,
        ..defaults
    };

    Ok(CoreConfig::new(
        data_dir,
        storage,
        canvas,
        prescription_prefix_from_env_value(env("CLINIC_RX_PREFIX")),
    )?)
}
