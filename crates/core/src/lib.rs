//! # Clinic Core
//!
//! Core business logic for prescription authoring.
//!
//! This crate contains pure data operations:
//! - Freehand annotation capture with undo/redo and raster export ([`annotation`])
//! - The delimited-text codec for medications, lab orders and simple lists ([`codec`])
//! - The Hospital → Department → Doctor → Patient → Prescription reference graph ([`graph`])
//! - Registry CRUD ([`registry`]) and prescription assembly ([`assembler`])
//! - Document storage in memory or as sharded YAML files ([`store`])
//!
//! **No API concerns**: HTTP servers and command-line handling belong in `api-rest` and
//! `clinic-cli`.

pub mod annotation;
pub mod assembler;
pub mod codec;
pub mod config;
pub mod constants;
pub mod entities;
pub mod error;
pub mod graph;
pub mod records;
pub mod registry;
pub mod store;

pub use annotation::{
    AnnotationEngine, CanvasEvent, DrawingSession, PenStyle, Point, PointerEvent, RasterPayload,
    Rgb, Stroke, Surface, Tool,
};
pub use assembler::{PrescriptionAssembler, PrescriptionForm};
pub use config::{CanvasSettings, CoreConfig, StorageMode};
pub use entities::{
    Department, DepartmentDetails, Doctor, DoctorDetails, EntityKind, Hospital, Patient,
    PatientDetails, Prescription, PrescriptionContent, Stored,
};
pub use error::{ClinicError, ClinicResult};
pub use graph::{AncestorChain, ReferenceGraph};
pub use records::{LabTestRecord, MedicationRecord, Urgency};
pub use registry::RegistryService;
pub use store::{DocumentStore, MemoryStore, StoreBackend, YamlStore};

pub use clinic_types::NonEmptyText;
pub use clinic_uuid::{PrescriptionNumber, ShardableUuid};
