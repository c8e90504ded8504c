use crate::entities::EntityKind;
use clinic_uuid::ShardableUuid;

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("missing selection: {0} must be selected")]
    MissingSelection(&'static str),
    #[error("missing parent: {kind} {id} does not exist")]
    MissingParent { kind: EntityKind, id: ShardableUuid },
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: ShardableUuid },
    #[error("corrupt reference chain on {kind} {id}: {reason}")]
    CorruptChain {
        kind: EntityKind,
        id: ShardableUuid,
        reason: String,
    },
    #[error("{kind} {id} still has {count} dependent {child}(s)")]
    HasDependents {
        kind: EntityKind,
        id: ShardableUuid,
        child: EntityKind,
        count: usize,
    },

    #[error("text error: {0}")]
    Text(#[from] clinic_types::TextError),
    #[error("identifier error: {0}")]
    Uuid(#[from] clinic_uuid::UuidError),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write document file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read document file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to delete document: {0}")]
    FileDelete(std::io::Error),
    #[error("failed to serialize document: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize document: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("document store lock poisoned")]
    StoreLockPoisoned,

    #[error("failed to encode raster: {0}")]
    RasterEncode(image::ImageError),
    #[error("failed to decode raster: {0}")]
    RasterDecode(String),
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
