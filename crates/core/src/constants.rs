//! Constants used throughout the clinic core crate.
//!
//! Path and filename constants live here so the store, config and binaries agree on them.

/// Default directory for clinic data when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "clinic_data";

/// Filename of each stored document inside its sharded directory.
pub const RECORD_FILENAME: &str = "record.yaml";

/// Default prefix for generated prescription numbers.
pub const DEFAULT_PRESCRIPTION_PREFIX: &str = "RX";

/// Default backing-store size of the annotation canvas, in pixels.
pub const DEFAULT_CANVAS_WIDTH: u32 = 800;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1000;

/// Upper bound on either canvas dimension.
pub const MAX_CANVAS_DIMENSION: u32 = 4096;

/// Default pen width in canvas pixels.
pub const DEFAULT_PEN_WIDTH: f32 = 2.0;

/// Pressure reported for input devices that have no pressure sensor (mouse).
pub const NOMINAL_PRESSURE: f32 = 0.5;

/// Media-type prefix of exported raster payloads.
pub const RASTER_DATA_URL_PREFIX: &str = "data:image/png;base64,";
