//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. Nothing
//! in this crate reads environment variables during request handling; binaries read the raw
//! values and hand them to the `*_from_env_value` helpers below.

use crate::annotation::{AnnotationEngine, PenStyle, Rgb, Surface, Tool};
use crate::constants::{
    DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, DEFAULT_DATA_DIR, DEFAULT_PEN_WIDTH,
    DEFAULT_PRESCRIPTION_PREFIX, MAX_CANVAS_DIMENSION,
};
use crate::error::{ClinicError, ClinicResult};
use crate::store::{MemoryStore, StoreBackend, YamlStore};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Where documents are kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StorageMode {
    /// YAML files under the data directory.
    #[default]
    Yaml,
    /// Process memory; everything is lost on exit.
    Memory,
}

impl FromStr for StorageMode {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "file" => Ok(StorageMode::Yaml),
            "memory" | "mem" => Ok(StorageMode::Memory),
            other => Err(ClinicError::InvalidInput(format!(
                "unknown storage mode '{}' (expected 'yaml' or 'memory')",
                other
            ))),
        }
    }
}

/// Annotation canvas defaults.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasSettings {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub pen_color: Rgb,
    pub pen_width: f32,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            background: Rgb::WHITE,
            pen_color: Rgb::BLACK,
            pen_width: DEFAULT_PEN_WIDTH,
        }
    }
}

impl CanvasSettings {
    pub fn pen(&self) -> PenStyle {
        PenStyle {
            color: self.pen_color,
            width: self.pen_width,
            tool: Tool::Pen,
        }
    }

    pub fn surface(&self) -> Surface {
        Surface::new(self.width, self.height, self.background)
    }

    /// A fresh engine on a blank surface of the configured size.
    pub fn engine(&self) -> AnnotationEngine {
        AnnotationEngine::new(self.surface(), self.pen())
    }

    fn validate(&self) -> ClinicResult<()> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if value == 0 || value > MAX_CANVAS_DIMENSION {
                return Err(ClinicError::InvalidInput(format!(
                    "canvas {} must be between 1 and {}, got {}",
                    name, MAX_CANVAS_DIMENSION, value
                )));
            }
        }
        if !self.pen_width.is_finite() || self.pen_width <= 0.0 {
            return Err(ClinicError::InvalidInput(format!(
                "pen width must be positive, got {}",
                self.pen_width
            )));
        }
        Ok(())
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    storage: StorageMode,
    canvas: CanvasSettings,
    prescription_prefix: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInput`] if the canvas settings are out of range or the
    /// prescription prefix is not ASCII alphanumeric.
    pub fn new(
        data_dir: PathBuf,
        storage: StorageMode,
        canvas: CanvasSettings,
        prescription_prefix: String,
    ) -> ClinicResult<Self> {
        canvas.validate()?;

        let prescription_prefix = prescription_prefix.trim().to_string();
        if prescription_prefix.is_empty()
            || !prescription_prefix
                .bytes()
                .all(|b| b.is_ascii_alphanumeric())
        {
            return Err(ClinicError::InvalidInput(format!(
                "prescription prefix must be non-empty ASCII alphanumeric, got '{}'",
                prescription_prefix
            )));
        }

        Ok(Self {
            data_dir,
            storage,
            canvas,
            prescription_prefix,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn storage(&self) -> StorageMode {
        self.storage
    }

    pub fn canvas(&self) -> &CanvasSettings {
        &self.canvas
    }

    pub fn prescription_prefix(&self) -> &str {
        &self.prescription_prefix
    }

    /// Opens the configured document store.
    pub fn open_store(&self) -> StoreBackend {
        match self.storage {
            StorageMode::Yaml => StoreBackend::Yaml(YamlStore::new(&self.data_dir)),
            StorageMode::Memory => StoreBackend::Memory(MemoryStore::new()),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the data directory from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_DATA_DIR`].
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    non_blank(value)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Parse the storage mode; blank means YAML.
pub fn storage_mode_from_env_value(value: Option<String>) -> ClinicResult<StorageMode> {
    non_blank(value)
        .map(|v| v.parse::<StorageMode>())
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Parse a canvas dimension, falling back to `default` when blank.
pub fn canvas_dimension_from_env_value(value: Option<String>, default: u32) -> ClinicResult<u32> {
    let Some(value) = non_blank(value) else {
        return Ok(default);
    };
    value.parse::<u32>().map_err(|e| {
        ClinicError::InvalidInput(format!("invalid canvas dimension '{}': {}", value, e))
    })
}

/// Parse a `#rrggbb` colour, falling back to `default` when blank.
pub fn color_from_env_value(value: Option<String>, default: Rgb) -> ClinicResult<Rgb> {
    let Some(value) = non_blank(value) else {
        return Ok(default);
    };
    value.parse::<Rgb>().map_err(ClinicError::InvalidInput)
}

/// Parse the prescription-number prefix; blank means [`DEFAULT_PRESCRIPTION_PREFIX`].
pub fn prescription_prefix_from_env_value(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| DEFAULT_PRESCRIPTION_PREFIX.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        assert_eq!(
            data_dir_from_env_value(Some("   ".into())),
            PathBuf::from(DEFAULT_DATA_DIR)
        );
        assert_eq!(
            storage_mode_from_env_value(None).expect("default mode"),
            StorageMode::Yaml
        );
        assert_eq!(
            canvas_dimension_from_env_value(Some(String::new()), 640).expect("default"),
            640
        );
        assert_eq!(
            color_from_env_value(None, Rgb::WHITE).expect("default"),
            Rgb::WHITE
        );
        assert_eq!(prescription_prefix_from_env_value(None), "RX");
    }

    #[test]
    fn test_values_are_parsed() {
        assert_eq!(
            storage_mode_from_env_value(Some(" Memory ".into())).expect("valid mode"),
            StorageMode::Memory
        );
        assert_eq!(
            canvas_dimension_from_env_value(Some("1200".into()), 640).expect("valid"),
            1200
        );
        assert_eq!(
            color_from_env_value(Some("#fffde7".into()), Rgb::WHITE).expect("valid"),
            Rgb::new(0xff, 0xfd, 0xe7)
        );
        assert!(storage_mode_from_env_value(Some("sqlite".into())).is_err());
        assert!(canvas_dimension_from_env_value(Some("wide".into()), 640).is_err());
        assert!(color_from_env_value(Some("cream".into()), Rgb::WHITE).is_err());
    }

    #[test]
    fn test_config_rejects_bad_prefix_and_canvas() {
        let err = CoreConfig::new(
            PathBuf::from("data"),
            StorageMode::Memory,
            CanvasSettings::default(),
            "RX-".into(),
        )
        .expect_err("hyphen is reserved");
        assert!(matches!(err, ClinicError::InvalidInput(_)));

        let canvas = CanvasSettings {
            width: MAX_CANVAS_DIMENSION + 1,
            ..CanvasSettings::default()
        };
        assert!(
            CoreConfig::new(PathBuf::from("data"), StorageMode::Memory, canvas, "RX".into())
                .is_err()
        );
    }

    #[test]
    fn test_canvas_settings_build_engine() {
        let canvas = CanvasSettings {
            width: 64,
            height: 48,
            ..CanvasSettings::default()
        };
        let engine = canvas.engine();
        let surface = engine.surface().expect("engine has a surface");

        assert_eq!((surface.width(), surface.height()), (64, 48));
        assert_eq!(engine.pen().width, DEFAULT_PEN_WIDTH);
    }
}
