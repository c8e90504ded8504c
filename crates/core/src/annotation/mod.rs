//! Freehand annotation capture.
//!
//! - [`stroke`]: the stroke model
//! - [`raster`]: the backing surface and the exported payload
//! - [`engine`]: pointer handling, undo/redo history and notifications

pub mod engine;
pub mod raster;
pub mod stroke;

pub use engine::{
    AnnotationEngine, CanvasEvent, DrawingSession, EngineState, PointerEvent, PointerKind,
    Viewport,
};
pub use raster::{render_strokes, RasterPayload, Surface};
pub use stroke::{PenStyle, Point, Rgb, Stroke, Tool};
