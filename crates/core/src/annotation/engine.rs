//! Freehand capture engine.
//!
//! [`AnnotationEngine`] turns pointer input into committed [`Stroke`]s, keeps undo/redo history in
//! a [`DrawingSession`] and maintains a live raster [`Surface`].
//!
//! ## States
//!
//! The engine is either idle or drawing one in-progress gesture:
//!
//! ```text
//! Idle --begin_stroke--> Drawing --extend_stroke--> Drawing --end_stroke--> Idle
//! ```
//!
//! `undo`, `redo` and `clear` are accepted in either state. Every operation that has nothing to do
//! (no surface attached, nothing to undo, a one-point tap) is a silent no-op: the user cannot
//! reach a state that warrants an error.
//!
//! ## Rendering
//!
//! New segments are painted incrementally while drawing. Every history change (undo, redo,
//! restore) instead repaints from a cleared surface by replaying the committed strokes in order,
//! so the raster only ever depends on the committed list.

use super::raster::{RasterPayload, Surface};
use super::stroke::{paint_color, paint_width, PenStyle, Point, Stroke};
use crate::constants::{MAX_CANVAS_DIMENSION, NOMINAL_PRESSURE};
use crate::error::{ClinicError, ClinicResult};
use std::time::Instant;

/// Whether a gesture is in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Drawing,
}

/// Input device that produced a pointer event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

/// A begin/move/end event in client (displayed-element) coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub client_x: f32,
    pub client_y: f32,
    /// Normalised pressure, when the device reports one.
    pub pressure: Option<f32>,
    pub kind: PointerKind,
}

impl PointerEvent {
    pub fn mouse(client_x: f32, client_y: f32) -> Self {
        Self {
            client_x,
            client_y,
            pressure: None,
            kind: PointerKind::Mouse,
        }
    }

    pub fn touch(client_x: f32, client_y: f32, pressure: Option<f32>) -> Self {
        Self {
            client_x,
            client_y,
            pressure,
            kind: PointerKind::Touch,
        }
    }
}

/// Placement of the surface on screen.
///
/// The displayed size may differ from the backing-store size (CSS scaling, high-DPI backing
/// stores); client coordinates are scaled per axis accordingly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub origin_x: f32,
    pub origin_y: f32,
    pub displayed_width: f32,
    pub displayed_height: f32,
}

impl Viewport {
    /// A viewport displaying the surface 1:1 at the origin.
    pub fn identity(surface: &Surface) -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            displayed_width: surface.width() as f32,
            displayed_height: surface.height() as f32,
        }
    }

    /// Maps client coordinates into canvas space:
    /// `canvas = (client - origin) * (backing / displayed)`.
    ///
    /// Returns `None` while the element has no displayed area.
    pub fn to_canvas(&self, client_x: f32, client_y: f32, surface: &Surface) -> Option<(f32, f32)> {
        if self.displayed_width <= 0.0 || self.displayed_height <= 0.0 {
            return None;
        }
        let scale_x = surface.width() as f32 / self.displayed_width;
        let scale_y = surface.height() as f32 / self.displayed_height;
        Some((
            (client_x - self.origin_x) * scale_x,
            (client_y - self.origin_y) * scale_y,
        ))
    }
}

/// Committed strokes plus undo/redo history.
///
/// Invariant: `committed` equals the concatenation, in order, of the batches on the undo stack.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawingSession {
    committed: Vec<Stroke>,
    undo_stack: Vec<Vec<Stroke>>,
    redo_stack: Vec<Vec<Stroke>>,
}

impl DrawingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed(&self) -> &[Stroke] {
        &self.committed
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Commits one batch; any redo history becomes unreachable.
    fn commit(&mut self, batch: Vec<Stroke>) {
        self.committed.extend(batch.iter().cloned());
        self.undo_stack.push(batch);
        self.redo_stack.clear();
    }

    fn undo(&mut self) -> bool {
        let Some(batch) = self.undo_stack.pop() else {
            return false;
        };
        let keep = self.committed.len().saturating_sub(batch.len());
        self.committed.truncate(keep);
        self.redo_stack.push(batch);
        true
    }

    fn redo(&mut self) -> bool {
        let Some(batch) = self.redo_stack.pop() else {
            return false;
        };
        self.committed.extend(batch.iter().cloned());
        self.undo_stack.push(batch);
        true
    }

    fn clear(&mut self) {
        self.committed.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Checks the committed/undo-stack invariant.
    pub fn is_consistent(&self) -> bool {
        self.undo_stack
            .iter()
            .flatten()
            .eq(self.committed.iter())
    }
}

/// Notifications emitted by the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum CanvasEvent {
    /// A gesture was committed.
    StrokeCommitted(Stroke),
    /// The canvas was cleared to an empty surface.
    Cleared,
    /// Fired after every committed mutation, carrying the latest raster.
    CanvasChanged(RasterPayload),
}

type Listener = Box<dyn FnMut(&CanvasEvent) + Send>;

struct InProgress {
    points: Vec<Point>,
    style: PenStyle,
    started_ms: u64,
}

/// Live drawing surface with stroke history.
pub struct AnnotationEngine {
    surface: Option<Surface>,
    viewport: Option<Viewport>,
    session: DrawingSession,
    pen: PenStyle,
    in_progress: Option<InProgress>,
    listeners: Vec<Listener>,
    epoch: Instant,
}

impl std::fmt::Debug for AnnotationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationEngine")
            .field("state", &self.state())
            .field("committed", &self.session.committed.len())
            .field("undo_depth", &self.session.undo_depth())
            .field("redo_depth", &self.session.redo_depth())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl AnnotationEngine {
    /// Creates an engine drawing on `surface` with the given pen.
    pub fn new(surface: Surface, pen: PenStyle) -> Self {
        let mut engine = Self::detached(pen);
        engine.attach(surface);
        engine
    }

    /// Creates an engine with no surface; every drawing operation is a no-op until
    /// [`attach`](Self::attach) is called.
    pub fn detached(pen: PenStyle) -> Self {
        Self {
            surface: None,
            viewport: None,
            session: DrawingSession::new(),
            pen,
            in_progress: None,
            listeners: Vec::new(),
            epoch: Instant::now(),
        }
    }

    /// Attaches a surface and repaints the current history onto it.
    pub fn attach(&mut self, surface: Surface) {
        self.viewport = Some(Viewport::identity(&surface));
        self.surface = Some(surface);
        self.redraw();
    }

    /// Detaches and returns the surface, abandoning any in-progress gesture.
    pub fn detach(&mut self) -> Option<Surface> {
        self.in_progress = None;
        self.viewport = None;
        self.surface.take()
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn session(&self) -> &DrawingSession {
        &self.session
    }

    pub fn state(&self) -> EngineState {
        if self.in_progress.is_some() {
            EngineState::Drawing
        } else {
            EngineState::Idle
        }
    }

    pub fn pen(&self) -> PenStyle {
        self.pen
    }

    /// Sets the pen for the next gesture; the gesture in progress keeps its pen.
    pub fn set_pen(&mut self, pen: PenStyle) {
        self.pen = pen;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    /// Registers a listener for [`CanvasEvent`]s.
    pub fn subscribe(&mut self, listener: impl FnMut(&CanvasEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Maps a pointer event into a canvas-space point. Mouse input reports the nominal
    /// pressure; touch and pen input report the device pressure when there is one.
    pub fn to_canvas(&self, event: &PointerEvent) -> Option<Point> {
        let surface = self.surface.as_ref()?;
        let viewport = self.viewport.unwrap_or_else(|| Viewport::identity(surface));
        let (x, y) = viewport.to_canvas(event.client_x, event.client_y, surface)?;
        let pressure = match event.kind {
            PointerKind::Mouse => NOMINAL_PRESSURE,
            PointerKind::Touch | PointerKind::Pen => event.pressure.unwrap_or(NOMINAL_PRESSURE),
        };
        Some(Point::new(x, y, pressure))
    }

    pub fn pointer_down(&mut self, event: &PointerEvent) {
        if let Some(point) = self.to_canvas(event) {
            self.begin_stroke(point);
        }
    }

    pub fn pointer_move(&mut self, event: &PointerEvent) {
        if self.in_progress.is_none() {
            return;
        }
        if let Some(point) = self.to_canvas(event) {
            self.extend_stroke(point);
        }
    }

    pub fn pointer_up(&mut self) {
        self.end_stroke();
    }

    /// Starts a gesture at `point` and invalidates redo history.
    ///
    /// A gesture still in progress (a lost pointer-up) is ended first.
    pub fn begin_stroke(&mut self, point: Point) {
        if self.surface.is_none() || !point.is_finite() {
            return;
        }
        if self.in_progress.is_some() {
            self.end_stroke();
        }

        self.session.redo_stack.clear();
        self.in_progress = Some(InProgress {
            points: vec![point],
            style: self.pen,
            started_ms: self.elapsed_ms(),
        });
    }

    /// Appends `point` to the gesture in progress and paints the new segment.
    pub fn extend_stroke(&mut self, point: Point) {
        if !point.is_finite() {
            return;
        }
        let (Some(surface), Some(current)) = (self.surface.as_mut(), self.in_progress.as_mut())
        else {
            return;
        };

        if let Some(&last) = current.points.last() {
            let style = current.style;
            let color = paint_color(style.tool, style.color, surface.background());
            surface.paint_segment(last, point, color, paint_width(style.tool, style.width));
        }
        current.points.push(point);
    }

    /// Ends the gesture in progress. Gestures with fewer than two points are discarded without
    /// touching history or notifying listeners.
    pub fn end_stroke(&mut self) {
        let Some(current) = self.in_progress.take() else {
            return;
        };
        let Some(stroke) = Stroke::from_points(current.points, current.style, current.started_ms)
        else {
            tracing::debug!("discarding tap: fewer than two points");
            return;
        };

        self.session.commit(vec![stroke.clone()]);
        tracing::debug!(
            committed = self.session.committed.len(),
            "stroke committed"
        );
        self.emit(CanvasEvent::StrokeCommitted(stroke));
        self.emit_canvas_changed();
    }

    /// Removes the most recent batch and repaints.
    pub fn undo(&mut self) {
        if self.surface.is_none() || !self.session.undo() {
            return;
        }
        tracing::debug!(redo_depth = self.session.redo_depth(), "undo");
        self.redraw();
        self.emit_canvas_changed();
    }

    /// Re-applies the most recently undone batch and repaints.
    pub fn redo(&mut self) {
        if self.surface.is_none() || !self.session.redo() {
            return;
        }
        tracing::debug!(undo_depth = self.session.undo_depth(), "redo");
        self.redraw();
        self.emit_canvas_changed();
    }

    /// Empties the canvas, the history and any restored raster.
    pub fn clear(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        surface.set_base(None);
        self.in_progress = None;
        self.session.clear();
        self.redraw();
        tracing::debug!("canvas cleared");
        self.emit(CanvasEvent::Cleared);
        self.emit(CanvasEvent::CanvasChanged(RasterPayload::empty()));
    }

    /// Commits each stroke as its own batch, as if it had just been drawn, then repaints once.
    ///
    /// Used to reproduce a raster from a stroke list captured elsewhere.
    pub fn replay(&mut self, strokes: impl IntoIterator<Item = Stroke>) {
        if self.surface.is_none() {
            return;
        }
        let mut replayed = 0usize;
        for stroke in strokes {
            self.session.commit(vec![stroke.clone()]);
            self.emit(CanvasEvent::StrokeCommitted(stroke));
            replayed += 1;
        }
        if replayed > 0 {
            self.redraw();
            self.emit_canvas_changed();
        }
    }

    /// Repaints from a cleared surface: restored base, committed strokes in order, then the
    /// gesture in progress.
    pub fn redraw(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        surface.replay(self.session.committed.iter());
        if let Some(current) = &self.in_progress {
            let style = current.style;
            let color = paint_color(style.tool, style.color, surface.background());
            surface.paint_polyline(&current.points, color, paint_width(style.tool, style.width));
        }
    }

    /// True when nothing is visible beyond the background.
    pub fn is_blank(&self) -> bool {
        let has_base = self.surface.as_ref().is_some_and(Surface::has_base);
        let drawing = self
            .in_progress
            .as_ref()
            .is_some_and(|current| current.points.len() >= 2);
        !has_base && !drawing && self.session.is_empty()
    }

    /// Exports the current raster. A blank or detached canvas exports the empty sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClinicError::RasterEncode`] if PNG encoding fails.
    pub fn snapshot(&self) -> ClinicResult<RasterPayload> {
        match &self.surface {
            Some(surface) if !self.is_blank() => RasterPayload::encode(surface.image()),
            _ => Ok(RasterPayload::empty()),
        }
    }

    /// Repaints the surface from an exported payload.
    ///
    /// Stroke history is not part of a payload, so history is reset and the restored raster
    /// becomes the base every later replay paints on. An empty payload restores a blank canvas.
    /// A payload drawn on a canvas of another size resizes the surface to the payload, so the
    /// next snapshot equals the payload.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::RasterDecode`] if the payload cannot be decoded or is larger than
    /// [`MAX_CANVAS_DIMENSION`] on either side; the engine is left untouched in that case.
    pub fn restore(&mut self, payload: &RasterPayload) -> ClinicResult<()> {
        if self.surface.is_none() {
            return Ok(());
        }
        let base = payload.decode()?;
        if let Some(base) = &base {
            if base.width() > MAX_CANVAS_DIMENSION || base.height() > MAX_CANVAS_DIMENSION {
                return Err(ClinicError::RasterDecode(format!(
                    "raster {}x{} exceeds the {} pixel limit",
                    base.width(),
                    base.height(),
                    MAX_CANVAS_DIMENSION
                )));
            }
        }

        if let Some(surface) = self.surface.as_mut() {
            let resized = base
                .as_ref()
                .is_some_and(|b| b.dimensions() != (surface.width(), surface.height()));
            surface.set_base(base);
            if resized {
                tracing::debug!(
                    width = surface.width(),
                    height = surface.height(),
                    "surface resized to the restored raster"
                );
            }
        }
        self.in_progress = None;
        self.session.clear();
        self.redraw();
        tracing::debug!(blank = payload.is_empty(), "canvas restored from payload");
        self.emit_canvas_changed();
        Ok(())
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn emit(&mut self, event: CanvasEvent) {
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    fn emit_canvas_changed(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        match self.snapshot() {
            Ok(payload) => self.emit(CanvasEvent::CanvasChanged(payload)),
            Err(e) => tracing::warn!("skipping canvas-changed notification: {}", e),
        }
    }
}
