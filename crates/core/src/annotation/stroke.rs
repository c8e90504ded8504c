//! Stroke model: points, colours and committed pen gestures.
//!
//! A [`Stroke`] is immutable once built. The only ways to obtain one are the engine committing an
//! in-progress gesture or deserializing a stroke list (both enforce at least two points and a
//! positive width), so renderers never need to re-validate.

use crate::constants::NOMINAL_PRESSURE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An opaque RGB colour, written as `#rrggbb` on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Accepts `#rrggbb`, `#rgb`, or either form without the leading `#`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("invalid colour '{}'", s));
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|e| e.to_string());
        match hex.len() {
            6 => Ok(Rgb::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let r = channel(&hex[0..1])?;
                let g = channel(&hex[1..2])?;
                let b = channel(&hex[2..3])?;
                Ok(Rgb::new(r * 17, g * 17, b * 17))
            }
            _ => Err(format!("invalid colour '{}'", s)),
        }
    }
}

impl Serialize for Rgb {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Drawing tool of a stroke.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pen,
    /// Paints the background colour at double width. Occludes, never reveals.
    Eraser,
}

/// A canvas-space sample of a gesture.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    #[serde(default = "nominal_pressure")]
    pub pressure: f32,
}

fn nominal_pressure() -> f32 {
    NOMINAL_PRESSURE
}

impl Point {
    /// Builds a point, clamping pressure into `[0, 1]` (NaN becomes the nominal pressure).
    pub fn new(x: f32, y: f32, pressure: f32) -> Self {
        let pressure = if pressure.is_nan() {
            NOMINAL_PRESSURE
        } else {
            pressure.clamp(0.0, 1.0)
        };
        Self { x, y, pressure }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Pen settings applied to the next stroke.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PenStyle {
    pub color: Rgb,
    pub width: f32,
    pub tool: Tool,
}

/// One committed pen gesture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StrokeWire")]
pub struct Stroke {
    points: Vec<Point>,
    color: Rgb,
    width: f32,
    tool: Tool,
    /// Milliseconds since the drawing session began.
    timestamp_ms: u64,
}

#[derive(Deserialize)]
struct StrokeWire {
    points: Vec<Point>,
    color: Rgb,
    width: f32,
    #[serde(default)]
    tool: Tool,
    #[serde(default)]
    timestamp_ms: u64,
}

impl TryFrom<StrokeWire> for Stroke {
    type Error = String;

    fn try_from(wire: StrokeWire) -> Result<Self, Self::Error> {
        let style = PenStyle {
            color: wire.color,
            width: wire.width,
            tool: wire.tool,
        };
        Stroke::from_points(wire.points, style, wire.timestamp_ms)
            .ok_or_else(|| "stroke needs at least two finite points and a positive width".into())
    }
}

impl Stroke {
    /// Builds a stroke, or `None` when the gesture is a tap (fewer than two points), contains a
    /// non-finite coordinate, or the width is not positive.
    pub fn from_points(points: Vec<Point>, style: PenStyle, timestamp_ms: u64) -> Option<Self> {
        let width_ok = style.width.is_finite() && style.width > 0.0;
        if points.len() < 2 || !width_ok || !points.iter().all(Point::is_finite) {
            return None;
        }
        Some(Self {
            points,
            color: style.color,
            width: style.width,
            tool: style.tool,
            timestamp_ms,
        })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Colour the rasterizer paints with: eraser strokes take the surface background.
    pub fn paint_color(&self, background: Rgb) -> Rgb {
        paint_color(self.tool, self.color, background)
    }

    /// Width the rasterizer paints with: eraser strokes are twice as wide.
    pub fn paint_width(&self) -> f32 {
        paint_width(self.tool, self.width)
    }
}

pub(crate) fn paint_color(tool: Tool, color: Rgb, background: Rgb) -> Rgb {
    match tool {
        Tool::Pen => color,
        Tool::Eraser => background,
    }
}

pub(crate) fn paint_width(tool: Tool, width: f32) -> f32 {
    match tool {
        Tool::Pen => width,
        Tool::Eraser => width * 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pen() -> PenStyle {
        PenStyle {
            color: Rgb::BLACK,
            width: 2.0,
            tool: Tool::Pen,
        }
    }

    #[test]
    fn test_rgb_parses_long_and_short_hex() {
        assert_eq!("#1a2b3c".parse::<Rgb>(), Ok(Rgb::new(0x1a, 0x2b, 0x3c)));
        assert_eq!("fff".parse::<Rgb>(), Ok(Rgb::WHITE));
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#gg0000".parse::<Rgb>().is_err());
        assert_eq!(Rgb::new(0, 128, 255).to_string(), "#0080ff");
    }

    #[test]
    fn test_point_clamps_pressure() {
        assert_eq!(Point::new(1.0, 1.0, 1.7).pressure, 1.0);
        assert_eq!(Point::new(1.0, 1.0, -0.2).pressure, 0.0);
        assert_eq!(Point::new(1.0, 1.0, f32::NAN).pressure, NOMINAL_PRESSURE);
    }

    #[test]
    fn test_single_point_is_not_a_stroke() {
        let points = vec![Point::new(5.0, 5.0, 0.5)];
        assert!(Stroke::from_points(points, pen(), 0).is_none());
    }

    #[test]
    fn test_stroke_rejects_non_positive_width() {
        let points = vec![Point::new(0.0, 0.0, 0.5), Point::new(3.0, 3.0, 0.5)];
        let style = PenStyle { width: 0.0, ..pen() };
        assert!(Stroke::from_points(points, style, 0).is_none());
    }

    #[test]
    fn test_eraser_paints_background_at_double_width() {
        let points = vec![Point::new(0.0, 0.0, 0.5), Point::new(3.0, 3.0, 0.5)];
        let style = PenStyle {
            color: Rgb::new(200, 0, 0),
            width: 3.0,
            tool: Tool::Eraser,
        };
        let stroke = Stroke::from_points(points, style, 7).expect("two points make a stroke");

        assert_eq!(stroke.paint_color(Rgb::WHITE), Rgb::WHITE);
        assert_eq!(stroke.paint_width(), 6.0);
    }

    #[test]
    fn test_stroke_deserialization_validates() {
        let json = r##"{"points":[{"x":1,"y":2},{"x":3,"y":4,"pressure":0.9}],"color":"#ff0000","width":2.5}"##;
        let stroke: Stroke = serde_json::from_str(json).expect("valid stroke");
        assert_eq!(stroke.points().len(), 2);
        assert_eq!(stroke.points()[0].pressure, NOMINAL_PRESSURE);
        assert_eq!(stroke.tool(), Tool::Pen);
        assert_eq!(stroke.color(), Rgb::new(255, 0, 0));

        let tap = r##"{"points":[{"x":1,"y":2}],"color":"#ff0000","width":2.5}"##;
        assert!(serde_json::from_str::<Stroke>(tap).is_err());
    }
}
