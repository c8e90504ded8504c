//! Raster surface and payload encoding.
//!
//! Strokes are painted as unions of capsules (every segment is filled out to half the stroke
//! width, measured from pixel centres), which gives round caps and round joins without any
//! anti-aliasing. Coverage is binary, so replaying the same stroke list always yields the same
//! pixels.
//!
//! Exported rasters are PNG images wrapped in a `data:` URL so the payload is a self-contained
//! string that can travel in a JSON body or a YAML document.

use super::stroke::{Point, Rgb, Stroke};
use crate::constants::RASTER_DATA_URL_PREFIX;
use crate::error::{ClinicError, ClinicResult};
use base64::{engine::general_purpose, Engine as _};
use image::{ImageEncoder, RgbImage};
use serde::{Deserialize, Serialize};

/// A string-encoded raster snapshot.
///
/// The empty string is the sentinel for "nothing was drawn".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RasterPayload(String);

impl RasterPayload {
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps an existing payload string (for example one read back from storage).
    pub fn from_string(payload: String) -> Self {
        Self(payload.trim().to_string())
    }

    /// Encodes an image as a PNG data URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::RasterEncode`] if the PNG encoder fails.
    pub fn encode(image: &RgbImage) -> ClinicResult<Self> {
        let mut png = Vec::new();
        image::codecs::png::PngEncoder::new(&mut png)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgb8,
            )
            .map_err(ClinicError::RasterEncode)?;

        Ok(Self(format!(
            "{}{}",
            RASTER_DATA_URL_PREFIX,
            general_purpose::STANDARD.encode(png)
        )))
    }

    /// Decodes the payload back into an image; the empty sentinel decodes to `None`.
    ///
    /// A bare base64 string without the `data:` prefix is accepted as well.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::RasterDecode`] if the payload is not base64 or not a PNG image.
    pub fn decode(&self) -> ClinicResult<Option<RgbImage>> {
        if self.is_empty() {
            return Ok(None);
        }

        let encoded = self
            .0
            .strip_prefix(RASTER_DATA_URL_PREFIX)
            .unwrap_or(&self.0);
        let bytes = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| ClinicError::RasterDecode(format!("invalid base64: {}", e)))?;
        let image = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
            .map_err(|e| ClinicError::RasterDecode(e.to_string()))?;

        Ok(Some(image.to_rgb8()))
    }
}

/// The backing store of the annotation canvas.
#[derive(Clone, Debug)]
pub struct Surface {
    image: RgbImage,
    background: Rgb,
    /// Raster restored from a payload; painted under every replay.
    base: Option<RgbImage>,
}

impl Surface {
    /// Creates a background-filled surface. Dimensions are clamped to at least one pixel.
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        let image = RgbImage::from_pixel(width.max(1), height.max(1), to_pixel(background));
        Self {
            image,
            background,
            base: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    /// Installs a restored raster. A base of another size resizes the surface to match, so the
    /// restored raster is never cropped or padded.
    pub(crate) fn set_base(&mut self, base: Option<RgbImage>) {
        if let Some(base) = &base {
            if base.dimensions() != self.image.dimensions() {
                self.image =
                    RgbImage::from_pixel(base.width(), base.height(), to_pixel(self.background));
            }
        }
        self.base = base;
    }

    /// Fills the surface with the background and paints the restored base on top, if any.
    pub fn reset(&mut self) {
        let background = to_pixel(self.background);
        for pixel in self.image.pixels_mut() {
            *pixel = background;
        }
        if let Some(base) = &self.base {
            image::imageops::replace(&mut self.image, base, 0, 0);
        }
    }

    /// Paints a committed stroke with its own colour and width.
    pub fn paint_stroke(&mut self, stroke: &Stroke) {
        let color = stroke.paint_color(self.background);
        self.paint_polyline(stroke.points(), color, stroke.paint_width());
    }

    /// Paints consecutive segments of `points`. A single point paints nothing.
    pub fn paint_polyline(&mut self, points: &[Point], color: Rgb, width: f32) {
        for pair in points.windows(2) {
            self.paint_segment(pair[0], pair[1], color, width);
        }
    }

    /// Fills every pixel whose centre lies within `width / 2` of the segment `a`-`b`.
    pub fn paint_segment(&mut self, a: Point, b: Point, color: Rgb, width: f32) {
        let diagonal = (self.width() as f32).hypot(self.height() as f32);
        let radius = (width / 2.0).clamp(0.5, diagonal.max(0.5));
        let Some((x0, x1)) = pixel_span(a.x.min(b.x) - radius, a.x.max(b.x) + radius, self.width())
        else {
            return;
        };
        let Some((y0, y1)) =
            pixel_span(a.y.min(b.y) - radius, a.y.max(b.y) + radius, self.height())
        else {
            return;
        };

        let pixel = to_pixel(color);
        let radius_sq = radius * radius;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let cx = px as f32 + 0.5;
                let cy = py as f32 + 0.5;
                if distance_sq_to_segment(cx, cy, a, b) <= radius_sq {
                    self.image.put_pixel(px, py, pixel);
                }
            }
        }
    }

    /// Replays `strokes` in order from a cleared surface.
    pub fn replay<'a>(&mut self, strokes: impl IntoIterator<Item = &'a Stroke>) {
        self.reset();
        for stroke in strokes {
            self.paint_stroke(stroke);
        }
    }
}

/// Renders a stroke list onto a fresh surface.
pub fn render_strokes(strokes: &[Stroke], width: u32, height: u32, background: Rgb) -> RgbImage {
    let mut surface = Surface::new(width, height, background);
    surface.replay(strokes);
    surface.image
}

fn to_pixel(color: Rgb) -> image::Rgb<u8> {
    image::Rgb([color.r, color.g, color.b])
}

/// Clamps a floating-point extent to the pixel indices `[0, limit)`.
fn pixel_span(lo: f32, hi: f32, limit: u32) -> Option<(u32, u32)> {
    if !lo.is_finite() || !hi.is_finite() || limit == 0 {
        return None;
    }
    let lo = lo.floor();
    let hi = hi.ceil();
    let max = (limit - 1) as f32;
    if hi < 0.0 || lo > max {
        return None;
    }
    Some((lo.max(0.0) as u32, hi.min(max) as u32))
}

fn distance_sq_to_segment(px: f32, py: f32, a: Point, b: Point) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((px - a.x) * dx + (py - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (qx, qy) = (a.x + t * dx, a.y + t * dy);
    (px - qx) * (px - qx) + (py - qy) * (py - qy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::stroke::{PenStyle, Tool};

    fn stroke(points: &[(f32, f32)], color: Rgb, width: f32, tool: Tool) -> Stroke {
        let points = points.iter().map(|&(x, y)| Point::new(x, y, 0.5)).collect();
        Stroke::from_points(points, PenStyle { color, width, tool }, 0).expect("valid stroke")
    }

    fn pixel(image: &RgbImage, x: u32, y: u32) -> Rgb {
        let p = image.get_pixel(x, y);
        Rgb::new(p[0], p[1], p[2])
    }

    #[test]
    fn test_segment_paints_along_its_length_only() {
        let red = Rgb::new(255, 0, 0);
        let image = render_strokes(
            &[stroke(&[(2.0, 10.0), (18.0, 10.0)], red, 3.0, Tool::Pen)],
            20,
            20,
            Rgb::WHITE,
        );

        assert_eq!(pixel(&image, 10, 9), red);
        assert_eq!(pixel(&image, 10, 10), red);
        assert_eq!(pixel(&image, 10, 2), Rgb::WHITE);
        assert_eq!(pixel(&image, 10, 17), Rgb::WHITE);
    }

    #[test]
    fn test_later_strokes_paint_over_earlier_ones() {
        let red = Rgb::new(255, 0, 0);
        let blue = Rgb::new(0, 0, 255);
        let strokes = [
            stroke(&[(0.0, 5.5), (10.0, 5.5)], red, 4.0, Tool::Pen),
            stroke(&[(5.5, 0.0), (5.5, 10.0)], blue, 4.0, Tool::Pen),
        ];
        let image = render_strokes(&strokes, 11, 11, Rgb::WHITE);
        assert_eq!(pixel(&image, 5, 5), blue);

        let reversed = [strokes[1].clone(), strokes[0].clone()];
        let image = render_strokes(&reversed, 11, 11, Rgb::WHITE);
        assert_eq!(pixel(&image, 5, 5), red);
    }

    #[test]
    fn test_eraser_occludes_with_background() {
        let red = Rgb::new(255, 0, 0);
        let strokes = [
            stroke(&[(0.0, 5.5), (10.0, 5.5)], red, 2.0, Tool::Pen),
            stroke(&[(5.5, 0.0), (5.5, 10.0)], red, 1.0, Tool::Eraser),
        ];
        let image = render_strokes(&strokes, 11, 11, Rgb::WHITE);

        assert_eq!(pixel(&image, 5, 5), Rgb::WHITE);
        assert_eq!(pixel(&image, 1, 5), red);
    }

    #[test]
    fn test_off_canvas_segment_is_ignored() {
        let image = render_strokes(
            &[stroke(&[(-50.0, -50.0), (-40.0, -40.0)], Rgb::BLACK, 2.0, Tool::Pen)],
            10,
            10,
            Rgb::WHITE,
        );
        assert!(image.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn test_payload_round_trips_pixels() {
        let image = render_strokes(
            &[stroke(&[(1.0, 1.0), (8.0, 6.0)], Rgb::new(10, 20, 30), 2.0, Tool::Pen)],
            12,
            9,
            Rgb::WHITE,
        );
        let payload = RasterPayload::encode(&image).expect("encode should succeed");
        assert!(payload.as_str().starts_with(RASTER_DATA_URL_PREFIX));

        let decoded = payload
            .decode()
            .expect("decode should succeed")
            .expect("payload is not empty");
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_empty_payload_decodes_to_none() {
        assert_eq!(RasterPayload::empty().decode().expect("empty is valid"), None);
    }

    #[test]
    fn test_garbage_payload_is_rejected() {
        let err = RasterPayload::from_string("data:image/png;base64,!!!".into())
            .decode()
            .expect_err("not base64");
        assert!(matches!(err, ClinicError::RasterDecode(_)));

        let not_png = general_purpose::STANDARD.encode(b"hello");
        let err = RasterPayload::from_string(not_png)
            .decode()
            .expect_err("not a png");
        assert!(matches!(err, ClinicError::RasterDecode(_)));
    }

    #[test]
    fn test_huge_width_covers_the_canvas() {
        let mut surface = Surface::new(20, 20, Rgb::WHITE);
        surface.paint_stroke(&stroke(&[(10.0, 10.0), (11.0, 11.0)], Rgb::BLACK, 1e38, Tool::Pen));

        assert!(surface.image().pixels().all(|p| *p == image::Rgb([0, 0, 0])));
    }

    #[test]
    fn test_base_of_another_size_resizes_the_surface() {
        let mut surface = Surface::new(40, 40, Rgb::WHITE);
        let base = RgbImage::from_pixel(80, 60, image::Rgb([1, 2, 3]));

        surface.set_base(Some(base.clone()));
        surface.reset();

        assert_eq!((surface.width(), surface.height()), (80, 60));
        assert_eq!(surface.image(), &base);
    }
}

