//! PNG export.
//!
//! Shapes are rasterised with [`tiny_skia`] into a pixmap cropped tightly
//! to the transformed content (clipped to the viewport when one is
//! given) plus a padding margin, at a fixed
//! supersampling factor. The pixmap is converted from premultiplied to
//! straight alpha and encoded with the `image` crate's PNG encoder.
//!
//! Labels are not drawn: tiny-skia has no text rendering. Use the SVG
//! export when labels are wanted in the file.

use image::{ImageEncoder, Rgba, RgbaImage};
use tiny_skia::{FillRule, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use footprint_core::{MapConfig, MapScene, SelectionStore, Shape, Size, ViewTransform};

use crate::colors::{MapColors, Rgb};
use crate::crop::ExportFrame;

/// Largest width or height, in pixels, a PNG export may have.
pub const MAX_DIMENSION: u32 = 16_384;

/// Errors that can occur while producing a PNG.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Nothing was rendered, so there is nothing to crop to.
    #[error("the map has no rendered shapes to export")]
    EmptyScene,

    /// The output canvas could not be allocated.
    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncode(String),
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        Self::PngEncode(err.to_string())
    }
}

/// Parameters for [`render_png`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Output pixels per screen pixel.
    pub supersample: f64,
    /// Margin around the content, in screen pixels.
    pub padding: f64,
    /// On-screen map size. When set, only content inside it is exported.
    pub viewport: Option<Size>,
    /// Outline width, in screen pixels.
    pub stroke_width: f64,
    /// Palette.
    pub colors: MapColors,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self::from_config(&MapConfig::default(), MapColors::default())
    }
}

impl RasterOptions {
    /// Options using the export settings from `config`.
    #[must_use]
    pub const fn from_config(config: &MapConfig, colors: MapColors) -> Self {
        Self {
            supersample: config.export_supersample,
            padding: config.export_padding,
            viewport: None,
            stroke_width: 0.5,
            colors,
        }
    }
}

/// Rasterise `scene` as it appears under `transform` into a straight-alpha
/// RGBA image.
///
/// # Errors
///
/// Returns [`ExportError::EmptyScene`] if nothing would be drawn and
/// [`ExportError::Canvas`] if the output size is zero or exceeds
/// [`MAX_DIMENSION`].
pub fn rasterize(
    scene: &MapScene,
    selection: &SelectionStore,
    transform: &ViewTransform,
    options: &RasterOptions,
) -> Result<RgbaImage, ExportError> {
    let frame = ExportFrame::around(scene, transform, options.padding, options.viewport)
        .ok_or(ExportError::EmptyScene)?;
    let factor = if options.supersample.is_finite() && options.supersample > 0.0 {
        options.supersample
    } else {
        1.0
    };
    let width = output_dimension(frame.width * factor);
    let height = output_dimension(frame.height * factor);
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ExportError::Canvas { width, height });
    }
    let mut pixmap = Pixmap::new(width, height).ok_or(ExportError::Canvas { width, height })?;

    if let Some([r, g, b]) = options.colors.background {
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, 255));
    }

    #[allow(clippy::cast_possible_truncation)]
    let stroke_width = (options.stroke_width * factor).max(0.0) as f32;
    let stroke = Stroke {
        width: stroke_width,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    let border = paint(options.colors.border);
    let mut drawn = 0usize;
    for shape in scene.shapes() {
        let Some(path) = shape_path(shape, transform, &frame, factor) else {
            continue;
        };
        let fill = if selection.contains(&shape.name) {
            options.colors.visited
        } else {
            options.colors.land
        };
        pixmap.fill_path(&path, &paint(fill), FillRule::EvenOdd, Transform::identity(), None);
        if stroke.width > 0.0 {
            pixmap.stroke_path(&path, &border, &stroke, Transform::identity(), None);
        }
        drawn += 1;
    }
    tracing::debug!(width, height, shapes = drawn, "rasterised map");

    Ok(unpremultiply(&pixmap))
}

/// Render `scene` to PNG bytes.
///
/// # Errors
///
/// Returns the errors of [`rasterize`], plus [`ExportError::PngEncode`]
/// if encoding fails.
pub fn render_png(
    scene: &MapScene,
    selection: &SelectionStore,
    transform: &ViewTransform,
    options: &RasterOptions,
) -> Result<Vec<u8>, ExportError> {
    let img = rasterize(scene, selection, transform, options)?;
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    tracing::info!(bytes = png_bytes.len(), "encoded PNG export");
    Ok(png_bytes)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn output_dimension(extent: f64) -> u32 {
    if !extent.is_finite() || extent <= 0.0 {
        return 0;
    }
    let px = extent.ceil();
    if px > f64::from(u32::MAX) {
        u32::MAX
    } else {
        px as u32
    }
}

fn paint(rgb: Rgb) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgb[0], rgb[1], rgb[2], 255);
    paint.anti_alias = true;
    paint
}

/// Build a tiny-skia path for one shape in output pixel space.
#[allow(clippy::cast_possible_truncation)]
fn shape_path(
    shape: &Shape,
    transform: &ViewTransform,
    frame: &ExportFrame,
    factor: f64,
) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for polygon in &shape.geometry {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            let mut coords = ring.coords().map(|c| {
                let screen = transform.apply(footprint_core::Point::new(c.x, c.y));
                let p = frame.to_output(screen, factor);
                (p.x as f32, p.y as f32)
            });
            let Some((x, y)) = coords.next() else {
                continue;
            };
            pb.move_to(x, y);
            for (x, y) in coords {
                pb.line_to(x, y);
            }
            pb.close();
        }
    }
    pb.finish()
}

/// Convert a premultiplied pixmap to a straight-alpha image.
#[allow(clippy::cast_possible_truncation)]
fn unpremultiply(pixmap: &Pixmap) -> RgbaImage {
    let data = pixmap.data();
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (pixel, px) in img.pixels_mut().zip(data.chunks_exact(4)) {
        let a = px[3];
        *pixel = if a == 0 {
            Rgba([0, 0, 0, 0])
        } else {
            let un = |c: u8| (u16::from(c) * 255 / u16::from(a)) as u8;
            Rgba([un(px[0]), un(px[1]), un(px[2]), a])
        };
    }
    img
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn output_dimension_rounds_up() {
        assert_eq!(output_dimension(10.2), 11);
        assert_eq!(output_dimension(0.0), 0);
        assert_eq!(output_dimension(f64::NAN), 0);
        assert_eq!(output_dimension(-3.0), 0);
    }

    #[test]
    fn unpremultiply_restores_straight_alpha() {
        let mut pixmap = Pixmap::new(1, 1).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(200, 100, 0, 128));
        let img = unpremultiply(&pixmap);
        let Rgba([r, g, b, a]) = *img.get_pixel(0, 0);
        assert_eq!(a, 128);
        assert!(r.abs_diff(200) <= 2 && g.abs_diff(100) <= 2 && b == 0);
    }

    #[test]
    fn options_follow_config() {
        let config = MapConfig {
            export_supersample: 3.0,
            export_padding: 4.0,
            ..MapConfig::default()
        };
        let options = RasterOptions::from_config(&config, MapColors::default());
        assert!((options.supersample - 3.0).abs() < f64::EPSILON);
        assert!((options.padding - 4.0).abs() < f64::EPSILON);
    }
}
