//! Tight output frame around the rendered content.

use footprint_core::{Bounds, MapScene, Point, Size, ViewTransform};

/// Screen-space rectangle that an export covers.
///
/// Both serializers map a screen point `p` to output units with
/// [`ExportFrame::to_output`], so PNG and SVG crops always agree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportFrame {
    /// Top-left corner in screen space.
    pub origin: Point,
    /// Width in screen pixels.
    pub width: f64,
    /// Height in screen pixels.
    pub height: f64,
}

impl ExportFrame {
    /// Frame around the shapes of `scene` under `transform`, grown by
    /// `padding` on each side.
    ///
    /// With a `viewport`, only the part of the content inside the
    /// rectangle `(0, 0)..(width, height)` is framed, so a zoomed-in view
    /// exports what is on screen rather than the whole enlarged map.
    ///
    /// Returns `None` when the scene has no shapes or the framed content
    /// is non-finite or has no area (e.g. panned entirely off screen).
    #[must_use]
    pub fn around(
        scene: &MapScene,
        transform: &ViewTransform,
        padding: f64,
        viewport: Option<Size>,
    ) -> Option<Self> {
        if scene.shapes().is_empty() {
            return None;
        }
        let padding = if padding.is_finite() { padding.max(0.0) } else { 0.0 };
        let mut content: Bounds = scene.screen_bounds(transform);
        if let Some(size) = viewport.filter(|s| !s.is_empty()) {
            let screen = Bounds::new(Point::new(0.0, 0.0), Point::new(size.width, size.height));
            content = content.intersection(screen);
        }
        if content.is_degenerate() {
            return None;
        }
        let bounds = content.expand(padding);
        Some(Self {
            origin: bounds.min,
            width: bounds.width(),
            height: bounds.height(),
        })
    }

    /// Map a screen point into frame coordinates scaled by `factor`.
    #[must_use]
    pub fn to_output(&self, p: Point, factor: f64) -> Point {
        Point::new((p.x - self.origin.x) * factor, (p.y - self.origin.y) * factor)
    }
}
