//! Fit-to-viewport and the interactive viewport transform.
//!
//! Projected geometry (see [`crate::projection`]) is mapped to screen
//! pixels by a [`ViewTransform`]: a uniform scale followed by a
//! translation. The fitted transform is recomputed on scope switch,
//! container resize and reset; pan and zoom gestures modify the current
//! transform directly.

use std::time::Duration;

use web_time::Instant;

use crate::projection::Projection;
use crate::scope::ManualView;
use crate::types::{Bounds, Point, RegionCollection, Size};

/// Uniform scale followed by a translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Pixels per projected unit.
    pub scale: f64,
    /// Screen position of the projected origin.
    pub translate: Point,
}

impl ViewTransform {
    /// The transform that leaves coordinates unchanged.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            scale: 1.0,
            translate: Point::new(0.0, 0.0),
        }
    }

    /// Map a projected point to screen space.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            p.x.mul_add(self.scale, self.translate.x),
            p.y.mul_add(self.scale, self.translate.y),
        )
    }

    /// Map a screen point back to projected space.
    #[must_use]
    pub fn invert(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.translate.x) / self.scale,
            (p.y - self.translate.y) / self.scale,
        )
    }

    /// Map projected bounds to screen space.
    #[must_use]
    pub fn apply_bounds(&self, b: &Bounds) -> Bounds {
        let mut out = Bounds::empty();
        out.include(self.apply(b.min));
        out.include(self.apply(b.max));
        out
    }

    /// Returns `true` if the scale is finite and positive and the
    /// translation is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.scale.is_finite() && self.scale > 0.0 && self.translate.is_finite()
    }

    /// SVG `transform` attribute value.
    #[must_use]
    pub fn svg_attr(&self) -> String {
        format!(
            "translate({},{}) scale({})",
            self.translate.x, self.translate.y, self.scale
        )
    }

    /// Linear interpolation between two transforms.
    #[must_use]
    pub fn lerp(&self, to: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            scale: (to.scale - self.scale).mul_add(t, self.scale),
            translate: Point::new(
                (to.translate.x - self.translate.x).mul_add(t, self.translate.x),
                (to.translate.y - self.translate.y).mul_add(t, self.translate.y),
            ),
        }
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Fit projected `bounds` inside `viewport`, centered, preserving aspect
/// ratio.
///
/// `padding` is the fraction of each viewport side kept free. The scale
/// is the smaller of the width and height ratios.
///
/// Returns `None` for empty, non-finite or zero-area bounds and for a
/// zero-size viewport.
#[must_use]
pub fn fit_bounds(bounds: &Bounds, viewport: Size, padding: f64) -> Option<ViewTransform> {
    if bounds.is_degenerate() || viewport.is_empty() {
        return None;
    }
    let usable = 2.0f64.mul_add(-padding.clamp(0.0, 0.49), 1.0);
    let kx = viewport.width * usable / bounds.width();
    let ky = viewport.height * usable / bounds.height();
    let scale = kx.min(ky);
    let center = bounds.center();
    let transform = ViewTransform {
        scale,
        translate: Point::new(
            center.x.mul_add(-scale, viewport.width / 2.0),
            center.y.mul_add(-scale, viewport.height / 2.0),
        ),
    };
    transform.is_finite().then_some(transform)
}

/// Union of the projected bounds of every region.
#[must_use]
pub fn projected_bounds<P: Projection + ?Sized>(
    projection: &P,
    regions: &RegionCollection,
) -> Bounds {
    let mut bounds = Bounds::empty();
    for region in regions.regions() {
        for polygon in &region.geometry {
            for c in polygon.exterior().coords() {
                if let Some(p) = projection.project(c.x, c.y) {
                    bounds.include(p);
                }
            }
        }
    }
    bounds
}

/// Compute the transform that centers and maximizes `regions` in
/// `viewport`.
///
/// Never fails and never yields a non-finite transform. When the
/// projected bounds cannot be fitted, the scope's manual view is used;
/// an empty collection, a zero-size viewport, or an unusable manual view
/// give [`ViewTransform::identity`].
#[must_use]
pub fn fit_to_viewport<P: Projection + ?Sized>(
    projection: &P,
    regions: &RegionCollection,
    viewport: Size,
    fallback: &ManualView,
    padding: f64,
) -> ViewTransform {
    if regions.is_empty() {
        return ViewTransform::identity();
    }
    let bounds = projected_bounds(projection, regions);
    fit_or_fallback(&bounds, projection, viewport, fallback, padding)
}

/// [`fit_bounds`], falling back to the manual view, then to identity.
#[must_use]
pub fn fit_or_fallback<P: Projection + ?Sized>(
    bounds: &Bounds,
    projection: &P,
    viewport: Size,
    fallback: &ManualView,
    padding: f64,
) -> ViewTransform {
    if let Some(t) = fit_bounds(bounds, viewport, padding) {
        return t;
    }
    if viewport.is_empty() {
        tracing::debug!(?viewport, "zero-size viewport, using identity transform");
        return ViewTransform::identity();
    }
    tracing::warn!(?bounds, "projected bounds not fittable, using manual view");
    manual_transform(projection, viewport, fallback).unwrap_or_else(|| {
        tracing::warn!(?fallback, "manual view unusable, using identity transform");
        ViewTransform::identity()
    })
}

/// Transform placing the manual view's center at the viewport center.
fn manual_transform<P: Projection + ?Sized>(
    projection: &P,
    viewport: Size,
    view: &ManualView,
) -> Option<ViewTransform> {
    let center = projection.project(view.center.0, view.center.1)?;
    let scale = view.scale * viewport.width.min(viewport.height);
    let transform = ViewTransform {
        scale,
        translate: Point::new(
            center.x.mul_add(-scale, viewport.width / 2.0),
            center.y.mul_add(-scale, viewport.height / 2.0),
        ),
    };
    transform.is_finite().then_some(transform)
}

/// Cubic ease-in-out on `[0, 1]`.
#[must_use]
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = 2.0f64.mul_add(-t, 2.0);
        1.0 - u * u * u / 2.0
    }
}

/// An eased transition between two transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewAnimation {
    /// Transform at the start.
    pub from: ViewTransform,
    /// Transform at the end.
    pub to: ViewTransform,
    /// When the animation started.
    pub started: Instant,
    /// Total length.
    pub duration: Duration,
}

impl ViewAnimation {
    /// Transform at normalized time `t` in `[0, 1]`.
    #[must_use]
    pub fn sample(&self, t: f64) -> ViewTransform {
        self.from.lerp(&self.to, ease_cubic_in_out(t))
    }

    /// Normalized progress at `now`.
    #[must_use]
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Returns `true` once `now` is past the end.
    #[must_use]
    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}

/// The live viewport: container size, fitted transform and current
/// transform after user gestures.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    size: Size,
    base: ViewTransform,
    current: ViewTransform,
    animation: Option<ViewAnimation>,
}

impl Viewport {
    /// A zero-size viewport with identity transforms.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            size: Size::new(0.0, 0.0),
            base: ViewTransform::identity(),
            current: ViewTransform::identity(),
            animation: None,
        }
    }

    /// Container size in CSS pixels.
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// The fitted transform.
    #[must_use]
    pub const fn base(&self) -> ViewTransform {
        self.base
    }

    /// The transform currently drawn.
    #[must_use]
    pub const fn current(&self) -> ViewTransform {
        self.current
    }

    /// Current scale relative to the fitted scale.
    #[must_use]
    pub fn zoom_ratio(&self) -> f64 {
        if self.base.scale > 0.0 {
            self.current.scale / self.base.scale
        } else {
            1.0
        }
    }

    /// Replace the fitted transform and jump to it.
    pub fn refit(&mut self, size: Size, base: ViewTransform) {
        self.size = size;
        self.base = base;
        self.current = base;
        self.animation = None;
    }

    /// Multiply the scale by `factor`, keeping the screen point `anchor`
    /// fixed. The resulting scale is clamped to `limits` (ratios of the
    /// fitted scale).
    ///
    /// Returns `true` if the transform changed.
    pub fn zoom_by(&mut self, factor: f64, anchor: Point, limits: (f64, f64)) -> bool {
        if !(factor.is_finite() && factor > 0.0 && anchor.is_finite()) {
            return false;
        }
        self.animation = None;
        let min = self.base.scale * limits.0;
        let max = self.base.scale * limits.1;
        let scale = (self.current.scale * factor).clamp(min.min(max), max.max(min));
        if (scale - self.current.scale).abs() <= f64::EPSILON * self.current.scale {
            return false;
        }
        let fixed = self.current.invert(anchor);
        self.current = ViewTransform {
            scale,
            translate: Point::new(
                fixed.x.mul_add(-scale, anchor.x),
                fixed.y.mul_add(-scale, anchor.y),
            ),
        };
        true
    }

    /// Translate by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        self.animation = None;
        self.current.translate.x += dx;
        self.current.translate.y += dy;
    }

    /// Start animating back to the fitted transform.
    pub fn reset(&mut self, now: Instant, duration: Duration) -> ViewAnimation {
        let animation = ViewAnimation {
            from: self.current,
            to: self.base,
            started: now,
            duration,
        };
        self.animation = Some(animation);
        animation
    }

    /// Advance a running reset animation.
    ///
    /// Returns `true` while more frames are needed.
    pub fn advance(&mut self, now: Instant) -> bool {
        let Some(animation) = self.animation else {
            return false;
        };
        self.current = animation.sample(animation.progress(now));
        if animation.is_finished(now) {
            self.current = animation.to;
            self.animation = None;
            false
        } else {
            true
        }
    }

    /// Returns `true` while a reset animation is running.
    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.animation.is_some()
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}
