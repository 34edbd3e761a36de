//! Tunable parameters for the map.

use serde::{Deserialize, Serialize};

/// Every tunable of the interactive map and the exporters.
///
/// Deserializing fills missing fields from [`MapConfig::default`], so a
/// JSON file only needs to name the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Smallest zoom, as a ratio of the fitted scale.
    pub min_zoom: f64,

    /// Largest zoom, as a ratio of the fitted scale.
    pub max_zoom: f64,

    /// Multiplicative factor applied by the zoom-in / zoom-out buttons.
    pub zoom_step: f64,

    /// Wheel curve exponent per pixel of vertical delta:
    /// `factor = 2^(-dy * wheel_sensitivity)`.
    pub wheel_sensitivity: f64,

    /// Pixels per wheel "line" when the browser reports line deltas.
    pub wheel_line_height: f64,

    /// Pixels per wheel "page" when the browser reports page deltas.
    pub wheel_page_height: f64,

    /// Pointer travel in pixels below which a press on empty canvas is
    /// not treated as a pan.
    pub drag_tolerance: f64,

    /// Milliseconds after a click during which hover labels stay hidden.
    pub hover_cooldown_ms: u64,

    /// Milliseconds a touch must be held to count as a long press.
    pub long_press_ms: u64,

    /// Milliseconds for the label overlay to fade in or out.
    pub label_fade_ms: u64,

    /// Milliseconds for the reset-view animation.
    pub reset_duration_ms: u64,

    /// Fraction of the viewport kept free on each side when fitting.
    pub fit_padding: f64,

    /// Pixel scale multiplier for PNG export.
    pub export_supersample: f64,

    /// Margin in output pixels (before supersampling) around exported content.
    pub export_padding: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            min_zoom: 1.0,
            max_zoom: 8.0,
            zoom_step: 1.5,
            wheel_sensitivity: 0.002,
            wheel_line_height: 33.0,
            wheel_page_height: 500.0,
            drag_tolerance: 3.0,
            hover_cooldown_ms: 500,
            long_press_ms: 300,
            label_fade_ms: 250,
            reset_duration_ms: 750,
            fit_padding: 0.02,
            export_supersample: 2.0,
            export_padding: 16.0,
        }
    }
}

impl MapConfig {
    /// Parse a (possibly partial) JSON document over the defaults.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if the text is not
    /// valid JSON or a field has the wrong type.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(text)?;
        Ok(config.sanitized())
    }

    /// Zoom limits as a `(min, max)` ratio pair.
    #[must_use]
    pub const fn zoom_limits(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    /// Replace out-of-range values with defaults.
    ///
    /// Zoom limits must be positive and ordered; the step and supersample
    /// factors must exceed one; padding must be non-negative.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !(positive(self.min_zoom) && positive(self.max_zoom) && self.min_zoom <= self.max_zoom) {
            tracing::warn!(
                min_zoom = self.min_zoom,
                max_zoom = self.max_zoom,
                "invalid zoom limits, using defaults",
            );
            self.min_zoom = defaults.min_zoom;
            self.max_zoom = defaults.max_zoom;
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            self.zoom_step = defaults.zoom_step;
        }
        if !positive(self.wheel_sensitivity) {
            self.wheel_sensitivity = defaults.wheel_sensitivity;
        }
        if !positive(self.wheel_line_height) {
            self.wheel_line_height = defaults.wheel_line_height;
        }
        if !positive(self.wheel_page_height) {
            self.wheel_page_height = defaults.wheel_page_height;
        }
        if !(self.drag_tolerance.is_finite() && self.drag_tolerance >= 0.0) {
            self.drag_tolerance = defaults.drag_tolerance;
        }
        if !(self.fit_padding.is_finite() && (0.0..0.5).contains(&self.fit_padding)) {
            self.fit_padding = defaults.fit_padding;
        }
        if !(self.export_supersample.is_finite() && self.export_supersample >= 1.0) {
            self.export_supersample = defaults.export_supersample;
        }
        if !(self.export_padding.is_finite() && self.export_padding >= 0.0) {
            self.export_padding = defaults.export_padding;
        }
        self
    }
}
