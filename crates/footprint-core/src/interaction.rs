//! Pointer gestures to map actions.
//!
//! A press on a region (or a control) suppresses the pan gesture and
//! toggles the region on release. A press on empty map pans. The wheel
//! always zooms. No state survives the end of a gesture.
//!
//! ```text
//! Idle --down(region)--> Suppressed --up--> Idle   (Toggle)
//! Idle --down(empty)---> Panning --move*--> Panning --up--> Idle   (Pan...)
//! Idle --wheel---------> Idle   (Zoom)
//! ```

use crate::config::MapConfig;
use crate::types::Point;

/// What a pointer press landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerTarget {
    /// A region shape.
    Region(String),
    /// A button or other control drawn over the map.
    Control,
    /// Empty map background.
    Empty,
}

/// Units of a wheel delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeltaMode {
    /// Pixels.
    #[default]
    Pixel,
    /// Lines of text.
    Line,
    /// Pages.
    Page,
}

/// Zoom button direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    /// Zoom in.
    In,
    /// Zoom out.
    Out,
}

/// An effect the session applies.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Flip a region's visited state.
    Toggle(String),
    /// Translate the view by a screen-space delta.
    Pan {
        /// Horizontal delta in pixels.
        dx: f64,
        /// Vertical delta in pixels.
        dy: f64,
    },
    /// Scale the view around a screen point.
    Zoom {
        /// Multiplicative factor.
        factor: f64,
        /// Screen point kept fixed.
        anchor: Point,
    },
}

/// What the select-all control does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    /// Select every region.
    SelectAll,
    /// Clear the selection.
    DeselectAll,
}

impl BulkAction {
    /// Button caption.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SelectAll => "Select all",
            Self::DeselectAll => "Deselect all",
        }
    }
}

/// The select-all control deselects when the selection already equals
/// the full name set, and selects otherwise.
#[must_use]
pub const fn select_all_action(all_selected: bool) -> BulkAction {
    if all_selected {
        BulkAction::DeselectAll
    } else {
        BulkAction::SelectAll
    }
}

/// Zoom factor for a wheel delta: `2^(-dy * sensitivity)` with `dy`
/// converted to pixels first.
#[must_use]
pub fn wheel_zoom_factor(dy: f64, mode: DeltaMode, config: &MapConfig) -> f64 {
    if !dy.is_finite() {
        return 1.0;
    }
    let pixels = match mode {
        DeltaMode::Pixel => dy,
        DeltaMode::Line => dy * config.wheel_line_height,
        DeltaMode::Page => dy * config.wheel_page_height,
    };
    (-pixels * config.wheel_sensitivity).exp2()
}

/// Per-gesture state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    /// No button held.
    #[default]
    Idle,
    /// Press began on a region or control; panning is suppressed.
    Suppressed {
        /// Region to toggle on release (`None` for controls).
        region: Option<String>,
    },
    /// Press began on empty map.
    Panning {
        /// Where the press started.
        origin: Point,
        /// Last pointer position.
        last: Point,
        /// Set once travel exceeded the drag tolerance.
        active: bool,
    },
}

/// Turns pointer events into [`Action`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionController {
    gesture: Gesture,
    config: MapConfig,
}

impl InteractionController {
    /// Create a controller using `config`'s tolerances and wheel curve.
    #[must_use]
    pub fn new(config: MapConfig) -> Self {
        Self {
            gesture: Gesture::Idle,
            config,
        }
    }

    /// Current gesture state.
    #[must_use]
    pub const fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Returns `true` while a drag is moving the map.
    #[must_use]
    pub const fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Panning { active: true, .. })
    }

    /// Button pressed on `target` at screen position `at`.
    pub fn pointer_down(&mut self, target: PointerTarget, at: Point) {
        self.gesture = match target {
            PointerTarget::Region(name) => Gesture::Suppressed { region: Some(name) },
            PointerTarget::Control => Gesture::Suppressed { region: None },
            PointerTarget::Empty => Gesture::Panning {
                origin: at,
                last: at,
                active: false,
            },
        };
    }

    /// Pointer moved to `at`.
    pub fn pointer_move(&mut self, at: Point) -> Option<Action> {
        let tolerance = self.config.drag_tolerance;
        let Gesture::Panning {
            origin,
            last,
            active,
        } = &mut self.gesture
        else {
            return None;
        };
        if !*active && origin.distance(at) < tolerance {
            return None;
        }
        *active = true;
        let action = Action::Pan {
            dx: at.x - last.x,
            dy: at.y - last.y,
        };
        *last = at;
        Some(action)
    }

    /// Button released. Emits a toggle when the press began on a region.
    pub fn pointer_up(&mut self) -> Option<Action> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Suppressed { region: Some(name) } => Some(Action::Toggle(name)),
            _ => None,
        }
    }

    /// Pointer left or the browser cancelled the gesture.
    pub fn pointer_cancel(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Wheel turned over the map at `anchor`.
    #[must_use]
    pub fn wheel(&self, dy: f64, mode: DeltaMode, anchor: Point) -> Action {
        Action::Zoom {
            factor: wheel_zoom_factor(dy, mode, &self.config),
            anchor,
        }
    }

    /// Zoom button pressed; zooms around `center`.
    #[must_use]
    pub fn step_zoom(&self, direction: ZoomDirection, center: Point) -> Action {
        let step = self.config.zoom_step;
        Action::Zoom {
            factor: match direction {
                ZoomDirection::In => step,
                ZoomDirection::Out => step.recip(),
            },
            anchor: center,
        }
    }
}
