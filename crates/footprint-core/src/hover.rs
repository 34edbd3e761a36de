//! Transient hover label.
//!
//! Pointer hover shows the region's name at its label anchor. Touch has
//! no hover, so a long press shows the name in a fixed corner of the map
//! instead; releasing hides it, and a press shorter than the threshold is
//! a tap that toggles the region. Right after a click the label is
//! suppressed for a short cooldown so it does not pop up over the region
//! that was just toggled.

use std::time::Duration;

use web_time::Instant;

use crate::fit::ViewTransform;
use crate::scene::MapScene;
use crate::types::Point;

/// Where the hover label is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// At a screen position (the region's anchor under the current
    /// transform).
    Anchored(Point),
    /// In the map's fixed top-left corner (touch).
    Corner,
}

/// The visible hover label.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverLabel {
    /// Region name.
    pub name: String,
    /// Placement.
    pub placement: Placement,
}

/// Result of lifting a finger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TouchRelease {
    /// A short press on a region: toggle it.
    Tap(String),
    /// A long press ended; the label was hidden.
    LongPressEnded,
    /// Nothing to do (press on empty map or cancelled).
    None,
}

#[derive(Debug, Clone, PartialEq)]
struct TouchPress {
    name: Option<String>,
    started: Instant,
    shown: bool,
}

/// Tracks the hover label for pointer and touch input.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverTracker {
    cooldown: Duration,
    long_press: Duration,
    last_click: Option<Instant>,
    label: Option<HoverLabel>,
    touch: Option<TouchPress>,
}

impl HoverTracker {
    /// Create a tracker with the given click cooldown and long-press
    /// threshold.
    #[must_use]
    pub const fn new(cooldown: Duration, long_press: Duration) -> Self {
        Self {
            cooldown,
            long_press,
            last_click: None,
            label: None,
            touch: None,
        }
    }

    /// The label to draw, if any.
    #[must_use]
    pub const fn label(&self) -> Option<&HoverLabel> {
        self.label.as_ref()
    }

    fn cooling_down(&self, now: Instant) -> bool {
        self.last_click
            .is_some_and(|at| now.saturating_duration_since(at) < self.cooldown)
    }

    /// Pointer is over `name` (or over no region). Returns `true` if the
    /// label changed.
    pub fn pointer_over(
        &mut self,
        name: Option<&str>,
        scene: &MapScene,
        transform: &ViewTransform,
        now: Instant,
    ) -> bool {
        let next = match name {
            Some(name) if !self.cooling_down(now) => scene.anchor(name).map(|anchor| HoverLabel {
                name: name.to_owned(),
                placement: Placement::Anchored(transform.apply(anchor)),
            }),
            _ => None,
        };
        self.replace(next)
    }

    /// Pointer left the map.
    pub fn pointer_leave(&mut self) -> bool {
        self.replace(None)
    }

    /// A region was clicked: hide the label and start the cooldown.
    pub fn note_click(&mut self, now: Instant) -> bool {
        self.last_click = Some(now);
        self.replace(None)
    }

    /// Re-anchor a pointer label after the transform changed.
    pub fn retarget(&mut self, scene: &MapScene, transform: &ViewTransform) {
        if let Some(label) = &mut self.label
            && let Placement::Anchored(_) = label.placement
        {
            match scene.anchor(&label.name) {
                Some(anchor) => label.placement = Placement::Anchored(transform.apply(anchor)),
                None => self.label = None,
            }
        }
    }

    /// A finger went down on `name` (or on empty map).
    pub fn touch_start(&mut self, name: Option<&str>, now: Instant) -> bool {
        self.touch = Some(TouchPress {
            name: name.map(str::to_owned),
            started: now,
            shown: false,
        });
        self.replace(None)
    }

    /// Check whether the current press has become a long press. Call this
    /// once the threshold has elapsed. Returns `true` if the label
    /// appeared.
    pub fn touch_poll(&mut self, now: Instant) -> bool {
        let Some(press) = &mut self.touch else {
            return false;
        };
        if press.shown || now.saturating_duration_since(press.started) < self.long_press {
            return false;
        }
        let Some(name) = press.name.clone() else {
            return false;
        };
        press.shown = true;
        self.replace(Some(HoverLabel {
            name,
            placement: Placement::Corner,
        }))
    }

    /// The finger lifted. Hides any label.
    pub fn touch_end(&mut self, now: Instant) -> TouchRelease {
        let press = self.touch.take();
        self.replace(None);
        match press {
            Some(TouchPress { shown: true, .. }) => TouchRelease::LongPressEnded,
            Some(TouchPress {
                name: Some(name),
                started,
                ..
            }) if now.saturating_duration_since(started) < self.long_press => {
                self.last_click = Some(now);
                TouchRelease::Tap(name)
            }
            _ => TouchRelease::None,
        }
    }

    /// The press turned into a pan or was cancelled by the browser.
    pub fn touch_cancel(&mut self) -> bool {
        self.touch = None;
        self.replace(None)
    }

    /// Forget all state (scope switch).
    pub fn clear(&mut self) {
        self.label = None;
        self.touch = None;
        self.last_click = None;
    }

    fn replace(&mut self, next: Option<HoverLabel>) -> bool {
        if self.label == next {
            false
        } else {
            self.label = next;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::Projection;
    use crate::scope::ScopeId;
    use crate::types::{Region, RegionCollection};
    use geo::{MultiPolygon, polygon};

    struct Flat;

    impl Projection for Flat {
        fn project(&self, lon: f64, lat: f64) -> Option<Point> {
            Some(Point::new(lon, lat))
        }
    }

    fn scene() -> MapScene {
        let region = Region {
            name: "Box".into(),
            geometry: MultiPolygon::new(vec![polygon![
                (x: 0.0, y: 0.0),
                (x: 2.0, y: 0.0),
                (x: 2.0, y: 2.0),
                (x: 0.0, y: 2.0),
                (x: 0.0, y: 0.0),
            ]]),
            properties: serde_json::Map::new(),
        };
        MapScene::build(&RegionCollection::new(ScopeId::World, vec![region]), &Flat)
    }

    fn tracker() -> HoverTracker {
        HoverTracker::new(Duration::from_millis(500), Duration::from_millis(300))
    }

    const TRANSFORM: ViewTransform = ViewTransform {
        scale: 10.0,
        translate: Point::new(5.0, 5.0),
    };

    #[test]
    fn pointer_label_anchors_at_transformed_centroid() {
        let mut h = tracker();
        assert!(h.pointer_over(Some("Box"), &scene(), &TRANSFORM, Instant::now()));
        assert_eq!(
            h.label().map(|l| l.placement),
            Some(Placement::Anchored(Point::new(15.0, 15.0)))
        );
        assert!(!h.pointer_over(Some("Box"), &scene(), &TRANSFORM, Instant::now()));
        assert!(h.pointer_leave());
        assert!(h.label().is_none());
    }

    #[test]
    fn hover_is_suppressed_after_click() {
        let scene = scene();
        let mut h = tracker();
        let t0 = Instant::now();
        h.note_click(t0);
        h.pointer_over(Some("Box"), &scene, &TRANSFORM, t0 + Duration::from_millis(200));
        assert!(h.label().is_none());
        h.pointer_over(Some("Box"), &scene, &TRANSFORM, t0 + Duration::from_millis(600));
        assert!(h.label().is_some());
    }

    #[test]
    fn retarget_follows_transform() {
        let scene = scene();
        let mut h = tracker();
        h.pointer_over(Some("Box"), &scene, &TRANSFORM, Instant::now());
        h.retarget(&scene, &ViewTransform::identity());
        assert_eq!(
            h.label().map(|l| l.placement),
            Some(Placement::Anchored(Point::new(1.0, 1.0)))
        );
    }

    #[test]
    fn long_press_shows_corner_label_until_release() {
        let mut h = tracker();
        let t0 = Instant::now();
        h.touch_start(Some("Box"), t0);
        assert!(!h.touch_poll(t0 + Duration::from_millis(100)));
        assert!(h.touch_poll(t0 + Duration::from_millis(300)));
        assert_eq!(h.label().map(|l| l.placement), Some(Placement::Corner));
        assert_eq!(
            h.touch_end(t0 + Duration::from_millis(900)),
            TouchRelease::LongPressEnded
        );
        assert!(h.label().is_none());
    }

    #[test]
    fn short_press_is_a_tap() {
        let mut h = tracker();
        let t0 = Instant::now();
        h.touch_start(Some("Box"), t0);
        assert_eq!(
            h.touch_end(t0 + Duration::from_millis(120)),
            TouchRelease::Tap("Box".to_owned())
        );
        assert!(h.label().is_none());
    }

    #[test]
    fn press_on_empty_map_does_nothing() {
        let mut h = tracker();
        let t0 = Instant::now();
        h.touch_start(None, t0);
        assert!(!h.touch_poll(t0 + Duration::from_millis(400)));
        assert_eq!(h.touch_end(t0 + Duration::from_millis(450)), TouchRelease::None);
    }

    #[test]
    fn cancelled_press_does_not_tap() {
        let mut h = tracker();
        let t0 = Instant::now();
        h.touch_start(Some("Box"), t0);
        h.touch_cancel();
        assert_eq!(h.touch_end(t0), TouchRelease::None);
    }
}
