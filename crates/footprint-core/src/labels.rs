//! Text labels for visited regions.
//!
//! When enabled, the overlay holds exactly one entry per selected region
//! that has a shape in the active scene, anchored at the region's label
//! point. Entries fade in when added and fade out before removal.
//! Updates are a keyed diff: only names whose membership changed are
//! touched.

use std::collections::BTreeMap;
use std::time::Duration;

use web_time::Instant;

use crate::scene::MapScene;
use crate::selection::SelectionStore;
use crate::types::Point;

/// Where an entry is in its fade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FadePhase {
    /// Fading from transparent to opaque.
    Entering,
    /// Fully shown.
    Visible,
    /// Fading out; removed by [`LabelOverlay::prune`] when transparent.
    Exiting,
}

impl FadePhase {
    /// CSS class used by the overlay for this phase.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Entering => "label-entering",
            Self::Visible => "label-visible",
            Self::Exiting => "label-exiting",
        }
    }
}

/// One label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelEntry {
    /// Region name (also the key).
    pub name: String,
    /// Anchor in projected coordinates.
    pub anchor: Point,
    /// Current fade phase.
    pub phase: FadePhase,
    /// When the current phase began.
    pub since: Instant,
}

impl LabelEntry {
    fn progress(&self, now: Instant, fade: Duration) -> f64 {
        if fade.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.since);
        (elapsed.as_secs_f64() / fade.as_secs_f64()).min(1.0)
    }
}

/// Names whose labels were added or started fading out by an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelDiff {
    /// Labels that started fading in.
    pub added: Vec<String>,
    /// Labels that started fading out.
    pub removed: Vec<String>,
}

impl LabelDiff {
    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// The label overlay.
#[derive(Debug, Clone)]
pub struct LabelOverlay {
    enabled: bool,
    fade: Duration,
    entries: BTreeMap<String, LabelEntry>,
}

impl LabelOverlay {
    /// A disabled overlay whose fades last `fade`.
    #[must_use]
    pub const fn new(fade: Duration) -> Self {
        Self {
            enabled: false,
            fade,
            entries: BTreeMap::new(),
        }
    }

    /// Returns `true` if labels are switched on.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch labels on (fade every selected label in) or off (fade all
    /// out).
    pub fn set_enabled(
        &mut self,
        on: bool,
        scene: &MapScene,
        selection: &SelectionStore,
        now: Instant,
    ) -> LabelDiff {
        if on == self.enabled {
            return LabelDiff::default();
        }
        self.enabled = on;
        if on {
            self.reconcile(scene, selection, now)
        } else {
            let mut diff = LabelDiff::default();
            for entry in self.entries.values_mut() {
                if entry.phase != FadePhase::Exiting {
                    entry.phase = FadePhase::Exiting;
                    entry.since = now;
                    diff.removed.push(entry.name.clone());
                }
            }
            diff
        }
    }

    /// Bring the entries in line with `selection` restricted to `scene`.
    ///
    /// Does nothing while disabled.
    pub fn reconcile(
        &mut self,
        scene: &MapScene,
        selection: &SelectionStore,
        now: Instant,
    ) -> LabelDiff {
        let mut diff = LabelDiff::default();
        if !self.enabled {
            return diff;
        }

        for entry in self.entries.values_mut() {
            let wanted = selection.contains(&entry.name) && scene.contains(&entry.name);
            if !wanted && entry.phase != FadePhase::Exiting {
                entry.phase = FadePhase::Exiting;
                entry.since = now;
                diff.removed.push(entry.name.clone());
            }
        }

        for name in selection.iter() {
            let Some(anchor) = scene.anchor(name) else {
                continue;
            };
            match self.entries.get_mut(name) {
                Some(entry) if entry.phase != FadePhase::Exiting => {}
                Some(entry) => {
                    entry.phase = FadePhase::Entering;
                    entry.since = now;
                    entry.anchor = anchor;
                    diff.added.push(name.to_owned());
                }
                None => {
                    self.entries.insert(
                        name.to_owned(),
                        LabelEntry {
                            name: name.to_owned(),
                            anchor,
                            phase: FadePhase::Entering,
                            since: now,
                        },
                    );
                    diff.added.push(name.to_owned());
                }
            }
        }
        diff
    }

    /// All entries, including ones still fading out.
    pub fn entries(&self) -> impl Iterator<Item = &LabelEntry> {
        self.entries.values()
    }

    /// Names with a label that is not fading out.
    pub fn shown_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .values()
            .filter(|e| e.phase != FadePhase::Exiting)
            .map(|e| e.name.as_str())
    }

    /// Opacity of `entry` at `now`, in `[0, 1]`.
    #[must_use]
    pub fn opacity(&self, entry: &LabelEntry, now: Instant) -> f64 {
        match entry.phase {
            FadePhase::Entering => entry.progress(now, self.fade),
            FadePhase::Visible => 1.0,
            FadePhase::Exiting => 1.0 - entry.progress(now, self.fade),
        }
    }

    /// Finish completed fades: entering labels become visible and fully
    /// faded exits are removed. Returns the removed names.
    pub fn prune(&mut self, now: Instant) -> Vec<String> {
        let fade = self.fade;
        let mut removed = Vec::new();
        self.entries.retain(|name, entry| {
            let done = entry.progress(now, fade) >= 1.0;
            match entry.phase {
                FadePhase::Exiting if done => {
                    removed.push(name.clone());
                    false
                }
                FadePhase::Entering if done => {
                    entry.phase = FadePhase::Visible;
                    entry.since = now;
                    true
                }
                _ => true,
            }
        });
        removed
    }

    /// Drop every entry immediately (scope switch).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Fade duration.
    #[must_use]
    pub const fn fade(&self) -> Duration {
        self.fade
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
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
        let regions = ["A", "B", "C"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                #[allow(clippy::cast_precision_loss)]
                let x = i as f64 * 2.0;
                Region {
                    name: (*name).to_owned(),
                    geometry: MultiPolygon::new(vec![polygon![
                        (x: x, y: 0.0),
                        (x: x + 1.0, y: 0.0),
                        (x: x + 1.0, y: 1.0),
                        (x: x, y: 1.0),
                        (x: x, y: 0.0),
                    ]]),
                    properties: serde_json::Map::new(),
                }
            })
            .collect();
        MapScene::build(&RegionCollection::new(ScopeId::World, regions), &Flat)
    }

    const FADE: Duration = Duration::from_millis(250);

    #[test]
    fn disabled_overlay_ignores_selection() {
        let mut overlay = LabelOverlay::new(FADE);
        let mut sel = SelectionStore::new();
        sel.toggle("A");
        assert!(overlay.reconcile(&scene(), &sel, Instant::now()).is_empty());
        assert_eq!(overlay.entries().count(), 0);
    }

    #[test]
    fn enabling_fades_in_one_label_per_selected_region() {
        let scene = scene();
        let mut overlay = LabelOverlay::new(FADE);
        let mut sel = SelectionStore::new();
        sel.select_all(["A", "C", "Nowhere"]);
        let now = Instant::now();
        let diff = overlay.set_enabled(true, &scene, &sel, now);
        assert_eq!(diff.added, vec!["A", "C"]);

        let entry = overlay.entries().next().cloned().unwrap();
        assert_eq!(entry.phase, FadePhase::Entering);
        assert!(overlay.opacity(&entry, now).abs() < 1e-9);
        assert!((overlay.opacity(&entry, now + FADE) - 1.0).abs() < 1e-9);
        assert_eq!(entry.anchor, Point::new(0.5, 0.5));
    }

    #[test]
    fn reconcile_touches_only_changed_names() {
        let scene = scene();
        let mut overlay = LabelOverlay::new(FADE);
        let mut sel = SelectionStore::new();
        sel.select_all(["A", "B"]);
        let t0 = Instant::now();
        overlay.set_enabled(true, &scene, &sel, t0);
        overlay.prune(t0 + FADE);

        sel.toggle("B");
        sel.toggle("C");
        let t1 = t0 + FADE * 2;
        let diff = overlay.reconcile(&scene, &sel, t1);
        assert_eq!(diff.added, vec!["C"]);
        assert_eq!(diff.removed, vec!["B"]);

        let a = overlay.entries().find(|e| e.name == "A").map(|e| (e.phase, e.since));
        assert_eq!(a, Some((FadePhase::Visible, t0 + FADE)));
    }

    #[test]
    fn disabling_fades_out_then_prunes() {
        let scene = scene();
        let mut overlay = LabelOverlay::new(FADE);
        let mut sel = SelectionStore::new();
        sel.toggle("A");
        let t0 = Instant::now();
        overlay.set_enabled(true, &scene, &sel, t0);
        let diff = overlay.set_enabled(false, &scene, &sel, t0);
        assert_eq!(diff.removed, vec!["A"]);
        assert_eq!(overlay.shown_names().count(), 0);
        assert!(overlay.prune(t0 + FADE / 2).is_empty());
        assert_eq!(overlay.prune(t0 + FADE), vec!["A"]);
        assert_eq!(overlay.entries().count(), 0);
    }

    #[test]
    fn reselecting_an_exiting_label_brings_it_back() {
        let scene = scene();
        let mut overlay = LabelOverlay::new(FADE);
        let mut sel = SelectionStore::new();
        sel.toggle("A");
        let t0 = Instant::now();
        overlay.set_enabled(true, &scene, &sel, t0);
        sel.toggle("A");
        overlay.reconcile(&scene, &sel, t0);
        sel.toggle("A");
        let diff = overlay.reconcile(&scene, &sel, t0);
        assert_eq!(diff.added, vec!["A"]);
        assert_eq!(overlay.entries().count(), 1);
    }
}
