//! Keeps the map shapes, the list rows and the label overlay consistent
//! with the selection.
//!
//! There are two update paths:
//!
//! - **Hot path.** [`RenderSync::toggle`] and the bulk operations update
//!   a read-optimized snapshot and push the visual change straight to a
//!   [`RenderSurface`] (shape highlight, list checkbox), then enqueue the
//!   authoritative mutation. The caller schedules one [`RenderSync::flush`]
//!   on the next tick when asked to; later operations join the same
//!   pending batch. The queue is FIFO, so the store ends up in the same
//!   state as the snapshot.
//! - **Full redraw.** [`RenderSync::frame`] describes every shape for a
//!   declarative re-render. It is only needed on scope switch, resize
//!   and reset, never for individual toggles.
//!
//! Both paths read the same snapshot, so callers that use both stay
//! eventually consistent.

use std::collections::{HashSet, VecDeque};
use std::fmt::Write as _;

use web_time::Instant;

use crate::fit::{ViewTransform, Viewport};
use crate::labels::{LabelDiff, LabelOverlay};
use crate::scene::MapScene;
use crate::scope::ScopeId;
use crate::selection::SelectionStore;

/// Imperative update API for the visual surfaces.
///
/// Implementations skip names they have no element for.
pub trait RenderSurface {
    /// Set or clear the visited highlight of a region's shape.
    fn highlight(&mut self, name: &str, on: bool);

    /// Check or uncheck a region's list row.
    fn set_list_checked(&mut self, name: &str, on: bool);
}

/// A surface that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurface;

impl RenderSurface for NullSurface {
    fn highlight(&mut self, _name: &str, _on: bool) {}
    fn set_list_checked(&mut self, _name: &str, _on: bool) {}
}

/// Deterministic element id for a region, e.g. `dom_id("shape", "Côte")`.
///
/// ASCII letters and digits are kept; every other character is written as
/// `_<hex>_`, so distinct names never share an id.
#[must_use]
pub fn dom_id(prefix: &str, name: &str) -> String {
    let mut id = String::with_capacity(prefix.len() + 1 + name.len());
    id.push_str(prefix);
    id.push('-');
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            id.push(ch);
        } else {
            let _ = write!(id, "_{:x}_", u32::from(ch));
        }
    }
    id
}

/// What the caller must do after a hot-path update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushRequest {
    /// First pending operation: schedule a flush on the next tick.
    Schedule,
    /// A flush is already scheduled; nothing to do.
    Pending,
    /// The operation had no effect.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingOp {
    Set(String, bool),
    SelectAll(Vec<String>),
    DeselectAll,
}

/// Result of applying the pending queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Operations applied to the store.
    pub applied: usize,
    /// Store version after the flush.
    pub version: u64,
    /// Label changes caused by the flush.
    pub labels: LabelDiff,
}

/// Everything needed to draw one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeView {
    /// Element id of the shape.
    pub id: String,
    /// Region name.
    pub name: String,
    /// SVG path data in projected coordinates.
    pub path: String,
    /// Whether the region is visited.
    pub selected: bool,
}

/// A full description of the map for a declarative redraw.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeFrame {
    /// Scope being drawn.
    pub scope: ScopeId,
    /// Transform from projected to screen coordinates.
    pub transform: ViewTransform,
    /// Shapes in draw order.
    pub shapes: Vec<ShapeView>,
}

/// The render synchronizer.
#[derive(Debug, Clone, Default)]
pub struct RenderSync {
    store: SelectionStore,
    snapshot: HashSet<String>,
    known: HashSet<String>,
    pending: VecDeque<PendingOp>,
    scheduled: bool,
}

impl RenderSync {
    /// A synchronizer with no known names.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start over for a new region set (scope switch).
    ///
    /// The store, the snapshot and any pending operations are discarded.
    pub fn reset<'a, I>(&mut self, names: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.store.clear();
        self.snapshot.clear();
        self.pending.clear();
        self.scheduled = false;
        self.known = names.into_iter().map(str::to_owned).collect();
    }

    /// Returns `true` if `name` is visited according to the snapshot.
    #[must_use]
    pub fn is_selected(&self, name: &str) -> bool {
        self.snapshot.contains(name)
    }

    /// Number of visited regions according to the snapshot.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.snapshot.len()
    }

    /// Number of selectable names.
    #[must_use]
    pub fn known_count(&self) -> usize {
        self.known.len()
    }

    /// Returns `true` if every selectable name is visited.
    #[must_use]
    pub fn all_selected(&self) -> bool {
        !self.known.is_empty() && self.snapshot.len() == self.known.len()
    }

    /// The authoritative store (trails the snapshot until flushed).
    #[must_use]
    pub const fn store(&self) -> &SelectionStore {
        &self.store
    }

    /// Returns `true` while operations wait for a flush.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Flip one region. Names outside the active region set are ignored.
    pub fn toggle<S: RenderSurface + ?Sized>(&mut self, name: &str, surface: &mut S) -> FlushRequest {
        if !self.known.contains(name) {
            tracing::debug!(name, "ignoring toggle of unknown region");
            return FlushRequest::Ignored;
        }
        let on = if self.snapshot.remove(name) {
            false
        } else {
            self.snapshot.insert(name.to_owned());
            true
        };
        surface.highlight(name, on);
        surface.set_list_checked(name, on);
        self.enqueue(PendingOp::Set(name.to_owned(), on))
    }

    /// Mark every known region visited.
    pub fn select_all<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) -> FlushRequest {
        if self.known.is_empty() {
            return FlushRequest::Ignored;
        }
        for name in &self.known {
            if self.snapshot.insert(name.clone()) {
                surface.highlight(name, true);
                surface.set_list_checked(name, true);
            }
        }
        let mut names: Vec<String> = self.known.iter().cloned().collect();
        names.sort();
        self.enqueue(PendingOp::SelectAll(names))
    }

    /// Clear the selection.
    pub fn deselect_all<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) -> FlushRequest {
        for name in self.snapshot.drain() {
            surface.highlight(&name, false);
            surface.set_list_checked(&name, false);
        }
        self.enqueue(PendingOp::DeselectAll)
    }

    /// Select all, or deselect all when everything is already selected.
    pub fn toggle_all<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) -> FlushRequest {
        if self.all_selected() {
            self.deselect_all(surface)
        } else {
            self.select_all(surface)
        }
    }

    fn enqueue(&mut self, op: PendingOp) -> FlushRequest {
        self.pending.push_back(op);
        if self.scheduled {
            FlushRequest::Pending
        } else {
            self.scheduled = true;
            FlushRequest::Schedule
        }
    }

    /// Apply pending operations to the store in order and update the
    /// label overlay.
    pub fn flush(&mut self, scene: &MapScene, labels: &mut LabelOverlay, now: Instant) -> FlushReport {
        let mut applied = 0;
        while let Some(op) = self.pending.pop_front() {
            match op {
                PendingOp::Set(name, on) => {
                    self.store.set(&name, on);
                }
                PendingOp::SelectAll(names) => self.store.select_all(names),
                PendingOp::DeselectAll => self.store.deselect_all(),
            }
            applied += 1;
        }
        self.scheduled = false;
        let labels = if applied > 0 {
            labels.reconcile(scene, &self.store, now)
        } else {
            LabelDiff::default()
        };
        FlushReport {
            applied,
            version: self.store.version(),
            labels,
        }
    }

    /// Describe every shape for a full redraw.
    #[must_use]
    pub fn frame(&self, scene: &MapScene, viewport: &Viewport) -> ShapeFrame {
        ShapeFrame {
            scope: scene.scope(),
            transform: viewport.current(),
            shapes: scene
                .shapes()
                .iter()
                .map(|shape| ShapeView {
                    id: dom_id("shape", &shape.name),
                    name: shape.name.clone(),
                    path: shape.path.clone(),
                    selected: self.snapshot.contains(&shape.name),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Records the last state pushed for each name.
    #[derive(Default)]
    struct Recorder {
        shapes: HashMap<String, bool>,
        rows: HashMap<String, bool>,
        calls: usize,
    }

    impl RenderSurface for Recorder {
        fn highlight(&mut self, name: &str, on: bool) {
            self.shapes.insert(name.to_owned(), on);
            self.calls += 1;
        }

        fn set_list_checked(&mut self, name: &str, on: bool) {
            self.rows.insert(name.to_owned(), on);
            self.calls += 1;
        }
    }

    fn sync() -> RenderSync {
        let mut s = RenderSync::new();
        s.reset(["A", "B", "C"]);
        s
    }

    fn overlay() -> LabelOverlay {
        LabelOverlay::new(Duration::from_millis(250))
    }

    #[test]
    fn toggle_updates_surface_immediately_and_store_on_flush() {
        let mut s = sync();
        let mut surface = Recorder::default();
        assert_eq!(s.toggle("A", &mut surface), FlushRequest::Schedule);
        assert!(s.is_selected("A"));
        assert_eq!(surface.shapes.get("A"), Some(&true));
        assert_eq!(surface.rows.get("A"), Some(&true));
        assert!(!s.store().contains("A"));

        let scene = MapScene::empty(ScopeId::World);
        let report = s.flush(&scene, &mut overlay(), Instant::now());
        assert_eq!(report.applied, 1);
        assert!(s.store().contains("A"));
        assert!(!s.has_pending());
    }

    #[test]
    fn only_first_pending_op_schedules() {
        let mut s = sync();
        let mut surface = NullSurface;
        assert_eq!(s.toggle("A", &mut surface), FlushRequest::Schedule);
        assert_eq!(s.toggle("B", &mut surface), FlushRequest::Pending);
        assert_eq!(s.toggle("A", &mut surface), FlushRequest::Pending);
        let scene = MapScene::empty(ScopeId::World);
        s.flush(&scene, &mut overlay(), Instant::now());
        assert!(s.store().equals_all(["B"]));
        assert_eq!(s.toggle("C", &mut surface), FlushRequest::Schedule);
    }

    #[test]
    fn unknown_names_are_ignored() {
        let mut s = sync();
        let mut surface = Recorder::default();
        assert_eq!(s.toggle("Atlantis", &mut surface), FlushRequest::Ignored);
        assert_eq!(surface.calls, 0);
        assert_eq!(s.selected_count(), 0);
    }

    #[test]
    fn select_all_touches_only_unselected() {
        let mut s = sync();
        let mut surface = Recorder::default();
        s.toggle("A", &mut surface);
        surface.calls = 0;
        s.select_all(&mut surface);
        assert_eq!(surface.calls, 4);
        assert!(s.all_selected());
    }

    #[test]
    fn toggle_all_alternates() {
        let mut s = sync();
        let mut surface = Recorder::default();
        s.toggle_all(&mut surface);
        assert_eq!(s.selected_count(), 3);
        s.toggle_all(&mut surface);
        assert_eq!(s.selected_count(), 0);
        assert!(surface.shapes.values().all(|on| !on));

        let scene = MapScene::empty(ScopeId::World);
        s.flush(&scene, &mut overlay(), Instant::now());
        assert!(s.store().is_empty());
    }

    #[test]
    fn reset_discards_everything() {
        let mut s = sync();
        s.toggle("A", &mut NullSurface);
        s.reset(["X"]);
        assert_eq!(s.selected_count(), 0);
        assert!(!s.has_pending());
        assert_eq!(s.toggle("A", &mut NullSurface), FlushRequest::Ignored);
        assert_eq!(s.toggle("X", &mut NullSurface), FlushRequest::Schedule);
    }

    #[test]
    fn dom_ids_are_unique_and_safe() {
        assert_eq!(dom_id("shape", "France"), "shape-France");
        assert_eq!(dom_id("row", "Côte d'Ivoire"), "row-C_f4_te_20_d_27_Ivoire");
        assert_ne!(dom_id("shape", "a b"), dom_id("shape", "a_20_b"));
    }
}
