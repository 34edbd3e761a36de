//! One map session: the active scope and everything derived from it.
//!
//! [`MapSession`] is the single owner of the selection, viewport, label
//! overlay and hover state. The UI layer feeds it input events and the
//! results of fetches, and reads back what to draw. It is not reactive
//! itself; [`MapSession::revision`] changes whenever a full redraw is
//! needed (scope switch, resize, reset), while toggles only touch the
//! [`RenderSurface`] handed in.
//!
//! A scope switch runs strictly in this order: the fetch completes, the
//! collection is committed, the scene is built, the selection is reset,
//! and the fit is computed.

use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

use crate::config::MapConfig;
use crate::fit::{ViewAnimation, ViewTransform, Viewport, fit_or_fallback};
use crate::hover::{HoverTracker, TouchRelease};
use crate::interaction::{
    Action, BulkAction, DeltaMode, InteractionController, PointerTarget, ZoomDirection,
    select_all_action,
};
use crate::labels::{LabelDiff, LabelOverlay};
use crate::loader::{LoadOutcome, LoadStep, LoadTicket, ScopeLoader};
use crate::projection::GeoProjection;
use crate::scene::MapScene;
use crate::scope::{FeatureSource, ScopeDescriptor, ScopeId};
use crate::stats::{VisitStats, filter_names, summary_text};
use crate::sync::{FlushReport, FlushRequest, RenderSurface, RenderSync, ShapeFrame};
use crate::types::{LoadError, Point, RegionCollection, Size};

/// What the caller must do after [`MapSession::request_scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeRequest {
    /// The scope was cached and is now active.
    Ready,
    /// Fetch `source`, then pass the result to [`MapSession::finish_load`].
    Fetch {
        /// Identifies this request.
        ticket: LoadTicket,
        /// Where to fetch from and how to parse.
        source: FeatureSource,
    },
    /// The scope is already active.
    Unchanged,
}

/// Result of [`MapSession::finish_load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadReport {
    /// The new scope is active.
    Activated(ScopeId),
    /// The response was superseded and dropped.
    Discarded,
    /// Loading failed; the previous scope stays active.
    Failed(LoadError),
}

/// Effects of a pointer move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveEffect {
    /// The view transform changed (pan).
    pub view_changed: bool,
    /// The hover label changed.
    pub hover_changed: bool,
}

/// The interactive map state for one browser tab.
#[derive(Debug)]
pub struct MapSession {
    config: MapConfig,
    scope: ScopeId,
    collection: Rc<RegionCollection>,
    projection: GeoProjection,
    scene: MapScene,
    sync: RenderSync,
    labels: LabelOverlay,
    viewport: Viewport,
    hover: HoverTracker,
    interaction: InteractionController,
    loader: ScopeLoader,
    loading: bool,
    revision: u64,
}

impl MapSession {
    /// A session showing nothing yet. Call [`MapSession::request_scope`]
    /// to load the first scope.
    #[must_use]
    pub fn new(config: MapConfig) -> Self {
        let scope = ScopeId::default();
        Self {
            scope,
            collection: Rc::new(RegionCollection::empty(scope)),
            projection: scope.descriptor().projection.build(),
            scene: MapScene::empty(scope),
            sync: RenderSync::new(),
            labels: LabelOverlay::new(Duration::from_millis(config.label_fade_ms)),
            viewport: Viewport::new(),
            hover: HoverTracker::new(
                Duration::from_millis(config.hover_cooldown_ms),
                Duration::from_millis(config.long_press_ms),
            ),
            interaction: InteractionController::new(config.clone()),
            loader: ScopeLoader::new(),
            loading: false,
            revision: 0,
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Tunables in effect.
    #[must_use]
    pub const fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Active scope.
    #[must_use]
    pub const fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Descriptor of the active scope.
    #[must_use]
    pub fn descriptor(&self) -> &'static ScopeDescriptor {
        self.scope.descriptor()
    }

    /// Regions of the active scope.
    #[must_use]
    pub fn collection(&self) -> &RegionCollection {
        &self.collection
    }

    /// Projected shapes of the active scope.
    #[must_use]
    pub const fn scene(&self) -> &MapScene {
        &self.scene
    }

    /// Selection state.
    #[must_use]
    pub const fn sync(&self) -> &RenderSync {
        &self.sync
    }

    /// Label overlay.
    #[must_use]
    pub const fn labels(&self) -> &LabelOverlay {
        &self.labels
    }

    /// Viewport.
    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Current view transform.
    #[must_use]
    pub const fn transform(&self) -> ViewTransform {
        self.viewport.current()
    }

    /// Hover state.
    #[must_use]
    pub const fn hover(&self) -> &HoverTracker {
        &self.hover
    }

    /// Returns `true` while a scope fetch is outstanding.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Changes whenever a full redraw is needed.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    // -----------------------------------------------------------------------
    // Scope lifecycle
    // -----------------------------------------------------------------------

    /// Ask for `scope` to become active.
    pub fn request_scope(&mut self, scope: ScopeId) -> ScopeRequest {
        if scope == self.scope && !self.collection.is_empty() && !self.loading {
            return ScopeRequest::Unchanged;
        }
        match self.loader.begin(scope) {
            LoadStep::Cached(collection) => {
                self.loading = false;
                self.commit(collection);
                ScopeRequest::Ready
            }
            LoadStep::Fetch(ticket) => {
                self.loading = true;
                ScopeRequest::Fetch {
                    ticket,
                    source: scope.descriptor().source,
                }
            }
        }
    }

    /// Deliver the result of a fetch started by [`MapSession::request_scope`].
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<RegionCollection, LoadError>,
    ) -> LoadReport {
        match self.loader.complete(ticket, result) {
            LoadOutcome::Committed(collection) => {
                self.loading = false;
                let scope = collection.scope();
                self.commit(collection);
                LoadReport::Activated(scope)
            }
            LoadOutcome::Stale => {
                self.loading = self.loader.is_loading();
                LoadReport::Discarded
            }
            LoadOutcome::Failed(err) => {
                self.loading = false;
                LoadReport::Failed(err)
            }
        }
    }

    /// Make `collection` the active scope.
    fn commit(&mut self, collection: Rc<RegionCollection>) {
        self.scope = collection.scope();
        self.projection = self.scope.descriptor().projection.build();
        self.scene = MapScene::build(&collection, &self.projection);
        self.sync.reset(collection.names());
        self.labels.clear();
        self.hover.clear();
        self.interaction.pointer_cancel();
        self.collection = collection;
        let size = self.viewport.size();
        self.refit(size);
        tracing::info!(scope = %self.scope, regions = self.collection.len(), "scope active");
    }

    fn refit(&mut self, size: Size) {
        let base = if self.collection.is_empty() {
            ViewTransform::identity()
        } else {
            fit_or_fallback(
                &self.scene.bounds(),
                &self.projection,
                size,
                &self.scope.descriptor().fallback,
                self.config.fit_padding,
            )
        };
        self.viewport.refit(size, base);
        self.hover.retarget(&self.scene, &base);
        self.revision += 1;
    }

    /// The map container changed size. Repeated calls with the same size
    /// are no-ops.
    pub fn resize(&mut self, size: Size) -> bool {
        if size == self.viewport.size() {
            return false;
        }
        self.refit(size);
        true
    }

    /// Animate back to the fitted view.
    pub fn reset_view(&mut self, now: Instant) -> ViewAnimation {
        let animation = self
            .viewport
            .reset(now, Duration::from_millis(self.config.reset_duration_ms));
        self.revision += 1;
        animation
    }

    /// Advance the reset animation. Returns `true` while more frames are
    /// needed.
    pub fn animate(&mut self, now: Instant) -> bool {
        let running = self.viewport.advance(now);
        self.hover.retarget(&self.scene, &self.viewport.current());
        running
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Flip one region (map click or list row).
    pub fn toggle<S: RenderSurface + ?Sized>(&mut self, name: &str, surface: &mut S) -> FlushRequest {
        self.sync.toggle(name, surface)
    }

    /// The select-all / deselect-all control.
    pub fn toggle_all<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) -> FlushRequest {
        self.sync.toggle_all(surface)
    }

    /// What the select-all control would do now.
    #[must_use]
    pub fn bulk_action(&self) -> BulkAction {
        select_all_action(self.sync.all_selected())
    }

    /// Apply pending selection changes (the next-tick batch).
    pub fn flush(&mut self, now: Instant) -> FlushReport {
        self.sync.flush(&self.scene, &mut self.labels, now)
    }

    /// Switch the label overlay on or off.
    pub fn set_labels(&mut self, on: bool, now: Instant) -> LabelDiff {
        if self.sync.has_pending() {
            self.flush(now);
        }
        self.labels.set_enabled(on, &self.scene, self.sync.store(), now)
    }

    /// Remove finished label fades. Returns `true` if anything changed.
    pub fn prune_labels(&mut self, now: Instant) -> bool {
        let before: Vec<_> = self.labels.entries().map(|e| e.phase).collect();
        let removed = self.labels.prune(now);
        let after: Vec<_> = self.labels.entries().map(|e| e.phase).collect();
        !removed.is_empty() || before != after
    }

    // -----------------------------------------------------------------------
    // Pointer and wheel
    // -----------------------------------------------------------------------

    /// Region under a screen point.
    #[must_use]
    pub fn region_at(&self, at: Point) -> Option<&str> {
        self.scene.hit_test(self.viewport.current().invert(at))
    }

    /// Button pressed at a screen point. `on_control` is set when the
    /// press landed on an overlay control rather than the map.
    pub fn pointer_down(&mut self, at: Point, on_control: bool) {
        let target = if on_control {
            PointerTarget::Control
        } else {
            match self.region_at(at) {
                Some(name) => PointerTarget::Region(name.to_owned()),
                None => PointerTarget::Empty,
            }
        };
        self.interaction.pointer_down(target, at);
    }

    /// Pointer moved: pans while dragging, otherwise updates the hover
    /// label.
    pub fn pointer_move(&mut self, at: Point, now: Instant) -> MoveEffect {
        if let Some(Action::Pan { dx, dy }) = self.interaction.pointer_move(at) {
            self.viewport.pan_by(dx, dy);
            let hover_changed = self.hover.pointer_leave();
            return MoveEffect {
                view_changed: true,
                hover_changed,
            };
        }
        if self.interaction.is_panning() {
            return MoveEffect::default();
        }
        let name = self.region_at(at).map(str::to_owned);
        let transform = self.viewport.current();
        MoveEffect {
            view_changed: false,
            hover_changed: self
                .hover
                .pointer_over(name.as_deref(), &self.scene, &transform, now),
        }
    }

    /// Button released. Toggles the region the press began on.
    pub fn pointer_up<S: RenderSurface + ?Sized>(
        &mut self,
        now: Instant,
        surface: &mut S,
    ) -> Option<FlushRequest> {
        match self.interaction.pointer_up() {
            Some(Action::Toggle(name)) => {
                self.hover.note_click(now);
                Some(self.sync.toggle(&name, surface))
            }
            _ => None,
        }
    }

    /// Pointer left the map.
    pub fn pointer_leave(&mut self) -> bool {
        self.interaction.pointer_cancel();
        self.hover.pointer_leave()
    }

    /// Wheel over the map. Returns `true` if the view changed.
    pub fn wheel(&mut self, dy: f64, mode: DeltaMode, at: Point) -> bool {
        let action = self.interaction.wheel(dy, mode, at);
        self.apply_zoom(&action)
    }

    /// Zoom button. Returns `true` if the view changed.
    pub fn zoom_step(&mut self, direction: ZoomDirection) -> bool {
        let size = self.viewport.size();
        let center = Point::new(size.width / 2.0, size.height / 2.0);
        let action = self.interaction.step_zoom(direction, center);
        self.apply_zoom(&action)
    }

    fn apply_zoom(&mut self, action: &Action) -> bool {
        let Action::Zoom { factor, anchor } = *action else {
            return false;
        };
        let changed = self
            .viewport
            .zoom_by(factor, anchor, self.config.zoom_limits());
        if changed {
            self.hover.retarget(&self.scene, &self.viewport.current());
        }
        changed
    }

    /// Pan by a screen delta (keyboard arrows).
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.viewport.pan_by(dx, dy);
        self.hover.retarget(&self.scene, &self.viewport.current());
    }

    // -----------------------------------------------------------------------
    // Touch
    // -----------------------------------------------------------------------

    /// Finger down at a screen point.
    pub fn touch_start(&mut self, at: Point, now: Instant) -> bool {
        let name = self.region_at(at).map(str::to_owned);
        let target = if name.is_some() {
            PointerTarget::Control
        } else {
            PointerTarget::Empty
        };
        self.interaction.pointer_down(target, at);
        self.hover.touch_start(name.as_deref(), now)
    }

    /// Finger moved. Pans when the press began on empty map.
    pub fn touch_move(&mut self, at: Point) -> MoveEffect {
        if let Some(Action::Pan { dx, dy }) = self.interaction.pointer_move(at) {
            self.viewport.pan_by(dx, dy);
            return MoveEffect {
                view_changed: true,
                hover_changed: self.hover.touch_cancel(),
            };
        }
        MoveEffect::default()
    }

    /// Check for a long press. Returns `true` if the label appeared.
    pub fn touch_poll(&mut self, now: Instant) -> bool {
        self.hover.touch_poll(now)
    }

    /// Finger lifted. A short tap on a region toggles it.
    pub fn touch_end<S: RenderSurface + ?Sized>(
        &mut self,
        now: Instant,
        surface: &mut S,
    ) -> Option<FlushRequest> {
        let panned = self.interaction.is_panning();
        self.interaction.pointer_cancel();
        match self.hover.touch_end(now) {
            TouchRelease::Tap(name) if !panned => Some(self.sync.toggle(&name, surface)),
            _ => None,
        }
    }

    /// The browser cancelled the touch.
    pub fn touch_cancel(&mut self) -> bool {
        self.interaction.pointer_cancel();
        self.hover.touch_cancel()
    }

    // -----------------------------------------------------------------------
    // Derived views
    // -----------------------------------------------------------------------

    /// List rows matching `query`, sorted alphabetically.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&str> {
        filter_names(self.collection.names(), query)
    }

    /// Visited count and percentage for the active scope.
    #[must_use]
    pub fn stats(&self) -> VisitStats {
        VisitStats::new(self.scope, self.sync.selected_count(), self.collection.len())
    }

    /// Shareable summary of the selection.
    #[must_use]
    pub fn summary(&self) -> String {
        let stats = self.stats();
        let names: Vec<&str> = self
            .collection
            .names()
            .filter(|name| self.sync.is_selected(name))
            .collect();
        summary_text(self.scope, stats.visited, stats.total, names)
    }

    /// Description of every shape for a full redraw.
    #[must_use]
    pub fn frame(&self) -> ShapeFrame {
        self.sync.frame(&self.scene, &self.viewport)
    }

    /// Returns `true` if `name` is visited.
    #[must_use]
    pub fn is_selected(&self, name: &str) -> bool {
        self.sync.is_selected(name)
    }
}

impl Default for MapSession {
    fn default() -> Self {
        Self::new(MapConfig::default())
    }
}
