//! Shared map state for the component tree.
//!
//! The [`MapSession`] lives in a non-reactive [`CopyValue`] so that the
//! selection hot path never re-renders the map. Components subscribe to
//! the small signals in [`MapContext`] instead:
//!
//! | signal     | bumped on                                   |
//! |------------|---------------------------------------------|
//! | `revision` | scope switch, resize, reset (full redraw)   |
//! | `view`     | pan, zoom, reset animation frames           |
//! | `stats`    | every selection change                      |
//! | `labels`   | label overlay changes                       |
//! | `hover`    | hover tooltip changes                       |
//! | `scope_failures` | a scope load failed                   |

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use web_time::Instant;

use footprint_core::sync::NullSurface;
use footprint_core::{
    BulkAction, DeltaMode, FlushRequest, HoverLabel, LoadReport, MapConfig, MapSession, MoveEffect,
    Point, RenderSurface, ScopeId, ScopeRequest, Size, ViewTransform, VisitStats, ZoomDirection,
};

use crate::dom::DomSurface;
use crate::{clipboard, fetch};

/// How long a toast stays up.
const NOTICE_MS: u32 = 4_000;

/// Interval between reset animation frames.
const FRAME_MS: u32 = 16;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Confirmation of a user action.
    Info,
    /// Something failed; the app keeps working.
    Error,
}

/// A transient message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Sequence number; a newer notice replaces an older one.
    pub id: u64,
    /// Severity.
    pub kind: NoticeKind,
    /// Text shown to the user.
    pub message: String,
}

/// Handle to the map session and the signals derived from it.
#[derive(Clone, Copy)]
pub struct MapContext {
    session: CopyValue<MapSession>,
    notice_seq: CopyValue<u64>,
    /// Full-redraw counter.
    pub revision: Signal<u64>,
    /// Current view transform.
    pub view: Signal<ViewTransform>,
    /// Visited count and percentage.
    pub stats: Signal<VisitStats>,
    /// What the select-all control does next.
    pub bulk: Signal<BulkAction>,
    /// Hover tooltip.
    pub hover: Signal<Option<HoverLabel>>,
    /// Label overlay change counter.
    pub labels: Signal<u64>,
    /// Whether labels are switched on.
    pub labels_on: Signal<bool>,
    /// A scope fetch is outstanding.
    pub loading: Signal<bool>,
    /// Active scope.
    pub scope: Signal<ScopeId>,
    /// Failed scope loads; the picker remounts on change so it shows the
    /// active scope again.
    pub scope_failures: Signal<u64>,
    /// Current toast.
    pub notice: Signal<Option<Notice>>,
}

/// Create the map context and provide it to descendants.
pub fn use_map_provider(config: MapConfig) -> MapContext {
    use_context_provider(|| MapContext::new(config))
}

/// The map context provided by an ancestor.
#[must_use]
pub fn use_map() -> MapContext {
    use_context::<MapContext>()
}

fn with_surface<R>(f: impl FnOnce(&mut dyn RenderSurface) -> R) -> R {
    match DomSurface::new() {
        Some(mut dom) => f(&mut dom),
        None => f(&mut NullSurface),
    }
}

fn millis(ms: u64) -> u32 {
    u32::try_from(ms).unwrap_or(u32::MAX)
}

impl MapContext {
    fn new(config: MapConfig) -> Self {
        let session = MapSession::new(config);
        Self {
            revision: Signal::new(session.revision()),
            view: Signal::new(session.transform()),
            stats: Signal::new(session.stats()),
            bulk: Signal::new(session.bulk_action()),
            hover: Signal::new(None),
            labels: Signal::new(0),
            labels_on: Signal::new(false),
            loading: Signal::new(false),
            scope: Signal::new(session.scope()),
            scope_failures: Signal::new(0),
            notice: Signal::new(None),
            notice_seq: CopyValue::new(0),
            session: CopyValue::new(session),
        }
    }

    /// Read the session.
    pub fn read<R>(&self, f: impl FnOnce(&MapSession) -> R) -> R {
        f(&self.session.read())
    }

    fn write<R>(&self, f: impl FnOnce(&mut MapSession) -> R) -> R {
        let mut session = self.session;
        let mut guard = session.write();
        f(&mut guard)
    }

    // --- selection ---

    /// Flip one region (map click or list row).
    pub fn toggle(self, name: &str) {
        let request = self.write(|s| with_surface(|surface| s.toggle(name, surface)));
        self.after_hot_path(request);
    }

    /// The select-all / deselect-all control.
    pub fn toggle_all(self) {
        let request = self.write(|s| with_surface(|surface| s.toggle_all(surface)));
        self.after_hot_path(request);
    }

    fn after_hot_path(self, request: FlushRequest) {
        self.publish_selection();
        if request == FlushRequest::Schedule {
            spawn(async move {
                TimeoutFuture::new(0).await;
                self.flush_now();
            });
        }
    }

    /// Apply pending selection changes immediately.
    pub fn flush_now(mut self) {
        let report = self.write(|s| s.flush(Instant::now()));
        tracing::trace!(applied = report.applied, version = report.version, "selection flushed");
        if !report.labels.is_empty() {
            *self.labels.write() += 1;
            self.schedule_prune();
        }
        self.publish_selection();
    }

    fn publish_selection(mut self) {
        let (stats, bulk) = self.read(|s| (s.stats(), s.bulk_action()));
        self.stats.set(stats);
        self.bulk.set(bulk);
    }

    // --- labels ---

    /// Switch the label overlay on or off.
    pub fn set_labels(mut self, on: bool) {
        let diff = self.write(|s| s.set_labels(on, Instant::now()));
        self.labels_on.set(on);
        if !diff.is_empty() {
            *self.labels.write() += 1;
            self.schedule_prune();
        }
        // Switching labels flushes any pending toggles first.
        self.publish_selection();
    }

    fn schedule_prune(self) {
        let fade = self.read(|s| s.config().label_fade_ms);
        spawn(async move {
            TimeoutFuture::new(millis(fade).saturating_add(FRAME_MS)).await;
            let mut labels = self.labels;
            if self.write(|s| s.prune_labels(Instant::now())) {
                *labels.write() += 1;
            }
        });
    }

    // --- scopes ---

    /// Make `scope` active, fetching its boundaries if needed.
    pub fn switch_scope(mut self, scope: ScopeId) {
        match self.write(|s| s.request_scope(scope)) {
            ScopeRequest::Unchanged => {}
            ScopeRequest::Ready => self.after_commit(),
            ScopeRequest::Fetch { ticket, .. } => {
                self.loading.set(true);
                spawn(async move {
                    let result = fetch::load_scope(scope.descriptor()).await;
                    let report = self.write(|s| s.finish_load(ticket, result));
                    let mut loading = self.loading;
                    loading.set(self.read(MapSession::is_loading));
                    match report {
                        LoadReport::Activated(_) => self.after_commit(),
                        LoadReport::Discarded => {}
                        LoadReport::Failed(err) => {
                            tracing::error!(%scope, %err, "scope failed to load");
                            let mut active = self.scope;
                            active.set(self.read(MapSession::scope));
                            let mut failures = self.scope_failures;
                            *failures.write() += 1;
                            self.notify(
                                NoticeKind::Error,
                                format!("Could not load {}: {err}", scope.label()),
                            );
                        }
                    }
                });
            }
        }
    }

    fn after_commit(mut self) {
        let (scope, view) = self.read(|s| (s.scope(), s.transform()));
        self.scope.set(scope);
        self.view.set(view);
        self.hover.set(None);
        *self.revision.write() += 1;
        *self.labels.write() += 1;
        self.publish_selection();
    }

    // --- viewport ---

    /// The map container's content box changed size.
    pub fn resize(mut self, width: f64, height: f64) {
        if self.write(|s| s.resize(Size::new(width, height))) {
            self.view.set(self.read(MapSession::transform));
            *self.revision.write() += 1;
            self.refresh_hover();
        }
    }

    /// Animate back to the fitted view.
    pub fn reset_view(mut self) {
        self.write(|s| s.reset_view(Instant::now()));
        *self.revision.write() += 1;
        spawn(async move {
            loop {
                TimeoutFuture::new(FRAME_MS).await;
                let running = self.write(|s| s.animate(Instant::now()));
                let mut view = self.view;
                view.set(self.read(MapSession::transform));
                self.refresh_hover();
                if !running {
                    break;
                }
            }
        });
    }

    /// Zoom button.
    pub fn zoom_step(mut self, direction: ZoomDirection) {
        if self.write(|s| s.zoom_step(direction)) {
            self.view.set(self.read(MapSession::transform));
            self.refresh_hover();
        }
    }

    /// Wheel over the map.
    pub fn wheel(mut self, dy: f64, mode: DeltaMode, at: Point) {
        if self.write(|s| s.wheel(dy, mode, at)) {
            self.view.set(self.read(MapSession::transform));
            self.refresh_hover();
        }
    }

    /// Pan by a screen delta (keyboard).
    pub fn pan(mut self, dx: f64, dy: f64) {
        self.write(|s| s.pan(dx, dy));
        self.view.set(self.read(MapSession::transform));
        self.refresh_hover();
    }

    // --- pointer ---

    /// Button pressed at `at`; `on_control` when over an overlay control.
    pub fn pointer_down(self, at: Point, on_control: bool) {
        self.write(|s| s.pointer_down(at, on_control));
    }

    /// Pointer moved over the map.
    pub fn pointer_move(self, at: Point) {
        let effect = self.write(|s| s.pointer_move(at, Instant::now()));
        self.apply_move(effect);
    }

    /// Button released.
    pub fn pointer_up(self) {
        let request = self.write(|s| with_surface(|surface| s.pointer_up(Instant::now(), surface)));
        if let Some(request) = request {
            self.after_hot_path(request);
        }
        self.refresh_hover();
    }

    /// Pointer left the map.
    pub fn pointer_leave(self) {
        if self.write(MapSession::pointer_leave) {
            self.refresh_hover();
        }
    }

    // --- touch ---

    /// Finger down at `at`. Shows the label after a long press.
    pub fn touch_start(self, at: Point) {
        let long_press = self.read(|s| s.config().long_press_ms);
        self.write(|s| s.touch_start(at, Instant::now()));
        spawn(async move {
            TimeoutFuture::new(millis(long_press)).await;
            if self.write(|s| s.touch_poll(Instant::now())) {
                self.refresh_hover();
            }
        });
    }

    /// Finger moved.
    pub fn touch_move(self, at: Point) {
        let effect = self.write(|s| s.touch_move(at));
        self.apply_move(effect);
    }

    /// Finger lifted.
    pub fn touch_end(self) {
        let request = self.write(|s| with_surface(|surface| s.touch_end(Instant::now(), surface)));
        if let Some(request) = request {
            self.after_hot_path(request);
        }
        self.refresh_hover();
    }

    /// The browser cancelled the touch.
    pub fn touch_cancel(self) {
        if self.write(MapSession::touch_cancel) {
            self.refresh_hover();
        }
    }

    fn apply_move(mut self, effect: MoveEffect) {
        if effect.view_changed {
            self.view.set(self.read(MapSession::transform));
        }
        if effect.hover_changed {
            self.refresh_hover();
        }
    }

    fn refresh_hover(mut self) {
        let label = self.read(|s| s.hover().label().cloned());
        if *self.hover.peek() != label {
            self.hover.set(label);
        }
    }

    // --- notices ---

    /// Show a toast that dismisses itself.
    pub fn notify(mut self, kind: NoticeKind, message: String) {
        let id = {
            let mut seq = self.notice_seq.write();
            *seq += 1;
            *seq
        };
        self.notice.set(Some(Notice { id, kind, message }));
        spawn(async move {
            TimeoutFuture::new(NOTICE_MS).await;
            let mut notice = self.notice;
            if notice.peek().as_ref().is_some_and(|n| n.id == id) {
                notice.set(None);
            }
        });
    }

    /// Dismiss the current toast.
    pub fn dismiss(mut self) {
        self.notice.set(None);
    }

    /// Copy the shareable summary to the clipboard.
    pub fn copy_summary(self) {
        let text = self.read(MapSession::summary);
        spawn(async move {
            match clipboard::write_text(&text).await {
                Ok(()) => self.notify(NoticeKind::Info, "Summary copied to clipboard".into()),
                Err(e) => self.notify(NoticeKind::Error, format!("Copy failed: {e}")),
            }
        });
    }
}
