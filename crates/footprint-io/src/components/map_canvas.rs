//! The interactive map: shapes, labels, hover tooltip and zoom controls.
//!
//! Pointer input is translated into container-local coordinates and
//! handed to the [`MapContext`]; touch pointers take the tap / long-press
//! path instead of hover. Shapes are drawn by [`ShapeLayer`], which only
//! re-renders when the full-redraw revision changes. Pan and zoom only
//! touch the `<g transform>`.

use dioxus::html::geometry::WheelDelta;
use dioxus::html::InteractionLocation;
use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::{LdMaximize, LdTag, LdZoomIn, LdZoomOut};
use web_time::Instant;

use footprint_core::{DeltaMode, MapSession, Placement, Point, ZoomDirection};

use crate::state::{MapContext, use_map};

/// Element id of the map container.
pub const MAP_CONTAINER_ID: &str = "map-canvas";

/// Keyboard pan step in pixels.
const KEY_PAN: f64 = 40.0;

/// Convert client coordinates to map-container coordinates.
fn local_point(client_x: f64, client_y: f64) -> Point {
    let origin = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(MAP_CONTAINER_ID))
        .map(|el| el.get_bounding_client_rect())
        .map_or((0.0, 0.0), |rect| (rect.left(), rect.top()));
    Point::new(client_x - origin.0, client_y - origin.1)
}

fn pointer_point(evt: &PointerEvent) -> Point {
    let client = evt.client_coordinates();
    local_point(client.x, client.y)
}

fn is_touch(evt: &PointerEvent) -> bool {
    evt.data().pointer_type() == "touch"
}

/// Class of the `<svg>`. While a scope loads the old map stays visible
/// but takes no pointer input.
const fn svg_class(loading: bool) -> &'static str {
    if loading { "map-svg loading" } else { "map-svg" }
}

/// The map canvas. Fills its parent.
#[component]
pub fn MapCanvas() -> Element {
    let ctx = use_map();
    let view = (ctx.view)();
    let loading = (ctx.loading)();
    let revision = (ctx.revision)();
    let empty = ctx.read(|s| s.scene().shapes().is_empty());

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "map-canvas",
            tabindex: "0",
            onresize: move |evt| {
                if let Ok(size) = evt.data().get_content_box_size() {
                    ctx.resize(size.width, size.height);
                }
            },
            onkeydown: move |evt| {
                if !*ctx.loading.peek() {
                    on_key(ctx, &evt);
                }
            },

            svg {
                class: svg_class(loading),
                xmlns: "http://www.w3.org/2000/svg",
                width: "100%",
                height: "100%",
                onpointerdown: move |evt| {
                    let at = pointer_point(&evt);
                    if is_touch(&evt) {
                        ctx.touch_start(at);
                    } else {
                        ctx.pointer_down(at, false);
                    }
                },
                onpointermove: move |evt| {
                    let at = pointer_point(&evt);
                    if is_touch(&evt) {
                        ctx.touch_move(at);
                    } else {
                        ctx.pointer_move(at);
                    }
                },
                onpointerup: move |evt| {
                    if is_touch(&evt) {
                        ctx.touch_end();
                    } else {
                        ctx.pointer_up();
                    }
                },
                onpointercancel: move |_| ctx.touch_cancel(),
                onpointerleave: move |evt| {
                    if !is_touch(&evt) {
                        ctx.pointer_leave();
                    }
                },
                onwheel: move |evt| {
                    evt.prevent_default();
                    if *ctx.loading.peek() {
                        return;
                    }
                    let (dy, mode) = match evt.data().delta() {
                        WheelDelta::Pixels(v) => (v.y, DeltaMode::Pixel),
                        WheelDelta::Lines(v) => (v.y, DeltaMode::Line),
                        WheelDelta::Pages(v) => (v.y, DeltaMode::Page),
                    };
                    let client = evt.client_coordinates();
                    ctx.wheel(dy, mode, local_point(client.x, client.y));
                },

                g { class: "regions", transform: "{view.svg_attr()}",
                    ShapeLayer { revision }
                }
                LabelLayer {}
            }

            HoverTooltip {}

            div {
                class: "map-controls",
                "aria-disabled": "{loading}",
                onpointerdown: move |evt| {
                    evt.stop_propagation();
                    ctx.pointer_down(pointer_point(&evt), true);
                },
                onpointerup: move |evt| {
                    evt.stop_propagation();
                    ctx.pointer_up();
                },
                button {
                    class: "map-control",
                    title: "Zoom in",
                    aria_label: "Zoom in",
                    onclick: move |_| ctx.zoom_step(ZoomDirection::In),
                    Icon { icon: LdZoomIn, width: 18, height: 18 }
                }
                button {
                    class: "map-control",
                    title: "Zoom out",
                    aria_label: "Zoom out",
                    onclick: move |_| ctx.zoom_step(ZoomDirection::Out),
                    Icon { icon: LdZoomOut, width: 18, height: 18 }
                }
                button {
                    class: "map-control",
                    title: "Reset view",
                    aria_label: "Reset view",
                    onclick: move |_| ctx.reset_view(),
                    Icon { icon: LdMaximize, width: 18, height: 18 }
                }
                button {
                    class: if (ctx.labels_on)() { "map-control active" } else { "map-control" },
                    title: "Show labels",
                    aria_label: "Show labels",
                    "aria-pressed": "{(ctx.labels_on)()}",
                    onclick: move |_| ctx.set_labels(!*ctx.labels_on.peek()),
                    Icon { icon: LdTag, width: 18, height: 18 }
                }
            }

            if loading {
                div { class: "map-status", "Loading boundaries…" }
            } else if empty {
                div { class: "map-status", "No regions to show" }
            }
        }
    }
}

fn on_key(ctx: MapContext, evt: &KeyboardEvent) {
    match evt.key() {
        Key::ArrowLeft => ctx.pan(KEY_PAN, 0.0),
        Key::ArrowRight => ctx.pan(-KEY_PAN, 0.0),
        Key::ArrowUp => ctx.pan(0.0, KEY_PAN),
        Key::ArrowDown => ctx.pan(0.0, -KEY_PAN),
        Key::Character(c) if c == "+" || c == "=" => ctx.zoom_step(ZoomDirection::In),
        Key::Character(c) if c == "-" => ctx.zoom_step(ZoomDirection::Out),
        Key::Character(c) if c == "0" => ctx.reset_view(),
        _ => return,
    }
    evt.prevent_default();
}

/// Props for [`ShapeLayer`].
#[derive(Props, Clone, PartialEq)]
struct ShapeLayerProps {
    /// Full-redraw revision; the layer re-renders only when it changes.
    revision: u64,
}

/// Every region path, in projected coordinates.
///
/// Selection changes between revisions are applied directly to the DOM
/// by [`crate::dom::DomSurface`].
#[component]
fn ShapeLayer(props: ShapeLayerProps) -> Element {
    let ctx = use_map();
    let frame = ctx.read(MapSession::frame);
    tracing::debug!(revision = props.revision, shapes = frame.shapes.len(), "drawing shapes");

    rsx! {
        for shape in frame.shapes {
            path {
                key: "{shape.id}",
                id: "{shape.id}",
                class: if shape.selected { "region visited" } else { "region" },
                "vector-effect": "non-scaling-stroke",
                d: "{shape.path}",
            }
        }
    }
}

/// Names of visited regions, fading in and out.
#[component]
fn LabelLayer() -> Element {
    let ctx = use_map();
    let _ = (ctx.labels)();
    let view = (ctx.view)();
    let now = Instant::now();
    let labels: Vec<(String, Point, &'static str, f64)> = ctx.read(|s| {
        let overlay = s.labels();
        overlay
            .entries()
            .map(|e| {
                (
                    e.name.clone(),
                    view.apply(e.anchor),
                    e.phase.css_class(),
                    overlay.opacity(e, now),
                )
            })
            .collect()
    });

    rsx! {
        g { class: "labels",
            for (name, at, class, opacity) in labels {
                text {
                    key: "{name}",
                    class: "map-label {class}",
                    x: "{at.x}",
                    y: "{at.y}",
                    "text-anchor": "middle",
                    style: "--label-from: {opacity}",
                    "{name}"
                }
            }
        }
    }
}

/// Region name near the pointer, or in the corner after a long press.
#[component]
fn HoverTooltip() -> Element {
    let ctx = use_map();
    let Some(label) = (ctx.hover)() else {
        return rsx! {};
    };
    match label.placement {
        Placement::Anchored(at) => rsx! {
            div {
                class: "map-tooltip",
                role: "tooltip",
                style: "left: {at.x}px; top: {at.y}px;",
                "{label.name}"
            }
        },
        Placement::Corner => rsx! {
            div { class: "map-tooltip corner", role: "tooltip", "{label.name}" }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svg_is_marked_while_loading() {
        assert_eq!(svg_class(false), "map-svg");
        assert!(svg_class(true).split(' ').any(|c| c == "loading"));
    }
}
