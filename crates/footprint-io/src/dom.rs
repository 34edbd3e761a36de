//! Hot-path DOM updates for selection changes.
//!
//! Map shapes and list checkboxes are rendered by Dioxus with ids from
//! [`dom_id`]. A toggle flips them directly here instead of re-rendering
//! the map, so clicking a region costs two element lookups.

use wasm_bindgen::JsCast;

use footprint_core::{RenderSurface, dom_id};

/// Element id prefix of map shapes.
pub const SHAPE_PREFIX: &str = "shape";
/// Element id prefix of list checkboxes.
pub const ROW_PREFIX: &str = "row";
/// Class carried by visited shapes.
pub const VISITED_CLASS: &str = "visited";

/// A [`RenderSurface`] over the live document.
#[derive(Debug, Clone)]
pub struct DomSurface {
    document: web_sys::Document,
}

impl DomSurface {
    /// Surface for the current window's document, if there is one.
    #[must_use]
    pub fn new() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self { document })
    }
}

impl RenderSurface for DomSurface {
    fn highlight(&mut self, name: &str, on: bool) {
        let Some(el) = self.document.get_element_by_id(&dom_id(SHAPE_PREFIX, name)) else {
            return;
        };
        if let Err(e) = el.class_list().toggle_with_force(VISITED_CLASS, on) {
            tracing::warn!(name, error = ?e, "failed to update shape class");
        }
    }

    fn set_list_checked(&mut self, name: &str, on: bool) {
        let Some(input) = self
            .document
            .get_element_by_id(&dom_id(ROW_PREFIX, name))
            .and_then(|el| el.dyn_into::<web_sys::HtmlInputElement>().ok())
        else {
            return;
        };
        input.set_checked(on);
    }
}
