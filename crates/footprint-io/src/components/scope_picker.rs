//! Scope selector.

use dioxus::prelude::*;

use footprint_core::ScopeId;

use crate::state::use_map;

/// One `<option>`: value, text and whether it is selected.
fn options(active: ScopeId) -> impl Iterator<Item = (&'static str, &'static str, bool)> {
    ScopeId::ALL
        .into_iter()
        .map(move |scope| (scope.slug(), scope.label(), scope == active))
}

/// Drop-down of every scope. Choosing one starts loading it; the previous
/// scope stays visible until the new one is ready.
///
/// A failed load leaves the browser showing the rejected option, so the
/// `<select>` is keyed on the failure count and rebuilt from the active
/// scope.
#[component]
pub fn ScopePicker() -> Element {
    let ctx = use_map();
    let active = (ctx.scope)();
    let failures = (ctx.scope_failures)();
    let loading = (ctx.loading)();

    rsx! {
        label { class: "scope-picker",
            span { class: "scope-picker-label", "Map" }
            select {
                key: "{failures}",
                value: "{active.slug()}",
                aria_busy: "{loading}",
                onchange: move |evt| match evt.value().parse::<ScopeId>() {
                    Ok(scope) => ctx.switch_scope(scope),
                    Err(e) => tracing::warn!(%e, "ignoring unknown scope"),
                },
                for (slug, label, selected) in options(active) {
                    option { value: slug, selected, "{label}" }
                }
            }
        }
    }
}
