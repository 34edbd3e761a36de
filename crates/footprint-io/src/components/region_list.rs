//! Searchable list of the active scope's regions with visited checkboxes.

use dioxus::prelude::*;

use footprint_core::dom_id;

use crate::dom::ROW_PREFIX;
use crate::state::use_map;

/// Region list with a search box and the select-all control.
///
/// The search filters the list only; the map always shows every region.
#[component]
pub fn RegionList() -> Element {
    let ctx = use_map();
    let mut query = use_signal(String::new);
    let _ = (ctx.revision)();
    let bulk = (ctx.bulk)();
    let q = query();
    let rows: Vec<(String, bool)> = ctx.read(|s| {
        s.search(&q)
            .into_iter()
            .map(|name| (name.to_owned(), s.is_selected(name)))
            .collect()
    });
    let noun = ctx.read(|s| s.descriptor().noun);

    rsx! {
        div { class: "region-list",
            div { class: "region-list-header",
                input {
                    r#type: "search",
                    class: "region-search",
                    placeholder: "Search {noun}",
                    aria_label: "Search {noun}",
                    value: "{q}",
                    oninput: move |evt| query.set(evt.value()),
                }
                button {
                    class: "btn",
                    onclick: move |_| ctx.toggle_all(),
                    "{bulk.label()}"
                }
            }

            if rows.is_empty() {
                p { class: "region-list-empty", "No matches" }
            }

            ul { class: "region-rows",
                for (name, checked) in rows {
                    RegionRow { key: "{name}", name, checked }
                }
            }
        }
    }
}

/// Props for [`RegionRow`].
#[derive(Props, Clone, PartialEq)]
struct RegionRowProps {
    /// Region name.
    name: String,
    /// Visited state when the row was rendered.
    checked: bool,
}

#[component]
fn RegionRow(props: RegionRowProps) -> Element {
    let ctx = use_map();
    let id = dom_id(ROW_PREFIX, &props.name);
    let name = props.name.clone();

    rsx! {
        li { class: "region-row",
            input {
                r#type: "checkbox",
                id: "{id}",
                checked: props.checked,
                onchange: move |_| ctx.toggle(&name),
            }
            label { r#for: "{id}", "{props.name}" }
        }
    }
}
