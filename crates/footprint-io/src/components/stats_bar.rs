//! Visited count, percentage and the share button.

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdCopy;

use footprint_core::format_percentage;

use crate::state::use_map;

/// "Visited 12 of 177 countries (6.8%)" plus a copy-summary button.
#[component]
pub fn StatsBar() -> Element {
    let ctx = use_map();
    let stats = (ctx.stats)();
    let noun = stats.scope.descriptor().noun;
    let pct = format_percentage(stats.percentage);

    rsx! {
        div { class: "stats-bar",
            p { class: "stats-text", role: "status",
                "Visited "
                strong { "{stats.visited}" }
                " of {stats.total} {noun} "
                span { class: "stats-pct", "({pct})" }
            }
            button {
                class: "btn btn-ghost",
                title: "Copy a summary to the clipboard",
                disabled: stats.total == 0,
                onclick: move |_| ctx.copy_summary(),
                Icon { icon: LdCopy, width: 16, height: 16 }
                " Share"
            }
        }
    }
}
