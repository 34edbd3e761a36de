use dioxus::prelude::*;
use footprint_core::{MapConfig, ScopeId};
use footprint_io::{
    ExportPanel, MapCanvas, RegionList, ScopePicker, StatsBar, Toast, use_map_provider,
};

fn main() {
    dioxus::logger::initialize_default();
    dioxus::launch(app);
}

/// Root application component.
///
/// Provides the shared map context, loads the default scope once, and
/// lays out the picker, stats, map, region list and export controls.
fn app() -> Element {
    let ctx = use_map_provider(MapConfig::default());

    // Kick off the first boundary fetch on mount.
    use_hook(move || {
        tracing::info!(scope = %ScopeId::default(), "starting");
        ctx.switch_scope(ScopeId::default());
    });

    rsx! {
        style { dangerous_inner_html: include_str!("../assets/style.css") }

        div { class: "app",
            header { class: "app-header",
                h1 { class: "app-title", "footprint" }
                p { class: "app-tagline", "Mark the places you have been" }
                ScopePicker {}
            }

            StatsBar {}

            main { class: "app-main",
                section { class: "app-map", MapCanvas {} }
                aside { class: "app-sidebar",
                    RegionList {}
                    ExportPanel {}
                }
            }

            Toast {}
        }
    }
}
