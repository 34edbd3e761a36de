//! Export panel: download the current view as PNG or SVG.

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::{LdFileCode, LdImage};

use footprint_core::MapSession;
use footprint_export::{
    ExportError, MapColors, RasterOptions, SvgOptions, export_filename, render_png, to_svg,
};

use crate::download::{self, DownloadError};
use crate::state::{MapContext, NoticeKind, use_map};
use crate::theme;

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Png,
    Svg,
}

impl Format {
    const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ExportFailure {
    #[error(transparent)]
    Render(#[from] ExportError),
    #[error(transparent)]
    Download(#[from] DownloadError),
}

fn colors() -> MapColors {
    theme::read_map_colors().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "using default export colours");
        MapColors::default()
    })
}

fn encode(session: &MapSession, format: Format, labels: bool) -> Result<Vec<u8>, ExportError> {
    let colors = colors();
    let scene = session.scene();
    let store = session.sync().store();
    let transform = session.transform();
    match format {
        Format::Png => {
            let options = RasterOptions {
                viewport: Some(session.viewport().size()),
                ..RasterOptions::from_config(session.config(), colors)
            };
            render_png(scene, store, &transform, &options)
        }
        Format::Svg => {
            let title = format!("{} visited", session.descriptor().label);
            let summary = session.summary();
            let options = SvgOptions {
                title: Some(&title),
                description: Some(&summary),
                labels,
                viewport: Some(session.viewport().size()),
                ..SvgOptions::from_config(session.config(), colors)
            };
            Ok(to_svg(scene, store, &transform, &options).into_bytes())
        }
    }
}

fn export(ctx: MapContext, format: Format) -> Result<String, ExportFailure> {
    // Pending toggles must be in the store before it is read.
    ctx.flush_now();
    let labels = *ctx.labels_on.peek();
    let (bytes, scope) = ctx.read(|s| encode(s, format, labels).map(|b| (b, s.scope())))?;
    let filename = export_filename(scope, &download::today(), format.extension());
    download::trigger_download(&bytes, &filename, format.mime())?;
    Ok(filename)
}

/// PNG and SVG download buttons for the current view.
///
/// Both formats are cropped to the visible content. Only SVG carries
/// labels, and only when labels are switched on.
#[component]
pub fn ExportPanel() -> Element {
    let ctx = use_map();
    let loading = (ctx.loading)();
    let empty = {
        let _ = (ctx.revision)();
        ctx.read(|s| s.scene().shapes().is_empty())
    };
    let disabled = loading || empty;

    let run = move |format: Format| match export(ctx, format) {
        Ok(filename) => ctx.notify(NoticeKind::Info, format!("Saved {filename}")),
        Err(e) => {
            tracing::error!(error = %e, ?format, "export failed");
            ctx.notify(NoticeKind::Error, format!("Export failed: {e}"));
        }
    };

    rsx! {
        div { class: "export-panel",
            button {
                class: "btn",
                disabled,
                onclick: move |_| run(Format::Png),
                Icon { icon: LdImage, width: 16, height: 16 }
                " PNG"
            }
            button {
                class: "btn",
                disabled,
                onclick: move |_| run(Format::Svg),
                Icon { icon: LdFileCode, width: 16, height: 16 }
                " SVG"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_pair_extension_and_mime() {
        assert_eq!(Format::Png.extension(), "png");
        assert_eq!(Format::Png.mime(), "image/png");
        assert_eq!(Format::Svg.extension(), "svg");
        assert_eq!(Format::Svg.mime(), "image/svg+xml");
    }
}
