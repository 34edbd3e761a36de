//! footprint-io: Browser I/O and Dioxus component library.
//!
//! Fetches boundary documents, applies selection changes straight to the
//! DOM, reads the export palette from CSS, triggers Blob downloads and
//! writes to the clipboard. The components share one [`MapContext`].

pub mod clipboard;
pub mod components;
pub mod dom;
pub mod download;
pub mod fetch;
pub mod state;
pub mod theme;

pub use components::{ExportPanel, MapCanvas, RegionList, ScopePicker, StatsBar, Toast};
pub use dom::DomSurface;
pub use state::{MapContext, Notice, NoticeKind, use_map, use_map_provider};
