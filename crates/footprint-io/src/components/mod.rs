//! Dioxus UI components for footprint.
//!
//! Provides the interactive map canvas, the searchable region list, the
//! scope picker, the visited-stats bar, the export panel and the toast.

mod export;
mod map_canvas;
mod region_list;
mod scope_picker;
mod stats_bar;
mod toast;

pub use export::ExportPanel;
pub use map_canvas::{MAP_CONTAINER_ID, MapCanvas};
pub use region_list::RegionList;
pub use scope_picker::ScopePicker;
pub use stats_bar::StatsBar;
pub use toast::Toast;
