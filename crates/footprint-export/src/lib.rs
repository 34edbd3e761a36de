//! footprint-export: Pure format serializers (sans-IO)
//!
//! Turns a [`footprint_core::MapScene`] plus the visited set and the
//! current view transform into downloadable files. Supports PNG
//! (tiny-skia raster, `image` encoder) and SVG (`svg` crate).
//!
//! Both formats crop tightly to the transformed content plus a padding
//! margin, so what is exported is what the user is looking at.

pub mod colors;
pub mod crop;
pub mod filename;
pub mod raster;
pub mod svg;

pub use colors::{MapColors, Rgb, css_hex, parse_css_hex};
pub use crop::ExportFrame;
pub use filename::{export_filename, format_date};
pub use raster::{ExportError, MAX_DIMENSION, RasterOptions, rasterize, render_png};
pub use svg::{SvgOptions, to_svg};
