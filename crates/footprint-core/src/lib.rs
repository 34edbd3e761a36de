//! footprint-core: the sans-IO heart of the visited-places map.
//!
//! Turns boundary documents into projected, hit-testable shapes and
//! keeps a selection of visited regions in sync with three surfaces:
//! the map shapes, the companion list and the label overlay.
//!
//! This crate has **no I/O dependencies**. Fetching documents, touching
//! the DOM and scheduling the next tick all live in `footprint-io`; the
//! core only says *what* needs to happen through return values such as
//! [`ScopeRequest`] and [`FlushRequest`].
//!
//! # Layers
//!
//! 1. [`source`]: GeoJSON / TopoJSON to a [`RegionCollection`]
//! 2. [`projection`]: geographic to planar coordinates per scope
//! 3. [`scene`]: projected shapes, SVG path data and an R\*-tree
//! 4. [`fit`]: fit-to-viewport and the interactive [`Viewport`]
//! 5. [`selection`] / [`sync`]: the visited set and its hot-path updates
//! 6. [`labels`] / [`hover`]: the label overlay and the hover tooltip
//! 7. [`interaction`]: pointer gestures to actions
//! 8. [`loader`] / [`session`]: scope caching and orchestration

pub mod config;
pub mod fit;
pub mod hover;
pub mod interaction;
pub mod labels;
pub mod loader;
pub mod projection;
pub mod scene;
pub mod scope;
pub mod selection;
pub mod session;
pub mod source;
pub mod stats;
pub mod sync;
pub mod types;

pub use config::MapConfig;
pub use fit::{ViewAnimation, ViewTransform, Viewport, fit_bounds, fit_to_viewport};
pub use hover::{HoverLabel, HoverTracker, Placement};
pub use interaction::{Action, BulkAction, DeltaMode, PointerTarget, ZoomDirection};
pub use labels::{FadePhase, LabelEntry, LabelOverlay};
pub use loader::{LoadOutcome, LoadStep, LoadTicket, ScopeLoader};
pub use projection::{GeoProjection, Projection, ProjectionKind};
pub use scene::{MapScene, Shape};
pub use scope::{FeatureSource, ManualView, ScopeDescriptor, ScopeId, SourceFormat};
pub use selection::SelectionStore;
pub use session::{LoadReport, MapSession, MoveEffect, ScopeRequest};
pub use source::parse_document;
pub use stats::{VisitStats, filter_names, format_percentage, percentage, summary_text};
pub use sync::{FlushReport, FlushRequest, RenderSurface, RenderSync, ShapeFrame, ShapeView, dom_id};
pub use types::{Bounds, LoadError, PLACEHOLDER_NAME, Point, Region, RegionCollection, Size};
