//! Shared types for the footprint map core.

use std::collections::HashMap;

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

use crate::scope::ScopeId;

/// Display name given to features whose name property is missing or blank.
pub const PLACEHOLDER_NAME: &str = "Unnamed region";

/// A 2D point in projected or screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (grows to the right).
    pub x: f64,
    /// Vertical position (grows downward).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `true` if both coordinates are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.hypot(dy)
    }
}

impl From<geo::Coord<f64>> for Point {
    fn from(c: geo::Coord<f64>) -> Self {
        Self::new(c.x, c.y)
    }
}

impl From<Point> for geo::Coord<f64> {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// Size of a drawing surface in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either side is zero, negative or not finite.
    #[must_use]
    pub fn is_empty(self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

/// Axis-aligned bounding box.
///
/// [`Bounds::empty`] starts at `(+inf, -inf)` so that folding points into
/// it with [`Bounds::include`] works without a special first case. Bounds
/// that never received a point stay non-finite, which is how callers
/// detect "nothing projected".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum corner.
    pub min: Point,
    /// Maximum corner.
    pub max: Point,
}

impl Bounds {
    /// Bounds containing nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            min: Point::new(f64::INFINITY, f64::INFINITY),
            max: Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Create bounds from two corners.
    #[must_use]
    pub const fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Grow the bounds to contain `p`. Non-finite points are ignored.
    pub fn include(&mut self, p: Point) {
        if !p.is_finite() {
            return;
        }
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// Smallest bounds containing both `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Returns `true` if all four extents are finite.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Returns `true` if the bounds are non-finite or have no area.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !self.is_finite() || self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Horizontal extent.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Vertical extent.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Grow every side by `margin`.
    #[must_use]
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min: Point::new(self.min.x - margin, self.min.y - margin),
            max: Point::new(self.max.x + margin, self.max.y + margin),
        }
    }

    /// Overlap of `self` and `other`. Disjoint bounds give a degenerate
    /// result.
    #[must_use]
    pub fn intersection(self, other: Self) -> Self {
        Self {
            min: Point::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            max: Point::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        }
    }

    /// Returns `true` if `p` lies inside or on the edge of the bounds.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

/// One selectable named geographic area.
///
/// Immutable once loaded; owned by its scope's [`RegionCollection`].
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Display name, unique within the owning collection.
    pub name: String,
    /// Boundary in geographic coordinates (x = longitude, y = latitude).
    pub geometry: MultiPolygon<f64>,
    /// Descriptive attributes copied from the source feature.
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// The regions of one scope, with display names guaranteed unique.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionCollection {
    scope: ScopeId,
    regions: Vec<Region>,
}

impl RegionCollection {
    /// Build a collection, repairing names so they are non-blank and unique.
    ///
    /// Blank names become [`PLACEHOLDER_NAME`]. The second and later
    /// occurrences of a name get a ` (2)`, ` (3)`, ... suffix. Merging
    /// geometries that share a name is left to the data provider.
    #[must_use]
    pub fn new(scope: ScopeId, regions: Vec<Region>) -> Self {
        let mut seen: HashMap<String, usize> = HashMap::with_capacity(regions.len());
        let mut unique = Vec::with_capacity(regions.len());

        for mut region in regions {
            let trimmed = region.name.trim();
            let base = if trimmed.is_empty() {
                PLACEHOLDER_NAME.to_owned()
            } else {
                trimmed.to_owned()
            };

            let mut name = base.clone();
            let mut n = seen.get(&base).copied().unwrap_or(0);
            while seen.contains_key(&name) {
                n += 1;
                name = format!("{base} ({n})");
            }
            if name != base {
                tracing::warn!(%scope, original = %base, renamed = %name, "duplicate region name");
            }
            seen.insert(base, n.max(1));
            seen.entry(name.clone()).or_insert(1);

            region.name = name;
            unique.push(region);
        }

        Self {
            scope,
            regions: unique,
        }
    }

    /// A collection with no regions (used for failed loads).
    #[must_use]
    pub const fn empty(scope: ScopeId) -> Self {
        Self {
            scope,
            regions: Vec::new(),
        }
    }

    /// Scope these regions belong to.
    #[must_use]
    pub const fn scope(&self) -> ScopeId {
        self.scope
    }

    /// All regions in source order.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Number of regions.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns `true` if the collection has no regions.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Look up a region by display name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Iterate display names in source order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|r| r.name.as_str())
    }
}

/// Errors that can occur while loading a scope's boundary document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The request could not be sent or the connection failed.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("server responded with HTTP {status}")]
    Http {
        /// HTTP status code.
        status: u16,
    },

    /// The body was not valid JSON.
    #[error("malformed boundary document: {0}")]
    Json(String),

    /// Valid JSON, but not a document shape we understand.
    #[error("unsupported boundary document: {0}")]
    Format(String),

    /// A TopoJSON topology lacks the object this scope reads.
    #[error("boundary document has no object named {0:?}")]
    MissingObject(String),
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(name: &str) -> Region {
        Region {
            name: name.to_owned(),
            geometry: MultiPolygon::new(vec![]),
            properties: serde_json::Map::new(),
        }
    }

    #[test]
    fn empty_bounds_are_not_finite() {
        let b = Bounds::empty();
        assert!(!b.is_finite());
        assert!(b.is_degenerate());
    }

    #[test]
    fn include_ignores_non_finite_points() {
        let mut b = Bounds::empty();
        b.include(Point::new(f64::NAN, 1.0));
        b.include(Point::new(f64::INFINITY, 1.0));
        assert!(!b.is_finite());
        b.include(Point::new(1.0, 2.0));
        b.include(Point::new(3.0, -1.0));
        assert_eq!(b, Bounds::new(Point::new(1.0, -1.0), Point::new(3.0, 2.0)));
    }

    #[test]
    fn intersection_keeps_the_overlap() {
        let a = Bounds::new(Point::new(-50.0, -20.0), Point::new(150.0, 80.0));
        let b = Bounds::new(Point::new(0.0, 0.0), Point::new(100.0, 60.0));
        assert_eq!(a.intersection(b), b);

        let c = Bounds::new(Point::new(200.0, 0.0), Point::new(300.0, 60.0));
        assert!(b.intersection(c).is_degenerate());
    }

    #[test]
    fn single_point_bounds_are_degenerate() {
        let mut b = Bounds::empty();
        b.include(Point::new(5.0, 5.0));
        assert!(b.is_finite());
        assert!(b.is_degenerate());
    }

    #[test]
    fn zero_size_is_empty() {
        assert!(Size::new(0.0, 100.0).is_empty());
        assert!(Size::new(100.0, f64::NAN).is_empty());
        assert!(!Size::new(1.0, 1.0).is_empty());
    }

    #[test]
    fn blank_names_get_placeholder() {
        let c = RegionCollection::new(ScopeId::World, vec![region("  "), region("")]);
        let names: Vec<&str> = c.names().collect();
        assert_eq!(names, vec![PLACEHOLDER_NAME, "Unnamed region (2)"]);
    }

    #[test]
    fn duplicate_names_are_suffixed() {
        let c = RegionCollection::new(
            ScopeId::World,
            vec![region("Georgia"), region("Georgia"), region("Georgia (2)"), region("Georgia")],
        );
        let names: Vec<&str> = c.names().collect();
        let unique: std::collections::HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), names.len(), "names must be unique: {names:?}");
        assert_eq!(names[0], "Georgia");
        assert_eq!(names[1], "Georgia (2)");
    }

    #[test]
    fn names_are_trimmed() {
        let c = RegionCollection::new(ScopeId::World, vec![region("  France ")]);
        assert!(c.get("France").is_some());
    }
}
