//! Projected shapes for the active scope.
//!
//! A [`MapScene`] is built once per scope switch: every region is
//! projected, converted to SVG path data, given a label anchor, and
//! indexed in an R\*-tree of its bounding box. Pan, zoom and resize only
//! change the [`ViewTransform`] applied on top, so nothing here is
//! recomputed for them.

use std::collections::HashMap;
use std::fmt::Write as _;

use geo::{Area, BoundingRect, Centroid, Contains, MultiPolygon};
use rstar::RTree;
use rstar::primitives::{GeomWithData, Rectangle};

use crate::fit::ViewTransform;
use crate::projection::{Projection, project_multipolygon};
use crate::scope::ScopeId;
use crate::types::{Bounds, Point, RegionCollection};

/// Decimal places kept in projected path coordinates.
const PATH_PRECISION: usize = 5;

/// A shape bounding box tagged with its index in [`MapScene::shapes`].
type IndexedBox = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// One region in projected space.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Region display name.
    pub name: String,
    /// Projected geometry.
    pub geometry: MultiPolygon<f64>,
    /// SVG path data in projected coordinates.
    pub path: String,
    /// Where this region's label sits, in projected coordinates.
    pub anchor: Point,
    /// Projected bounding box.
    pub bounds: Bounds,
    /// Projected area (unsigned).
    pub area: f64,
}

/// The projected shape set of one scope.
#[derive(Clone)]
pub struct MapScene {
    scope: ScopeId,
    shapes: Vec<Shape>,
    by_name: HashMap<String, usize>,
    tree: RTree<IndexedBox>,
    bounds: Bounds,
    total: usize,
}

impl std::fmt::Debug for MapScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapScene")
            .field("scope", &self.scope)
            .field("shapes", &self.shapes.len())
            .field("total", &self.total)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl MapScene {
    /// Project every region of `collection`.
    ///
    /// Regions whose geometry projects to nothing (e.g. territories a
    /// composite projection does not draw) get no shape but still count
    /// towards [`MapScene::total`].
    #[must_use]
    pub fn build<P: Projection + ?Sized>(collection: &RegionCollection, projection: &P) -> Self {
        let mut shapes = Vec::with_capacity(collection.len());
        let mut bounds = Bounds::empty();

        for region in collection.regions() {
            let geometry = project_multipolygon(&region.geometry, projection);
            let Some(rect) = geometry.bounding_rect() else {
                tracing::debug!(name = %region.name, "region has no drawable geometry");
                continue;
            };
            let shape_bounds = Bounds::new(rect.min().into(), rect.max().into());
            if !shape_bounds.is_finite() {
                continue;
            }
            bounds = bounds.union(shape_bounds);

            let anchor = geometry
                .centroid()
                .map(|c| Point::new(c.x(), c.y()))
                .filter(|p| p.is_finite())
                .unwrap_or_else(|| shape_bounds.center());

            shapes.push(Shape {
                name: region.name.clone(),
                path: path_data(&geometry),
                area: geometry.unsigned_area(),
                anchor,
                bounds: shape_bounds,
                geometry,
            });
        }

        let by_name = shapes
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.clone(), i))
            .collect();
        let boxes = shapes
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let rect = Rectangle::from_corners(
                    [s.bounds.min.x, s.bounds.min.y],
                    [s.bounds.max.x, s.bounds.max.y],
                );
                GeomWithData::new(rect, i)
            })
            .collect();

        tracing::debug!(
            scope = %collection.scope(),
            regions = collection.len(),
            shapes = shapes.len(),
            "scene built",
        );

        Self {
            scope: collection.scope(),
            shapes,
            by_name,
            tree: RTree::bulk_load(boxes),
            bounds,
            total: collection.len(),
        }
    }

    /// A scene with no shapes.
    #[must_use]
    pub fn empty(scope: ScopeId) -> Self {
        Self {
            scope,
            shapes: Vec::new(),
            by_name: HashMap::new(),
            tree: RTree::new(),
            bounds: Bounds::empty(),
            total: 0,
        }
    }

    /// Scope this scene was built for.
    #[must_use]
    pub const fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Drawable shapes in source order.
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Number of regions in the source collection, drawable or not.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Union of all shape bounds in projected space.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Index of the shape named `name`.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// The shape named `name`.
    #[must_use]
    pub fn shape(&self, name: &str) -> Option<&Shape> {
        self.index_of(name).map(|i| &self.shapes[i])
    }

    /// Returns `true` if a shape named `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Label anchor for `name` in projected coordinates.
    #[must_use]
    pub fn anchor(&self, name: &str) -> Option<Point> {
        self.shape(name).map(|s| s.anchor)
    }

    /// Name of the region under a projected point.
    ///
    /// Bounding-box candidates from the R\*-tree are checked for exact
    /// containment; where shapes overlap the smallest one wins.
    #[must_use]
    pub fn hit_test(&self, p: Point) -> Option<&str> {
        if !p.is_finite() {
            return None;
        }
        let point = geo::Point::new(p.x, p.y);
        self.tree
            .locate_all_at_point(&[p.x, p.y])
            .map(|entry| &self.shapes[entry.data])
            .filter(|shape| shape.geometry.contains(&point))
            .min_by(|a, b| a.area.total_cmp(&b.area))
            .map(|shape| shape.name.as_str())
    }

    /// Screen-space bounds of all shapes under `transform`.
    #[must_use]
    pub fn screen_bounds(&self, transform: &ViewTransform) -> Bounds {
        transform.apply_bounds(&self.bounds)
    }
}

/// SVG path data for a multipolygon: one closed subpath per ring.
#[must_use]
pub fn path_data(geometry: &MultiPolygon<f64>) -> String {
    let mut d = String::new();
    for polygon in geometry {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            let mut coords = ring.coords();
            let Some(first) = coords.next() else {
                continue;
            };
            let _ = write!(
                d,
                "M{:.prec$},{:.prec$}",
                first.x,
                first.y,
                prec = PATH_PRECISION
            );
            let mut rest: Vec<_> = coords.collect();
            if rest.last().is_some_and(|last| *last == first) {
                rest.pop();
            }
            for c in rest {
                let _ = write!(d, "L{:.prec$},{:.prec$}", c.x, c.y, prec = PATH_PRECISION);
            }
            d.push('Z');
        }
    }
    d
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::projection::GeoProjection;
    use crate::types::Region;
    use geo::polygon;

    /// Identity-like projection for exact geometry checks.
    struct Flat;

    impl Projection for Flat {
        fn project(&self, lon: f64, lat: f64) -> Option<Point> {
            Some(Point::new(lon, lat))
        }
    }

    fn square(name: &str, x0: f64, y0: f64, size: f64) -> Region {
        Region {
            name: name.to_owned(),
            geometry: MultiPolygon::new(vec![polygon![
                (x: x0, y: y0),
                (x: x0 + size, y: y0),
                (x: x0 + size, y: y0 + size),
                (x: x0, y: y0 + size),
                (x: x0, y: y0),
            ]]),
            properties: serde_json::Map::new(),
        }
    }

    fn scene() -> MapScene {
        let regions = RegionCollection::new(
            ScopeId::World,
            vec![
                square("Big", 0.0, 0.0, 10.0),
                square("Small", 2.0, 2.0, 2.0),
                square("Far", 20.0, 20.0, 1.0),
            ],
        );
        MapScene::build(&regions, &Flat)
    }

    #[test]
    fn builds_one_shape_per_region() {
        let s = scene();
        assert_eq!(s.shapes().len(), 3);
        assert_eq!(s.total(), 3);
        assert_eq!(s.index_of("Small"), Some(1));
        assert!(s.contains("Far"));
        assert!(!s.contains("Nowhere"));
    }

    #[test]
    fn anchor_is_area_centroid() {
        let s = scene();
        assert_eq!(s.anchor("Big"), Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn bounds_are_union() {
        let s = scene();
        assert_eq!(
            s.bounds(),
            Bounds::new(Point::new(0.0, 0.0), Point::new(21.0, 21.0))
        );
    }

    #[test]
    fn hit_test_prefers_smallest_overlapping_shape() {
        let s = scene();
        assert_eq!(s.hit_test(Point::new(3.0, 3.0)), Some("Small"));
        assert_eq!(s.hit_test(Point::new(8.0, 8.0)), Some("Big"));
        assert_eq!(s.hit_test(Point::new(15.0, 15.0)), None);
        assert_eq!(s.hit_test(Point::new(f64::NAN, 0.0)), None);
    }

    #[test]
    fn hit_test_uses_exact_geometry() {
        let triangle = Region {
            name: "Tri".into(),
            geometry: MultiPolygon::new(vec![polygon![
                (x: 0.0, y: 0.0),
                (x: 10.0, y: 0.0),
                (x: 0.0, y: 10.0),
                (x: 0.0, y: 0.0),
            ]]),
            properties: serde_json::Map::new(),
        };
        let s = MapScene::build(&RegionCollection::new(ScopeId::World, vec![triangle]), &Flat);
        assert_eq!(s.hit_test(Point::new(1.0, 1.0)), Some("Tri"));
        assert_eq!(s.hit_test(Point::new(9.0, 9.0)), None);
    }

    #[test]
    fn path_data_closes_rings_without_repeating_first_point() {
        let s = scene();
        let d = &s.shape("Far").unwrap().path;
        assert_eq!(
            d,
            "M20.00000,20.00000L21.00000,20.00000L21.00000,21.00000L20.00000,21.00000Z"
        );
    }

    #[test]
    fn undrawable_regions_count_but_have_no_shape() {
        let guam = Region {
            name: "Guam".into(),
            geometry: MultiPolygon::new(vec![polygon![
                (x: 144.6, y: 13.2),
                (x: 145.0, y: 13.2),
                (x: 145.0, y: 13.7),
                (x: 144.6, y: 13.2),
            ]]),
            properties: serde_json::Map::new(),
        };
        let projection: GeoProjection = crate::projection::ProjectionKind::AlbersUsa.build();
        let s = MapScene::build(&RegionCollection::new(ScopeId::UsStates, vec![guam]), &projection);
        assert_eq!(s.total(), 1);
        assert!(s.shapes().is_empty());
        assert!(!s.bounds().is_finite());
    }

    #[test]
    fn screen_bounds_follow_transform() {
        let s = scene();
        let t = ViewTransform {
            scale: 2.0,
            translate: Point::new(1.0, 1.0),
        };
        assert_eq!(
            s.screen_bounds(&t),
            Bounds::new(Point::new(1.0, 1.0), Point::new(43.0, 43.0))
        );
    }
}
