//! Cartographic projections from geographic to planar coordinates.
//!
//! This module defines the [`Projection`] trait and the [`ProjectionKind`]
//! enum each scope descriptor names. [`ProjectionKind::build`] always
//! constructs a fresh [`GeoProjection`], so switching scopes never reuses
//! projection state.
//!
//! Output coordinates are unitless (roughly radians) with y growing
//! downward. The viewport transform in [`crate::fit`] scales them to
//! pixels.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use crate::types::Point;

/// Latitude limit for Mercator; the poles map to infinity.
const MERCATOR_MAX_LAT: f64 = 85.051_128_78;

/// Selects which projection a scope uses.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProjectionKind {
    /// Natural Earth I: a compromise projection for whole-world maps.
    #[default]
    NaturalEarth,
    /// Composite conic equal-area layout of the United States with
    /// Alaska and Hawaii moved into insets below the lower 48.
    AlbersUsa,
    /// Spherical Mercator recentered on the given point.
    Mercator {
        /// Central meridian in degrees.
        center_lon: f64,
        /// Latitude placed at projected y = 0, in degrees.
        center_lat: f64,
    },
}

impl ProjectionKind {
    /// Construct a fresh projection instance.
    #[must_use]
    pub fn build(self) -> GeoProjection {
        match self {
            Self::NaturalEarth => GeoProjection::NaturalEarth,
            Self::AlbersUsa => GeoProjection::AlbersUsa(AlbersUsa::new()),
            Self::Mercator {
                center_lon,
                center_lat,
            } => GeoProjection::Mercator(Mercator::new(center_lon, center_lat)),
        }
    }
}

/// Maps a geographic position to planar coordinates.
pub trait Projection {
    /// Project `(lon, lat)` in degrees.
    ///
    /// Returns `None` when the position falls outside the projection's
    /// domain (e.g. a territory a composite layout does not draw).
    fn project(&self, lon: f64, lat: f64) -> Option<Point>;
}

/// A constructed projection.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoProjection {
    /// See [`ProjectionKind::NaturalEarth`].
    NaturalEarth,
    /// See [`ProjectionKind::AlbersUsa`].
    AlbersUsa(AlbersUsa),
    /// See [`ProjectionKind::Mercator`].
    Mercator(Mercator),
}

impl Projection for GeoProjection {
    fn project(&self, lon: f64, lat: f64) -> Option<Point> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        match self {
            Self::NaturalEarth => Some(natural_earth(wrap_longitude(lon.to_radians()), lat.to_radians())),
            Self::AlbersUsa(p) => p.project(lon, lat),
            Self::Mercator(p) => p.project(lon, lat),
        }
    }
}

/// Normalize a longitude in radians to `[-pi, pi)`.
fn wrap_longitude(lambda: f64) -> f64 {
    (lambda + PI).rem_euclid(TAU) - PI
}

/// Natural Earth I polynomial approximation (Šavrič et al.).
fn natural_earth(lambda: f64, phi: f64) -> Point {
    let phi2 = phi * phi;
    let phi4 = phi2 * phi2;
    let x = lambda
        * (0.8707 - 0.131_979 * phi2
            + phi4 * (-0.013_791 + phi4 * (0.003_971 * phi2 - 0.001_529 * phi4)));
    let y = phi
        * (1.007_226
            + phi2 * (0.015_085 + phi4 * (-0.044_475 + 0.028_874 * phi2 - 0.005_916 * phi4)));
    Point::new(x, -y)
}

/// Albers conic equal-area projection with a rotation and a center.
#[derive(Debug, Clone, PartialEq)]
pub struct ConicEqualArea {
    n: f64,
    c: f64,
    r0: f64,
    rotate: f64,
    origin: Point,
}

impl ConicEqualArea {
    /// Create a conic projection with standard parallels `phi0`/`phi1`
    /// (degrees), rotated by `rotate` degrees of longitude, with the
    /// rotated position `center` (degrees) placed at the origin.
    #[must_use]
    pub fn new(parallels: (f64, f64), rotate: f64, center: (f64, f64)) -> Self {
        let sy0 = parallels.0.to_radians().sin();
        let n = (sy0 + parallels.1.to_radians().sin()) / 2.0;
        let c = sy0.mul_add(2.0f64.mul_add(n, -sy0), 1.0);
        let r0 = c.sqrt() / n;
        let mut conic = Self {
            n,
            c,
            r0,
            rotate: rotate.to_radians(),
            origin: Point::new(0.0, 0.0),
        };
        conic.origin = conic.raw(center.0.to_radians(), center.1.to_radians());
        conic
    }

    fn raw(&self, lambda: f64, phi: f64) -> Point {
        let r = (2.0 * self.n).mul_add(-phi.sin(), self.c).max(0.0).sqrt() / self.n;
        let a = lambda * self.n;
        Point::new(r * a.sin(), self.r0 - r * a.cos())
    }

    fn project_radians(&self, lambda: f64, phi: f64) -> Point {
        let p = self.raw(wrap_longitude(lambda + self.rotate), phi);
        Point::new(p.x - self.origin.x, -(p.y - self.origin.y))
    }
}

/// Inset placement: planar scale and offset applied after projecting.
#[derive(Debug, Clone, PartialEq)]
struct Inset {
    conic: ConicEqualArea,
    scale: f64,
    offset: Point,
}

impl Inset {
    fn project(&self, lon: f64, lat: f64) -> Point {
        let p = self
            .conic
            .project_radians(lon.to_radians(), lat.to_radians());
        Point::new(
            p.x.mul_add(self.scale, self.offset.x),
            p.y.mul_add(self.scale, self.offset.y),
        )
    }
}

/// Composite United States layout.
///
/// The lower 48 use a conic equal-area projection with parallels at
/// 29.5° and 45.5°. Alaska is drawn at 35% scale and Hawaii at full
/// scale, both moved into the empty area south-west of the mainland.
/// Positions outside the three areas (other territories) are not drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbersUsa {
    lower48: Inset,
    alaska: Inset,
    hawaii: Inset,
}

impl AlbersUsa {
    /// Build the composite with its fixed inset layout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lower48: Inset {
                conic: ConicEqualArea::new((29.5, 45.5), 96.0, (-0.6, 38.7)),
                scale: 1.0,
                offset: Point::new(0.0, 0.0),
            },
            alaska: Inset {
                conic: ConicEqualArea::new((55.0, 65.0), 154.0, (-2.0, 58.5)),
                scale: 0.35,
                offset: Point::new(-0.307, 0.201),
            },
            hawaii: Inset {
                conic: ConicEqualArea::new((8.0, 18.0), 157.0, (-3.0, 19.9)),
                scale: 1.0,
                offset: Point::new(-0.205, 0.212),
            },
        }
    }

    fn project(&self, lon: f64, lat: f64) -> Option<Point> {
        let in_alaska = (50.0..=72.0).contains(&lat) && (lon <= -129.0 || lon >= 170.0);
        let in_hawaii = (18.0..=23.0).contains(&lat) && (-161.0..=-154.0).contains(&lon);
        let in_lower48 = (23.0..=51.0).contains(&lat) && (-128.0..=-64.0).contains(&lon);

        if in_alaska {
            Some(self.alaska.project(lon, lat))
        } else if in_hawaii {
            Some(self.hawaii.project(lon, lat))
        } else if in_lower48 {
            Some(self.lower48.project(lon, lat))
        } else {
            None
        }
    }
}

impl Default for AlbersUsa {
    fn default() -> Self {
        Self::new()
    }
}

/// Spherical Mercator recentered on a point.
#[derive(Debug, Clone, PartialEq)]
pub struct Mercator {
    center_lon: f64,
    origin_y: f64,
}

impl Mercator {
    /// Create a Mercator projection centered on `(center_lon, center_lat)`.
    #[must_use]
    pub fn new(center_lon: f64, center_lat: f64) -> Self {
        Self {
            center_lon: center_lon.to_radians(),
            origin_y: mercator_y(center_lat.to_radians()),
        }
    }

    fn project(&self, lon: f64, lat: f64) -> Option<Point> {
        let lambda = wrap_longitude(lon.to_radians() - self.center_lon);
        let phi = lat
            .clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT)
            .to_radians();
        Some(Point::new(lambda, -(mercator_y(phi) - self.origin_y)))
    }
}

fn mercator_y(phi: f64) -> f64 {
    (FRAC_PI_4 + phi.clamp(-FRAC_PI_2, FRAC_PI_2) / 2.0).tan().ln()
}

/// Project every ring of a geographic multipolygon.
///
/// Positions the projection rejects are dropped; rings left with fewer
/// than three positions are discarded, and a polygon whose exterior is
/// discarded is dropped entirely.
#[must_use]
pub fn project_multipolygon<P: Projection + ?Sized>(
    geometry: &MultiPolygon<f64>,
    projection: &P,
) -> MultiPolygon<f64> {
    let project_ring = |ring: &LineString<f64>| -> Option<LineString<f64>> {
        let coords: Vec<Coord<f64>> = ring
            .coords()
            .filter_map(|c| projection.project(c.x, c.y))
            .filter(|p| p.is_finite())
            .map(Coord::from)
            .collect();
        if coords.len() < 3 {
            None
        } else {
            Some(LineString::new(coords))
        }
    };

    let polygons = geometry
        .iter()
        .filter_map(|polygon| {
            let exterior = project_ring(polygon.exterior())?;
            let interiors = polygon.interiors().iter().filter_map(project_ring).collect();
            Some(Polygon::new(exterior, interiors))
        })
        .collect();
    MultiPolygon::new(polygons)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use geo::polygon;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn natural_earth_origin_maps_to_origin() {
        let p = ProjectionKind::NaturalEarth.build().project(0.0, 0.0).unwrap();
        assert!(approx(p.x, 0.0) && approx(p.y, 0.0));
    }

    #[test]
    fn natural_earth_north_is_up() {
        let proj = ProjectionKind::NaturalEarth.build();
        let north = proj.project(0.0, 60.0).unwrap();
        let south = proj.project(0.0, -60.0).unwrap();
        assert!(north.y < 0.0);
        assert!(approx(north.y, -south.y));
    }

    #[test]
    fn natural_earth_is_symmetric_in_longitude() {
        let proj = ProjectionKind::NaturalEarth.build();
        let east = proj.project(120.0, 30.0).unwrap();
        let west = proj.project(-120.0, 30.0).unwrap();
        assert!(approx(east.x, -west.x));
        assert!(approx(east.y, west.y));
    }

    #[test]
    fn natural_earth_equator_width() {
        let proj = ProjectionKind::NaturalEarth.build();
        let edge = proj.project(179.999_999, 0.0).unwrap();
        assert!((edge.x - 0.8707 * PI).abs() < 1e-5);
    }

    #[test]
    fn non_finite_input_is_rejected() {
        for kind in [
            ProjectionKind::NaturalEarth,
            ProjectionKind::AlbersUsa,
            ProjectionKind::Mercator {
                center_lon: 0.0,
                center_lat: 0.0,
            },
        ] {
            assert!(kind.build().project(f64::NAN, 0.0).is_none());
        }
    }

    #[test]
    fn albers_usa_places_lower48_center_near_origin() {
        let proj = ProjectionKind::AlbersUsa.build();
        let kansas = proj.project(-96.6, 38.7).unwrap();
        assert!(kansas.x.abs() < 1e-6, "x = {}", kansas.x);
        assert!(kansas.y.abs() < 1e-6, "y = {}", kansas.y);
    }

    #[test]
    fn albers_usa_east_is_right_and_north_is_up() {
        let proj = ProjectionKind::AlbersUsa.build();
        let maine = proj.project(-69.0, 45.0).unwrap();
        let california = proj.project(-120.0, 37.0).unwrap();
        let florida = proj.project(-81.5, 27.5).unwrap();
        assert!(maine.x > california.x);
        assert!(florida.y > maine.y);
    }

    #[test]
    fn albers_usa_insets_sit_south_west() {
        let proj = ProjectionKind::AlbersUsa.build();
        let anchorage = proj.project(-149.9, 61.2).unwrap();
        let honolulu = proj.project(-157.8, 21.3).unwrap();
        assert!(anchorage.x < 0.0 && anchorage.y > 0.0);
        assert!(honolulu.x < 0.0 && honolulu.y > 0.0);
    }

    #[test]
    fn albers_usa_drops_other_territories() {
        let proj = ProjectionKind::AlbersUsa.build();
        assert!(proj.project(144.8, 13.4).is_none(), "Guam");
        assert!(proj.project(-170.7, -14.3).is_none(), "American Samoa");
    }

    #[test]
    fn mercator_center_maps_to_origin() {
        let proj = ProjectionKind::Mercator {
            center_lon: -96.0,
            center_lat: 62.0,
        }
        .build();
        let p = proj.project(-96.0, 62.0).unwrap();
        assert!(approx(p.x, 0.0) && approx(p.y, 0.0));
    }

    #[test]
    fn mercator_clamps_poles() {
        let proj = ProjectionKind::Mercator {
            center_lon: 0.0,
            center_lat: 0.0,
        }
        .build();
        let pole = proj.project(0.0, 90.0).unwrap();
        assert!(pole.is_finite());
    }

    #[test]
    fn project_multipolygon_drops_rejected_rings() {
        let proj = ProjectionKind::AlbersUsa.build();
        let guam = MultiPolygon::new(vec![polygon![
            (x: 144.6, y: 13.2),
            (x: 145.0, y: 13.2),
            (x: 145.0, y: 13.7),
            (x: 144.6, y: 13.2),
        ]]);
        assert!(project_multipolygon(&guam, &proj).0.is_empty());

        let colorado = MultiPolygon::new(vec![polygon![
            (x: -109.0, y: 37.0),
            (x: -102.0, y: 37.0),
            (x: -102.0, y: 41.0),
            (x: -109.0, y: 41.0),
            (x: -109.0, y: 37.0),
        ]]);
        let projected = project_multipolygon(&colorado, &proj);
        assert_eq!(projected.0.len(), 1);
        assert_eq!(projected.0[0].exterior().0.len(), 5);
    }
}
