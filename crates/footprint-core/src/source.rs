//! Boundary document parsing.
//!
//! Scopes are backed by either a GeoJSON `FeatureCollection` or a
//! TopoJSON `Topology`. Both are reduced to a [`RegionCollection`] of
//! polygonal regions in geographic coordinates. Non-polygonal and null
//! geometries are filtered out; geometry collections are flattened to
//! their polygonal members.

use std::collections::BTreeMap;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use geojson::GeoJson;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::scope::{FeatureSource, ScopeId, SourceFormat};
use crate::types::{LoadError, Region, RegionCollection};

/// Parse a boundary document into the regions of `scope`.
///
/// A document whose top-level `type` is `"Topology"` is decoded as
/// TopoJSON regardless of `source.format`. When the source does not
/// name an object, the first object in the topology is used.
///
/// # Errors
///
/// Returns [`LoadError::Json`] if `text` is not JSON,
/// [`LoadError::Format`] if it is not a GeoJSON or TopoJSON document,
/// and [`LoadError::MissingObject`] if a topology lacks the object the
/// source names.
pub fn parse_document(
    text: &str,
    source: &FeatureSource,
    scope: ScopeId,
) -> Result<RegionCollection, LoadError> {
    let value: Value = serde_json::from_str(text)?;
    let regions = if value.get("type").and_then(Value::as_str) == Some("Topology") {
        let object = match source.format {
            SourceFormat::TopoJson { object } => Some(object),
            SourceFormat::GeoJson => None,
        };
        parse_topojson(value, object, source.name_keys)?
    } else {
        parse_geojson(value, source.name_keys)?
    };
    tracing::debug!(%scope, regions = regions.len(), "boundary document parsed");
    Ok(RegionCollection::new(scope, regions))
}

/// First non-blank string among `keys`, trimmed.
fn read_name(properties: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| properties.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_owned)
}

// ---------------------------------------------------------------------------
// GeoJSON
// ---------------------------------------------------------------------------

fn parse_geojson(value: Value, name_keys: &[&str]) -> Result<Vec<Region>, LoadError> {
    let document =
        GeoJson::from_json_value(value).map_err(|e| LoadError::Format(e.to_string()))?;

    let features = match document {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(LoadError::Format(
                "expected a FeatureCollection, found a bare geometry".to_owned(),
            ));
        }
    };

    let mut regions = Vec::with_capacity(features.len());
    for feature in features {
        let properties = feature.properties.unwrap_or_default();
        let Some(geometry) = feature.geometry else {
            continue;
        };
        let geometry = match geo::Geometry::<f64>::try_from(geometry.value) {
            Ok(g) => g,
            Err(err) => {
                tracing::debug!(%err, "skipping feature with unconvertible geometry");
                continue;
            }
        };
        let polygons = polygons_of(geometry);
        if polygons.is_empty() {
            continue;
        }
        regions.push(Region {
            name: read_name(&properties, name_keys).unwrap_or_default(),
            geometry: MultiPolygon::new(polygons),
            properties,
        });
    }
    Ok(regions)
}

/// Polygonal members of a geometry, flattening collections.
fn polygons_of(geometry: geo::Geometry<f64>) -> Vec<Polygon<f64>> {
    match geometry {
        geo::Geometry::Polygon(p) => vec![p],
        geo::Geometry::MultiPolygon(mp) => mp.0,
        geo::Geometry::GeometryCollection(gc) => gc.0.into_iter().flat_map(polygons_of).collect(),
        geo::Geometry::Rect(r) => vec![r.to_polygon()],
        geo::Geometry::Triangle(t) => vec![t.to_polygon()],
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// TopoJSON
// ---------------------------------------------------------------------------

/// Quantization transform of a topology.
#[derive(Debug, Clone, Copy, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
    #[serde(default)]
    objects: BTreeMap<String, TopoGeometry>,
}

/// A geometry object inside a topology. `type` may be `null`.
#[derive(Debug, Deserialize)]
struct TopoGeometry {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    arcs: Option<Value>,
    #[serde(default)]
    geometries: Vec<TopoGeometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    id: Option<Value>,
}

fn parse_topojson(
    value: Value,
    object: Option<&str>,
    name_keys: &[&str],
) -> Result<Vec<Region>, LoadError> {
    let topology: Topology =
        serde_json::from_value(value).map_err(|e| LoadError::Format(e.to_string()))?;
    let arcs = decode_arcs(&topology.arcs, topology.transform);

    let root = match object {
        Some(name) => topology
            .objects
            .get(name)
            .ok_or_else(|| LoadError::MissingObject(name.to_owned()))?,
        None => topology
            .objects
            .values()
            .next()
            .ok_or_else(|| LoadError::Format("topology has no objects".to_owned()))?,
    };

    let members: Vec<&TopoGeometry> = if root.kind.as_deref() == Some("GeometryCollection") {
        root.geometries.iter().collect()
    } else {
        vec![root]
    };

    let mut regions = Vec::with_capacity(members.len());
    for member in members {
        let polygons = topo_polygons(member, &arcs)?;
        if polygons.is_empty() {
            continue;
        }
        let properties = member.properties.clone().unwrap_or_default();
        let name = read_name(&properties, name_keys)
            .or_else(|| member.id.as_ref().and_then(id_string))
            .unwrap_or_default();
        regions.push(Region {
            name,
            geometry: MultiPolygon::new(polygons),
            properties,
        });
    }
    Ok(regions)
}

fn id_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Resolve arcs to absolute coordinates, undoing delta encoding when the
/// topology is quantized.
fn decode_arcs(arcs: &[Vec<Vec<f64>>], transform: Option<Transform>) -> Vec<Vec<Coord<f64>>> {
    arcs.iter()
        .map(|arc| {
            let positions = arc.iter().filter(|p| p.len() >= 2);
            match transform {
                Some(t) => {
                    let (mut x, mut y) = (0.0, 0.0);
                    positions
                        .map(|p| {
                            x += p[0];
                            y += p[1];
                            Coord {
                                x: x.mul_add(t.scale[0], t.translate[0]),
                                y: y.mul_add(t.scale[1], t.translate[1]),
                            }
                        })
                        .collect()
                }
                None => positions.map(|p| Coord { x: p[0], y: p[1] }).collect(),
            }
        })
        .collect()
}

fn topo_polygons(
    geometry: &TopoGeometry,
    arcs: &[Vec<Coord<f64>>],
) -> Result<Vec<Polygon<f64>>, LoadError> {
    let bad_arcs = |e: serde_json::Error| LoadError::Format(format!("invalid arc indices: {e}"));

    match (geometry.kind.as_deref(), &geometry.arcs) {
        (Some("Polygon"), Some(value)) => {
            let rings: Vec<Vec<i64>> = serde_json::from_value(value.clone()).map_err(bad_arcs)?;
            Ok(topo_polygon(&rings, arcs)?.into_iter().collect())
        }
        (Some("MultiPolygon"), Some(value)) => {
            let polygons: Vec<Vec<Vec<i64>>> =
                serde_json::from_value(value.clone()).map_err(bad_arcs)?;
            let mut out = Vec::with_capacity(polygons.len());
            for rings in &polygons {
                out.extend(topo_polygon(rings, arcs)?);
            }
            Ok(out)
        }
        (Some("GeometryCollection"), _) => {
            let mut out = Vec::new();
            for member in &geometry.geometries {
                out.extend(topo_polygons(member, arcs)?);
            }
            Ok(out)
        }
        _ => Ok(Vec::new()),
    }
}

fn topo_polygon(
    rings: &[Vec<i64>],
    arcs: &[Vec<Coord<f64>>],
) -> Result<Option<Polygon<f64>>, LoadError> {
    let mut stitched = Vec::with_capacity(rings.len());
    for ring in rings {
        stitched.push(stitch_ring(ring, arcs)?);
    }
    let mut rings = stitched.into_iter().filter(|r| r.len() >= 3);
    let Some(exterior) = rings.next() else {
        return Ok(None);
    };
    Ok(Some(Polygon::new(
        LineString::new(exterior),
        rings.map(LineString::new).collect(),
    )))
}

/// Concatenate arcs into one ring. A negative index `i` refers to arc
/// `!i` traversed backwards. The first point of each arc after the first
/// duplicates the previous arc's last point and is dropped.
fn stitch_ring(indices: &[i64], arcs: &[Vec<Coord<f64>>]) -> Result<Vec<Coord<f64>>, LoadError> {
    let mut ring: Vec<Coord<f64>> = Vec::new();
    for &index in indices {
        let (slot, reversed) = if index < 0 { (!index, true) } else { (index, false) };
        let arc = usize::try_from(slot)
            .ok()
            .and_then(|i| arcs.get(i))
            .ok_or_else(|| LoadError::Format(format!("arc index {index} out of range")))?;
        if !ring.is_empty() {
            ring.pop();
        }
        if reversed {
            ring.extend(arc.iter().rev());
        } else {
            ring.extend(arc.iter());
        }
    }
    Ok(ring)
}
