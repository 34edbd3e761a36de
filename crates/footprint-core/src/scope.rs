//! Scope identifiers and per-scope descriptors.
//!
//! Everything that varies by scope (dataset, projection, fallback view,
//! wording) lives in one [`ScopeDescriptor`] record. It is looked up once
//! per scope switch and handed to the loader, projection engine and UI,
//! so no other code branches on the scope.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::projection::ProjectionKind;

/// The geographic mode that decides which regions and projection are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeId {
    /// Countries of the world.
    #[default]
    World,
    /// The fifty US states plus DC.
    UsStates,
    /// Canadian provinces and territories.
    CanadaProvinces,
    /// Curated set: US national park boundaries.
    UsNationalParks,
}

impl ScopeId {
    /// All scopes in picker order.
    pub const ALL: [Self; 4] = [
        Self::World,
        Self::UsStates,
        Self::CanadaProvinces,
        Self::UsNationalParks,
    ];

    /// Human-readable label for the scope picker.
    #[must_use]
    pub fn label(self) -> &'static str {
        self.descriptor().label
    }

    /// Short identifier used in file names and on the command line.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::World => "world",
            Self::UsStates => "us-states",
            Self::CanadaProvinces => "canada-provinces",
            Self::UsNationalParks => "us-national-parks",
        }
    }

    /// The descriptor record for this scope.
    #[must_use]
    pub fn descriptor(self) -> &'static ScopeDescriptor {
        match self {
            Self::World => &WORLD,
            Self::UsStates => &US_STATES,
            Self::CanadaProvinces => &CANADA_PROVINCES,
            Self::UsNationalParks => &US_NATIONAL_PARKS,
        }
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Error returned when parsing an unknown scope slug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scope {0:?} (expected one of: world, us-states, canada-provinces, us-national-parks)")]
pub struct UnknownScope(pub String);

impl FromStr for ScopeId {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scope| scope.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownScope(s.to_owned()))
    }
}

/// Encoding of a boundary document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// A GeoJSON `FeatureCollection`.
    GeoJson,
    /// A TopoJSON `Topology`; features are read from the named object.
    TopoJson {
        /// Key under `objects` holding the geometry collection.
        object: &'static str,
    },
}

/// Where a scope's regions come from and how to name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSource {
    /// URL of the static boundary document.
    pub url: &'static str,
    /// Document encoding.
    pub format: SourceFormat,
    /// Feature property keys tried in order for the display name.
    pub name_keys: &'static [&'static str],
}

/// Hand-tuned view used when fitting to the projected bounds fails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualView {
    /// Geographic point placed at the viewport center (lon, lat).
    pub center: (f64, f64),
    /// Pixels per projected unit, as a multiple of the viewport's shorter
    /// side.
    pub scale: f64,
}

/// Everything that varies between scopes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScopeDescriptor {
    /// Which scope this describes.
    pub id: ScopeId,
    /// Picker label.
    pub label: &'static str,
    /// Plural noun for the region kind ("countries", "states", ...).
    pub noun: &'static str,
    /// Boundary dataset.
    pub source: FeatureSource,
    /// Cartographic projection.
    pub projection: ProjectionKind,
    /// Fallback view for when bounds fitting fails.
    pub fallback: ManualView,
}

static WORLD: ScopeDescriptor = ScopeDescriptor {
    id: ScopeId::World,
    label: "World",
    noun: "countries",
    source: FeatureSource {
        url: "https://cdn.jsdelivr.net/npm/world-atlas@2/countries-110m.json",
        format: SourceFormat::TopoJson { object: "countries" },
        name_keys: &["name", "NAME", "ADMIN"],
    },
    projection: ProjectionKind::NaturalEarth,
    fallback: ManualView {
        center: (0.0, 0.0),
        scale: 0.34,
    },
};

static US_STATES: ScopeDescriptor = ScopeDescriptor {
    id: ScopeId::UsStates,
    label: "United States",
    noun: "states",
    source: FeatureSource {
        url: "https://cdn.jsdelivr.net/npm/us-atlas@3/states-10m.json",
        format: SourceFormat::TopoJson { object: "states" },
        name_keys: &["name", "NAME"],
    },
    projection: ProjectionKind::AlbersUsa,
    fallback: ManualView {
        center: (-98.5, 39.5),
        scale: 2.1,
    },
};

static CANADA_PROVINCES: ScopeDescriptor = ScopeDescriptor {
    id: ScopeId::CanadaProvinces,
    label: "Canada",
    noun: "provinces and territories",
    source: FeatureSource {
        url: "assets/data/canada-provinces.geojson",
        format: SourceFormat::GeoJson,
        name_keys: &["name", "PRENAME", "NAME"],
    },
    projection: ProjectionKind::Mercator {
        center_lon: -96.0,
        center_lat: 62.0,
    },
    fallback: ManualView {
        center: (-96.0, 62.0),
        scale: 0.5,
    },
};

static US_NATIONAL_PARKS: ScopeDescriptor = ScopeDescriptor {
    id: ScopeId::UsNationalParks,
    label: "US National Parks",
    noun: "national parks",
    source: FeatureSource {
        url: "assets/data/us-national-parks.geojson",
        format: SourceFormat::GeoJson,
        name_keys: &["UNIT_NAME", "name", "PARKNAME"],
    },
    projection: ProjectionKind::AlbersUsa,
    fallback: ManualView {
        center: (-98.5, 39.5),
        scale: 2.1,
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_contains_every_variant_once() {
        let mut seen = std::collections::HashSet::new();
        for scope in ScopeId::ALL {
            assert!(seen.insert(scope), "duplicate scope in ALL: {scope}");
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn descriptor_ids_match() {
        for scope in ScopeId::ALL {
            assert_eq!(scope.descriptor().id, scope);
            assert!(!scope.descriptor().source.name_keys.is_empty());
        }
    }

    #[test]
    fn slug_round_trips_through_from_str() {
        for scope in ScopeId::ALL {
            assert_eq!(scope.slug().parse::<ScopeId>(), Ok(scope));
        }
        assert_eq!(" WORLD ".parse::<ScopeId>(), Ok(ScopeId::World));
        assert!("mars".parse::<ScopeId>().is_err());
    }

    #[test]
    fn fallback_scales_are_positive() {
        for scope in ScopeId::ALL {
            assert!(scope.descriptor().fallback.scale > 0.0);
        }
    }
}
