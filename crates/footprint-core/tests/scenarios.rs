//! Integration test: end-to-end map sessions over synthetic boundary
//! documents.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::fmt::Write as _;

use footprint_core::{
    FlushRequest, LoadReport, MapSession, RenderSurface, ScopeId, ScopeRequest, Size,
    ViewTransform, fit_to_viewport, parse_document, percentage,
};
use web_time::Instant;

/// Remembers the last state pushed to each shape and list row.
#[derive(Default)]
struct Surface {
    highlighted: HashMap<String, bool>,
    checked: HashMap<String, bool>,
}

impl RenderSurface for Surface {
    fn highlight(&mut self, name: &str, on: bool) {
        self.highlighted.insert(name.to_owned(), on);
    }

    fn set_list_checked(&mut self, name: &str, on: bool) {
        self.checked.insert(name.to_owned(), on);
    }
}

/// A GeoJSON collection of `count` small squares on a lon/lat grid. The
/// first one is called "France"; a blank and a duplicate name are mixed
/// in to exercise name repair.
fn world_geojson(count: usize) -> String {
    let mut features = Vec::with_capacity(count);
    for i in 0..count {
        #[allow(clippy::cast_precision_loss)]
        let (col, row) = ((i % 20) as f64, (i / 20) as f64);
        let lon = -170.0 + col * 17.0;
        let lat = -60.0 + row * 14.0;
        let name = match i {
            0 => "France".to_owned(),
            1 => "  ".to_owned(),
            2 | 3 => "Congo".to_owned(),
            _ => format!("Region {i:03}"),
        };
        let mut f = String::new();
        write!(
            f,
            r#"{{"type":"Feature","properties":{{"name":"{name}"}},"geometry":{{"type":"Polygon","coordinates":[[[{lon},{lat}],[{x1},{lat}],[{x1},{y1}],[{lon},{y1}],[{lon},{lat}]]]}}}}"#,
            x1 = lon + 10.0,
            y1 = lat + 10.0,
        )
        .unwrap();
        features.push(f);
    }
    format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    )
}

/// A tiny TopoJSON topology with two states.
const STATES_TOPOJSON: &str = r#"{
    "type": "Topology",
    "arcs": [
        [[-110, 35], [-100, 35], [-100, 45], [-110, 45], [-110, 35]],
        [[-90, 30], [-80, 30], [-80, 40], [-90, 40], [-90, 30]]
    ],
    "objects": {
        "states": { "type": "GeometryCollection", "geometries": [
            { "type": "Polygon", "arcs": [[0]], "properties": { "name": "Colorado" } },
            { "type": "Polygon", "arcs": [[1]], "properties": { "name": "Georgia" } }
        ] }
    }
}"#;

fn load(session: &mut MapSession, scope: ScopeId, text: &str) -> LoadReport {
    match session.request_scope(scope) {
        ScopeRequest::Fetch { ticket, source } => {
            let result = parse_document(text, &source, scope);
            session.finish_load(ticket, result)
        }
        other => panic!("expected a fetch, got {other:?}"),
    }
}

fn world_session() -> MapSession {
    let mut session = MapSession::default();
    session.resize(Size::new(960.0, 540.0));
    let report = load(&mut session, ScopeId::World, &world_geojson(177));
    assert_eq!(report, LoadReport::Activated(ScopeId::World));
    session
}

#[test]
fn region_names_are_unique_within_a_scope() {
    let session = world_session();
    let names: Vec<&str> = session.collection().names().collect();
    let unique: std::collections::HashSet<&str> = names.iter().copied().collect();
    assert_eq!(names.len(), 177);
    assert_eq!(unique.len(), 177);
    assert!(unique.contains("Unnamed region"));
    assert!(unique.contains("Congo") && unique.contains("Congo (2)"));
}

#[test]
fn toggling_france_updates_count_percentage_shape_and_row() {
    let mut session = world_session();
    let mut surface = Surface::default();

    let request = session.toggle("France", &mut surface);
    assert_eq!(request, FlushRequest::Schedule);
    assert_eq!(surface.highlighted.get("France"), Some(&true));
    assert_eq!(surface.checked.get("France"), Some(&true));

    session.flush(Instant::now());
    let stats = session.stats();
    assert_eq!(stats.visited, 1);
    assert_eq!(stats.total, 177);
    assert!((stats.percentage - 0.6).abs() < 1e-9);
    assert!((stats.percentage - percentage(1, 177)).abs() < f64::EPSILON);
    assert!(session.sync().store().contains("France"));
    assert!(session.frame().shapes.iter().any(|s| s.name == "France" && s.selected));
}

#[test]
fn double_toggle_restores_selection() {
    let mut session = world_session();
    let mut surface = Surface::default();
    session.toggle("Region 010", &mut surface);
    session.flush(Instant::now());
    session.toggle("France", &mut surface);
    session.toggle("France", &mut surface);
    session.flush(Instant::now());
    assert!(session.sync().store().equals_all(["Region 010"]));
    assert_eq!(surface.highlighted.get("France"), Some(&false));
}

#[test]
fn switching_scope_resets_selection_and_refits() {
    let mut session = world_session();
    let mut surface = Surface::default();
    session.toggle("France", &mut surface);
    session.toggle("Region 100", &mut surface);
    session.flush(Instant::now());
    assert_eq!(session.stats().visited, 2);

    let world_transform = session.transform();
    let world_revision = session.revision();

    let report = load(&mut session, ScopeId::UsStates, STATES_TOPOJSON);
    assert_eq!(report, LoadReport::Activated(ScopeId::UsStates));

    let stats = session.stats();
    assert_eq!(stats.visited, 0);
    assert!(stats.percentage.abs() < f64::EPSILON);
    assert_eq!(stats.total, 2);
    assert!(session.sync().store().is_empty());
    assert!(session.revision() > world_revision);
    assert_ne!(session.transform(), world_transform);
    assert!(session.transform().is_finite());
    assert_eq!(session.frame().shapes.len(), 2);
}

#[test]
fn fit_of_empty_collection_is_identity() {
    let projection = ScopeId::World.descriptor().projection.build();
    let empty = footprint_core::RegionCollection::empty(ScopeId::World);
    let t = fit_to_viewport(
        &projection,
        &empty,
        Size::new(960.0, 540.0),
        &ScopeId::World.descriptor().fallback,
        0.02,
    );
    assert_eq!(t, ViewTransform::identity());
    assert!(!t.scale.is_nan() && t.translate.is_finite());
}

#[test]
fn select_all_then_again_deselects_all() {
    let mut session = world_session();
    let mut surface = Surface::default();

    session.toggle_all(&mut surface);
    session.flush(Instant::now());
    assert_eq!(session.stats().visited, 177);
    assert_eq!(surface.highlighted.len(), 177);
    assert!(surface.highlighted.values().all(|on| *on));
    assert!(surface.checked.values().all(|on| *on));
    assert!(session.frame().shapes.iter().all(|s| s.selected));

    session.toggle_all(&mut surface);
    session.flush(Instant::now());
    assert_eq!(session.stats().visited, 0);
    assert!(surface.highlighted.values().all(|on| !on));
    assert!(surface.checked.values().all(|on| !on));
}

#[test]
fn stale_response_after_rapid_switch_is_discarded() {
    let mut session = world_session();
    let ScopeRequest::Fetch { ticket: states, .. } = session.request_scope(ScopeId::UsStates)
    else {
        panic!("states must fetch");
    };
    let ScopeRequest::Fetch { ticket: parks, .. } = session.request_scope(ScopeId::UsNationalParks)
    else {
        panic!("parks must fetch");
    };

    let stale = parse_document(
        STATES_TOPOJSON,
        &ScopeId::UsStates.descriptor().source,
        ScopeId::UsStates,
    );
    assert_eq!(session.finish_load(states, stale), LoadReport::Discarded);
    assert_eq!(session.scope(), ScopeId::World);
    assert!(session.is_loading());

    let parks_doc = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"UNIT_NAME":"Yellowstone"},
         "geometry":{"type":"Polygon","coordinates":[[[-111,44],[-110,44],[-110,45],[-111,44]]]}}]}"#;
    let result = parse_document(
        parks_doc,
        &ScopeId::UsNationalParks.descriptor().source,
        ScopeId::UsNationalParks,
    );
    assert_eq!(
        session.finish_load(parks, result),
        LoadReport::Activated(ScopeId::UsNationalParks)
    );
    assert!(!session.is_loading());
    assert_eq!(session.search("yellow"), vec!["Yellowstone"]);
}

#[test]
fn search_filters_list_but_not_map() {
    let session = world_session();
    let hits = session.search("region 01");
    assert_eq!(hits.len(), 10);
    assert!(hits.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(session.frame().shapes.len(), 177);
    assert_eq!(session.search("").len(), 177);
}

#[test]
fn search_matches_spaces_as_typed() {
    let session = world_session();
    // "01" also hits "Region 101"; the leading space rules it out.
    assert_eq!(session.search("01").len(), 11);
    assert_eq!(session.search(" 01").len(), 10);
    assert!(session.search("france ").is_empty());
    assert!(session.search("   ").is_empty());
}
