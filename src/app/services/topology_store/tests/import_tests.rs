//! Tests for CSV topology import

use super::*;
use crate::app::services::topology_store::TopologyImporter;
use crate::constants::DEFAULT_LINE_COLOR;

#[test]
fn test_import_builds_topology() {
    let (state, stats) = TopologyImporter::new()
        .import(STATIONS_CSV.as_bytes(), LINES_CSV.as_bytes())
        .unwrap();

    assert_eq!(stats.stations_created, 3);
    assert_eq!(stats.lines_created, 2);
    assert_eq!(state.stations.len(), 3);

    let green_park = &state.stations["Green Park"];
    assert!(green_park.neighbours.contains("AIIMS"));
    assert!(green_park.neighbours.contains("Hauz Khas"));
    assert!(green_park.lines.contains("Yellow Line"));

    let hauz_khas = &state.stations["Hauz Khas"];
    assert!(hauz_khas.lines.contains("Pink Line"));
    assert_eq!(hauz_khas.neighbours.len(), 1);
}

#[test]
fn test_import_skips_malformed_rows() {
    let (_, stats) = TopologyImporter::new()
        .import(STATIONS_CSV.as_bytes(), LINES_CSV.as_bytes())
        .unwrap();

    assert_eq!(stats.rows_skipped, 1);
    assert!(stats.has_errors());
    // neighbour uid 99 and line station uid 42
    assert_eq!(stats.unknown_references, 2);
}

#[test]
fn test_import_keeps_first_row_for_duplicate_uid() {
    let stations = "uid,name,neighbours\n1,AIIMS,2\n2,Green Park,1\n1,INA,2\n";
    let lines = "name,stations\nYellow Line,1|2\n";
    let (state, stats) = TopologyImporter::new()
        .import(stations.as_bytes(), lines.as_bytes())
        .unwrap();

    assert_eq!(stats.stations_created, 2);
    assert_eq!(stats.rows_skipped, 1);
    assert!(stats.errors[0].contains("duplicate uid 1"), "{:?}", stats.errors);
    assert!(state.stations.contains_key("AIIMS"));
    assert!(!state.stations.contains_key("INA"));
    assert!(state.stations["AIIMS"].lines.contains("Yellow Line"));
}

#[test]
fn test_import_uses_colour_map_and_overrides() {
    let (state, _) = TopologyImporter::new()
        .with_color("Pink Line", "#123456")
        .import(STATIONS_CSV.as_bytes(), LINES_CSV.as_bytes())
        .unwrap();

    assert_eq!(state.lines["Yellow Line"].color, "#FFFF00");
    assert_eq!(state.lines["Pink Line"].color, "#123456");
}

#[test]
fn test_import_unknown_line_gets_default_colour() {
    let lines = "name,stations\nOrange Line,1|2\n";
    let (state, _) = TopologyImporter::new()
        .import(STATIONS_CSV.as_bytes(), lines.as_bytes())
        .unwrap();

    assert_eq!(state.lines["Orange Line"].color, DEFAULT_LINE_COLOR);
}

#[test]
fn test_import_rows_are_dirty_and_versioned() {
    let (state, _) = TopologyImporter::new()
        .import(STATIONS_CSV.as_bytes(), LINES_CSV.as_bytes())
        .unwrap();

    assert_eq!(state.version, 5);
    assert!(state.stations.values().all(|s| s.dirty));
    assert!(state.lines.values().all(|l| l.dirty));
}

#[test]
fn test_import_empty_documents() {
    let (state, stats) = TopologyImporter::new()
        .import("uid,name,neighbours\n".as_bytes(), "name,stations\n".as_bytes())
        .unwrap();

    assert!(state.is_empty());
    assert_eq!(stats.stations_created, 0);
    assert!(!stats.has_errors());
}
