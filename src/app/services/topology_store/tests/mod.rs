//! Shared test utilities and fixtures for topology store tests

use crate::app::models::{Line, Station};
use crate::app::services::topology_store::InMemoryTopologyStore;

pub mod import_tests;

/// Stations CSV with a deliberately malformed row
pub const STATIONS_CSV: &str = "uid,name,neighbours
1,AIIMS,2
2,Green Park,1|3
3,Hauz Khas,2|99
x,Broken,1
";

/// Lines CSV covering the three stations
pub const LINES_CSV: &str = "name,stations
Yellow Line,1|2|3
Pink Line,3|42
";

/// Store holding A-B-C on one running line
pub fn create_test_store() -> InMemoryTopologyStore {
    let store = InMemoryTopologyStore::new();
    store
        .upsert_line(Line::new("Red", "#FF0000").unwrap())
        .unwrap();
    for name in ["A", "B", "C"] {
        store
            .upsert_station(Station::new(name).unwrap().with_lines(["Red"]))
            .unwrap();
    }
    store.connect("A", "B").unwrap();
    store.connect("B", "C").unwrap();
    store
}
