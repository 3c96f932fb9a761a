//! Shared test utilities and fixtures for graph builder tests

use crate::app::models::{Line, Station, TopologySnapshot};


/// Create a test station with line memberships and neighbour records
pub fn create_test_station(name: &str, lines: &[&str], neighbours: &[&str]) -> Station {
    Station::new(name)
        .unwrap()
        .with_lines(lines.iter().copied())
        .with_neighbours(neighbours.iter().copied())
}

/// Create a test line
pub fn create_test_line(name: &str, color: &str, is_running: bool) -> Line {
    Line::new(name, color).unwrap().running(is_running)
}

/// A - B - C on "Red", plus an isolated station D on no line
pub fn create_abc_snapshot(red_running: bool) -> TopologySnapshot {
    TopologySnapshot::new(
        1,
        vec![
            create_test_station("A", &["Red"], &["B"]),
            create_test_station("B", &["Red"], &["A", "C"]),
            create_test_station("C", &["Red"], &["B"]),
            create_test_station("D", &[], &[]),
        ],
        vec![create_test_line("Red", "#FF0000", red_running)],
    )
}
