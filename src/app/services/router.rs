//! Shortest-path routing over the cached graph
//!
//! Routes are unweighted shortest paths found by breadth-first search.
//! Successors are visited in station-name order, so ties between equally
//! short paths always resolve the same way.

use crate::app::services::graph_cache::GraphCache;
use pathfinding::prelude::bfs;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

/// Ordered station names from origin to destination; empty when no route exists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(Vec<String>);

impl Route {
    /// Route through the given stations
    pub fn new(stations: Vec<String>) -> Self {
        Self(stations)
    }

    /// Empty route
    pub fn none() -> Self {
        Self::default()
    }

    /// Stations in travel order
    pub fn stations(&self) -> &[String] {
        &self.0
    }

    /// Whether no route was found
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of hops, or `None` for an empty route
    pub fn hop_count(&self) -> Option<usize> {
        self.0.len().checked_sub(1)
    }

    /// Consume the route, returning the station names
    pub fn into_stations(self) -> Vec<String> {
        self.0
    }
}

/// Finds routes on the current graph
#[derive(Debug, Clone)]
pub struct Router {
    cache: Arc<GraphCache>,
}

impl Router {
    pub fn new(cache: Arc<GraphCache>) -> Self {
        Self { cache }
    }

    /// Shortest route from `start` to `stop`
    ///
    /// Never fails: an unknown station, an unreachable destination or an
    /// unavailable graph all yield an empty route.
    pub async fn route(&self, start: &str, stop: &str) -> Route {
        if start == stop {
            return Route::new(vec![start.to_string()]);
        }

        let graph = match self.cache.get_current_graph().await {
            Ok(graph) => graph,
            Err(e) => {
                error!("No graph available for routing {} -> {}: {}", start, stop, e);
                return Route::none();
            }
        };

        if !graph.contains_station(start) || !graph.contains_station(stop) {
            debug!("No route {} -> {}: unknown station", start, stop);
            return Route::none();
        }

        let path = bfs(
            &start.to_string(),
            |station: &String| {
                graph
                    .successors(station)
                    .map(String::from)
                    .collect::<Vec<_>>()
            },
            |station: &String| station == stop,
        );

        match path {
            Some(stations) => {
                debug!("Route {} -> {}: {} hop(s)", start, stop, stations.len() - 1);
                Route::new(stations)
            }
            None => {
                debug!("No route {} -> {}: unreachable", start, stop);
                Route::none()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{Line, Station};
    use crate::app::services::topology_store::InMemoryTopologyStore;
    use crate::config::CacheConfig;
    use tempfile::TempDir;

    fn create_router(store: Arc<InMemoryTopologyStore>, temp_dir: &TempDir) -> Router {
        let cache = GraphCache::new(store, CacheConfig::new(temp_dir.path())).unwrap();
        Router::new(Arc::new(cache))
    }

    /// A-B-C on "Red"
    fn create_abc_store() -> Arc<InMemoryTopologyStore> {
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
        Arc::new(store)
    }

    /// Square A-B-D and A-C-D on "Red" plus a spur D-E on "Blue"
    fn create_square_store() -> Arc<InMemoryTopologyStore> {
        let store = InMemoryTopologyStore::new();
        store
            .upsert_line(Line::new("Red", "#FF0000").unwrap())
            .unwrap();
        store
            .upsert_line(Line::new("Blue", "#0000FF").unwrap())
            .unwrap();
        for name in ["A", "B", "C"] {
            store
                .upsert_station(Station::new(name).unwrap().with_lines(["Red"]))
                .unwrap();
        }
        store
            .upsert_station(Station::new("D").unwrap().with_lines(["Red", "Blue"]))
            .unwrap();
        store
            .upsert_station(Station::new("E").unwrap().with_lines(["Blue"]))
            .unwrap();
        for (a, b) in [("A", "C"), ("A", "B"), ("B", "D"), ("C", "D"), ("D", "E")] {
            store.connect(a, b).unwrap();
        }
        Arc::new(store)
    }

    #[test]
    fn test_hop_count() {
        assert_eq!(Route::none().hop_count(), None);
        assert_eq!(Route::new(vec!["A".into()]).hop_count(), Some(0));
        assert_eq!(Route::new(vec!["A".into(), "B".into()]).hop_count(), Some(1));
    }

    #[tokio::test]
    async fn test_same_station_route_skips_graph() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_abc_store();
        let cache = Arc::new(GraphCache::new(store, CacheConfig::new(temp_dir.path())).unwrap());
        let router = Router::new(cache.clone());

        let route = router.route("Nowhere", "Nowhere").await;

        assert_eq!(route.stations(), ["Nowhere"]);
        assert_eq!(cache.rebuild_count(), 0);
    }

    #[tokio::test]
    async fn test_abc_route_and_line_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_abc_store();
        let router = create_router(store.clone(), &temp_dir);

        assert_eq!(router.route("A", "C").await.stations(), ["A", "B", "C"]);

        store.set_line_running("Red", false).unwrap();
        assert!(router.route("A", "C").await.is_empty());
    }

    #[tokio::test]
    async fn test_route_edges_and_endpoints() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_square_store();
        let cache = Arc::new(GraphCache::new(store, CacheConfig::new(temp_dir.path())).unwrap());
        let router = Router::new(cache.clone());

        let route = router.route("A", "E").await;
        let graph = cache.get_current_graph().await.unwrap();

        let stations = route.stations();
        assert_eq!(stations.first().map(String::as_str), Some("A"));
        assert_eq!(stations.last().map(String::as_str), Some("E"));
        for pair in stations.windows(2) {
            assert!(graph.has_edge(&pair[0], &pair[1]));
        }
        assert_eq!(route.hop_count(), Some(3));
    }

    #[tokio::test]
    async fn test_tie_break_is_lexicographic() {
        let temp_dir = TempDir::new().unwrap();
        let router = create_router(create_square_store(), &temp_dir);

        // A-B-D and A-C-D are equally short; B sorts first
        assert_eq!(router.route("A", "D").await.stations(), ["A", "B", "D"]);
        assert_eq!(router.route("D", "A").await.stations(), ["D", "B", "A"]);
    }

    #[tokio::test]
    async fn test_route_length_symmetric() {
        let temp_dir = TempDir::new().unwrap();
        let router = create_router(create_square_store(), &temp_dir);

        for (a, b) in [("A", "E"), ("B", "C"), ("C", "E")] {
            let there = router.route(a, b).await;
            let back = router.route(b, a).await;
            assert_eq!(there.hop_count(), back.hop_count(), "{} <-> {}", a, b);
        }
    }

    #[tokio::test]
    async fn test_unknown_or_unreachable_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_square_store();
        store
            .upsert_station(Station::new("F").unwrap().with_lines(["Red"]))
            .unwrap();
        let router = create_router(store, &temp_dir);

        assert!(router.route("A", "Z").await.is_empty());
        assert!(router.route("Z", "A").await.is_empty());
        assert!(router.route("A", "F").await.is_empty());
    }
}
