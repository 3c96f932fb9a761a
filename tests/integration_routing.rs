//! End-to-end tests: CSV import into a JSON topology document, graph caching
//! in a shared cache directory, and routing over the cached graph.

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use transit_graph::app::services::graph_cache::GraphCache;
use transit_graph::app::services::router::Router;
use transit_graph::app::services::topology_store::{
    JsonFileTopologyStore, TopologyImporter, TopologyStore,
};
use transit_graph::config::CacheConfig;

const STATIONS_CSV: &str = "uid,name,neighbours
1,Kashmere Gate,2
2,Civil Lines,1|3
3,Vidhan Sabha,2|4
4,Rajiv Chowk,3|5
5,Mandi House,4
";

const LINES_CSV: &str = "name,stations
Yellow Line,1|2|3|4
Blue Line,4|5
";

/// Import the fixture CSVs into a fresh topology document
fn seed_topology(dir: &Path) -> Arc<JsonFileTopologyStore> {
    let stations = dir.join("stations.csv");
    let lines = dir.join("lines.csv");
    std::fs::write(&stations, STATIONS_CSV).unwrap();
    std::fs::write(&lines, LINES_CSV).unwrap();

    let (state, stats) = TopologyImporter::new()
        .import_files(&stations, &lines)
        .unwrap();
    assert!(!stats.has_errors(), "{:?}", stats.errors);

    let store = Arc::new(JsonFileTopologyStore::new(dir.join("topology.json")));
    store.replace(&state).unwrap();
    store
}

fn create_cache(store: Arc<JsonFileTopologyStore>, cache_dir: &Path) -> Arc<GraphCache> {
    Arc::new(GraphCache::new(store, CacheConfig::new(cache_dir)).unwrap())
}

/// Route across two lines, then stop the connecting line and route again
#[tokio::test]
async fn test_route_across_lines_and_after_line_stopped() {
    let temp_dir = TempDir::new().unwrap();
    let store = seed_topology(temp_dir.path());
    let cache = create_cache(store.clone(), &temp_dir.path().join("cache"));
    let router = Router::new(cache.clone());

    let route = router.route("Kashmere Gate", "Mandi House").await;
    assert_eq!(
        route.stations(),
        [
            "Kashmere Gate",
            "Civil Lines",
            "Vidhan Sabha",
            "Rajiv Chowk",
            "Mandi House"
        ]
    );
    assert_eq!(route.hop_count(), Some(4));

    let first_url = cache.get_artifact_url().await;
    assert!(first_url.starts_with("/media/maps/v"), "{}", first_url);

    store
        .mutate_async(|state| state.toggle_line_running("Blue Line"))
        .await
        .unwrap();

    assert!(router.route("Kashmere Gate", "Mandi House").await.is_empty());
    assert_eq!(
        router.route("Kashmere Gate", "Rajiv Chowk").await.hop_count(),
        Some(3)
    );

    let second_url = cache.get_artifact_url().await;
    assert_ne!(first_url, second_url);
    assert_eq!(cache.rebuild_count(), 2);
}

/// Two independent handles on the same document and cache directory build once
#[tokio::test]
async fn test_shared_cache_directory_builds_once() {
    let temp_dir = TempDir::new().unwrap();
    let cache_dir = temp_dir.path().join("cache");
    let store = seed_topology(temp_dir.path());

    let first = create_cache(store.clone(), &cache_dir);
    let second_store = Arc::new(JsonFileTopologyStore::new(store.path()));
    let second = create_cache(second_store, &cache_dir);

    let built = first.get_current_graph().await.unwrap();
    let adopted = second.get_current_graph().await.unwrap();

    assert_eq!(built.generation, adopted.generation);
    assert_eq!(*built, *adopted);
    assert_eq!(first.rebuild_count() + second.rebuild_count(), 1);

    // Dirty flags were cleared by the build and persisted to the document
    let snapshot = store.snapshot().await.unwrap();
    assert_eq!(snapshot.dirty_count(), 0);
    assert_eq!(built.topology_version, snapshot.version);
}

/// A missing topology document degrades to the fallback URL and empty routes
#[tokio::test]
async fn test_missing_topology_degrades_gracefully() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(JsonFileTopologyStore::new(
        temp_dir.path().join("missing.json"),
    ));
    let cache = create_cache(store, &temp_dir.path().join("cache"));
    let router = Router::new(cache.clone());

    assert_eq!(cache.get_artifact_url().await, "/stations/");
    assert!(router.route("Kashmere Gate", "Civil Lines").await.is_empty());
    assert_eq!(
        router.route("Kashmere Gate", "Kashmere Gate").await.stations(),
        ["Kashmere Gate"]
    );
}
