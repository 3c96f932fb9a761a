//! Build and map-url commands

use super::shared::{load_config, open_cache, open_store, print_json};
use crate::Result;
use crate::cli::args::GlobalArgs;
use colored::*;
use serde_json::json;
use std::time::Instant;

/// Bring the cached graph up to date and report it
pub async fn run_build(global: &GlobalArgs) -> Result<()> {
    let start_time = Instant::now();
    let config = load_config(global)?;
    let cache = open_cache(&config, open_store(&config))?;

    let graph = cache.get_current_graph().await?;
    let rebuilt = cache.rebuild_count() > 0;
    let artifact = cache.artifacts().path_for(&graph.generation);

    if global.json() {
        return print_json(&json!({
            "generation": graph.generation,
            "topology_version": graph.topology_version,
            "stations": graph.node_count(),
            "connections": graph.connection_count(),
            "rebuilt": rebuilt,
            "artifact": artifact,
        }));
    }

    if !global.quiet {
        let status = if rebuilt {
            "Graph rebuilt".bright_green().bold()
        } else {
            "Graph up to date".bright_green().bold()
        };
        println!("{}", status);
        println!("  Generation:  {}", graph.generation.bright_white().bold());
        println!("  Topology:    version {}", graph.topology_version);
        println!(
            "  Stations:    {}  Connections: {}",
            graph.node_count().to_string().bright_white().bold(),
            graph.connection_count().to_string().bright_white().bold()
        );
        println!("  Artifact:    {}", artifact.display());
        println!("  Elapsed:     {:.2}s", start_time.elapsed().as_secs_f64());
    }
    Ok(())
}

/// Print the URL of the current map artifact (or the fallback URL)
pub async fn run_map_url(global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let cache = open_cache(&config, open_store(&config))?;

    let url = cache.get_artifact_url().await;
    if global.json() {
        print_json(&json!({ "url": url }))
    } else {
        println!("{}", url);
        Ok(())
    }
}
