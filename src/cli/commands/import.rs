//! Import command: seed the topology document from CSV files

use super::shared::{load_config, open_store, print_json};
use crate::app::services::topology_store::{ImportStats, TopologyImporter, TopologyState};
use crate::cli::args::{GlobalArgs, ImportArgs};
use crate::{Error, Result};
use colored::*;
use serde_json::json;
use tracing::info;

/// Merge an imported state into the current document
///
/// Refuses to overwrite a non-empty topology unless `force` is set. The
/// imported version is offset by the current one so that the topology
/// version never goes backwards.
pub fn install_imported(
    current: &mut TopologyState,
    mut imported: TopologyState,
    force: bool,
) -> Result<u64> {
    if !current.is_empty() && !force {
        return Err(Error::data_validation(format!(
            "Topology already holds {} stations and {} lines; use --force to replace it",
            current.stations.len(),
            current.lines.len()
        )));
    }
    imported.version += current.version;
    *current = imported;
    Ok(current.version)
}

/// Import command runner
pub async fn run_import(global: &GlobalArgs, args: ImportArgs) -> Result<()> {
    let config = load_config(global)?;
    let store = open_store(&config);

    let (state, stats) = TopologyImporter::new().import_files(&args.stations, &args.lines)?;
    let force = args.force;
    let version = store
        .mutate_async(move |current| install_imported(current, state, force))
        .await?;
    info!(
        "Topology at {} is now version {}",
        store.path().display(),
        version
    );

    if global.json() {
        print_json(&json!({
            "topology": store.path(),
            "version": version,
            "stations_created": stats.stations_created,
            "lines_created": stats.lines_created,
            "memberships": stats.memberships,
            "neighbour_links": stats.neighbour_links,
            "rows_skipped": stats.rows_skipped,
            "errors": stats.errors,
        }))?;
    } else if !global.quiet {
        print_summary(&stats, version);
    }
    Ok(())
}

fn print_summary(stats: &ImportStats, version: u64) {
    println!("{}", "Topology imported".bright_green().bold());
    println!("  {}", stats.summary());
    println!(
        "  Topology version: {}",
        version.to_string().bright_white().bold()
    );
    if stats.has_errors() {
        println!("{}", "Skipped rows:".bright_yellow().bold());
        for message in &stats.errors {
            println!("  - {}", message);
        }
    }
}
