//! Stations and toggle-line commands

use super::shared::{load_config, open_store, print_json};
use crate::app::services::topology_store::TopologyStore;
use crate::cli::args::{GlobalArgs, ToggleLineArgs};
use crate::Result;
use colored::*;
use serde_json::json;
use tracing::info;

/// List every station with its lines and neighbours
pub async fn run_stations(global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let store = open_store(&config);
    let snapshot = store.snapshot().await?;

    if global.json() {
        return print_json(&snapshot);
    }

    println!(
        "{} (topology version {}, {} dirty)",
        format!("{} stations", snapshot.stations.len()).bright_green().bold(),
        snapshot.version,
        snapshot.dirty_count()
    );
    for station in &snapshot.stations {
        let lines: Vec<&str> = station.lines.iter().map(String::as_str).collect();
        let neighbours: Vec<&str> = station.neighbours.iter().map(String::as_str).collect();
        let marker = if station.dirty { "*".bright_yellow() } else { " ".normal() };
        println!(
            "{} {}  [{}]  -> {}  (footfall {})",
            marker,
            station.name.bright_white().bold(),
            lines.join(", "),
            neighbours.join(", "),
            station.footfall
        );
    }
    for line in &snapshot.lines {
        let state = if line.is_running {
            "running".green()
        } else {
            "stopped".red()
        };
        println!("  line {} {} {}", line.name.bold(), line.color, state);
    }
    Ok(())
}

/// Flip a line between running and stopped
pub async fn run_toggle_line(global: &GlobalArgs, args: ToggleLineArgs) -> Result<()> {
    let config = load_config(global)?;
    let store = open_store(&config);

    let line = args.line.clone();
    let (is_running, version) = store
        .mutate_async(move |state| {
            let is_running = state.toggle_line_running(&line)?;
            Ok((is_running, state.version))
        })
        .await?;
    info!(
        "Line {} is now {} (topology version {})",
        args.line,
        if is_running { "running" } else { "stopped" },
        version
    );

    if global.json() {
        print_json(&json!({
            "line": args.line,
            "is_running": is_running,
            "version": version,
        }))
    } else {
        let state = if is_running {
            "running".bright_green().bold()
        } else {
            "stopped".bright_red().bold()
        };
        println!("{} is now {}", args.line.bright_white().bold(), state);
        Ok(())
    }
}
