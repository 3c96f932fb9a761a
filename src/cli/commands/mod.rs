//! Command implementations for the transit graph CLI
//!
//! Each subcommand lives in its own module:
//! - `import`: seed the topology document from CSV
//! - `graph`: build the cached graph and report its artifact URL
//! - `route`: shortest route with a fare quote
//! - `stations`: list stations and toggle lines

pub mod graph;
pub mod import;
pub mod route;
pub mod shared;
pub mod stations;

use crate::Result;
use crate::cli::args::{Args, Commands};
use tracing::debug;

/// Main command runner
///
/// Sets up logging and dispatches to the subcommand handler. Does nothing
/// when no subcommand was given; `main` prints help in that case.
pub async fn run(args: Args) -> Result<()> {
    shared::setup_logging(&args.global)?;

    let Some(command) = args.command else {
        return Ok(());
    };
    debug!("Running command: {:?}", command);

    match command {
        Commands::Import(import_args) => import::run_import(&args.global, import_args).await,
        Commands::Build => graph::run_build(&args.global).await,
        Commands::Route(route_args) => route::run_route(&args.global, route_args).await,
        Commands::MapUrl => graph::run_map_url(&args.global).await,
        Commands::Stations => stations::run_stations(&args.global).await,
        Commands::ToggleLine(toggle_args) => {
            stations::run_toggle_line(&args.global, toggle_args).await
        }
    }
}
