//! Command-line argument definitions for the transit graph CLI
//!
//! Defines the CLI interface using the clap derive API. Global options select
//! the configuration, cache directory and topology document; each subcommand
//! drives one engine operation.

use crate::app::services::freshness::FreshnessStrategy;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the transit graph engine
#[derive(Debug, Clone, Parser)]
#[command(
    name = "transit-graph",
    version,
    about = "Build, cache and route over a transit network graph",
    long_about = "Maintains a cached routing graph derived from a transit topology. \
                  The graph is rebuilt at most once per topology change, shared between \
                  processes through a common cache directory, and queried for shortest \
                  routes between stations."
)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every subcommand
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct GlobalArgs {
    /// Path to configuration file
    ///
    /// TOML configuration file. If not specified, looks for
    /// <config_dir>/transit-graph/config.toml and uses defaults when absent.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Cache directory holding the lock file and map artifacts
    #[arg(
        long = "cache-dir",
        value_name = "PATH",
        global = true,
        help = "Cache directory for graph artifacts"
    )]
    pub cache_dir: Option<PathBuf>,

    /// Topology document path
    #[arg(
        short = 't',
        long = "topology",
        value_name = "FILE",
        global = true,
        help = "Path to the JSON topology document"
    )]
    pub topology: Option<PathBuf>,

    /// Cache identity strategy
    #[arg(
        long = "freshness",
        value_name = "STRATEGY",
        global = true,
        help = "Freshness strategy: version, timestamp or content-hash"
    )]
    pub freshness: Option<FreshnessStrategy>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format for results
    #[arg(
        long = "format",
        value_enum,
        default_value = "human",
        global = true,
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Seed the topology document from stations and lines CSV files
    Import(ImportArgs),
    /// Bring the cached graph up to date with the topology
    Build,
    /// Find the shortest route between two stations
    Route(RouteArgs),
    /// Print the URL of the current map artifact
    MapUrl,
    /// List stations with their lines and neighbours
    Stations,
    /// Toggle whether a line is running
    ToggleLine(ToggleLineArgs),
}

/// Arguments for the import command
#[derive(Debug, Clone, Parser)]
pub struct ImportArgs {
    /// Stations CSV (`uid,name,neighbours`)
    #[arg(long = "stations", value_name = "FILE")]
    pub stations: PathBuf,

    /// Lines CSV (`name,stations`)
    #[arg(long = "lines", value_name = "FILE")]
    pub lines: PathBuf,

    /// Replace an existing, non-empty topology
    #[arg(long = "force", help = "Overwrite an existing topology")]
    pub force: bool,
}

/// Arguments for the route command
#[derive(Debug, Clone, Parser)]
pub struct RouteArgs {
    /// Origin station name
    #[arg(value_name = "FROM")]
    pub from: String,

    /// Destination station name
    #[arg(value_name = "TO")]
    pub to: String,

    /// Price per hop for the fare quote (overrides configuration)
    #[arg(long = "unit-price", value_name = "PRICE")]
    pub unit_price: Option<f64>,
}

/// Arguments for the toggle-line command
#[derive(Debug, Clone, Parser)]
pub struct ToggleLineArgs {
    /// Line name
    #[arg(value_name = "LINE")]
    pub line: String,
}

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON format for scripting
    Json,
}

impl GlobalArgs {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Whether results should be printed as JSON
    pub fn json(&self) -> bool {
        self.output_format == OutputFormat::Json
    }
}
