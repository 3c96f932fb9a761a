//! Shared components for CLI commands
//!
//! Logging setup, configuration resolution and construction of the store and
//! cache used by every subcommand.

use crate::app::services::graph_cache::GraphCache;
use crate::app::services::topology_store::JsonFileTopologyStore;
use crate::cli::args::GlobalArgs;
use crate::config::Config;
use crate::{Error, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Set up structured logging to stderr
pub fn setup_logging(global: &GlobalArgs) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = global.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("transit_graph={}", log_level)));

    let initialized = if global.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    initialized
        .map_err(|e| Error::configuration(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Config file to load: the explicit one, else the default location if present
fn config_file(global: &GlobalArgs) -> Option<PathBuf> {
    match &global.config_file {
        Some(path) => Some(path.clone()),
        None => Config::default_config_path()
            .ok()
            .filter(|path| path.is_file()),
    }
}

/// Resolve configuration: defaults, file, environment, then CLI flags
pub fn load_config(global: &GlobalArgs) -> Result<Config> {
    let mut config = Config::load_layered(config_file(global).as_deref())?;

    if let Some(cache_dir) = &global.cache_dir {
        config.cache.cache_dir = cache_dir.clone();
    }
    if let Some(topology) = &global.topology {
        config.topology.path = topology.clone();
    }
    if let Some(freshness) = global.freshness {
        config.cache.freshness = freshness;
    }

    config.validate()?;
    debug!("Resolved configuration: {:?}", config);
    Ok(config)
}

/// Open the topology document named by the configuration
pub fn open_store(config: &Config) -> Arc<JsonFileTopologyStore> {
    debug!("Using topology document {}", config.topology.path.display());
    Arc::new(JsonFileTopologyStore::new(&config.topology.path))
}

/// Create the graph cache over a store
pub fn open_cache(config: &Config, store: Arc<JsonFileTopologyStore>) -> Result<Arc<GraphCache>> {
    Ok(Arc::new(GraphCache::new(store, config.cache.clone())?))
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{}", rendered);
    Ok(())
}
