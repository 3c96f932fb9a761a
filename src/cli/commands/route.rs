//! Route command: shortest route and fare quote

use super::shared::{load_config, open_cache, open_store, print_json};
use crate::app::services::router::{Route, Router};
use crate::cli::args::{GlobalArgs, RouteArgs};
use crate::{Error, Result};
use colored::*;
use serde_json::json;

/// Fare for a route: one unit per hop; `None` when there is no route
pub fn fare_quote(route: &Route, unit_price: f64) -> Option<f64> {
    route.hop_count().map(|hops| hops as f64 * unit_price)
}

/// Route command runner
pub async fn run_route(global: &GlobalArgs, args: RouteArgs) -> Result<()> {
    let config = load_config(global)?;
    let unit_price = args.unit_price.unwrap_or(config.unit_price);
    if !(unit_price.is_finite() && unit_price >= 0.0) {
        return Err(Error::configuration(format!(
            "--unit-price must be a non-negative number, got {}",
            unit_price
        )));
    }

    let router = Router::new(open_cache(&config, open_store(&config))?);
    let route = router.route(&args.from, &args.to).await;
    let fare = fare_quote(&route, unit_price);

    if global.json() {
        return print_json(&json!({
            "from": args.from,
            "to": args.to,
            "route": route,
            "hops": route.hop_count(),
            "fare": fare,
        }));
    }

    match fare {
        Some(fare) => {
            println!("{}", route.stations().join(" -> ").bright_white().bold());
            println!(
                "  {} stations, {} hop(s), fare {:.2}",
                route.stations().len(),
                route.hop_count().unwrap_or_default(),
                fare
            );
        }
        None => println!(
            "{}",
            format!("No route from {} to {}", args.from, args.to).bright_yellow()
        ),
    }
    Ok(())
}
