use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use transit_graph::cli::{args::Args, commands};

fn main() -> Result<()> {
    let args = Args::parse();

    // No subcommand: show help and exit cleanly
    if args.command.is_none() {
        Args::command()
            .print_help()
            .context("Failed to print help")?;
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

    runtime.block_on(async {
        tokio::select! {
            result = commands::run(args) => result.context("Command failed"),
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to install CTRL+C signal handler")?;
                eprintln!("\nReceived CTRL+C, shutting down...");
                anyhow::bail!("Interrupted by user")
            }
        }
    })
}
