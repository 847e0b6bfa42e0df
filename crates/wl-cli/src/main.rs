use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wl_cli::commands::{preview, sync};
use wl_cli::{Cli, Commands, Config};
use wl_core::CommitSummary;

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Keep stdout clean for `preview --json`
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Preview(args)) => {
            let config = load_config(cli.config.as_deref())?;
            preview::run(&mut io::stdout(), args, &config).await?;
        }
        Some(Commands::Sync(args)) => {
            let config = load_config(cli.config.as_deref())?;
            let input = io::BufReader::new(io::stdin());
            let report = sync::run(&mut io::stdout(), input, args, &config).await?;
            tracing::debug!(?report, "sync finished");
            if let Some(summary) = report.summary.filter(CommitSummary::has_failures) {
                anyhow::bail!("{} worklog(s) failed to post", summary.failed);
            }
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
