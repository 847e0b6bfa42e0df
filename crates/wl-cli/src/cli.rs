//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{preview::PreviewArgs, sync::SyncArgs};

/// Sync tracked time into Jira worklogs.
///
/// Groups ScreenshotMonitor activity into per-day totals for each ticket key
/// and posts them to Jira, skipping days that already have your worklog.
#[derive(Debug, Parser)]
#[command(name = "wl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the worklogs a sync would post, without writing anything.
    Preview(PreviewArgs),

    /// Preview, confirm, then post worklogs to Jira.
    ///
    /// Days that already have a worklog by you on the same ticket are skipped,
    /// so running a sync twice is safe.
    Sync(SyncArgs),
}
