//! Preview command: aggregate tracked time without writing to Jira.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use wl_core::PreviewItem;

use crate::Config;
use crate::commands::util::{self, RangeArgs};

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub async fn run<W: Write>(
    writer: &mut W,
    args: &PreviewArgs,
    config: &Config,
) -> Result<Vec<PreviewItem>> {
    let range = args.range.date_range()?;
    let (events, printer) = util::printed_event_channel();
    let synchronizer = util::build_synchronizer(config, events)?;

    let result = synchronizer.preview(&range).await;
    drop(synchronizer);
    printer.await.context("event printer stopped unexpectedly")?;
    let items = result.context("failed to build preview")?;

    if args.json {
        serde_json::to_writer_pretty(&mut *writer, &items)
            .context("failed to encode preview")?;
        writeln!(writer)?;
    } else {
        write!(writer, "{}", util::render_preview(&items))?;
    }

    Ok(items)
}
