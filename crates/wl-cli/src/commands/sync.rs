//! Sync command: preview, confirm, then post worklogs to Jira.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use clap::Args;

use wl_core::CommitSummary;

use crate::Config;
use crate::commands::util::{self, CliSynchronizer, RangeArgs};

#[derive(Debug, Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Post without asking for confirmation.
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug)]
pub struct SyncReport {
    /// Number of aggregated worklogs shown in the preview.
    pub previewed: usize,
    /// `None` when nothing was posted (empty preview or declined).
    pub summary: Option<CommitSummary>,
}

pub async fn run<W, R>(
    writer: &mut W,
    input: R,
    args: &SyncArgs,
    config: &Config,
) -> Result<SyncReport>
where
    W: Write,
    R: BufRead + Send + 'static,
{
    let range = args.range.date_range()?;
    let (events, printer) = util::printed_event_channel();
    let synchronizer = util::build_synchronizer(config, events)?;

    let result = preview_and_commit(&synchronizer, writer, input, args, range).await;
    drop(synchronizer);
    printer.await.context("event printer stopped unexpectedly")?;
    result
}

async fn preview_and_commit<W, R>(
    synchronizer: &CliSynchronizer,
    writer: &mut W,
    input: R,
    args: &SyncArgs,
    range: wl_core::DateRange,
) -> Result<SyncReport>
where
    W: Write,
    R: BufRead + Send + 'static,
{
    let items = synchronizer
        .preview(&range)
        .await
        .context("failed to build preview")?;
    write!(writer, "{}", util::render_preview(&items))?;

    let mut report = SyncReport {
        previewed: items.len(),
        summary: None,
    };
    if items.is_empty() {
        return Ok(report);
    }

    let prompt = format!("Post {} worklog(s) to Jira? [y/N] ", items.len());
    if !args.yes && !confirm(input, writer, &prompt).await? {
        writeln!(writer, "Aborted, nothing was posted.")?;
        return Ok(report);
    }

    let summary = synchronizer.commit(&items).await;
    writeln!(
        writer,
        "Posted {}, already present {}, missing issue {}, failed {}.",
        summary.written, summary.duplicates, summary.missing, summary.failed
    )?;
    report.summary = Some(summary);
    Ok(report)
}

/// Asks a yes/no question; anything but `y`/`yes` declines.
///
/// The answer is read on the blocking pool so the runtime keeps serving the
/// event printer while waiting on the terminal.
async fn confirm<R, W>(input: R, writer: &mut W, prompt: &str) -> Result<bool>
where
    R: BufRead + Send + 'static,
    W: Write,
{
    write!(writer, "{prompt}")?;
    writer.flush()?;
    tokio::task::spawn_blocking(move || read_answer(input))
        .await
        .context("confirmation prompt stopped unexpectedly")?
}

fn read_answer<R: BufRead>(mut input: R) -> Result<bool> {
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
