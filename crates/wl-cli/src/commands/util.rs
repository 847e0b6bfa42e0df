//! Shared utilities for CLI commands.

use std::fmt::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use tokio::task::JoinHandle;

use wl_core::{
    DateRange, EventSink, EventStream, LogEvent, PreviewItem, Synchronizer, event_channel,
};

use crate::Config;

/// The synchronizer wired to the real services.
pub type CliSynchronizer = Synchronizer<wl_scrin::Client, wl_jira::Client>;

/// Date range arguments shared by `preview` and `sync`.
#[derive(Debug, Clone, Args)]
pub struct RangeArgs {
    /// First day to include (YYYY-MM-DD).
    #[arg(long)]
    pub from: NaiveDate,

    /// Last day to include, inclusive (YYYY-MM-DD). Defaults to --from.
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl RangeArgs {
    pub fn date_range(&self) -> Result<DateRange> {
        Ok(DateRange::new(self.from, self.to.unwrap_or(self.from))?)
    }
}

/// Builds both API clients and the synchronizer from configuration.
pub fn build_synchronizer(config: &Config, events: EventSink) -> Result<CliSynchronizer> {
    let settings = config.sync_settings()?;
    let timeout = config.http_timeout();

    let source = wl_scrin::Client::new(config.scrin_token()?, &config.scrin.base_url, timeout)
        .context("failed to build ScreenshotMonitor client")?;

    let jira = config.jira_credentials()?;
    let destination = wl_jira::Client::new(jira.email, jira.api_token, jira.base_url, timeout)
        .context("failed to build Jira client")?;

    Ok(Synchronizer::new(source, destination, settings, events))
}

/// Creates an event channel whose events are printed to stderr as they arrive.
///
/// The returned task finishes once every sink has been dropped.
pub fn printed_event_channel() -> (EventSink, JoinHandle<()>) {
    let (sink, stream) = event_channel();
    (sink, tokio::spawn(print_events(stream)))
}

async fn print_events(mut stream: EventStream) {
    while let Some(event) = stream.next().await {
        eprintln!("{}", format_event(&event));
    }
}

pub fn format_event(event: &LogEvent) -> String {
    format!("[{}] {}", event.severity.as_str(), event.message)
}

/// Renders preview items as an aligned table with a total line.
pub fn render_preview(items: &[PreviewItem]) -> String {
    if items.is_empty() {
        return "No tracked time with a ticket key in this range.\n".to_string();
    }

    let width = items
        .iter()
        .map(|item| item.ticket_key.chars().count())
        .max()
        .unwrap_or(0)
        .max("TICKET".len());

    let mut out = String::new();
    let _ = writeln!(out, "{:<10}  {:<width$}  {:>7}", "DATE", "TICKET", "MINUTES");
    for item in items {
        let _ = writeln!(
            out,
            "{}  {:<width$}  {:>7}",
            item.date,
            item.ticket_key,
            item.minutes()
        );
    }

    let total: i64 = items.iter().map(|item| item.seconds).sum();
    let noun = if items.len() == 1 { "worklog" } else { "worklogs" };
    let _ = writeln!(
        out,
        "Total: {} {noun}, {}",
        items.len(),
        format_duration(total)
    );
    out
}

/// Formats seconds as duration string.
/// Returns "Xh Ym" if >= 1 hour, "Xm" if < 1 hour.
/// Negative durations are treated as 0m.
pub fn format_duration(seconds: i64) -> String {
    if seconds < 0 {
        return "0m".to_string();
    }
    let total_minutes = seconds / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use wl_core::Severity;

    fn item(day: u32, key: &str, seconds: i64) -> PreviewItem {
        PreviewItem {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            ticket_key: key.to_string(),
            seconds,
        }
    }

    #[test]
    fn render_preview_aligns_columns_and_totals() {
        let items = vec![
            item(15, "PROJ-1", 3600),
            item(15, "PROJ-22", 1800),
            item(16, "PROJ-1", 5400),
        ];
        assert_snapshot!(render_preview(&items), @r"
        DATE        TICKET   MINUTES
        2024-01-15  PROJ-1        60
        2024-01-15  PROJ-22       30
        2024-01-16  PROJ-1        90
        Total: 3 worklogs, 3h 0m
        ");
    }

    #[test]
    fn render_preview_reports_empty_range() {
        assert_eq!(
            render_preview(&[]),
            "No tracked time with a ticket key in this range.\n"
        );
    }

    #[test]
    fn render_preview_singular_total() {
        let output = render_preview(&[item(15, "PROJ-1", 90)]);
        assert!(output.ends_with("Total: 1 worklog, 1m\n"), "{output}");
    }

    #[test]
    fn format_duration_minutes_and_hours() {
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(59), "0m");
        assert_eq!(format_duration(45 * 60), "45m");
        assert_eq!(format_duration(2 * 3600 + 5 * 60), "2h 5m");
        assert_eq!(format_duration(-10), "0m");
    }

    #[test]
    fn format_event_prefixes_severity() {
        let event = LogEvent {
            message: "Issue PROJ-9 not found. Skipping worklog.".to_string(),
            severity: Severity::Error,
        };
        assert_eq!(
            format_event(&event),
            "[error] Issue PROJ-9 not found. Skipping worklog."
        );
    }

    #[test]
    fn range_defaults_to_single_day() {
        let args = RangeArgs {
            from: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            to: None,
        };
        let range = args.date_range().unwrap();
        assert_eq!(range.start(), range.end());
    }

    #[test]
    fn range_rejects_reversed_dates() {
        let args = RangeArgs {
            from: NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 1, 15),
        };
        assert!(args.date_range().is_err());
    }

    #[test]
    fn build_synchronizer_requires_credentials() {
        let (sink, _stream) = event_channel();
        let err = build_synchronizer(&Config::default(), sink)
            .err()
            .unwrap()
            .to_string();
        assert!(err.contains("scrin.token"), "{err}");
    }
}
