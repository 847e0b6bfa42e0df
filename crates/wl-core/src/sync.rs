//! Preview and commit runs.
//!
//! `preview` reads the source one day at a time and aggregates; it either
//! returns the complete list or fails. `commit` posts each item in order and
//! never stops early: per-item problems become outcomes, not errors.
//!
//! Both run strictly sequentially. Writes in particular must not overlap for
//! the same issue, or two posts could both miss each other in the duplicate
//! scan.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use thiserror::Error;

use crate::aggregate::aggregate;
use crate::events::EventSink;
use crate::ports::{ActivitySource, SourceError, WorklogDestination};
use crate::types::{PostOutcome, PreviewItem};
use crate::window::{DateRange, DayBoundary, DayWindow};
use crate::writer::WorklogWriter;

/// Errors that abort a preview.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to resolve source account: {0}")]
    Scope(#[source] SourceError),
    #[error("failed to fetch activities for {date}: {source}")]
    Fetch {
        date: NaiveDate,
        #[source]
        source: SourceError,
    },
}

/// How calendar days are laid out.
#[derive(Debug, Clone, Copy)]
pub struct SyncSettings {
    /// Applied to every day window and every created worklog's start time.
    pub offset: FixedOffset,
    pub boundary: DayBoundary,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
            boundary: DayBoundary::default(),
        }
    }
}

/// Outcome counts for one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub written: usize,
    pub duplicates: usize,
    pub missing: usize,
    pub failed: usize,
}

impl CommitSummary {
    fn record(&mut self, outcome: &PostOutcome) {
        match outcome {
            PostOutcome::Written => self.written += 1,
            PostOutcome::SkippedDuplicate => self.duplicates += 1,
            PostOutcome::SkippedMissingTarget => self.missing += 1,
            PostOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub const fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Drives the source, the aggregator and the writer.
pub struct Synchronizer<S, D> {
    source: S,
    writer: WorklogWriter<D>,
    settings: SyncSettings,
    events: EventSink,
}

impl<S: ActivitySource, D: WorklogDestination> Synchronizer<S, D> {
    pub fn new(source: S, destination: D, settings: SyncSettings, events: EventSink) -> Self {
        let writer = WorklogWriter::new(destination, settings.offset, events.clone());
        Self {
            source,
            writer,
            settings,
            events,
        }
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    pub const fn destination(&self) -> &D {
        self.writer.destination()
    }

    /// Aggregates tracked time for every day in `range`.
    ///
    /// Any source failure aborts the whole preview; no partial list is returned.
    pub async fn preview(&self, range: &DateRange) -> Result<Vec<PreviewItem>, SyncError> {
        let result = self.collect_preview(range).await;
        if let Err(err) = &result {
            self.events.error(format!("Error getting preview: {err}"));
        }
        result
    }

    async fn collect_preview(&self, range: &DateRange) -> Result<Vec<PreviewItem>, SyncError> {
        let scope = self
            .source
            .resolve_scope()
            .await
            .map_err(SyncError::Scope)?;
        self.events.info(format!("Using employment {scope}"));

        let mut preview = Vec::new();
        for date in range.days() {
            let window = DayWindow::for_date(date, self.settings.offset, self.settings.boundary);
            let intervals = self
                .source
                .fetch_intervals(&scope, window.start, window.end)
                .await
                .map_err(|source| SyncError::Fetch { date, source })?;
            tracing::debug!(%date, intervals = intervals.len(), "fetched activity");

            preview.extend(
                aggregate(&intervals, window)
                    .into_iter()
                    .map(|total| PreviewItem {
                        date,
                        ticket_key: total.ticket_key,
                        seconds: total.seconds,
                    }),
            );
        }
        Ok(preview)
    }

    /// Posts every item in order, one at a time.
    pub async fn commit(&self, items: &[PreviewItem]) -> CommitSummary {
        self.events.info("Logging to Jira...");

        let mut summary = CommitSummary::default();
        for item in items {
            let outcome = self
                .writer
                .post(&item.ticket_key, item.seconds, item.date)
                .await;
            self.report(item, &outcome);
            summary.record(&outcome);
        }

        self.events.success("Done.");
        summary
    }

    fn report(&self, item: &PreviewItem, outcome: &PostOutcome) {
        let PreviewItem {
            date, ticket_key, ..
        } = item;
        match outcome {
            PostOutcome::Written => self.events.success(format!(
                "Logged {} minutes to {ticket_key} on {date}",
                item.minutes()
            )),
            PostOutcome::SkippedDuplicate => self.events.info(format!(
                "You already have a worklog for {ticket_key} on {date}. Skipping."
            )),
            PostOutcome::SkippedMissingTarget => self
                .events
                .error(format!("Issue {ticket_key} not found. Skipping worklog.")),
            PostOutcome::Failed(reason) => self.events.error(format!(
                "Failed to add worklog for {ticket_key} on {date}: {reason}"
            )),
        }
    }
}
