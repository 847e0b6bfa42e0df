//! Idempotent worklog posting.
//!
//! For each preview item the writer checks destination state before writing:
//!
//! 1. The issue must exist, otherwise the item is skipped
//! 2. The caller's account id is resolved once per writer and cached
//! 3. An existing worklog by the caller on the same date skips the item
//! 4. Otherwise a worklog starting at 09:00 local time is created
//!
//! Lookup failures degrade asymmetrically. An existence check that fails is
//! treated as "not found" so no entry is written against an unknown issue. A
//! duplicate scan that fails (or an unresolved account id) is treated as
//! "no duplicate", so the write is attempted and may be redundant.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta};
use tokio::sync::OnceCell;

use crate::events::EventSink;
use crate::ports::WorklogDestination;
use crate::types::{ExistingWorklog, NewWorklog, PostOutcome};

/// Local hour at which created worklogs start.
const WORKDAY_START_HOUR: i64 = 9;

/// Output format for `started`. `%z` renders the offset as `+HHMM`.
const STARTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Accepts any fractional precision and `+HHMM` or `+HH:MM` offsets.
const STARTED_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Posts preview items to a [`WorklogDestination`] without creating duplicates.
pub struct WorklogWriter<D> {
    destination: D,
    offset: FixedOffset,
    events: EventSink,
    /// `Some(None)` once resolution has failed; it is not retried.
    account_id: OnceCell<Option<String>>,
}

impl<D: WorklogDestination> WorklogWriter<D> {
    pub fn new(destination: D, offset: FixedOffset, events: EventSink) -> Self {
        Self {
            destination,
            offset,
            events,
            account_id: OnceCell::new(),
        }
    }

    pub const fn destination(&self) -> &D {
        &self.destination
    }

    /// Ensures a worklog of `seconds` exists for `issue_key` on `date`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn post(&self, issue_key: &str, seconds: i64, date: NaiveDate) -> PostOutcome {
        match self.destination.issue_exists(issue_key).await {
            Ok(true) => {}
            Ok(false) => return PostOutcome::SkippedMissingTarget,
            Err(err) => {
                self.events
                    .error(format!("Could not verify that issue {issue_key} exists: {err}"));
                return PostOutcome::SkippedMissingTarget;
            }
        }

        if let Some(account_id) = self.account_id().await {
            match self.destination.list_worklogs(issue_key).await {
                Ok(worklogs) => {
                    if has_worklog_on(&worklogs, account_id, date, self.offset) {
                        return PostOutcome::SkippedDuplicate;
                    }
                }
                Err(err) => self.events.error(format!(
                    "Error checking existing worklogs for {issue_key}: {err}"
                )),
            }
        }

        let worklog = NewWorklog {
            time_spent_seconds: seconds,
            started: format_started(date, self.offset),
        };
        match self.destination.create_worklog(issue_key, &worklog).await {
            Ok(()) => PostOutcome::Written,
            Err(err) => PostOutcome::Failed(err.to_string()),
        }
    }

    async fn account_id(&self) -> Option<&str> {
        self.account_id
            .get_or_init(|| async {
                match self.destination.current_account_id().await {
                    Ok(account_id) => {
                        tracing::debug!(%account_id, "resolved destination account");
                        Some(account_id)
                    }
                    Err(err) => {
                        self.events.error(format!(
                            "Error getting current user account id: {err}. \
                             Duplicate detection is disabled for this run."
                        ));
                        None
                    }
                }
            })
            .await
            .as_deref()
    }
}

/// Formats 09:00:00.000 on `date` in `offset`, e.g. `2024-01-15T09:00:00.000+0200`.
pub fn format_started(date: NaiveDate, offset: FixedOffset) -> String {
    let local = date.and_time(NaiveTime::MIN) + TimeDelta::hours(WORKDAY_START_HOUR);
    let utc = local - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
    DateTime::<FixedOffset>::from_naive_utc_and_offset(utc, offset)
        .format(STARTED_FORMAT)
        .to_string()
}

fn has_worklog_on(
    worklogs: &[ExistingWorklog],
    account_id: &str,
    date: NaiveDate,
    offset: FixedOffset,
) -> bool {
    worklogs
        .iter()
        .filter(|worklog| worklog.author_account_id.as_deref() == Some(account_id))
        .any(|worklog| started_date(&worklog.started, offset) == Some(date))
}

/// Calendar date of a destination `started` value, as seen in `offset`.
///
/// Falls back to the leading `YYYY-MM-DD` when the timestamp does not parse.
fn started_date(started: &str, offset: FixedOffset) -> Option<NaiveDate> {
    DateTime::parse_from_str(started, STARTED_PARSE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(started))
        .map(|started| started.with_timezone(&offset).date_naive())
        .ok()
        .or_else(|| {
            started
                .get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}
