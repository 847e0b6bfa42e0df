//! Calendar days and date ranges in a fixed UTC offset.
//!
//! Day boundaries never consult the machine's local timezone: the same
//! configured offset yields the same windows on every host.

use chrono::{FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SECONDS_PER_DAY: i64 = 86_400;

/// Where a day window ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DayBoundary {
    /// End at 23:59:59 local time.
    ///
    /// The overlap test is exclusive at the end, so activity during the last
    /// second of each day is not attributed to any day.
    #[default]
    EndOfDaySecond,
    /// End at the next local midnight. Consecutive days tile without gaps.
    Midnight,
}

/// One calendar day as epoch seconds, `[start, end)` for overlap purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: i64,
    pub end: i64,
}

impl DayWindow {
    /// Builds the window for `date` as observed in `offset`.
    pub fn for_date(date: NaiveDate, offset: FixedOffset, boundary: DayBoundary) -> Self {
        let start = date.and_time(NaiveTime::MIN).and_utc().timestamp()
            - i64::from(offset.local_minus_utc());
        let end = match boundary {
            DayBoundary::EndOfDaySecond => start + SECONDS_PER_DAY - 1,
            DayBoundary::Midnight => start + SECONDS_PER_DAY,
        };
        Self { start, end }
    }

    /// Seconds of `[from, to)` that fall inside the window.
    ///
    /// Returns `None` when the interval does not overlap at all, which also
    /// covers zero-length intervals.
    pub fn overlap(&self, from: i64, to: i64) -> Option<i64> {
        let seconds = to.min(self.end) - from.max(self.start);
        (seconds > 0).then_some(seconds)
    }
}

/// Errors building a fixed offset from minutes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("timezone offset must be strictly between -1440 and 1440 minutes, got {minutes}")]
pub struct OffsetError {
    pub minutes: i32,
}

/// Converts a whole-minute UTC offset into a [`FixedOffset`].
pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, OffsetError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or(OffsetError { minutes })
}

/// Errors building a [`DateRange`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("range end {end} is before start {start}")]
pub struct RangeError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if end < start {
            return Err(RangeError { start, end });
        }
        Ok(Self { start, end })
    }

    pub const fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Every date in the range, in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |date| *date <= end)
    }
}
