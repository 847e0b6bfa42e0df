//! Core data types shared by the source, the aggregator and the destination.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A raw unit of tracked time from the activity source.
///
/// `note` carries the ticket key (or free text) the user typed while tracking.
/// `from` and `to` are epoch seconds; `to >= from` is expected but not checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityInterval {
    pub note: String,
    pub from: i64,
    pub to: i64,
}

impl ActivityInterval {
    pub fn new(note: impl Into<String>, from: i64, to: i64) -> Self {
        Self {
            note: note.into(),
            from,
            to,
        }
    }
}

/// Total clipped seconds for one ticket key within one day window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketTotal {
    pub ticket_key: String,
    pub seconds: i64,
}

/// An aggregated worklog awaiting confirmation before it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewItem {
    pub date: NaiveDate,
    pub ticket_key: String,
    pub seconds: i64,
}

impl PreviewItem {
    /// Whole minutes, truncated.
    pub const fn minutes(&self) -> i64 {
        self.seconds / 60
    }
}

/// Opaque account scope on the activity source (the employment id).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeId(String);

impl ScopeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A worklog that already exists at the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingWorklog {
    /// Account id of the author, when the destination reported one.
    pub author_account_id: Option<String>,
    /// Start timestamp exactly as the destination returned it.
    pub started: String,
}

/// Payload for a worklog to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorklog {
    pub time_spent_seconds: i64,
    /// `YYYY-MM-DDTHH:MM:SS.sss+HHMM`, see [`crate::format_started`].
    pub started: String,
}

/// Result of posting one preview item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    Written,
    SkippedDuplicate,
    SkippedMissingTarget,
    /// The destination rejected the write or could not be reached.
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_worklog_serializes_camel_case() {
        let worklog = NewWorklog {
            time_spent_seconds: 3600,
            started: "2024-01-15T09:00:00.000+0000".to_string(),
        };
        let json = serde_json::to_value(&worklog).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "timeSpentSeconds": 3600,
                "started": "2024-01-15T09:00:00.000+0000",
            })
        );
    }

    #[test]
    fn preview_item_minutes_truncate() {
        let item = PreviewItem {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            ticket_key: "PROJ-1".to_string(),
            seconds: 179,
        };
        assert_eq!(item.minutes(), 2);
    }

    #[test]
    fn scope_id_displays_raw_value() {
        assert_eq!(ScopeId::new("4242").to_string(), "4242");
    }
}
