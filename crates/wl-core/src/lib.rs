//! Core domain logic for syncing tracked time into worklogs.
//!
//! This crate contains:
//! - Aggregation: grouping raw activity intervals into per-day ticket totals
//! - Day windows: calendar days expressed in a fixed UTC offset
//! - Posting: idempotently writing one worklog per ticket, day and author
//! - Orchestration: preview and commit runs that report progress as log events

mod aggregate;
pub mod events;
pub mod ports;
mod sync;
mod types;
mod window;
mod writer;

#[cfg(test)]
mod testing;

pub use aggregate::aggregate;
pub use events::{EventSink, EventStream, LogEvent, Severity, event_channel};
pub use ports::{ActivitySource, DestinationError, SourceError, WorklogDestination};
pub use sync::{CommitSummary, SyncError, SyncSettings, Synchronizer};
pub use types::{
    ActivityInterval, ExistingWorklog, NewWorklog, PostOutcome, PreviewItem, ScopeId, TicketTotal,
};
pub use window::{DateRange, DayBoundary, DayWindow, OffsetError, RangeError, offset_from_minutes};
pub use writer::{WorklogWriter, format_started};
