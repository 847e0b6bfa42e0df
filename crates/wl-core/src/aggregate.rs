//! Interval-to-daily-total aggregation.
//!
//! # Algorithm Summary
//!
//! 1. Drop intervals whose note is empty or whitespace-only
//! 2. Drop intervals that do not overlap the day window
//! 3. Clip each remaining interval to the window
//! 4. Sum clipped seconds per exact note value, in first-seen order

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::types::{ActivityInterval, TicketTotal};
use crate::window::DayWindow;

/// Groups `intervals` into per-ticket totals for a single day window.
///
/// Notes are compared byte for byte; `"PROJ-1"` and `" PROJ-1"` are distinct
/// tickets. The output order is the order in which each note first appears.
pub fn aggregate(intervals: &[ActivityInterval], window: DayWindow) -> Vec<TicketTotal> {
    let mut totals: Vec<TicketTotal> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for interval in intervals {
        if interval.note.trim().is_empty() {
            continue;
        }
        let Some(seconds) = window.overlap(interval.from, interval.to) else {
            continue;
        };

        match positions.entry(interval.note.as_str()) {
            Entry::Occupied(slot) => totals[*slot.get()].seconds += seconds,
            Entry::Vacant(slot) => {
                slot.insert(totals.len());
                totals.push(TicketTotal {
                    ticket_key: interval.note.clone(),
                    seconds,
                });
            }
        }
    }

    totals
}
