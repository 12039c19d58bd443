//! Gap compaction.
//!
//! Sorts sessions by start, buckets them by calendar day and replays each
//! day back-to-back from its first start. Only explicit breaks, lunches
//! and resurfacings remain as non-skating time.

use chrono::NaiveDateTime;

use crate::models::Session;

/// Removes idle time between sessions within each day.
pub fn compact(mut sessions: Vec<Session>) -> Vec<Session> {
    sessions.sort_by_key(|s| s.start);

    let mut compacted = Vec::with_capacity(sessions.len());
    let mut day = None;
    let mut cursor = NaiveDateTime::default();

    for session in sessions {
        let date = session.start.date();
        if day != Some(date) {
            day = Some(date);
            cursor = session.start;
        }
        let placed = session.placed_at(cursor);
        cursor = placed.end;
        compacted.push(placed);
    }

    compacted
}
