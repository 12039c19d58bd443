//! Availability windows.
//!
//! The venue is usable only inside configured [`AvailabilityBlock`]s: one
//! `[date, start, end]` per day. Blocks are converted to absolute
//! [`TimeWindow`]s, sorted by start, and consumed in order by the placement
//! engine. When no blocks are configured, a fallback of N identical days is
//! synthesized from the global start/end hours.
//!
//! # Time Model
//! Wall-clock local time (`NaiveDateTime`), second resolution. Windows are
//! half-open `[start, end)`.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A single day's usable ice time as configured by the organizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityBlock {
    /// Block identifier.
    #[serde(default)]
    pub id: String,
    /// Calendar day.
    pub date: NaiveDate,
    /// Opening time.
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    /// Closing time.
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

impl AvailabilityBlock {
    /// Creates a block.
    pub fn new(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            id: format!("{date} {start_time}-{end_time}"),
            date,
            start_time,
            end_time,
        }
    }

    /// Absolute window for this block.
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(
            self.date.and_time(self.start_time),
            self.date.and_time(self.end_time),
        )
        .with_label(format!(
            "{} ({}-{})",
            self.date,
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        ))
    }
}

/// A time interval [start, end).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    /// Interval start (inclusive).
    pub start: NaiveDateTime,
    /// Interval end (exclusive).
    pub end: NaiveDateTime,
    /// Display label.
    pub label: String,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            label: String::new(),
        }
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Length of this window.
    #[inline]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether a timestamp falls within this window.
    #[inline]
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        time >= self.start && time < self.end
    }

    /// Whether an interval ending at `end` still fits (end is inclusive here).
    #[inline]
    pub fn fits_until(&self, end: NaiveDateTime) -> bool {
        end <= self.end
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// `time + secs`, or `None` when the result is out of range.
pub fn add_secs(time: NaiveDateTime, secs: i64) -> Option<NaiveDateTime> {
    Duration::try_seconds(secs).and_then(|d| time.checked_add_signed(d))
}

/// Absolute windows for the configured blocks, sorted by start.
pub fn windows_from_blocks(blocks: &[AvailabilityBlock]) -> Vec<TimeWindow> {
    let mut windows: Vec<TimeWindow> = blocks.iter().map(AvailabilityBlock::window).collect();
    windows.sort_by_key(|w| w.start);
    windows
}

/// `days` identical windows from `start_date`, `start_hour:00` to `end_hour:00`.
///
/// Returns an empty list when the hours do not form a valid day.
pub fn fallback_windows(
    start_date: NaiveDate,
    days: u32,
    start_hour: u32,
    end_hour: u32,
) -> Vec<TimeWindow> {
    let (Some(open), Some(close)) = (
        NaiveTime::from_hms_opt(start_hour, 0, 0),
        NaiveTime::from_hms_opt(end_hour, 0, 0),
    ) else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }

    (0..days)
        .filter_map(|offset| start_date.checked_add_signed(Duration::days(i64::from(offset))))
        .enumerate()
        .map(|(i, date)| {
            TimeWindow::new(date.and_time(open), date.and_time(close))
                .with_label(format!("Day {}", i + 1))
        })
        .collect()
}

/// Serde adapter for "HH:MM" times of day ("HH:MM:SS" also accepted).
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes as "HH:MM".
    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    /// Parses "HH:MM" or "HH:MM:SS".
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&text, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&text, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}
