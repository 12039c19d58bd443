//! Session model.
//!
//! A session is one atomic timed activity on the ice. Sessions are first
//! generated with a duration only; the placement engine assigns real
//! start and end times.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{add_secs, ProgramSegment};

/// Name of the invisible preparation buffer between a warmup and the first skater.
pub const PREP_BUFFER_NAME: &str = "(Förb.)";

/// Name of the lunch break.
pub const LUNCH_NAME: &str = "Lunch (incl. ice maintenance)";

/// Name of an ice-resurfacing session.
pub const RESURFACING_NAME: &str = "Ice resurfacing";

/// Kind of session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Warmup,
    Performance,
    Judging,
    Resurfacing,
    Break,
}

/// An atomic timed activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique identifier.
    pub id: String,
    /// Kind of session.
    #[serde(rename = "type")]
    pub session_type: SessionType,
    /// Start time.
    pub start: NaiveDateTime,
    /// End time.
    pub end: NaiveDateTime,
    /// Duration (s).
    pub duration: i64,
    /// Owning class id (empty for lunch and resurfacing).
    pub class_id: String,
    /// Owning class display name.
    pub class_name: String,
    /// Warmup-group index; glues warmup, prep buffer and performances into one block.
    pub group_index: Option<u32>,
    /// Skaters on the ice (warmups only).
    pub skater_count: Option<usize>,
    /// Performing skater (performances only).
    pub skater_id: Option<String>,
    /// Performing skater's display name.
    pub skater_name: Option<String>,
    /// Program segment of the owning class.
    pub segment: ProgramSegment,
    /// Display name.
    pub name: String,
    /// Ids of sessions overlapping this one.
    #[serde(default)]
    pub conflicts: Vec<String>,
}

impl Session {
    /// Creates a session of the given length. Start and end are provisional.
    pub fn new(session_type: SessionType, name: impl Into<String>, duration: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_type,
            start: NaiveDateTime::default(),
            end: add_secs(NaiveDateTime::default(), duration).unwrap_or(NaiveDateTime::MAX),
            duration,
            class_id: String::new(),
            class_name: String::new(),
            group_index: None,
            skater_count: None,
            skater_id: None,
            skater_name: None,
            segment: ProgramSegment::Unspecified,
            name: name.into(),
            conflicts: Vec::new(),
        }
    }

    /// A lunch break.
    pub fn lunch(duration: i64) -> Self {
        Self::new(SessionType::Break, LUNCH_NAME, duration)
    }

    /// An ice resurfacing.
    pub fn resurfacing(duration: i64) -> Self {
        Self::new(SessionType::Resurfacing, RESURFACING_NAME, duration)
    }

    /// Sets the owning class.
    pub fn with_class(
        mut self,
        class_id: impl Into<String>,
        class_name: impl Into<String>,
        segment: ProgramSegment,
    ) -> Self {
        self.class_id = class_id.into();
        self.class_name = class_name.into();
        self.segment = segment;
        self
    }

    /// Sets the warmup-group index.
    pub fn with_group(mut self, index: u32) -> Self {
        self.group_index = Some(index);
        self
    }

    /// Sets the on-ice skater count.
    pub fn with_skater_count(mut self, count: usize) -> Self {
        self.skater_count = Some(count);
        self
    }

    /// Sets the performing skater.
    pub fn with_skater(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.skater_id = Some(id.into());
        self.skater_name = Some(name.into());
        self
    }

    /// Places this session at `start`, keeping its duration.
    ///
    /// An end past the representable range saturates.
    pub fn placed_at(mut self, start: NaiveDateTime) -> Self {
        self.start = start;
        self.end = add_secs(start, self.duration).unwrap_or(NaiveDateTime::MAX);
        self
    }

    /// Whether this is the invisible preparation buffer.
    #[inline]
    pub fn is_prep_buffer(&self) -> bool {
        self.session_type == SessionType::Break && self.name == PREP_BUFFER_NAME
    }

    /// Whether this session resets ice capacity (resurfacing or a real break).
    #[inline]
    pub fn resets_ice(&self) -> bool {
        match self.session_type {
            SessionType::Resurfacing => true,
            SessionType::Break => !self.is_prep_buffer(),
            _ => false,
        }
    }

    /// Whether this session is skating (warmup or performance).
    #[inline]
    pub fn is_skating(&self) -> bool {
        matches!(self.session_type, SessionType::Warmup | SessionType::Performance)
    }

    /// Whether two sessions overlap in time.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 8)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_placed_at_keeps_duration() {
        let s = Session::new(SessionType::Warmup, "Warmup", 360).placed_at(at(9, 0));
        assert_eq!(s.end, at(9, 6));
        assert_eq!(s.duration, 360);
    }

    #[test]
    fn test_end_saturates_out_of_range() {
        let s = Session::new(SessionType::Performance, "x", i64::MAX).placed_at(at(9, 0));
        assert_eq!(s.end, NaiveDateTime::MAX);
    }

    #[test]
    fn test_ice_reset_kinds() {
        assert!(Session::resurfacing(900).resets_ice());
        assert!(Session::lunch(3600).resets_ice());
        let prep = Session::new(SessionType::Break, PREP_BUFFER_NAME, 30);
        assert!(prep.is_prep_buffer());
        assert!(!prep.resets_ice());
        assert!(!Session::new(SessionType::Performance, "x", 400).resets_ice());
    }

    #[test]
    fn test_skating_kinds() {
        assert!(Session::new(SessionType::Warmup, "w", 360).is_skating());
        assert!(Session::new(SessionType::Performance, "p", 400).is_skating());
        assert!(!Session::new(SessionType::Judging, "j", 140).is_skating());
        assert!(!Session::lunch(3600).is_skating());
    }

    #[test]
    fn test_overlap() {
        let a = Session::new(SessionType::Performance, "a", 600).placed_at(at(9, 0));
        let b = Session::new(SessionType::Performance, "b", 600).placed_at(at(9, 5));
        let c = Session::new(SessionType::Performance, "c", 600).placed_at(at(9, 10));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_type_serde() {
        let s = Session::new(SessionType::Resurfacing, "r", 900);
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains(r#""type":"resurfacing""#));
    }
}
