//! Schedule (solution) model.
//!
//! A schedule is the ordered list of placed sessions plus metadata. It is
//! created fresh on every generation and may then be edited by hand;
//! each edit re-runs overlap detection.
//!
//! Scheduling shortfalls (a block that did not fit, a skater performing
//! free before short) are carried as [`Violation`]s in the metadata, never
//! as errors.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{Session, SessionType};

/// A generated schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// Schedule identifier.
    pub id: String,
    /// Source competition (event) id.
    pub competition_id: String,
    /// Sessions ordered by start time.
    pub sessions: Vec<Session>,
    /// Timestamps, totals and warnings.
    pub metadata: ScheduleMetadata,
}

/// Schedule bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMetadata {
    /// Creation time (UTC).
    pub created_at: DateTime<Utc>,
    /// Last edit time (UTC).
    pub updated_at: DateTime<Utc>,
    /// Incremented on every edit.
    pub version: u32,
    /// Makespan (s).
    pub total_duration: i64,
    /// Skating and judging time divided by makespan (0.0..1.0).
    pub efficiency: f64,
    /// Schedule-full drops and short/free findings.
    pub warnings: Vec<Violation>,
}

/// A scheduling shortfall or rule violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related entity id (class or skater).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
    /// Penalty weight; 1.0 for a full violation, fractional for a partial recovery shortfall.
    pub weight: f64,
}

/// Classification of violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// A block could not be placed in any remaining window; its skaters are missing.
    ScheduleFull,
    /// A skater's free program starts before their short program.
    FreeBeforeShort,
    /// Short and free on the same day with less than the minimum gap between them.
    InsufficientRecovery,
}

impl Violation {
    /// A block that did not fit.
    pub fn schedule_full(unit_id: impl Into<String>, unit_name: &str) -> Self {
        Self {
            violation_type: ViolationType::ScheduleFull,
            entity_id: unit_id.into(),
            message: format!("Could not schedule block from {unit_name} - Schedule Full"),
            severity: 100,
            weight: 1.0,
        }
    }

    /// Free program before short program.
    pub fn free_before_short(skater_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::FreeBeforeShort,
            entity_id: skater_id.into(),
            message: message.into(),
            severity: 95,
            weight: 1.0,
        }
    }

    /// Recovery gap too short; `weight` is the fractional shortfall.
    pub fn insufficient_recovery(
        skater_id: impl Into<String>,
        message: impl Into<String>,
        weight: f64,
    ) -> Self {
        Self {
            violation_type: ViolationType::InsufficientRecovery,
            entity_id: skater_id.into(),
            message: message.into(),
            severity: 80,
            weight,
        }
    }

    /// Whether this violation dropped skaters from the schedule.
    pub fn is_schedule_full(&self) -> bool {
        self.violation_type == ViolationType::ScheduleFull
    }
}

impl Schedule {
    /// Creates a schedule from placed sessions and computes its metadata.
    pub fn new(competition_id: impl Into<String>, sessions: Vec<Session>) -> Self {
        let now = Utc::now();
        let mut schedule = Self {
            id: uuid::Uuid::new_v4().to_string(),
            competition_id: competition_id.into(),
            sessions,
            metadata: ScheduleMetadata {
                created_at: now,
                updated_at: now,
                version: 1,
                total_duration: 0,
                efficiency: 0.0,
                warnings: Vec::new(),
            },
        };
        schedule.refresh();
        schedule
    }

    /// Adds warnings.
    pub fn with_warnings(mut self, warnings: Vec<Violation>) -> Self {
        self.metadata.warnings.extend(warnings);
        self
    }

    /// Whether nothing was dropped and no violation was found.
    pub fn is_valid(&self) -> bool {
        self.metadata.warnings.is_empty()
    }

    /// Earliest session start.
    pub fn first_start(&self) -> Option<NaiveDateTime> {
        self.sessions.iter().map(|s| s.start).min()
    }

    /// Latest session end.
    pub fn last_end(&self) -> Option<NaiveDateTime> {
        self.sessions.iter().map(|s| s.end).max()
    }

    /// Makespan: latest end minus earliest start (s). Spans overnight gaps.
    pub fn makespan_secs(&self) -> i64 {
        match (self.first_start(), self.last_end()) {
            (Some(start), Some(end)) => (end - start).num_seconds(),
            _ => 0,
        }
    }

    /// Total time of sessions of one type (s).
    pub fn time_in(&self, session_type: SessionType) -> i64 {
        self.sessions
            .iter()
            .filter(|s| s.session_type == session_type)
            .map(|s| s.duration)
            .sum()
    }

    /// Sessions owned by a class.
    pub fn sessions_for_class(&self, class_id: &str) -> Vec<&Session> {
        self.sessions.iter().filter(|s| s.class_id == class_id).collect()
    }

    /// Performance sessions of a skater.
    pub fn performances_for_skater(&self, skater_id: &str) -> Vec<&Session> {
        self.sessions
            .iter()
            .filter(|s| {
                s.session_type == SessionType::Performance
                    && s.skater_id.as_deref() == Some(skater_id)
            })
            .collect()
    }

    /// Ids of all sessions overlapping another session.
    pub fn conflicts(&self) -> Vec<String> {
        detect_conflicts(&self.sessions)
    }

    /// Replaces the session with the same id. Returns `false` if absent.
    pub fn update_session(&mut self, session: Session) -> bool {
        let Some(slot) = self.sessions.iter_mut().find(|s| s.id == session.id) else {
            return false;
        };
        *slot = session;
        self.touch();
        true
    }

    /// Adds a session.
    pub fn add_session(&mut self, session: Session) {
        self.sessions.push(session);
        self.touch();
    }

    /// Removes a session by id. Returns the removed session.
    pub fn remove_session(&mut self, session_id: &str) -> Option<Session> {
        let pos = self.sessions.iter().position(|s| s.id == session_id)?;
        let removed = self.sessions.remove(pos);
        self.touch();
        Some(removed)
    }

    fn touch(&mut self) {
        self.metadata.updated_at = Utc::now();
        self.metadata.version += 1;
        self.refresh();
    }

    /// Re-sorts sessions, recomputes totals and marks conflicting sessions.
    pub fn refresh(&mut self) {
        self.sessions.sort_by_key(|s| s.start);

        let conflicting: HashSet<String> = detect_conflicts(&self.sessions).into_iter().collect();
        for i in 0..self.sessions.len() {
            let conflicts = if conflicting.contains(&self.sessions[i].id) {
                let me = &self.sessions[i];
                self.sessions
                    .iter()
                    .filter(|o| o.id != me.id && o.overlaps(me))
                    .map(|o| o.id.clone())
                    .collect()
            } else {
                Vec::new()
            };
            self.sessions[i].conflicts = conflicts;
        }

        let makespan = self.makespan_secs();
        let active = self.time_in(SessionType::Warmup)
            + self.time_in(SessionType::Performance)
            + self.time_in(SessionType::Judging);
        self.metadata.total_duration = makespan;
        self.metadata.efficiency = if makespan > 0 {
            active as f64 / makespan as f64
        } else {
            0.0
        };
    }
}

/// Ids of sessions that overlap at least one other session.
///
/// Sorts by start and scans forward from each session until the next
/// start is at or after its end.
pub fn detect_conflicts(sessions: &[Session]) -> Vec<String> {
    if sessions.len() < 2 {
        return Vec::new();
    }
    let mut sorted: Vec<&Session> = sessions.iter().collect();
    sorted.sort_by_key(|s| s.start);

    let mut seen = HashSet::new();
    let mut conflicts = Vec::new();
    for (i, current) in sorted.iter().enumerate() {
        for next in &sorted[i + 1..] {
            if next.start >= current.end {
                break;
            }
            for id in [&current.id, &next.id] {
                if seen.insert(id.as_str()) {
                    conflicts.push(id.clone());
                }
            }
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProgramSegment;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 8)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn perf(name: &str, start: NaiveDateTime, secs: i64) -> Session {
        Session::new(SessionType::Performance, name, secs).placed_at(start)
    }

    fn sample_schedule() -> Schedule {
        Schedule::new(
            "E1",
            vec![
                Session::new(SessionType::Warmup, "w", 600).placed_at(at(9, 0)),
                perf("a", at(9, 10), 600),
                Session::resurfacing(1200).placed_at(at(9, 20)),
            ],
        )
    }

    #[test]
    fn test_makespan_and_efficiency() {
        let s = sample_schedule();
        assert_eq!(s.makespan_secs(), 40 * 60);
        assert_eq!(s.metadata.total_duration, 2400);
        assert!((s.metadata.efficiency - 0.5).abs() < 1e-10);
        assert!(s.conflicts().is_empty());
        assert!(s.is_valid());
    }

    #[test]
    fn test_empty_schedule() {
        let s = Schedule::new("E1", Vec::new());
        assert_eq!(s.makespan_secs(), 0);
        assert_eq!(s.metadata.efficiency, 0.0);
        assert!(s.first_start().is_none());
    }

    #[test]
    fn test_detect_conflicts_long_session() {
        // one long session overlapping two short ones
        let sessions = vec![
            perf("long", at(9, 0), 3600),
            perf("b", at(9, 10), 300),
            perf("c", at(9, 30), 300),
            perf("d", at(10, 0), 300),
        ];
        let conflicts = detect_conflicts(&sessions);
        assert_eq!(conflicts.len(), 3);
        assert!(!conflicts.contains(&sessions[3].id));
    }

    #[test]
    fn test_update_session_marks_conflict() {
        let mut s = sample_schedule();
        let mut moved = s.sessions[1].clone();
        moved = moved.placed_at(at(9, 5));
        assert!(s.update_session(moved.clone()));
        assert_eq!(s.metadata.version, 2);

        let updated = s.sessions.iter().find(|x| x.id == moved.id).unwrap();
        assert_eq!(updated.conflicts.len(), 1);
        assert_eq!(s.conflicts().len(), 2);
    }

    #[test]
    fn test_add_and_remove_session() {
        let mut s = sample_schedule();
        let extra = perf("late", at(12, 0), 600);
        let id = extra.id.clone();
        s.add_session(extra);
        assert_eq!(s.sessions.len(), 4);
        assert_eq!(s.last_end(), Some(at(12, 10)));

        assert!(s.remove_session(&id).is_some());
        assert!(s.remove_session(&id).is_none());
        assert_eq!(s.sessions.len(), 3);
        assert!(!s.update_session(perf("ghost", at(8, 0), 10)));
    }

    #[test]
    fn test_lookup_by_class_and_skater() {
        let short = ProgramSegment::Short;
        let s = Schedule::new(
            "E1",
            vec![
                Session::new(SessionType::Warmup, "w", 600)
                    .with_class("K1", "Minior", short)
                    .placed_at(at(9, 0)),
                perf("a", at(9, 10), 300)
                    .with_class("K1", "Minior", short)
                    .with_skater("S1", "Anna Berg"),
                perf("b", at(9, 15), 300)
                    .with_class("K2", "Junior", short)
                    .with_skater("S2", "Bo Ek"),
                perf("a2", at(9, 20), 300)
                    .with_class("K2", "Junior", short)
                    .with_skater("S1", "Anna Berg"),
            ],
        );

        let k1 = s.sessions_for_class("K1");
        assert_eq!(k1.len(), 2);
        assert_eq!(k1[0].session_type, SessionType::Warmup);
        assert!(s.sessions_for_class("K9").is_empty());

        let anna: Vec<&str> = s
            .performances_for_skater("S1")
            .iter()
            .map(|p| p.class_id.as_str())
            .collect();
        assert_eq!(anna, vec!["K1", "K2"]);
        assert!(s.performances_for_skater("S3").is_empty());
    }

    #[test]
    fn test_violation_factories() {
        let v = Violation::schedule_full("C1", "Seniorer A & Seniorer B");
        assert!(v.is_schedule_full());
        assert_eq!(
            v.message,
            "Could not schedule block from Seniorer A & Seniorer B - Schedule Full"
        );

        let r = Violation::insufficient_recovery("S1", "gap", 0.25);
        assert_eq!(r.violation_type, ViolationType::InsufficientRecovery);
        assert!((r.weight - 0.25).abs() < 1e-10);
    }
}
