//! Schedule cost for class-order search.
//!
//! # Cost
//!
//! All terms are in milliseconds so that annealing temperatures have a
//! fixed scale:
//!
//! - makespan (first start to last end)
//! - [`HARD_VIOLATION_PENALTY_MS`] per dropped block and per free-before-short
//!   skater, and the same penalty scaled by the fractional shortfall for
//!   each same-day recovery gap under four hours
//! - [`SOFT_VIOLATION_PENALTY_MS`] per soft-rule violation
//!
//! Soft rules are checked per performance: a young skater starting at or
//! after the late cutoff, or a non-local skater starting at or after the
//! local cutoff on the recovery day.

use chrono::Datelike;

use crate::models::{CompetitionData, Schedule, SessionType, SoftRules, ViolationType};

/// Penalty per hard violation (24 h).
pub const HARD_VIOLATION_PENALTY_MS: f64 = 86_400_000.0;

/// Penalty per soft violation (30 min).
pub const SOFT_VIOLATION_PENALTY_MS: f64 = 1_800_000.0;

/// Cost of one schedule, split by term.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostBreakdown {
    /// First start to last end (ms).
    pub makespan_ms: f64,
    /// Dropped blocks, ordering and recovery penalties (ms).
    pub hard_penalty_ms: f64,
    /// Soft-rule penalties (ms).
    pub soft_penalty_ms: f64,
    /// Number of soft-rule violations.
    pub soft_violations: usize,
}

impl CostBreakdown {
    /// Sum of all terms; lower is better.
    #[inline]
    pub fn total(&self) -> f64 {
        self.makespan_ms + self.hard_penalty_ms + self.soft_penalty_ms
    }
}

/// Evaluates a generated schedule.
pub fn evaluate(
    schedule: &Schedule,
    data: &CompetitionData,
    soft_rules: &SoftRules,
) -> CostBreakdown {
    let makespan_ms = schedule.makespan_secs() as f64 * 1000.0;

    let hard_penalty_ms = schedule
        .metadata
        .warnings
        .iter()
        .map(|w| match w.violation_type {
            ViolationType::ScheduleFull => HARD_VIOLATION_PENALTY_MS,
            ViolationType::FreeBeforeShort | ViolationType::InsufficientRecovery => {
                HARD_VIOLATION_PENALTY_MS * w.weight
            }
        })
        .sum();

    let soft_violations = if soft_rules.any_enabled() {
        count_soft_violations(schedule, data, soft_rules)
    } else {
        0
    };

    CostBreakdown {
        makespan_ms,
        hard_penalty_ms,
        soft_penalty_ms: soft_violations as f64 * SOFT_VIOLATION_PENALTY_MS,
        soft_violations,
    }
}

fn count_soft_violations(schedule: &Schedule, data: &CompetitionData, rules: &SoftRules) -> usize {
    let mut count = 0;
    for session in &schedule.sessions {
        if session.session_type != SessionType::Performance {
            continue;
        }
        let Some(skater_id) = session.skater_id.as_deref() else {
            continue;
        };
        let Some(skater) = data.skater(skater_id) else {
            continue;
        };
        let date = session.start.date();
        let time = session.start.time();

        if rules.avoid_young_on_late_slots
            && time >= rules.young_latest_time
            && skater.age_on(date) <= rules.young_max_age
        {
            count += 1;
        }
        if rules.prefer_local_on_recovery_day
            && date.weekday() == rules.recovery_day
            && time >= rules.local_after_time
            && !rules.is_local(skater_id)
        {
            count += 1;
        }
    }
    count
}
