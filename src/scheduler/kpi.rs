//! Schedule quality metrics (KPIs).
//!
//! Computes summary indicators from a generated schedule and the windows
//! it was placed into.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan | Last end minus first start |
//! | Skating time | Warmups plus performances |
//! | Ice maintenance | Resurfacing time |
//! | Break time | Lunches and preparation buffers |
//! | Efficiency | Skating and judging time / makespan |
//! | Window utilization | Scheduled time / total window time |
//! | Dropped blocks | Schedule-full warnings |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::BTreeSet;

use crate::models::{Schedule, SessionType, TimeWindow, ViolationType};

/// Schedule performance indicators.
///
/// All time values are in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleKpi {
    /// Last end minus first start (s).
    pub makespan_secs: i64,
    /// Warmup time (s).
    pub warmup_secs: i64,
    /// Performance time including introduction and judging (s).
    pub performance_secs: i64,
    /// Resurfacing time (s).
    pub resurfacing_secs: i64,
    /// Lunch and buffer time (s).
    pub break_secs: i64,
    /// Number of performances.
    pub performance_count: usize,
    /// Number of distinct calendar days with sessions.
    pub days_used: usize,
    /// Skating and judging time / makespan (0.0..1.0).
    pub efficiency: f64,
    /// Scheduled time / total window time (0.0..1.0).
    pub window_utilization: f64,
    /// Blocks dropped for lack of space.
    pub dropped_blocks: usize,
    /// Short/free ordering and recovery findings.
    pub rule_violations: usize,
}

impl ScheduleKpi {
    /// Computes KPIs from a schedule and its placement windows.
    pub fn calculate(schedule: &Schedule, windows: &[TimeWindow]) -> Self {
        let warmup_secs = schedule.time_in(SessionType::Warmup);
        let performance_secs = schedule.time_in(SessionType::Performance);
        let judging_secs = schedule.time_in(SessionType::Judging);
        let resurfacing_secs = schedule.time_in(SessionType::Resurfacing);
        let break_secs = schedule.time_in(SessionType::Break);
        let makespan_secs = schedule.makespan_secs();

        let performance_count = schedule
            .sessions
            .iter()
            .filter(|s| s.session_type == SessionType::Performance)
            .count();
        let days_used = schedule
            .sessions
            .iter()
            .map(|s| s.start.date())
            .collect::<BTreeSet<_>>()
            .len();

        let efficiency = if makespan_secs > 0 {
            (warmup_secs + performance_secs + judging_secs) as f64 / makespan_secs as f64
        } else {
            0.0
        };

        let capacity: i64 = windows.iter().map(|w| w.duration().num_seconds()).sum();
        let scheduled =
            warmup_secs + performance_secs + judging_secs + resurfacing_secs + break_secs;
        let window_utilization = if capacity > 0 {
            scheduled as f64 / capacity as f64
        } else {
            0.0
        };

        let warnings = &schedule.metadata.warnings;
        let dropped_blocks = warnings
            .iter()
            .filter(|w| w.violation_type == ViolationType::ScheduleFull)
            .count();

        Self {
            makespan_secs,
            warmup_secs,
            performance_secs,
            resurfacing_secs,
            break_secs,
            performance_count,
            days_used,
            efficiency,
            window_utilization,
            dropped_blocks,
            rule_violations: warnings.len() - dropped_blocks,
        }
    }

    /// Whether every skater was placed and no short/free rule was broken.
    pub fn is_complete(&self) -> bool {
        self.dropped_blocks == 0 && self.rule_violations == 0
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_days: usize, min_efficiency: f64) -> bool {
        self.is_complete() && self.days_used <= max_days && self.efficiency >= min_efficiency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Session, Violation};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 8)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn sample() -> Schedule {
        Schedule::new(
            "E1",
            vec![
                Session::new(SessionType::Warmup, "w", 600).placed_at(at(8, 0)),
                Session::new(SessionType::Performance, "p1", 600).placed_at(at(8, 10)),
                Session::new(SessionType::Performance, "p2", 600).placed_at(at(8, 20)),
                Session::resurfacing(600).placed_at(at(8, 30)),
            ],
        )
    }

    #[test]
    fn test_kpi_basic() {
        let windows = vec![TimeWindow::new(at(8, 0), at(9, 20))];
        let kpi = ScheduleKpi::calculate(&sample(), &windows);
        assert_eq!(kpi.makespan_secs, 2400);
        assert_eq!(kpi.performance_count, 2);
        assert_eq!(kpi.resurfacing_secs, 600);
        assert_eq!(kpi.days_used, 1);
        assert!((kpi.efficiency - 0.75).abs() < 1e-10);
        assert!((kpi.window_utilization - 0.5).abs() < 1e-10);
        assert!(kpi.is_complete());
        assert!(kpi.meets_thresholds(1, 0.7));
        assert!(!kpi.meets_thresholds(1, 0.8));
    }

    #[test]
    fn test_kpi_counts_warnings() {
        let schedule = sample().with_warnings(vec![
            Violation::schedule_full("C1", "Senior"),
            Violation::free_before_short("S1", "late short"),
        ]);
        let kpi = ScheduleKpi::calculate(&schedule, &[]);
        assert_eq!(kpi.dropped_blocks, 1);
        assert_eq!(kpi.rule_violations, 1);
        assert_eq!(kpi.window_utilization, 0.0);
        assert!(!kpi.is_complete());
    }

    #[test]
    fn test_kpi_empty() {
        let kpi = ScheduleKpi::calculate(&Schedule::new("E1", Vec::new()), &[]);
        assert_eq!(kpi.makespan_secs, 0);
        assert_eq!(kpi.days_used, 0);
        assert_eq!(kpi.efficiency, 0.0);
    }
}
