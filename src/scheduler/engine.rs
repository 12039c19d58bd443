//! Schedule generation pipeline.
//!
//! # Algorithm
//!
//! 1. Drop ignored and empty classes, then order them (custom order, else
//!    short before free, then by name).
//! 2. Greedily merge adjacent small classes into scheduling units.
//! 3. For each unit in order, generate its sessions, split them into
//!    blocks and place every block (lunch, resurfacing, window overflow).
//! 4. Compact each day, then check short/free ordering and recovery.
//!
//! Blocks of different units never interleave. Placement shortfalls and
//! validator findings become warnings on the schedule.
//!
//! # Complexity
//! O(b * w) placement steps for b blocks and w windows, plus
//! O(c^2) for merging c classes in the worst case.

use log::{debug, info, warn};

use crate::error::{Result, ScheduleError};
use crate::models::{
    CompetitionData, Exclusions, RuleSet, Schedule, SchedulerSettings, TimeWindow,
};
use crate::validation::{validate_competition, validate_schedule, validate_settings};

use super::compact::compact;
use super::grouping::build_units;
use super::ordering::{order_classes, schedulable_classes};
use super::placement::{build_blocks, Placer};
use super::sessions::generate_unit_sessions;

/// Builds schedules from competition data under fixed settings.
///
/// Settings are validated once on construction; every later generation
/// call is infallible apart from competition-data validation.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use skate_schedule::models::{
///     CompetitionData, Competition, SchedulerSettings, Skater, SkatingClass,
/// };
/// use skate_schedule::scheduler::ScheduleGenerator;
///
/// let skaters = (0..4)
///     .map(|i| Skater::new(format!("S{i}"), "Anna", format!("Nr{i}"),
///         NaiveDate::from_ymd_opt(2009, 5, 1).unwrap()))
///     .collect();
/// let data = CompetitionData::new("E1", "Vårtävling").with_competition(
///     Competition::new("C1", "Singel")
///         .with_class(
///             SkatingClass::new("K1", "Juniorer Damer", "Friåkning").with_skaters(skaters),
///         ),
/// );
///
/// let settings = SchedulerSettings::default()
///     .with_start_date(NaiveDate::from_ymd_opt(2025, 3, 7).unwrap());
/// let generator = ScheduleGenerator::new(settings).unwrap();
/// let schedule = generator.generate(&data).unwrap();
/// assert!(schedule.is_valid());
/// assert_eq!(schedule.sessions.len(), 6); // warmup, prep buffer, 4 performances
/// ```
#[derive(Debug, Clone)]
pub struct ScheduleGenerator {
    settings: SchedulerSettings,
    rules: RuleSet,
    windows: Vec<TimeWindow>,
}

impl ScheduleGenerator {
    /// Validates settings and prepares the placement windows.
    pub fn new(settings: SchedulerSettings) -> Result<Self> {
        validate_settings(&settings).map_err(ScheduleError::InvalidSettings)?;
        let rules = RuleSet::new(settings.rules.clone()).map_err(ScheduleError::InvalidSettings)?;
        let windows = settings.windows();
        Ok(Self {
            settings,
            rules,
            windows,
        })
    }

    /// Overrides the class order (class ids).
    pub fn with_class_order(mut self, order: Vec<String>) -> Self {
        self.settings.custom_class_order = order;
        self
    }

    /// The validated settings.
    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// The resolved rule set.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Placement windows in order.
    pub fn windows(&self) -> &[TimeWindow] {
        &self.windows
    }

    /// Validates competition data and generates a schedule.
    pub fn generate(&self, data: &CompetitionData) -> Result<Schedule> {
        validate_competition(data).map_err(ScheduleError::InvalidCompetition)?;
        Ok(self.generate_with_order(data, &self.settings.custom_class_order))
    }

    /// Applies exclusions, then generates.
    pub fn generate_filtered(
        &self,
        data: &CompetitionData,
        exclusions: &Exclusions,
    ) -> Result<Schedule> {
        if exclusions.is_empty() {
            return self.generate(data);
        }
        self.generate(&data.filtered(exclusions))
    }

    /// Generates a schedule for an explicit class order.
    ///
    /// Does not validate `data`. An empty order means default ordering.
    pub fn generate_with_order(&self, data: &CompetitionData, class_order: &[String]) -> Schedule {
        let mut classes = schedulable_classes(data, &self.settings);
        order_classes(&mut classes, class_order);
        let units = build_units(&classes, &self.rules);

        let placer = Placer::new(&self.windows, &self.settings);
        let mut state = placer.start();
        let mut placed = Vec::new();
        let mut warnings = Vec::new();

        for unit in &units {
            let limit = self
                .rules
                .resolve(&unit.primary().name)
                .max_skaters_between_resurfacing;
            let sessions = generate_unit_sessions(unit, &self.rules, &self.settings);

            for block in build_blocks(sessions) {
                let step = placer.place_block(&state, &block, limit, unit);
                state = step.state;
                placed.extend(step.sessions);
                if let Some(warning) = step.warning {
                    warn!("{}", warning.message);
                    warnings.push(warning);
                }
            }
            debug!(
                "placed unit {} ({} skaters), cursor {}",
                unit.display_name(),
                unit.skater_count(),
                state.cursor
            );
        }

        let sessions = compact(placed);
        let findings = validate_schedule(&sessions);
        let schedule = Schedule::new(data.event.id.clone(), sessions)
            .with_warnings(warnings)
            .with_warnings(findings);

        info!(
            "generated schedule: {} classes in {} units, {} sessions, {} warnings",
            classes.len(),
            units.len(),
            schedule.sessions.len(),
            schedule.metadata.warnings.len()
        );
        schedule
    }
}

/// One-shot generation: validate settings and data, then generate.
pub fn generate_schedule(data: &CompetitionData, settings: SchedulerSettings) -> Result<Schedule> {
    ScheduleGenerator::new(settings)?.generate(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AvailabilityBlock, Competition, Rule, Session, SessionType, Skater, SkatingClass,
        ViolationType, DEFAULT_PATTERN, LUNCH_NAME,
    };
    use crate::validation::ValidationErrorKind;
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 8).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn window(start: (u32, u32), end: (u32, u32)) -> AvailabilityBlock {
        AvailabilityBlock::new(
            day(),
            NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        )
    }

    fn skaters(prefix: &str, n: usize) -> Vec<Skater> {
        (0..n)
            .map(|i| {
                Skater::new(
                    format!("{prefix}-{i}"),
                    "Skater",
                    format!("{prefix}{i}"),
                    NaiveDate::from_ymd_opt(2008, 4, 1).unwrap(),
                )
            })
            .collect()
    }

    fn data(classes: Vec<SkatingClass>) -> CompetitionData {
        let competition = classes
            .into_iter()
            .fold(Competition::new("C1", "Singel"), |c, class| c.with_class(class));
        CompetitionData::new("E1", "Event").with_competition(competition)
    }

    fn of_type(sessions: &[Session], t: SessionType) -> Vec<&Session> {
        sessions.iter().filter(|s| s.session_type == t).collect()
    }

    fn assert_contiguous(sessions: &[Session]) {
        for pair in sessions.windows(2) {
            if pair[0].start.date() == pair[1].start.date() {
                assert_eq!(pair[0].end, pair[1].start);
            }
        }
    }

    #[test]
    fn test_one_class_single_block() {
        let rules = vec![
            Rule::new("mini", 150, 240, 8).with_judging(110, 110),
            Rule::new(DEFAULT_PATTERN, 180, 240, 8),
        ];
        let settings = SchedulerSettings::default()
            .with_rules(rules)
            .with_availability(window((8, 0), (18, 0)));
        let data = data(vec![
            SkatingClass::new("A", "Mini Flickor", "").with_skaters(skaters("A", 6))
        ]);

        let schedule = generate_schedule(&data, settings).unwrap();
        let sessions = &schedule.sessions;

        assert!(schedule.metadata.warnings.is_empty());
        assert_eq!(of_type(sessions, SessionType::Warmup).len(), 1);
        assert_eq!(of_type(sessions, SessionType::Performance).len(), 6);
        assert_eq!(sessions.len(), 7);
        assert_eq!(sessions[0].start, at(8, 0));
        assert_contiguous(sessions);
        assert_eq!(schedule.makespan_secs(), 240 + 6 * (30 + 150 + 110));
    }

    #[test]
    fn test_two_small_classes_share_warmup() {
        let settings = SchedulerSettings::default().with_availability(window((8, 0), (18, 0)));
        let data = data(vec![
            SkatingClass::new("A", "Seniorer Damer", "Friåkning").with_skaters(skaters("A", 3)),
            SkatingClass::new("B", "Seniorer Herrar", "Friåkning").with_skaters(skaters("B", 3)),
        ]);

        let schedule = generate_schedule(&data, settings).unwrap();
        let warmups = of_type(&schedule.sessions, SessionType::Warmup);
        let performances = of_type(&schedule.sessions, SessionType::Performance);

        assert_eq!(warmups.len(), 1);
        assert_eq!(warmups[0].skater_count, Some(6));
        assert_eq!(warmups[0].duration, 360);
        assert_eq!(performances.len(), 6);
        assert!(performances.iter().all(|p| p.duration == 30 + 240 + 140));
        assert_eq!(performances.iter().filter(|p| p.class_id == "A").count(), 3);
        assert_eq!(performances.iter().filter(|p| p.class_id == "B").count(), 3);
        assert!(schedule.is_valid());
    }

    #[test]
    fn test_window_too_small_reports_schedule_full() {
        let settings = SchedulerSettings::default().with_availability(window((8, 0), (8, 30)));
        let data = data(vec![
            SkatingClass::new("A", "Seniorer Damer", "Friåkning").with_skaters(skaters("A", 5))
        ]);

        let schedule = generate_schedule(&data, settings).unwrap();
        assert!(schedule.sessions.is_empty());
        assert_eq!(schedule.metadata.warnings.len(), 1);
        let warning = &schedule.metadata.warnings[0];
        assert_eq!(warning.violation_type, ViolationType::ScheduleFull);
        assert_eq!(warning.entity_id, "A");
        assert!(warning.message.contains("Seniorer Damer"));
    }

    #[test]
    fn test_resurfacing_inserted_mid_class() {
        // senior: groups of 6, resurfacing after 12 skaters
        let settings = SchedulerSettings::default().with_availability(window((8, 0), (18, 0)));
        let data = data(vec![
            SkatingClass::new("A", "Seniorer Damer", "Friåkning").with_skaters(skaters("A", 18))
        ]);

        let schedule = generate_schedule(&data, settings).unwrap();
        let sessions = &schedule.sessions;
        let resurfacings = of_type(sessions, SessionType::Resurfacing);
        assert_eq!(resurfacings.len(), 1);
        assert_eq!(resurfacings[0].duration, 900);

        let pos = sessions
            .iter()
            .position(|s| s.session_type == SessionType::Resurfacing)
            .unwrap();
        assert_eq!(sessions[pos - 1].session_type, SessionType::Performance);
        assert_eq!(sessions[pos - 1].group_index, Some(2));
        assert_eq!(sessions[pos + 1].session_type, SessionType::Warmup);
        assert_eq!(sessions[pos + 1].group_index, Some(3));
        assert_eq!(of_type(sessions, SessionType::Performance).len(), 18);
        assert_contiguous(sessions);
    }

    #[test]
    fn test_lunch_inserted_once_per_day() {
        let settings = SchedulerSettings::default().with_availability(window((8, 0), (18, 0)));
        // eight 44.5 min junior classes; lunch lands before the seventh
        let classes = (0..8)
            .map(|i| {
                SkatingClass::new(format!("K{i}"), format!("Junior {i}"), "Friåkning")
                    .with_skaters(skaters(&format!("K{i}"), 6))
            })
            .collect();
        let schedule = generate_schedule(&data(classes), settings).unwrap();

        let lunches: Vec<&Session> = schedule
            .sessions
            .iter()
            .filter(|s| s.name == LUNCH_NAME)
            .collect();
        assert_eq!(lunches.len(), 1);
        assert!(lunches[0].start >= at(12, 0));
        assert!(lunches[0].end <= at(14, 0) + Duration::hours(1));
        assert_contiguous(&schedule.sessions);
    }

    #[test]
    fn test_overflow_to_second_day() {
        let next_day = day() + Duration::days(1);
        let mut settings = SchedulerSettings::default().with_availability(window((8, 0), (9, 0)));
        settings.availability.push(AvailabilityBlock::new(
            next_day,
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        ));
        let data = data(vec![
            SkatingClass::new("A", "Junior A", "Friåkning").with_skaters(skaters("A", 6)),
            SkatingClass::new("B", "Junior B", "Friåkning").with_skaters(skaters("B", 6)),
        ]);

        let schedule = generate_schedule(&data, settings).unwrap();
        assert!(schedule.is_valid());
        let first_b = schedule
            .sessions
            .iter()
            .find(|s| s.class_id == "B")
            .unwrap();
        assert_eq!(first_b.start.date(), next_day);
        assert_eq!(schedule.metadata.total_duration, schedule.makespan_secs());
    }

    #[test]
    fn test_free_before_short_reported() {
        let settings = SchedulerSettings::default()
            .with_availability(window((8, 0), (18, 0)))
            .with_class_order(vec!["F".into(), "S".into()]);
        let skaters = skaters("X", 2);
        let data = data(vec![
            SkatingClass::new("S", "Junior", "Kortprogram").with_skaters(skaters.clone()),
            SkatingClass::new("F", "Junior", "Friåkning").with_skaters(skaters),
        ]);

        let schedule = generate_schedule(&data, settings).unwrap();
        let ordering: Vec<_> = schedule
            .metadata
            .warnings
            .iter()
            .filter(|w| w.violation_type == ViolationType::FreeBeforeShort)
            .collect();
        assert_eq!(ordering.len(), 2);
    }

    #[test]
    fn test_custom_order_respected() {
        let settings = SchedulerSettings::default().with_availability(window((8, 0), (18, 0)));
        let data = data(vec![
            SkatingClass::new("A", "Senior A", "Friåkning").with_skaters(skaters("A", 6)),
            SkatingClass::new("B", "Junior B", "Friåkning").with_skaters(skaters("B", 6)),
        ]);
        let generator = ScheduleGenerator::new(settings).unwrap();

        let default = generator.generate(&data).unwrap();
        assert_eq!(default.sessions[0].class_id, "B");

        let custom = generator
            .clone()
            .with_class_order(vec!["A".into()])
            .generate(&data)
            .unwrap();
        assert_eq!(custom.sessions[0].class_id, "A");
    }

    #[test]
    fn test_exclusions_applied() {
        let settings = SchedulerSettings::default().with_availability(window((8, 0), (18, 0)));
        let data = data(vec![
            SkatingClass::new("A", "Senior A", "Friåkning").with_skaters(skaters("A", 2)),
            SkatingClass::new("B", "Junior B", "Friåkning").with_skaters(skaters("B", 2)),
        ]);
        let exclusions = Exclusions::new()
            .with_excluded_class("B")
            .with_scratched_skater("A-0");
        let generator = ScheduleGenerator::new(settings).unwrap();
        let schedule = generator.generate_filtered(&data, &exclusions).unwrap();

        let performances = of_type(&schedule.sessions, SessionType::Performance);
        assert_eq!(performances.len(), 1);
        assert_eq!(performances[0].skater_id.as_deref(), Some("A-1"));
    }

    #[test]
    fn test_invalid_settings_fail_fast() {
        let settings = SchedulerSettings::default().with_rules(Vec::new());
        match ScheduleGenerator::new(settings) {
            Err(ScheduleError::InvalidSettings(errors)) => {
                assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::EmptyRules));
                assert!(errors
                    .iter()
                    .any(|e| e.kind == ValidationErrorKind::NoAvailability));
            }
            other => panic!("expected invalid settings, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_rule_is_an_error() {
        let settings = SchedulerSettings::default()
            .with_rules(vec![Rule::new(DEFAULT_PATTERN, 10_000_000_000_000, 240, 8)])
            .with_availability(window((8, 0), (18, 0)));
        let data = data(vec![
            SkatingClass::new("A", "Senior", "").with_skaters(skaters("A", 1))
        ]);
        match generate_schedule(&data, settings) {
            Err(ScheduleError::InvalidSettings(errors)) => {
                assert!(errors.iter().all(|e| e.kind == ValidationErrorKind::InvalidRule));
            }
            other => panic!("expected invalid settings, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_competition_rejected() {
        let settings = SchedulerSettings::default().with_availability(window((8, 0), (18, 0)));
        let data = data(vec![
            SkatingClass::new("A", "Senior", "").with_skaters(skaters("A", 1)),
            SkatingClass::new("A", "Junior", "").with_skaters(skaters("B", 1)),
        ]);
        assert!(matches!(
            generate_schedule(&data, settings),
            Err(ScheduleError::InvalidCompetition(_))
        ));
    }

    #[test]
    fn test_every_unplaced_block_warns() {
        let settings = SchedulerSettings::default().with_availability(window((8, 0), (8, 20)));
        let data = data(vec![
            SkatingClass::new("A", "Senior A", "Friåkning").with_skaters(skaters("A", 6)),
            SkatingClass::new("B", "Junior B", "Kortprogram").with_skaters(skaters("B", 6)),
        ]);
        let schedule = generate_schedule(&data, settings).unwrap();
        assert!(schedule.sessions.is_empty());
        assert_eq!(schedule.metadata.warnings.len(), 2);
        assert!(schedule.metadata.warnings.iter().all(|w| w.is_schedule_full()));
    }
}
