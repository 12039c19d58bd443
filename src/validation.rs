//! Validation for scheduling input and output.
//!
//! Input checks run before scheduling and collect every problem found:
//! - Rule list integrity (non-empty, exactly one default, usable capacities)
//! - Availability integrity (positive length, no overlap, fallback computable)
//! - Competition data integrity (duplicate class ids, duplicate skaters in a class)
//!
//! The schedule check runs after placement and inspects each skater's
//! short and free performances:
//! - Free program before short program
//! - Same-day gap shorter than [`MIN_RECOVERY_HOURS`]
//!
//! Findings on a schedule are [`Violation`]s, never errors.

use chrono::NaiveDateTime;
use std::collections::{HashMap, HashSet};

use crate::models::{
    CompetitionData, ProgramSegment, Rule, SchedulerSettings, Session, SessionType, Violation,
};

/// Minimum same-day gap between a skater's short and free programs.
pub const MIN_RECOVERY_HOURS: f64 = 4.0;

/// Longest accepted single duration: one day (s).
pub const MAX_DURATION_SECS: i64 = 24 * 60 * 60;

fn duration_in_range(secs: i64) -> bool {
    (0..=MAX_DURATION_SECS).contains(&secs)
}

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// No rules configured.
    EmptyRules,
    /// No rule carries the default pattern.
    MissingDefaultRule,
    /// More than one rule carries the default pattern.
    DuplicateDefaultRule,
    /// A rule has a zero capacity or a negative duration.
    InvalidRule,
    /// An availability block ends at or before its start.
    InvalidAvailability,
    /// Two availability blocks overlap.
    OverlappingAvailability,
    /// No availability and no computable fallback.
    NoAvailability,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

fn into_result(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a rule list.
///
/// Checks:
/// 1. At least one rule
/// 2. Exactly one rule with the default pattern
/// 3. Every rule has a positive group size and resurfacing capacity
/// 4. Every duration between zero and [`MAX_DURATION_SECS`]
pub fn validate_rules(rules: &[Rule]) -> ValidationResult {
    if rules.is_empty() {
        return Err(vec![ValidationError::new(
            ValidationErrorKind::EmptyRules,
            "Rule list is empty",
        )]);
    }

    let mut errors = Vec::new();

    match rules.iter().filter(|r| r.is_default()).count() {
        0 => errors.push(ValidationError::new(
            ValidationErrorKind::MissingDefaultRule,
            "No default rule configured",
        )),
        1 => {}
        n => errors.push(ValidationError::new(
            ValidationErrorKind::DuplicateDefaultRule,
            format!("{n} default rules configured, expected one"),
        )),
    }

    for rule in rules {
        if rule.max_group_size == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidRule,
                format!("Rule '{}' has zero max group size", rule.name_pattern),
            ));
        }
        if rule.max_skaters_between_resurfacing == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidRule,
                format!(
                    "Rule '{}' has zero skaters between resurfacing",
                    rule.name_pattern
                ),
            ));
        }
        let durations = [
            rule.performance_time_short,
            rule.performance_time_free,
            rule.warmup_time_short,
            rule.warmup_time_free,
            rule.judging_time_short,
            rule.judging_time_free,
            rule.first_skater_buffer,
        ];
        if !durations.iter().all(|&d| duration_in_range(d)) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidRule,
                format!(
                    "Rule '{}' has a duration outside 0..={MAX_DURATION_SECS} s",
                    rule.name_pattern
                ),
            ));
        }
    }

    into_result(errors)
}

/// Validates settings, including their rules and availability.
pub fn validate_settings(settings: &SchedulerSettings) -> ValidationResult {
    let mut errors = match validate_rules(&settings.rules) {
        Ok(()) => Vec::new(),
        Err(errs) => errs,
    };

    for block in &settings.availability {
        if block.end_time <= block.start_time {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidAvailability,
                format!(
                    "Availability on {} ends at or before it starts ({}-{})",
                    block.date,
                    block.start_time.format("%H:%M"),
                    block.end_time.format("%H:%M")
                ),
            ));
        }
    }

    let windows = settings.windows();
    for pair in windows.windows(2) {
        if pair[0].overlaps(&pair[1]) {
            errors.push(ValidationError::new(
                ValidationErrorKind::OverlappingAvailability,
                format!("Availability {} overlaps {}", pair[0].label, pair[1].label),
            ));
        }
    }

    if settings.availability.is_empty() && windows.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoAvailability,
            "No availability configured and no fallback days computable \
             (start date, fallback days and start/end hours required)",
        ));
    }

    let max_minutes = MAX_DURATION_SECS / 60;
    let minutes_ok = |m: i64| (0..=max_minutes).contains(&m);
    if !minutes_ok(settings.lunch_duration)
        || !settings.max_ice_time_between_resurfacing.map_or(true, minutes_ok)
        || !duration_in_range(settings.ice_resurfacing_duration)
        || !duration_in_range(settings.introduction_duration)
    {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidRule,
            "Lunch, ice-time cap, resurfacing and introduction durations must lie between \
             zero and one day",
        ));
    }

    into_result(errors)
}

/// Validates competition data.
///
/// Checks:
/// 1. No duplicate class ids (across all competitions)
/// 2. No skater listed twice in one class
pub fn validate_competition(data: &CompetitionData) -> ValidationResult {
    let mut errors = Vec::new();
    let mut class_ids = HashSet::new();

    for class in data.classes() {
        if !class_ids.insert(class.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate class ID: {}", class.id),
            ));
        }

        let mut skater_ids = HashSet::new();
        for skater in class.skaters() {
            if !skater_ids.insert(skater.id.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Skater '{}' listed twice in class '{}'", skater.id, class.id),
                ));
            }
        }
    }

    into_result(errors)
}

#[derive(Default)]
struct SegmentStarts<'a> {
    name: &'a str,
    short: Option<NaiveDateTime>,
    free: Option<NaiveDateTime>,
}

fn earliest(slot: &mut Option<NaiveDateTime>, start: NaiveDateTime) {
    *slot = Some(slot.map_or(start, |s| s.min(start)));
}

/// Checks short/free ordering and recovery for every skater.
///
/// For each skater id, takes the earliest short and earliest free
/// performance start. Free before short yields one
/// [`ViolationType::FreeBeforeShort`](crate::models::ViolationType::FreeBeforeShort)
/// with weight 1. Short and free on the same calendar day with a signed
/// gap `free - short` below [`MIN_RECOVERY_HOURS`] also yield an
/// insufficient-recovery violation weighted by the shortfall
/// `(4 - gap) / 4`, which exceeds 1 when free comes first.
pub fn validate_schedule(sessions: &[Session]) -> Vec<Violation> {
    let mut starts: HashMap<&str, SegmentStarts> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for session in sessions {
        if session.session_type != SessionType::Performance {
            continue;
        }
        let Some(skater_id) = session.skater_id.as_deref() else {
            continue;
        };
        let entry = starts.entry(skater_id).or_insert_with(|| {
            order.push(skater_id);
            SegmentStarts {
                name: session.skater_name.as_deref().unwrap_or(skater_id),
                ..SegmentStarts::default()
            }
        });
        match session.segment {
            ProgramSegment::Short => earliest(&mut entry.short, session.start),
            ProgramSegment::Free => earliest(&mut entry.free, session.start),
            ProgramSegment::Unspecified => {}
        }
    }

    let mut violations = Vec::new();
    for skater_id in order {
        let Some(entry) = starts.get(skater_id) else {
            continue;
        };
        let (Some(short), Some(free)) = (entry.short, entry.free) else {
            continue;
        };

        if free < short {
            violations.push(Violation::free_before_short(
                skater_id,
                format!("Legacy Rule Violation: {} skates Free before Short.", entry.name),
            ));
        }

        if free.date() == short.date() {
            let gap_hours = (free - short).num_seconds() as f64 / 3600.0;
            if gap_hours < MIN_RECOVERY_HOURS {
                violations.push(Violation::insufficient_recovery(
                    skater_id,
                    format!(
                        "Recovery Violation: {} has < 4h between Short and Free ({:.1}h).",
                        entry.name, gap_hours
                    ),
                    (MIN_RECOVERY_HOURS - gap_hours) / MIN_RECOVERY_HOURS,
                ));
            }
        }
    }

    violations
}
