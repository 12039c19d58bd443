//! Scheduler settings.
//!
//! Plain configuration passed by reference into the scheduling functions.
//! Every field has a default, so partial JSON documents are accepted.

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::calendar::{fallback_windows, hhmm, windows_from_blocks};
use super::{standard_rules, AvailabilityBlock, Rule, TimeWindow};

/// Global scheduling parameters.
///
/// The default carries no `start_date` and no `availability`, so it has no
/// windows. Set one of them before generating; otherwise validation fails
/// with `NoAvailability` rather than guessing a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerSettings {
    /// Opening hour of fallback days.
    pub start_hour: u32,
    /// Closing hour of fallback days.
    pub end_hour: u32,
    /// First fallback day. Required when `availability` is empty.
    pub start_date: Option<NaiveDate>,
    /// Number of fallback days.
    pub fallback_days: u32,
    /// Preferred lunch start.
    #[serde(with = "hhmm")]
    pub lunch_start_time: NaiveTime,
    /// Lunch length (minutes).
    pub lunch_duration: i64,
    /// Resurfacing length (s).
    pub ice_resurfacing_duration: i64,
    /// Optional ice-time cap between resurfacings (minutes).
    pub max_ice_time_between_resurfacing: Option<i64>,
    /// Introduction time before each performance (s).
    pub introduction_duration: i64,
    /// Timing rules in priority order.
    pub rules: Vec<Rule>,
    /// Explicit class order (class ids). Empty = default ordering.
    pub custom_class_order: Vec<String>,
    /// Explicit availability. Empty = fallback days.
    pub availability: Vec<AvailabilityBlock>,
    /// Classes whose name contains any of these (case-insensitive) are never scheduled.
    pub ignored_class_patterns: Vec<String>,
    /// Soft preferences used by the optimizer.
    pub soft_rules: SoftRules,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            start_hour: 8,
            end_hour: 19,
            start_date: None,
            fallback_days: 3,
            lunch_start_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default(),
            lunch_duration: 60,
            ice_resurfacing_duration: 15 * 60,
            max_ice_time_between_resurfacing: None,
            introduction_duration: 30,
            rules: standard_rules(),
            custom_class_order: Vec::new(),
            availability: Vec::new(),
            ignored_class_patterns: vec!["tränare".to_string()],
            soft_rules: SoftRules::default(),
        }
    }
}

impl SchedulerSettings {
    /// Default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses settings from JSON; missing fields take defaults.
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the fallback start date.
    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Replaces the rules.
    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    /// Adds an availability block.
    pub fn with_availability(mut self, block: AvailabilityBlock) -> Self {
        self.availability.push(block);
        self
    }

    /// Sets an explicit class order.
    pub fn with_class_order(mut self, order: Vec<String>) -> Self {
        self.custom_class_order = order;
        self
    }

    /// Sets the introduction time (s).
    pub fn with_introduction(mut self, secs: i64) -> Self {
        self.introduction_duration = secs;
        self
    }

    /// Sets the soft preferences.
    pub fn with_soft_rules(mut self, soft_rules: SoftRules) -> Self {
        self.soft_rules = soft_rules;
        self
    }

    /// Lunch length (s).
    pub fn lunch_secs(&self) -> i64 {
        self.lunch_duration.saturating_mul(60)
    }

    /// Ice-time cap between resurfacings (s), if configured.
    pub fn max_ice_secs(&self) -> Option<i64> {
        self.max_ice_time_between_resurfacing.map(|m| m.saturating_mul(60))
    }

    /// Placement windows: configured blocks, else fallback days.
    pub fn windows(&self) -> Vec<TimeWindow> {
        if !self.availability.is_empty() {
            return windows_from_blocks(&self.availability);
        }
        match self.start_date {
            Some(date) => {
                fallback_windows(date, self.fallback_days, self.start_hour, self.end_hour)
            }
            None => Vec::new(),
        }
    }

    /// Whether a class name is excluded by `ignored_class_patterns`.
    pub fn is_ignored_class(&self, class_name: &str) -> bool {
        let lower = class_name.to_lowercase();
        self.ignored_class_patterns
            .iter()
            .any(|p| !p.is_empty() && lower.contains(&p.to_lowercase()))
    }
}

/// Soft scheduling preferences (penalized, never enforced).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SoftRules {
    /// Penalize young skaters performing late.
    pub avoid_young_on_late_slots: bool,
    /// Skaters at or below this age count as young.
    pub young_max_age: i32,
    /// Performances starting at or after this time are late.
    #[serde(with = "hhmm")]
    pub young_latest_time: NaiveTime,
    /// Penalize non-local skaters performing late on the recovery day.
    pub prefer_local_on_recovery_day: bool,
    /// The travel/recovery day (usually the last competition day).
    pub recovery_day: Weekday,
    /// Performances starting at or after this time on the recovery day are late.
    #[serde(with = "hhmm")]
    pub local_after_time: NaiveTime,
    /// Skater ids counted as local.
    pub local_skater_ids: Vec<String>,
}

impl Default for SoftRules {
    fn default() -> Self {
        Self {
            avoid_young_on_late_slots: true,
            young_max_age: 10,
            young_latest_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            prefer_local_on_recovery_day: true,
            recovery_day: Weekday::Sun,
            local_after_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap_or_default(),
            local_skater_ids: Vec::new(),
        }
    }
}

impl SoftRules {
    /// Both preferences off.
    pub fn disabled() -> Self {
        Self {
            avoid_young_on_late_slots: false,
            prefer_local_on_recovery_day: false,
            ..Self::default()
        }
    }

    /// Whether any preference is active.
    pub fn any_enabled(&self) -> bool {
        self.avoid_young_on_late_slots || self.prefer_local_on_recovery_day
    }

    /// Whether a skater id is local.
    pub fn is_local(&self, skater_id: &str) -> bool {
        self.local_skater_ids.iter().any(|id| id == skater_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = SchedulerSettings::default();
        assert_eq!(s.lunch_secs(), 3600);
        assert_eq!(s.ice_resurfacing_duration, 900);
        assert_eq!(s.rules.len(), 5);
        assert!(s.rules.last().unwrap().is_default());
        assert!(s.windows().is_empty()); // no start date
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{
            "startDate": "2025-03-07",
            "lunchStartTime": "11:30",
            "softRules": { "localSkaterIds": ["S1"], "recoveryDay": "Sat" }
        }"#;
        let s = SchedulerSettings::from_json_str(json).unwrap();
        assert_eq!(s.lunch_start_time, NaiveTime::from_hms_opt(11, 30, 0).unwrap());
        assert_eq!(s.windows().len(), 3);
        assert_eq!(s.soft_rules.recovery_day, Weekday::Sat);
        assert!(s.soft_rules.is_local("S1"));
        assert_eq!(s.soft_rules.young_max_age, 10);
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(SchedulerSettings::from_json_str(r#"{"lunchStartTime": "noon"}"#).is_err());
    }

    #[test]
    fn test_ignored_classes() {
        let s = SchedulerSettings::default();
        assert!(s.is_ignored_class("Tränare Öppen"));
        assert!(!s.is_ignored_class("Seniorer Damer"));
    }

    #[test]
    fn test_availability_overrides_fallback() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
        let s = SchedulerSettings::default()
            .with_start_date(date)
            .with_availability(AvailabilityBlock::new(
                date,
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            ));
        let windows = s.windows();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, date.and_hms_opt(9, 0, 0).unwrap());
    }
}
