//! Class timing rules.
//!
//! A [`Rule`] carries per-segment timings and capacity limits for every class
//! whose name contains its pattern. Rules are scanned in list order; the first
//! case-insensitive substring match wins, and the rule whose pattern is the
//! literal [`DEFAULT_PATTERN`] is the fallback.
//!
//! All durations are in seconds.

use serde::{Deserialize, Serialize};

use super::ProgramSegment;

/// Pattern marking the fallback rule.
pub const DEFAULT_PATTERN: &str = "default";

/// Timing and capacity rule for classes matching a name pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Rule identifier.
    #[serde(default)]
    pub id: String,
    /// Case-insensitive substring matched against class names.
    pub name_pattern: String,
    /// Short program length (s).
    pub performance_time_short: i64,
    /// Free program length (s).
    pub performance_time_free: i64,
    /// Warmup length before a short program group (s).
    pub warmup_time_short: i64,
    /// Warmup length before a free program group (s).
    pub warmup_time_free: i64,
    /// Maximum skaters in one warmup group.
    pub max_group_size: usize,
    /// Maximum skaters on the ice between two resurfacings.
    pub max_skaters_between_resurfacing: usize,
    /// Judging time after a short program (s).
    pub judging_time_short: i64,
    /// Judging time after a free program (s).
    pub judging_time_free: i64,
    /// Preparation buffer before the first skater of a group (s).
    #[serde(default)]
    pub first_skater_buffer: i64,
}

impl Rule {
    /// Creates a rule with the same timings for both segments.
    pub fn new(
        name_pattern: impl Into<String>,
        performance_time: i64,
        warmup_time: i64,
        max_group_size: usize,
    ) -> Self {
        let name_pattern = name_pattern.into();
        Self {
            id: name_pattern.clone(),
            name_pattern,
            performance_time_short: performance_time,
            performance_time_free: performance_time,
            warmup_time_short: warmup_time,
            warmup_time_free: warmup_time,
            max_group_size,
            max_skaters_between_resurfacing: usize::MAX,
            judging_time_short: 0,
            judging_time_free: 0,
            first_skater_buffer: 0,
        }
    }

    /// Sets performance times (short, free).
    pub fn with_performance(mut self, short: i64, free: i64) -> Self {
        self.performance_time_short = short;
        self.performance_time_free = free;
        self
    }

    /// Sets warmup times (short, free).
    pub fn with_warmup(mut self, short: i64, free: i64) -> Self {
        self.warmup_time_short = short;
        self.warmup_time_free = free;
        self
    }

    /// Sets judging times (short, free).
    pub fn with_judging(mut self, short: i64, free: i64) -> Self {
        self.judging_time_short = short;
        self.judging_time_free = free;
        self
    }

    /// Sets the resurfacing capacity.
    pub fn with_max_skaters_between_resurfacing(mut self, max: usize) -> Self {
        self.max_skaters_between_resurfacing = max;
        self
    }

    /// Sets the first-skater preparation buffer.
    pub fn with_first_skater_buffer(mut self, secs: i64) -> Self {
        self.first_skater_buffer = secs;
        self
    }

    /// Whether this is the fallback rule.
    #[inline]
    pub fn is_default(&self) -> bool {
        self.name_pattern == DEFAULT_PATTERN
    }

    /// Whether the pattern occurs in `class_name` (case-insensitive).
    pub fn matches(&self, class_name: &str) -> bool {
        class_name
            .to_lowercase()
            .contains(&self.name_pattern.to_lowercase())
    }

    /// Warmup length for a segment (s). Unspecified uses free timings.
    pub fn warmup_time(&self, segment: ProgramSegment) -> i64 {
        if segment.is_short() {
            self.warmup_time_short
        } else {
            self.warmup_time_free
        }
    }

    /// Program length for a segment (s).
    pub fn performance_time(&self, segment: ProgramSegment) -> i64 {
        if segment.is_short() {
            self.performance_time_short
        } else {
            self.performance_time_free
        }
    }

    /// Judging time for a segment (s).
    pub fn judging_time(&self, segment: ProgramSegment) -> i64 {
        if segment.is_short() {
            self.judging_time_short
        } else {
            self.judging_time_free
        }
    }
}

/// Resolves the rule for a class name.
///
/// Returns the first rule whose pattern occurs in the name, else the
/// [`DEFAULT_PATTERN`] rule, else the last rule. `None` only for an empty list.
pub fn resolve_rule<'a>(class_name: &str, rules: &'a [Rule]) -> Option<&'a Rule> {
    let lower = class_name.to_lowercase();
    rules
        .iter()
        .find(|r| lower.contains(&r.name_pattern.to_lowercase()))
        .or_else(|| rules.iter().find(|r| r.is_default()))
        .or_else(|| rules.last())
}

/// An ordered rule list guaranteed to resolve.
///
/// Built by [`crate::validation::validate_rules`]-checked constructors, so
/// [`RuleSet::resolve`] never fails.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Wraps a rule list after validation.
    pub fn new(rules: Vec<Rule>) -> Result<Self, Vec<crate::validation::ValidationError>> {
        crate::validation::validate_rules(&rules)?;
        Ok(Self { rules })
    }

    /// Rule for a class name.
    pub fn resolve(&self, class_name: &str) -> &Rule {
        // Non-empty with a default rule, checked in `new`.
        resolve_rule(class_name, &self.rules).unwrap_or(&self.rules[0])
    }

    /// Rules in priority order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// The standard rule list used by default settings.
pub fn standard_rules() -> Vec<Rule> {
    vec![
        Rule::new("senior", 0, 360, 6)
            .with_performance(160, 240)
            .with_max_skaters_between_resurfacing(12)
            .with_judging(110, 140)
            .with_first_skater_buffer(30),
        Rule::new("junior", 0, 360, 6)
            .with_performance(160, 210)
            .with_max_skaters_between_resurfacing(12)
            .with_judging(110, 140)
            .with_first_skater_buffer(30),
        Rule::new("ungdom", 0, 0, 8)
            .with_performance(140, 180)
            .with_warmup(240, 300)
            .with_max_skaters_between_resurfacing(16)
            .with_judging(110, 140)
            .with_first_skater_buffer(30),
        Rule::new("minior", 0, 240, 8)
            .with_performance(140, 180)
            .with_max_skaters_between_resurfacing(16)
            .with_judging(110, 140)
            .with_first_skater_buffer(30),
        Rule::new(DEFAULT_PATTERN, 0, 240, 8)
            .with_performance(150, 180)
            .with_max_skaters_between_resurfacing(24)
            .with_judging(110, 140)
            .with_first_skater_buffer(30),
    ]
}

/// "MM:SS" row of the federation table: pattern, short/free performance,
/// short/free warmup, group size, resurfacing capacity, short/free judging.
type CatalogRow = (
    &'static str,
    Option<&'static str>,
    &'static str,
    Option<&'static str>,
    &'static str,
    usize,
    usize,
    &'static str,
    &'static str,
);

const FEDERATION_TABLE: &[CatalogRow] = &[
    (
        "synkroniserad senior",
        Some("02:50"),
        "04:00",
        Some("00:00"),
        "01:00",
        1,
        2,
        "01:50",
        "02:20",
    ),
    (
        "synkroniserad junior",
        Some("02:50"),
        "03:30",
        Some("00:00"),
        "01:00",
        1,
        2,
        "01:50",
        "02:20",
    ),
    ("synkroniserad advanced novice", None, "03:00", None, "01:00", 1, 2, "01:50", "02:20"),
    ("synkroniserad basic novice", None, "03:00", None, "01:00", 1, 2, "01:50", "02:20"),
    ("synkroniserad juvenile", None, "03:00", None, "01:00", 1, 2, "01:50", "02:20"),
    ("synkroniserad pre-juvenile", None, "03:00", None, "01:00", 1, 2, "01:50", "02:20"),
    ("synkroniserad adult", None, "03:00", None, "01:00", 1, 2, "01:50", "02:20"),
    ("synkroniserad mixed", None, "03:30", None, "01:00", 1, 2, "01:50", "02:20"),
    ("synkroniserad open", None, "03:00", None, "01:00", 1, 2, "01:50", "02:20"),
    ("synkroniserad", Some("02:50"), "03:30", Some("00:00"), "01:00", 1, 2, "01:50", "02:20"),
    ("vit", None, "02:15", None, "04:00", 8, 28, "01:50", "02:20"),
    ("gul", None, "02:40", None, "04:00", 8, 28, "01:50", "02:20"),
    ("grön", None, "02:40", None, "04:00", 8, 28, "01:50", "02:20"),
    ("blå", None, "02:50", None, "04:00", 8, 24, "01:50", "02:20"),
    ("röd", None, "03:00", None, "05:00", 8, 24, "01:50", "02:20"),
    ("grå", None, "03:30", None, "06:00", 6, 16, "01:50", "02:20"),
    ("svart", None, "04:00", None, "06:00", 6, 16, "01:50", "02:20"),
    ("ungdom 13", Some("02:20"), "03:00", Some("04:00"), "05:00", 8, 16, "01:50", "02:20"),
    ("ungdom 16", Some("02:20"), "03:00", Some("04:00"), "05:00", 8, 16, "01:50", "02:20"),
    ("juniorer damer", Some("02:40"), "03:30", Some("06:00"), "06:00", 6, 12, "01:50", "02:20"),
    ("juniorer herrar", Some("02:40"), "03:30", Some("06:00"), "06:00", 6, 12, "01:50", "02:20"),
    ("junior", Some("02:40"), "03:30", Some("06:00"), "06:00", 6, 12, "01:50", "02:20"),
    (
        "seniorer nationell damer",
        Some("02:40"),
        "03:30",
        Some("06:00"),
        "06:00",
        6,
        12,
        "01:50",
        "02:20",
    ),
    (
        "seniorer nationell herrar",
        Some("02:40"),
        "03:30",
        Some("06:00"),
        "06:00",
        6,
        12,
        "01:50",
        "02:20",
    ),
    ("seniorer damer", Some("02:40"), "04:00", Some("06:00"), "06:00", 6, 12, "01:50", "02:20"),
    ("seniorer herrar", Some("02:40"), "04:00", Some("06:00"), "06:00", 6, 12, "01:50", "02:20"),
    ("senior", Some("02:40"), "04:00", Some("06:00"), "06:00", 6, 12, "01:50", "02:20"),
    ("adults bronze artistisk", None, "01:30", None, "04:00", 6, 12, "01:50", "02:00"),
    ("adults silver artistisk", None, "01:30", None, "04:00", 6, 12, "01:50", "02:00"),
    ("adults gold artistisk", None, "01:30", None, "04:00", 6, 12, "01:50", "02:00"),
    ("adults master artistisk", None, "02:00", None, "04:00", 6, 12, "01:50", "02:00"),
    ("adults bronze", None, "01:40", None, "05:00", 6, 12, "01:50", "02:00"),
    ("adults silver", None, "02:00", None, "05:00", 6, 12, "01:50", "02:00"),
    ("adults gold", None, "02:50", None, "06:00", 6, 12, "01:50", "02:00"),
    ("adults master", None, "03:00", None, "06:00", 6, 12, "01:50", "02:00"),
    ("adult", None, "02:00", None, "05:00", 6, 12, "01:50", "02:00"),
    (DEFAULT_PATTERN, Some("02:30"), "03:00", Some("04:00"), "04:00", 8, 24, "01:50", "02:20"),
];

/// Converts "MM:SS" to seconds; malformed text counts as zero.
fn mmss(text: &str) -> i64 {
    let mut parts = text.split(':').map(|p| p.parse::<i64>().unwrap_or(0));
    let minutes = parts.next().unwrap_or(0);
    let seconds = parts.next().unwrap_or(0);
    minutes * 60 + seconds
}

/// The national federation class-rule table.
///
/// More specific patterns precede generic ones; the last entry is the
/// default rule. Segments without a short program reuse free timings. The
/// federation table has no preparation buffer, so `first_skater_buffer`
/// is the standard 30 s.
pub fn federation_rules() -> Vec<Rule> {
    FEDERATION_TABLE
        .iter()
        .map(
            |&(
                pattern,
                perf_short,
                perf_free,
                warm_short,
                warm_free,
                group,
                resurf,
                judge_short,
                judge_free,
            )| {
                let perf_free = mmss(perf_free);
                let warm_free = mmss(warm_free);
                Rule::new(pattern, perf_free, warm_free, group)
                    .with_performance(perf_short.map(mmss).unwrap_or(perf_free), perf_free)
                    .with_warmup(warm_short.map(mmss).unwrap_or(warm_free), warm_free)
                    .with_max_skaters_between_resurfacing(resurf)
                    .with_judging(mmss(judge_short), mmss(judge_free))
                    .with_first_skater_buffer(30)
            },
        )
        .collect()
}
