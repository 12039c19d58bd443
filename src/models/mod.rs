//! Scheduling domain models.
//!
//! Provides the data types consumed and produced by the scheduler:
//! competition data (classes, warmup groups, skaters), timing rules,
//! availability windows, settings, sessions and the resulting schedule.
//!
//! # Domain Mappings
//!
//! | skate-schedule | Generic scheduling |
//! |----------------|--------------------|
//! | SkatingClass | Job |
//! | Session | Operation |
//! | TimeWindow | Resource calendar |
//! | Rule | Processing-time table |
//! | Schedule | Production plan |

mod calendar;
mod competition;
mod rule;
mod schedule;
mod session;
mod settings;

pub use calendar::{
    add_secs, fallback_windows, hhmm, windows_from_blocks, AvailabilityBlock, TimeWindow,
};
pub use competition::{
    Competition, CompetitionData, Event, Exclusions, Organization, ProgramEntry, ProgramSegment,
    Skater, SkatingClass, WarmupGroup,
};
pub use rule::{federation_rules, resolve_rule, standard_rules, Rule, RuleSet, DEFAULT_PATTERN};
pub use schedule::{detect_conflicts, Schedule, ScheduleMetadata, Violation, ViolationType};
pub use session::{Session, SessionType, LUNCH_NAME, PREP_BUFFER_NAME, RESURFACING_NAME};
pub use settings::{SchedulerSettings, SoftRules};
