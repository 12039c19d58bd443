//! Session generation.
//!
//! Expands a scheduling unit into its ordered, duration-only session
//! stream. Start times are provisional; the placement engine recomputes
//! them from its cursor.
//!
//! Per warmup group:
//! 1. One warmup sized by the primary class's rule and segment
//! 2. The preparation buffer, if the rule has one
//! 3. One performance per skater, `intro + program + judging` from the
//!    skater's own class rule
//!
//! A merged unit is always a single group. A single class is
//! re-partitioned under its rule's group size.

use crate::models::{RuleSet, SchedulerSettings, Session, SessionType, Skater, PREP_BUFFER_NAME};

use super::grouping::{partition_warmup_groups, SchedulingUnit};

/// Generates the sessions of one unit.
pub fn generate_unit_sessions(
    unit: &SchedulingUnit<'_>,
    rules: &RuleSet,
    settings: &SchedulerSettings,
) -> Vec<Session> {
    let primary = unit.primary();
    let rule = rules.resolve(&primary.name);
    let skaters: Vec<&Skater> = unit.classes.iter().flat_map(|c| c.skaters()).collect();

    let groups: Vec<&[&Skater]> = if unit.is_merged() {
        vec![skaters.as_slice()]
    } else {
        partition_warmup_groups(&skaters, rule.max_group_size)
    };

    let class_name = if unit.is_merged() {
        format!(
            "Merged: {}",
            unit.classes
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(" + ")
        )
    } else {
        primary.name.clone()
    };

    let mut sessions = Vec::with_capacity(skaters.len() + 2 * groups.len());
    for (i, group) in groups.iter().enumerate() {
        let index = i as u32 + 1;

        let warmup_name = if unit.is_merged() {
            format!(
                "Warmup (merged: {})",
                unit.classes
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        } else {
            format!("Warmup Group {index}")
        };
        sessions.push(
            Session::new(SessionType::Warmup, warmup_name, rule.warmup_time(primary.segment))
                .with_class(primary.id.clone(), class_name.clone(), primary.segment)
                .with_group(index)
                .with_skater_count(group.len()),
        );

        if rule.first_skater_buffer > 0 {
            sessions.push(
                Session::new(SessionType::Break, PREP_BUFFER_NAME, rule.first_skater_buffer)
                    .with_class(primary.id.clone(), primary.name.clone(), primary.segment)
                    .with_group(index),
            );
        }

        for skater in group.iter() {
            let source = unit.source_class(&skater.id);
            let source_rule = rules.resolve(&source.name);
            let duration = settings.introduction_duration
                + source_rule.performance_time(source.segment)
                + source_rule.judging_time(source.segment);
            let name = skater.full_name();
            sessions.push(
                Session::new(SessionType::Performance, name.clone(), duration)
                    .with_class(source.id.clone(), source.name.clone(), source.segment)
                    .with_group(index)
                    .with_skater(skater.id.clone(), name),
            );
        }
    }

    sessions
}
