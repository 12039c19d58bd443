//! Warmup grouping and class merging.
//!
//! # Algorithm
//!
//! **Partition**: `k = ceil(n / max)` groups, base size `floor(n / k)`,
//! the last `n mod k` groups one larger. Sizes differ by at most one and
//! no trailing group is undersized.
//!
//! **Merge**: walking classes in priority order, a unit keeps absorbing
//! the next class while [`can_merge`] holds and stops at the first class
//! that does not fit. Merged classes share one warmup.

use crate::models::{RuleSet, SkatingClass};

/// Splits `items` into balanced groups of at most `max_group_size`.
///
/// Returns an empty list for no items. A zero limit is treated as one.
pub fn partition_warmup_groups<T>(items: &[T], max_group_size: usize) -> Vec<&[T]> {
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }
    let max = max_group_size.max(1);
    let num_groups = total.div_ceil(max);
    let base = total / num_groups;
    let remainder = total % num_groups;

    let mut groups = Vec::with_capacity(num_groups);
    let mut offset = 0;
    for i in 0..num_groups {
        let size = base + usize::from(i >= num_groups - remainder);
        groups.push(&items[offset..offset + size]);
        offset += size;
    }
    groups
}

/// One class, or several adjacent classes merged into a single warmup group.
#[derive(Debug, Clone)]
pub struct SchedulingUnit<'a> {
    /// Member classes in priority order. Never empty.
    pub classes: Vec<&'a SkatingClass>,
}

impl<'a> SchedulingUnit<'a> {
    /// A unit holding one class.
    pub fn new(class: &'a SkatingClass) -> Self {
        Self {
            classes: vec![class],
        }
    }

    /// The representative (first) class.
    pub fn primary(&self) -> &'a SkatingClass {
        self.classes[0]
    }

    /// Whether several classes share this unit.
    pub fn is_merged(&self) -> bool {
        self.classes.len() > 1
    }

    /// Unit id (the primary class id).
    pub fn id(&self) -> &str {
        &self.primary().id
    }

    /// Member class names joined with " & ".
    pub fn display_name(&self) -> String {
        self.classes
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(" & ")
    }

    /// Total skaters across member classes.
    pub fn skater_count(&self) -> usize {
        self.classes.iter().map(|c| c.skater_count()).sum()
    }

    /// The member class holding a skater, else the primary class.
    pub fn source_class(&self, skater_id: &str) -> &'a SkatingClass {
        self.classes
            .iter()
            .copied()
            .find(|c| c.contains_skater(skater_id))
            .unwrap_or_else(|| self.primary())
    }
}

/// Whether `candidate` may join `unit` in a shared warmup.
///
/// All must hold:
/// 1. The candidate fits in one group under its own rule.
/// 2. Every member class fits in one group under its own rule.
/// 3. The combined count fits the smallest group size among all involved rules.
/// 4. The candidate's warmup length equals the primary class's.
/// 5. Same program segment as the primary class.
pub fn can_merge(unit: &SchedulingUnit<'_>, candidate: &SkatingClass, rules: &RuleSet) -> bool {
    let candidate_rule = rules.resolve(&candidate.name);
    if candidate.skater_count() > candidate_rule.max_group_size {
        return false;
    }

    let mut limit = candidate_rule.max_group_size;
    for class in &unit.classes {
        let rule = rules.resolve(&class.name);
        if class.skater_count() > rule.max_group_size {
            return false;
        }
        limit = limit.min(rule.max_group_size);
    }

    if unit.skater_count() + candidate.skater_count() > limit {
        return false;
    }

    let primary = unit.primary();
    let primary_warmup = rules.resolve(&primary.name).warmup_time(primary.segment);
    if primary_warmup != candidate_rule.warmup_time(candidate.segment) {
        return false;
    }

    primary.segment == candidate.segment
}

/// Greedily merges adjacent classes into scheduling units.
pub fn build_units<'a>(classes: &[&'a SkatingClass], rules: &RuleSet) -> Vec<SchedulingUnit<'a>> {
    let mut units = Vec::new();
    let mut iter = classes.iter().copied().peekable();

    while let Some(first) = iter.next() {
        let mut unit = SchedulingUnit::new(first);
        while let Some(next) = iter.next_if(|next| can_merge(&unit, next, rules)) {
            unit.classes.push(next);
        }
        units.push(unit);
    }

    units
}
