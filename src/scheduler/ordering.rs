//! Class priority ordering.
//!
//! Decides the order in which classes reach the merge engine and the
//! placement engine.
//!
//! # Rules
//!
//! - **Custom**: classes listed in the explicit order come first, in list
//!   order; unlisted classes follow in default order.
//! - **Default**: short before free before unspecified segment, then by
//!   display name.
//!
//! # Score Convention
//! Lower sort keys are scheduled earlier.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{CompetitionData, SchedulerSettings, SkatingClass};

/// Classes that can be scheduled, in natural (import) order.
///
/// Drops classes matching an ignored pattern and classes without skaters.
pub fn schedulable_classes<'a>(
    data: &'a CompetitionData,
    settings: &SchedulerSettings,
) -> Vec<&'a SkatingClass> {
    data.classes()
        .filter(|c| !settings.is_ignored_class(&c.name))
        .filter(|c| c.skater_count() > 0)
        .collect()
}

/// Default comparison: segment priority, then name.
pub fn default_order(a: &SkatingClass, b: &SkatingClass) -> Ordering {
    a.segment
        .priority()
        .cmp(&b.segment.priority())
        .then_with(|| a.name.cmp(&b.name))
}

/// Sorts classes for scheduling.
///
/// An empty `custom_order` means default ordering. The sort is stable.
pub fn order_classes(classes: &mut [&SkatingClass], custom_order: &[String]) {
    if custom_order.is_empty() {
        classes.sort_by(|a, b| default_order(a, b));
        return;
    }

    let rank: HashMap<&str, usize> = custom_order
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    classes.sort_by(|a, b| {
        match (rank.get(a.id.as_str()), rank.get(b.id.as_str())) {
            (Some(ra), Some(rb)) => ra.cmp(rb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => default_order(a, b),
        }
    });
}
