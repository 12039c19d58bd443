//! Greedy schedule generation and KPI evaluation.
//!
//! Turns competition data and settings into a placed schedule.
//!
//! # Algorithm
//!
//! `ScheduleGenerator` orders classes, merges small adjacent classes into
//! shared warmups, expands each unit into sessions, and packs them as
//! atomic blocks into availability windows with dynamic lunch and ice
//! resurfacing. Each day is then compacted and the result checked for
//! short/free ordering and recovery. It is greedy, not optimal; the
//! `optimizer` module searches over class orders on top of it.
//!
//! # KPI
//!
//! `ScheduleKpi` computes makespan, time per session type, efficiency,
//! window utilization and dropped blocks.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Baker & Trietsch (2019), "Principles of Sequencing and Scheduling"

mod compact;
mod engine;
mod grouping;
mod kpi;
mod ordering;
mod placement;
mod sessions;

pub use compact::compact;
pub use engine::{generate_schedule, ScheduleGenerator};
pub use grouping::{build_units, can_merge, partition_warmup_groups, SchedulingUnit};
pub use kpi::ScheduleKpi;
pub use ordering::{default_order, order_classes, schedulable_classes};
pub use placement::{build_blocks, Block, PlacementState, PlacementStep, Placer};
pub use sessions::generate_unit_sessions;
