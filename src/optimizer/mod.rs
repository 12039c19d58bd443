//! Class-order optimization.
//!
//! The greedy generator is sensitive to the order in which classes are
//! placed. This module searches that order with simulated annealing,
//! scoring each candidate by regenerating the schedule.
//!
//! # Submodules
//!
//! - [`cost`]: makespan plus hard and soft penalties, in milliseconds
//! - `annealing`: cooling schedule, Metropolis acceptance, search loop
//!
//! # Reference
//! - Kirkpatrick et al. (1983), "Optimization by Simulated Annealing"
//! - Pinedo (2016), "Scheduling", Ch. 14: Local Search

mod annealing;
pub mod cost;

pub use annealing::{
    optimize, AnnealingConfig, CoolingSchedule, GeometricCooling, OptimizationResult,
};
pub use cost::{evaluate, CostBreakdown, HARD_VIOLATION_PENALTY_MS, SOFT_VIOLATION_PENALTY_MS};
