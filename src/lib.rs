//! Figure-skating competition scheduling.
//!
//! Places warmups, performances, ice resurfacings and lunch breaks into
//! daily availability windows, then checks each skater's short and free
//! programs for ordering and recovery time.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `CompetitionData`, `SkatingClass`, `Rule`,
//!   `SchedulerSettings`, `Session`, `Schedule`, `Violation`
//! - **`scheduler`**: Greedy pipeline (ordering, merging, session generation,
//!   placement, compaction) and schedule KPIs
//! - **`optimizer`**: Simulated annealing over class order
//! - **`validation`**: Input checks and the short/free validator
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use skate_schedule::models::{
//!     Competition, CompetitionData, SchedulerSettings, Skater, SkatingClass,
//! };
//! use skate_schedule::generate_schedule;
//!
//! let skater = Skater::new("S1", "Anna", "Berg", NaiveDate::from_ymd_opt(2012, 2, 3).unwrap());
//! let data = CompetitionData::new("E1", "Höstpokalen").with_competition(
//!     Competition::new("C1", "Singel")
//!         .with_class(
//!             SkatingClass::new("K1", "Minior Flickor", "Friåkning").with_skaters(vec![skater]),
//!         ),
//! );
//! let settings = SchedulerSettings::default()
//!     .with_start_date(NaiveDate::from_ymd_opt(2025, 10, 4).unwrap());
//!
//! let schedule = generate_schedule(&data, settings).unwrap();
//! assert!(schedule.is_valid());
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Kirkpatrick et al. (1983), "Optimization by Simulated Annealing"

pub mod error;
pub mod models;
pub mod optimizer;
pub mod scheduler;
pub mod validation;

pub use error::{Result, ScheduleError};
pub use optimizer::{optimize, AnnealingConfig, OptimizationResult};
pub use scheduler::{generate_schedule, ScheduleGenerator, ScheduleKpi};
