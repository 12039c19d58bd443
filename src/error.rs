//! Crate error type.
//!
//! Errors are reserved for malformed input. A schedule that cannot hold
//! every skater is still a schedule; its shortfalls are reported as
//! [`Violation`](crate::models::Violation)s.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors raised before scheduling starts.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Settings failed validation.
    #[error("invalid settings: {}", join(.0))]
    InvalidSettings(Vec<ValidationError>),

    /// Competition data failed validation.
    #[error("invalid competition data: {}", join(.0))]
    InvalidCompetition(Vec<ValidationError>),

    /// Optimizer parameters out of range.
    #[error("invalid optimizer config: {0}")]
    InvalidConfig(String),

    /// JSON could not be parsed into settings or competition data.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for fallible crate operations.
pub type Result<T> = std::result::Result<T, ScheduleError>;
