use chrono::NaiveDateTime;
use thiserror::Error;

/// Precondition violations surfaced by the pipeline.
///
/// None of these are recoverable locally; they are reported to the caller
/// as-is. An empty filter result is *not* an error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("required column '{0}' is missing")]
    MissingColumn(String),

    #[error("column '{column}' is malformed at row {row}: {reason}")]
    MalformedColumn {
        column: String,
        row: usize,
        reason: String,
    },

    #[error("date range is inverted: start {start} is after end {end}")]
    InvalidDateRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("distance range is inverted: lo {lo} is greater than hi {hi}")]
    InvalidDistanceRange { lo: f64, hi: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
