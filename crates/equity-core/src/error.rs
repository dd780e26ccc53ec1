//! Error types for metrics operations.
//!
//! [`MetricsError`] covers failures that abort an operation. Row-level
//! problems ([`RowError`]) and fundamentals merge problems ([`MergeError`])
//! are recoverable: the engine records them and keeps going.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that abort a metrics operation.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// No usable price rows remained after normalization.
    #[error("No usable price data for {0}")]
    EmptyInput(String),

    /// A price series contained the same date twice.
    #[error("Duplicate price date: {0}")]
    DuplicateDate(NaiveDate),

    /// A frame or record did not have the expected shape.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Error parsing input data.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with a metrics store.
    #[error("Store error: {0}")]
    Store(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias using [`MetricsError`].
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Reason a single raw price row was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    /// A required field was absent or null.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// The date could not be parsed.
    #[error("invalid date `{0}`")]
    InvalidDate(String),

    /// A price field was not a finite number.
    #[error("field `{field}` is not a number: {value}")]
    NotNumeric {
        /// Name of the offending field.
        field: &'static str,
        /// The raw value, rendered as text.
        value: String,
    },

    /// A price or volume was negative.
    #[error("field `{field}` is negative: {value}")]
    Negative {
        /// Name of the offending field.
        field: &'static str,
        /// The parsed value.
        value: f64,
    },

    /// Volume was not a whole number.
    #[error("volume is not an integer: {0}")]
    FractionalVolume(f64),

    /// The bar's high was below its low.
    #[error("high {high} is below low {low}")]
    HighBelowLow {
        /// Reported high.
        high: f64,
        /// Reported low.
        low: f64,
    },
}

/// A raw row dropped during normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRejection {
    /// Position of the row in the raw input.
    pub index: usize,
    /// Why the row was dropped.
    pub reason: RowError,
}

/// Failure to merge a fundamentals report onto the price calendar.
///
/// Merge failures never abort the pipeline; the table proceeds without
/// fundamentals columns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// None of the report's fields are recognized fundamentals.
    #[error("report has no recognized fields (saw: {0})")]
    NoRecognizedFields(String),

    /// Two report labels resolve to the same date with different values.
    #[error("conflicting reports for {0}")]
    ConflictingReports(NaiveDate),
}
