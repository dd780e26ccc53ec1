#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/equity/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types and traits for equity metrics.
//!
//! This crate provides the shared vocabulary of the workspace:
//!
//! - [`PriceSeries`](types::PriceSeries) - Validated daily price history
//! - [`RawInput`](raw::RawInput) - Provider output before validation
//! - [`MetricsTable`](metrics::MetricsTable) - Computed indicators and ratios
//! - [`MetricsStore`](store::MetricsStore) - Persistence abstraction
//! - [`PipelineObserver`](observer::PipelineObserver) - Sink for recoverable problems

/// Error types for metrics operations.
pub mod error;
/// Fundamentals report and company metadata types.
pub mod fundamentals;
/// Computed metrics table.
pub mod metrics;
/// Reporting of recoverable pipeline problems.
pub mod observer;
/// Unvalidated provider input.
pub mod raw;
/// Storage trait for metrics and signals.
pub mod store;
/// Core price and signal types.
pub mod types;

// Re-export commonly used items at crate root
pub use error::{MergeError, MetricsError, Result, RowError, RowRejection};
pub use fundamentals::{
    CompanyInfo, FundamentalField, FundamentalValues, RawFundamentals, numeric_value, truthy,
};
pub use metrics::{MetricsRow, MetricsTable};
pub use observer::{ObservedEvent, PipelineObserver, RecordingObserver, TracingObserver};
pub use raw::{RawBar, RawInput};
pub use store::{MetricsStore, StoredMetric, parse_signal_date};
pub use types::{CrossKind, CrossoverEvent, DailyBar, IndicatorWindows, PriceSeries, Symbol};
