#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/equity/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Metrics and signal-detection engine.
//!
//! Every function here is a pure, synchronous transformation over data
//! already in memory. Recoverable problems go to an injected
//! [`PipelineObserver`](equity_core::PipelineObserver).

/// Moving-average crossover detection.
pub mod crossover;
/// Fundamentals merge and valuation ratios.
pub mod fundamentals;
/// Rolling-window technical indicators.
pub mod indicators;
/// Validation and coercion of raw price rows.
pub mod normalize;
/// Normalize, compute and merge in one call.
pub mod pipeline;
/// Latest-row summary and data-quality classification.
pub mod quality;

pub use crossover::{
    SmaPoint, crosses_in_frame, death_crosses, detect, golden_crosses, points_from_table,
    tag_events,
};
pub use fundamentals::{Ratios, derive_ratios, merge_report};
pub use indicators::compute;
pub use normalize::{Normalized, normalize};
pub use pipeline::{Processed, Signals, process};
pub use quality::{DataQuality, LatestMetrics, Summary, assess};
