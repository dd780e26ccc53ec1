#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/equity/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Equity metrics and moving-average crossover signals.
//!
//! This crate re-exports the core types, the computation engine and the
//! store backends, and provides a [`MetricsRunner`] that processes one
//! symbol end to end.
//!
//! # Features
//!
//! - `store-sqlite` - SQLite-backed [`SqliteStore`] (default)
//!
//! # Example
//!
//! ```rust,ignore
//! use equity::{MetricsRunner, RawInput, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> equity::Result<()> {
//!     let raw: RawInput = serde_json::from_str(&std::fs::read_to_string("raw.json")?)?;
//!     let report = MetricsRunner::new().run(&Symbol::normalized("infy"), &raw).await?;
//!     println!("{:?}", report.summary);
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use equity_core::*;

// Engine
pub use equity_engine::{
    DataQuality, LatestMetrics, Normalized, Processed, Ratios, Signals, SmaPoint, Summary, assess,
    compute, crosses_in_frame, death_crosses, derive_ratios, detect, golden_crosses,
    merge_report, normalize, points_from_table, process, tag_events,
};

// Store implementations
pub use equity_store::InMemoryStore;
#[cfg(feature = "store-sqlite")]
pub use equity_store::SqliteStore;

mod runner;
pub use runner::{MetricsRunner, RunReport};
