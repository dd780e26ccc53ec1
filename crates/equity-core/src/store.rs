//! Storage trait for computed metrics and signals.
//!
//! This module defines the [`MetricsStore`] trait. Every write is an upsert:
//! replaying a run for the same symbol must not create duplicates.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    error::{MetricsError, Result},
    metrics::MetricsTable,
    types::{CrossKind, Symbol},
};

/// The persisted projection of a metrics row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredMetric {
    /// Trading date.
    pub date: NaiveDate,
    /// Closing price.
    pub close: f64,
    /// Short simple moving average.
    pub sma_short: f64,
    /// Long simple moving average.
    pub sma_long: f64,
}

/// Trait for persisting metrics output.
///
/// Implementations key daily metrics by (symbol, date) and signals by
/// (symbol, date, kind).
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Registers a symbol, updating its display name if one is given.
    async fn upsert_ticker(&self, symbol: &Symbol, name: Option<&str>) -> Result<()>;

    /// Stores one row per date of the table.
    ///
    /// Returns the number of rows written.
    async fn upsert_daily_metrics(&self, symbol: &Symbol, table: &MetricsTable) -> Result<usize>;

    /// Stores signal dates (`YYYY-MM-DD`) of one kind.
    ///
    /// Returns the number of dates written.
    async fn upsert_signals(&self, symbol: &Symbol, dates: &[String], kind: CrossKind)
    -> Result<usize>;

    /// Returns the display name of a registered symbol.
    ///
    /// `Ok(None)` if the symbol is unknown or has no name.
    async fn ticker_name(&self, symbol: &Symbol) -> Result<Option<String>>;

    /// Returns stored daily metrics for a symbol in date order.
    async fn daily_metrics(&self, symbol: &Symbol) -> Result<Vec<StoredMetric>>;

    /// Returns stored signal dates of one kind in date order.
    async fn signals(&self, symbol: &Symbol, kind: CrossKind) -> Result<Vec<NaiveDate>>;
}

/// Parses a signal date label.
///
/// # Errors
/// Returns [`MetricsError::Parse`] if the label is not `YYYY-MM-DD`.
pub fn parse_signal_date(label: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(label, "%Y-%m-%d")
        .map_err(|e| MetricsError::Parse(format!("Invalid signal date {label}: {e}")))
}
