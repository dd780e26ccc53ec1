//! Latest-row summary and data-quality classification.

use chrono::NaiveDate;
use equity_core::{MetricsRow, MetricsTable, Symbol};
use serde::{Deserialize, Serialize};

/// How many core metrics the latest row carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    /// Every core metric is present.
    Complete,
    /// Some core metrics are present.
    Partial,
    /// No core metric is present, or there are no rows.
    Missing,
}

/// Number of core metrics checked by [`assess`].
pub const CORE_METRIC_COUNT: usize = 7;

/// Presence of each core metric on a row.
fn core_metrics(row: &MetricsRow) -> [bool; CORE_METRIC_COUNT] {
    [
        row.sma_short.is_finite(),
        row.sma_long.is_finite(),
        row.trailing_high.is_finite(),
        row.pct_from_trailing_high.is_some_and(f64::is_finite),
        row.book_value_per_share.is_some_and(f64::is_finite),
        row.price_to_book.is_some_and(f64::is_finite),
        row.enterprise_value.is_some_and(f64::is_finite),
    ]
}

/// Classifies the table by the core metrics on its latest row.
#[must_use]
pub fn assess(table: &MetricsTable) -> DataQuality {
    let Some(latest) = table.latest() else {
        return DataQuality::Missing;
    };
    match core_metrics(latest).iter().filter(|present| **present).count() {
        CORE_METRIC_COUNT => DataQuality::Complete,
        0 => DataQuality::Missing,
        _ => DataQuality::Partial,
    }
}

/// Fixed projection of the latest metrics row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatestMetrics {
    /// Trading date.
    pub date: NaiveDate,
    /// Closing price.
    pub close: f64,
    /// Short simple moving average.
    #[serde(rename = "SMA50")]
    pub sma_short: f64,
    /// Long simple moving average.
    #[serde(rename = "SMA200")]
    pub sma_long: f64,
    /// Trailing 52-week high.
    #[serde(rename = "52w_high")]
    pub trailing_high: f64,
    /// Percent distance from the trailing high.
    #[serde(rename = "pct_from_52w_high")]
    pub pct_from_trailing_high: Option<f64>,
    /// Book value per share.
    pub bvps: Option<f64>,
    /// Price-to-book ratio.
    pub pb_ratio: Option<f64>,
    /// Enterprise value.
    pub enterprise_value: Option<f64>,
}

impl From<&MetricsRow> for LatestMetrics {
    fn from(row: &MetricsRow) -> Self {
        Self {
            date: row.date,
            close: row.close,
            sma_short: row.sma_short,
            sma_long: row.sma_long,
            trailing_high: row.trailing_high,
            pct_from_trailing_high: row.pct_from_trailing_high,
            bvps: row.book_value_per_share,
            pb_ratio: row.price_to_book,
            enterprise_value: row.enterprise_value,
        }
    }
}

/// Serializable result of one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Symbol the run was for.
    pub ticker: Symbol,
    /// Golden cross dates.
    pub golden_crosses: Vec<String>,
    /// Death cross dates.
    pub death_crosses: Vec<String>,
    /// Latest metrics, absent for an empty table.
    pub latest: Option<LatestMetrics>,
    /// Classification of the latest row.
    pub data_quality: DataQuality,
}

impl Summary {
    /// Summarizes a table and its crossover dates.
    #[must_use]
    pub fn new(
        ticker: Symbol,
        table: &MetricsTable,
        golden_crosses: Vec<String>,
        death_crosses: Vec<String>,
    ) -> Self {
        Self {
            ticker,
            golden_crosses,
            death_crosses,
            latest: table.latest().map(LatestMetrics::from),
            data_quality: assess(table),
        }
    }
}
