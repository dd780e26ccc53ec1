//! Computed metrics table.

use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};
use crate::fundamentals::FundamentalValues;
use crate::types::DailyBar;

/// One trading day of computed metrics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    /// Trading date.
    pub date: NaiveDate,
    /// Opening price.
    pub open: f64,
    /// Highest price of the day.
    pub high: f64,
    /// Lowest price of the day.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Trading volume.
    pub volume: u64,
    /// Short simple moving average of close.
    pub sma_short: f64,
    /// Long simple moving average of close.
    pub sma_long: f64,
    /// Highest close over the trailing-high window.
    pub trailing_high: f64,
    /// Percent distance of close below the trailing high.
    ///
    /// Absent when the trailing high is zero.
    pub pct_from_trailing_high: Option<f64>,
    /// Forward-filled fundamentals.
    #[serde(flatten)]
    pub fundamentals: FundamentalValues,
    /// Book value per share.
    pub book_value_per_share: Option<f64>,
    /// Close divided by book value per share.
    pub price_to_book: Option<f64>,
    /// Enterprise value.
    pub enterprise_value: Option<f64>,
}

impl MetricsRow {
    /// Creates a row carrying a bar and its technical indicators.
    ///
    /// Fundamentals and ratios start absent.
    #[must_use]
    pub fn from_bar(
        bar: &DailyBar,
        sma_short: f64,
        sma_long: f64,
        trailing_high: f64,
        pct_from_trailing_high: Option<f64>,
    ) -> Self {
        Self {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            sma_short,
            sma_long,
            trailing_high,
            pct_from_trailing_high,
            fundamentals: FundamentalValues::default(),
            book_value_per_share: None,
            price_to_book: None,
            enterprise_value: None,
        }
    }
}

/// Metrics rows in ascending date order, one per input bar.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsTable {
    rows: Vec<MetricsRow>,
}

impl MetricsTable {
    /// Wraps rows that are already in date order.
    #[must_use]
    pub const fn from_rows(rows: Vec<MetricsRow>) -> Self {
        Self { rows }
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the rows.
    #[must_use]
    pub fn rows(&self) -> &[MetricsRow] {
        &self.rows
    }

    /// Returns mutable access to the rows.
    pub fn rows_mut(&mut self) -> &mut [MetricsRow] {
        &mut self.rows
    }

    /// Returns an iterator over the rows.
    pub fn iter(&self) -> impl Iterator<Item = &MetricsRow> {
        self.rows.iter()
    }

    /// Returns the chronologically last row.
    #[must_use]
    pub fn latest(&self) -> Option<&MetricsRow> {
        self.rows.last()
    }

    /// Consumes the table and returns the rows.
    #[must_use]
    pub fn into_inner(self) -> Vec<MetricsRow> {
        self.rows
    }

    /// Converts the table to a polars frame.
    ///
    /// Columns: date, open, high, low, close, volume, sma_short, sma_long,
    /// trailing_high, pct_from_trailing_high, total_assets,
    /// total_liabilities, shares_outstanding, book_value_per_share,
    /// price_to_book, enterprise_value. Absent values are nulls.
    ///
    /// # Errors
    /// Returns [`MetricsError::Schema`] if polars rejects the columns.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let schema_err = |e: PolarsError| MetricsError::Schema(e.to_string());
        let epoch = NaiveDate::default();
        let dates: Vec<i32> = self
            .rows
            .iter()
            .map(|r| (r.date - epoch).num_days() as i32)
            .collect();
        let date_col = Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(schema_err)?;

        let values = |f: fn(&MetricsRow) -> f64| self.rows.iter().map(f).collect::<Vec<_>>();
        let optional =
            |f: fn(&MetricsRow) -> Option<f64>| self.rows.iter().map(f).collect::<Vec<_>>();

        DataFrame::new(vec![
            date_col,
            Column::new("open".into(), values(|r| r.open)),
            Column::new("high".into(), values(|r| r.high)),
            Column::new("low".into(), values(|r| r.low)),
            Column::new("close".into(), values(|r| r.close)),
            Column::new(
                "volume".into(),
                self.rows.iter().map(|r| r.volume).collect::<Vec<_>>(),
            ),
            Column::new("sma_short".into(), values(|r| r.sma_short)),
            Column::new("sma_long".into(), values(|r| r.sma_long)),
            Column::new("trailing_high".into(), values(|r| r.trailing_high)),
            Column::new(
                "pct_from_trailing_high".into(),
                optional(|r| r.pct_from_trailing_high),
            ),
            Column::new(
                "total_assets".into(),
                optional(|r| r.fundamentals.total_assets),
            ),
            Column::new(
                "total_liabilities".into(),
                optional(|r| r.fundamentals.total_liabilities),
            ),
            Column::new(
                "shares_outstanding".into(),
                optional(|r| r.fundamentals.shares_outstanding),
            ),
            Column::new(
                "book_value_per_share".into(),
                optional(|r| r.book_value_per_share),
            ),
            Column::new("price_to_book".into(), optional(|r| r.price_to_book)),
            Column::new("enterprise_value".into(), optional(|r| r.enterprise_value)),
        ])
        .map_err(schema_err)
    }
}

impl IntoIterator for MetricsTable {
    type Item = MetricsRow;
    type IntoIter = std::vec::IntoIter<MetricsRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(day: u32, close: f64) -> MetricsRow {
        let bar = DailyBar::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            close,
            close,
            close,
            close,
            100,
        )
        .unwrap();
        MetricsRow::from_bar(&bar, close, close, close, Some(0.0))
    }

    #[test]
    fn test_latest_row() {
        let table = MetricsTable::from_rows(vec![row(1, 10.0), row(2, 11.0)]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.latest().map(|r| r.close), Some(11.0));
        assert!(MetricsTable::default().latest().is_none());
    }

    #[test]
    fn test_to_dataframe() {
        let mut table = MetricsTable::from_rows(vec![row(1, 10.0), row(2, 11.0)]);
        table.rows_mut()[1].book_value_per_share = Some(5.0);

        let df = table.to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 16);
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);

        let bvps = df.column("book_value_per_share").unwrap();
        assert_eq!(bvps.null_count(), 1);
    }

    #[test]
    fn test_exported_frame_reads_back_as_raw_bars() {
        let table = MetricsTable::from_rows(vec![row(1, 10.0), row(2, 11.0)]);
        let df = table.to_dataframe().unwrap();

        let bars = crate::raw::RawBar::from_frame(&df).unwrap();
        assert_eq!(bars.len(), 2);
        for (bar, row) in bars.iter().zip(table.iter()) {
            assert_eq!(bar.date, serde_json::json!(row.date.to_string()));
            assert_eq!(bar.close.as_f64(), Some(row.close));
        }
    }
}
