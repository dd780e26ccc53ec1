//! Unvalidated input as delivered by a data provider.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{MetricsError, Result};
use crate::fundamentals::{CompanyInfo, RawFundamentals};

/// A price row before validation.
///
/// Fields hold raw JSON values so that malformed rows can be carried to the
/// normalizer and rejected there individually.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBar {
    /// Trading date.
    #[serde(alias = "Date")]
    pub date: Value,
    /// Opening price.
    #[serde(alias = "Open")]
    pub open: Value,
    /// Highest price of the day.
    #[serde(alias = "High")]
    pub high: Value,
    /// Lowest price of the day.
    #[serde(alias = "Low")]
    pub low: Value,
    /// Closing price.
    #[serde(alias = "Close")]
    pub close: Value,
    /// Trading volume.
    #[serde(alias = "Volume")]
    pub volume: Value,
}

impl RawBar {
    /// Extracts raw rows from an OHLCV frame.
    ///
    /// The frame needs `date`, `open`, `high`, `low`, `close` and `volume`
    /// columns; any other column is ignored. Nulls and NaNs become JSON nulls
    /// and are rejected later by the normalizer.
    ///
    /// # Errors
    /// Returns [`MetricsError::Schema`] if a column is missing or cannot be
    /// cast.
    pub fn from_frame(data: &DataFrame) -> Result<Vec<Self>> {
        let schema_err = |e: PolarsError| MetricsError::Schema(e.to_string());

        let dates = data
            .column("date")
            .map_err(schema_err)?
            .cast(&DataType::String)
            .map_err(schema_err)?;
        let dates = dates.str().map_err(schema_err)?;

        let mut prices = Vec::with_capacity(5);
        for name in ["open", "high", "low", "close", "volume"] {
            let column = data
                .column(name)
                .map_err(schema_err)?
                .cast(&DataType::Float64)
                .map_err(schema_err)?;
            prices.push(column);
        }
        let prices = prices
            .iter()
            .map(|c| c.f64().map_err(schema_err))
            .collect::<Result<Vec<_>>>()?;

        let number = |v: Option<f64>| {
            v.and_then(Number::from_f64)
                .map_or(Value::Null, Value::Number)
        };

        let rows = (0..data.height())
            .map(|i| Self {
                date: dates
                    .get(i)
                    .map_or(Value::Null, |d| Value::String(d.to_string())),
                open: number(prices[0].get(i)),
                high: number(prices[1].get(i)),
                low: number(prices[2].get(i)),
                close: number(prices[3].get(i)),
                volume: number(prices[4].get(i)),
            })
            .collect();

        Ok(rows)
    }
}

/// Everything fetched for one symbol, before any processing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    /// Price rows, in any order.
    pub prices: Vec<RawBar>,
    /// Quarterly fundamentals report, if the provider had one.
    #[serde(default)]
    pub fundamentals: Option<RawFundamentals>,
    /// Flat company metadata.
    #[serde(default)]
    pub info: Option<Map<String, Value>>,
}

impl RawInput {
    /// Creates input holding only price rows.
    #[must_use]
    pub fn from_prices(prices: Vec<RawBar>) -> Self {
        Self {
            prices,
            ..Default::default()
        }
    }

    /// Attaches a fundamentals report.
    #[must_use]
    pub fn with_fundamentals(mut self, fundamentals: RawFundamentals) -> Self {
        self.fundamentals = Some(fundamentals);
        self
    }

    /// Attaches a company info map.
    #[must_use]
    pub fn with_info(mut self, info: Map<String, Value>) -> Self {
        self.info = Some(info);
        self
    }

    /// Returns the typed view of the company info map.
    #[must_use]
    pub fn company_info(&self) -> CompanyInfo {
        self.info
            .as_ref()
            .map(CompanyInfo::from_fields)
            .unwrap_or_default()
    }
}
