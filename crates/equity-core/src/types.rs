//! Core data types for daily price history.
//!
//! This module defines the validated price structures:
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`DailyBar`] - One validated OHLCV bar
//! - [`PriceSeries`] - Date-ordered, duplicate-free bars
//! - [`IndicatorWindows`] - Rolling window lengths for technical indicators
//! - [`CrossKind`] / [`CrossoverEvent`] - Moving-average crossover signals

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MetricsError, Result, RowError};

/// Suffix appended to bare tickers that look like NSE listings.
const NSE_SUFFIX: &str = ".NS";

/// Longest bare ticker still treated as a US listing.
const MAX_US_TICKER_LEN: usize = 4;

/// A trading symbol/ticker.
///
/// Symbols are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Creates a symbol with a market suffix inferred from its shape.
    ///
    /// Tickers that already carry an exchange suffix (`RELIANCE.NS`, `BRK.B`)
    /// are kept as-is. Bare tickers longer than four characters are assumed
    /// to be NSE listings and get `.NS` appended; shorter ones are left as US
    /// tickers.
    #[must_use]
    pub fn normalized(s: impl Into<String>) -> Self {
        let symbol = Self::new(s);
        if symbol.0.contains('.') || symbol.0.len() <= MAX_US_TICKER_LEN {
            return symbol;
        }
        Self(format!("{}{NSE_SUFFIX}", symbol.0))
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A validated daily OHLCV bar.
///
/// Prices are finite and non-negative and `high >= low`. Construct through
/// [`DailyBar::new`], which enforces these.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
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
}

impl DailyBar {
    /// Creates a bar, validating prices.
    ///
    /// # Errors
    /// Returns a [`RowError`] if any price is not finite, is negative, or if
    /// `high < low`.
    pub fn new(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> std::result::Result<Self, RowError> {
        for (field, value) in [("open", open), ("high", high), ("low", low), ("close", close)] {
            if !value.is_finite() {
                return Err(RowError::NotNumeric {
                    field,
                    value: value.to_string(),
                });
            }
            if value < 0.0 {
                return Err(RowError::Negative { field, value });
            }
        }
        if high < low {
            return Err(RowError::HighBelowLow { high, low });
        }
        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Daily bars ordered strictly ascending by date.
///
/// Immutable once built; derived tables are produced alongside it rather
/// than by mutating it.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<DailyBar>,
}

impl PriceSeries {
    /// Builds a series from bars in any order.
    ///
    /// # Errors
    /// Returns [`MetricsError::DuplicateDate`] if two bars share a date.
    pub fn from_bars(mut bars: Vec<DailyBar>) -> Result<Self> {
        bars.sort_by_key(|bar| bar.date);
        if let Some(pair) = bars.windows(2).find(|pair| pair[0].date == pair[1].date) {
            return Err(MetricsError::DuplicateDate(pair[1].date));
        }
        Ok(Self { bars })
    }

    /// Returns the number of bars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Returns true if there are no bars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Returns the bars in date order.
    #[must_use]
    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    /// Returns an iterator over the bars.
    pub fn iter(&self) -> impl Iterator<Item = &DailyBar> {
        self.bars.iter()
    }

    /// Returns the closing prices in date order.
    #[must_use]
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    /// Returns the first and last dates covered.
    #[must_use]
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.bars.first()?.date, self.bars.last()?.date))
    }
}

/// Rolling window lengths, in trading days.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorWindows {
    /// Window of the short simple moving average.
    pub short_window: usize,
    /// Window of the long simple moving average.
    pub long_window: usize,
    /// Window of the trailing high (52 weeks of trading days).
    pub trailing_high_window: usize,
}

impl IndicatorWindows {
    /// Checks that every window is at least one day long.
    ///
    /// # Errors
    /// Returns [`MetricsError::InvalidParameter`] naming the first empty window.
    pub fn validate(&self) -> Result<()> {
        for (name, window) in [
            ("short_window", self.short_window),
            ("long_window", self.long_window),
            ("trailing_high_window", self.trailing_high_window),
        ] {
            if window == 0 {
                return Err(MetricsError::InvalidParameter(format!(
                    "{name} must be at least 1"
                )));
            }
        }
        Ok(())
    }
}

impl Default for IndicatorWindows {
    fn default() -> Self {
        Self {
            short_window: 50,
            long_window: 200,
            trailing_high_window: 252,
        }
    }
}

/// Direction of a moving-average crossover.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CrossKind {
    /// Short average crossing above the long average.
    GoldenCross,
    /// Short average crossing below the long average.
    DeathCross,
}

impl CrossKind {
    /// Returns the label used when persisting events.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GoldenCross => "GoldenCross",
            Self::DeathCross => "DeathCross",
        }
    }
}

impl fmt::Display for CrossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrossKind {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GoldenCross" => Ok(Self::GoldenCross),
            "DeathCross" => Ok(Self::DeathCross),
            other => Err(MetricsError::Parse(format!("Invalid cross kind: {other}"))),
        }
    }
}

/// A crossover signal on a given date.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrossoverEvent {
    /// Date the cross was observed.
    pub date: NaiveDate,
    /// Direction of the cross.
    pub kind: CrossKind,
}
