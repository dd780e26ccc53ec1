//! Rolling-window technical indicators.
//!
//! Every window uses a minimum period of one: until a window fills up it is
//! computed over the history available so far, so short series still get a
//! value on every row.

use std::collections::VecDeque;

use equity_core::{IndicatorWindows, MetricsRow, MetricsTable, PriceSeries, Result};

/// Trailing mean of `values` over `window` points, minimum period one.
///
/// Each window is summed as deviations from its first value, so a window of
/// identical values averages to exactly that value and equal windows of
/// different lengths compare equal.
///
/// `window` must be non-zero.
#[must_use]
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let len = (i + 1).min(window);
            let slice = &values[i + 1 - len..=i];
            let base = slice[0];
            let offset: f64 = slice.iter().map(|v| v - base).sum();
            base + offset / len as f64
        })
        .collect()
}

/// Trailing maximum of `values` over `window` points, minimum period one.
///
/// `window` must be non-zero.
#[must_use]
pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    // Indices of candidate maxima, values strictly decreasing front to back.
    let mut candidates: VecDeque<usize> = VecDeque::new();
    for (i, value) in values.iter().enumerate() {
        while candidates.back().is_some_and(|&j| values[j] <= *value) {
            candidates.pop_back();
        }
        candidates.push_back(i);
        if candidates.front().is_some_and(|&j| j + window <= i) {
            candidates.pop_front();
        }
        out.push(values[candidates[0]]);
    }
    out
}

/// Percent distance of `close` from `high`.
///
/// Absent when `high` is zero.
#[must_use]
pub fn pct_from_high(close: f64, high: f64) -> Option<f64> {
    (high != 0.0).then(|| (close - high) / high * 100.0)
}

/// Computes the technical columns for every bar of the series.
///
/// The table has exactly one row per bar, in the same order. Fundamentals
/// and ratio columns are left absent.
///
/// # Errors
/// Returns [`equity_core::MetricsError::InvalidParameter`] if a window is zero.
pub fn compute(series: &PriceSeries, windows: &IndicatorWindows) -> Result<MetricsTable> {
    windows.validate()?;

    let closes = series.closes();
    let sma_short = rolling_mean(&closes, windows.short_window);
    let sma_long = rolling_mean(&closes, windows.long_window);
    let trailing_high = rolling_max(&closes, windows.trailing_high_window);

    let rows = series
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            MetricsRow::from_bar(
                bar,
                sma_short[i],
                sma_long[i],
                trailing_high[i],
                pct_from_high(bar.close, trailing_high[i]),
            )
        })
        .collect();

    Ok(MetricsTable::from_rows(rows))
}
