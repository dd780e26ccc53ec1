//! Validation and coercion of raw price rows.
//!
//! Each row goes through a strict constructor. Rows that fail are dropped
//! one at a time and reported; they never abort the rest of the input.

use chrono::NaiveDate;
use equity_core::{
    DailyBar, PipelineObserver, PriceSeries, RawBar, Result, RowError, RowRejection,
    numeric_value,
};
use serde_json::Value;
use tracing::debug;

/// Output of [`normalize`].
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Valid bars in ascending date order.
    pub series: PriceSeries,
    /// Rows that were dropped, in input order.
    pub rejections: Vec<RowRejection>,
}

/// Validates raw rows into a date-ordered [`PriceSeries`].
///
/// Rejected rows are reported to `observer` and returned alongside the
/// series. The series may be empty; deciding what that means is up to the
/// caller.
///
/// # Errors
/// Returns [`equity_core::MetricsError::DuplicateDate`] if two valid rows
/// share a date.
pub fn normalize(rows: &[RawBar], observer: &dyn PipelineObserver) -> Result<Normalized> {
    let mut bars = Vec::with_capacity(rows.len());
    let mut rejections = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match coerce_bar(row) {
            Ok(bar) => bars.push(bar),
            Err(reason) => {
                let rejection = RowRejection { index, reason };
                observer.row_rejected(&rejection);
                rejections.push(rejection);
            }
        }
    }

    debug!(
        accepted = bars.len(),
        rejected = rejections.len(),
        "Normalized price rows"
    );

    Ok(Normalized {
        series: PriceSeries::from_bars(bars)?,
        rejections,
    })
}

/// Coerces one raw row into a validated bar.
///
/// # Errors
/// Returns the first problem found with the row.
pub fn coerce_bar(row: &RawBar) -> std::result::Result<DailyBar, RowError> {
    let date = coerce_date(&row.date)?;
    let open = coerce_price("open", &row.open)?;
    let high = coerce_price("high", &row.high)?;
    let low = coerce_price("low", &row.low)?;
    let close = coerce_price("close", &row.close)?;
    let volume = coerce_volume(&row.volume)?;
    DailyBar::new(date, open, high, low, close, volume)
}

/// Parses an ISO date, or the date part of an ISO datetime.
#[must_use]
pub fn parse_date_label(label: &str) -> Option<NaiveDate> {
    let label = label.trim();
    NaiveDate::parse_from_str(label, "%Y-%m-%d").ok().or_else(|| {
        let day = label.split(['T', ' ']).next()?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    })
}

fn coerce_date(value: &Value) -> std::result::Result<NaiveDate, RowError> {
    match value {
        Value::Null => Err(RowError::MissingField("date")),
        Value::String(s) => parse_date_label(s).ok_or_else(|| RowError::InvalidDate(s.clone())),
        other => Err(RowError::InvalidDate(other.to_string())),
    }
}

fn coerce_price(field: &'static str, value: &Value) -> std::result::Result<f64, RowError> {
    if value.is_null() {
        return Err(RowError::MissingField(field));
    }
    numeric_value(value).ok_or_else(|| RowError::NotNumeric {
        field,
        value: value.to_string(),
    })
}

fn coerce_volume(value: &Value) -> std::result::Result<u64, RowError> {
    if value.is_null() {
        return Err(RowError::MissingField("volume"));
    }
    if let Some(volume) = value.as_u64() {
        return Ok(volume);
    }
    let volume = numeric_value(value).ok_or_else(|| RowError::NotNumeric {
        field: "volume",
        value: value.to_string(),
    })?;
    if volume < 0.0 {
        return Err(RowError::Negative {
            field: "volume",
            value: volume,
        });
    }
    if volume.fract() != 0.0 {
        return Err(RowError::FractionalVolume(volume));
    }
    Ok(volume as u64)
}
