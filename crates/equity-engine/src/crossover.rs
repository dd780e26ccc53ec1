//! Moving-average crossover detection.
//!
//! A golden cross is the short average moving from at-or-below the long
//! average to strictly above it; a death cross is the reverse. Equality never
//! counts as a cross by itself, and the first row never crosses.

use chrono::NaiveDate;
use equity_core::{CrossKind, CrossoverEvent, MetricsError, MetricsTable, Result};
use polars::prelude::*;

use crate::normalize::parse_date_label;

/// Column holding the short moving average in exported frames.
pub const SMA_SHORT_COLUMN: &str = "sma_short";
/// Column holding the long moving average in exported frames.
pub const SMA_LONG_COLUMN: &str = "sma_long";

/// The two averages on one date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmaPoint {
    /// Trading date.
    pub date: NaiveDate,
    /// Short moving average, if known.
    pub short: Option<f64>,
    /// Long moving average, if known.
    pub long: Option<f64>,
}

impl SmaPoint {
    /// Creates a point with both averages known.
    #[must_use]
    pub const fn new(date: NaiveDate, short: f64, long: f64) -> Self {
        Self {
            date,
            short: Some(short),
            long: Some(long),
        }
    }
}

/// Extracts the averages from a metrics table.
#[must_use]
pub fn points_from_table(table: &MetricsTable) -> Vec<SmaPoint> {
    table
        .iter()
        .map(|row| SmaPoint::new(row.date, row.sma_short, row.sma_long))
        .collect()
}

/// Extracts the averages from a frame.
///
/// Returns `Ok(None)` if either average column is missing.
///
/// # Errors
/// Returns [`MetricsError::Schema`] if there is no usable `date` column and
/// [`MetricsError::Parse`] if a date cannot be read.
pub fn points_from_frame(
    data: &DataFrame,
    short_column: &str,
    long_column: &str,
) -> Result<Option<Vec<SmaPoint>>> {
    let schema_err = |e: PolarsError| MetricsError::Schema(e.to_string());

    let (Ok(short), Ok(long)) = (data.column(short_column), data.column(long_column)) else {
        return Ok(None);
    };
    let short = short.cast(&DataType::Float64).map_err(schema_err)?;
    let short = short.f64().map_err(schema_err)?;
    let long = long.cast(&DataType::Float64).map_err(schema_err)?;
    let long = long.f64().map_err(schema_err)?;

    let dates = data
        .column("date")
        .map_err(schema_err)?
        .cast(&DataType::String)
        .map_err(schema_err)?;
    let dates = dates.str().map_err(schema_err)?;

    let mut points = Vec::with_capacity(data.height());
    for i in 0..data.height() {
        let label = dates
            .get(i)
            .ok_or_else(|| MetricsError::Parse(format!("Missing date in row {i}")))?;
        let date = parse_date_label(label)
            .ok_or_else(|| MetricsError::Parse(format!("Invalid date {label}")))?;
        points.push(SmaPoint {
            date,
            short: short.get(i),
            long: long.get(i),
        });
    }
    Ok(Some(points))
}

/// Returns the dates on which a cross of `kind` occurs, ascending.
///
/// Points are sorted by date first. A point with either average missing
/// cannot take part in a cross.
#[must_use]
pub fn detect(points: &[SmaPoint], kind: CrossKind) -> Vec<NaiveDate> {
    let mut points = points.to_vec();
    points.sort_by_key(|p| p.date);

    points
        .windows(2)
        .filter(|pair| crosses(&pair[0], &pair[1], kind))
        .map(|pair| pair[1].date)
        .collect()
}

fn crosses(prev: &SmaPoint, curr: &SmaPoint, kind: CrossKind) -> bool {
    let (Some(prev_short), Some(prev_long), Some(short), Some(long)) =
        (prev.short, prev.long, curr.short, curr.long)
    else {
        return false;
    };
    match kind {
        CrossKind::GoldenCross => short > long && prev_short <= prev_long,
        CrossKind::DeathCross => short < long && prev_short >= prev_long,
    }
}

/// Golden cross dates as `YYYY-MM-DD` labels.
#[must_use]
pub fn golden_crosses(points: &[SmaPoint]) -> Vec<String> {
    labels(detect(points, CrossKind::GoldenCross))
}

/// Death cross dates as `YYYY-MM-DD` labels.
#[must_use]
pub fn death_crosses(points: &[SmaPoint]) -> Vec<String> {
    labels(detect(points, CrossKind::DeathCross))
}

/// Cross labels of `kind` found in a frame's `sma_short`/`sma_long` columns.
///
/// A frame without those columns has no crosses.
///
/// # Errors
/// See [`points_from_frame`].
pub fn crosses_in_frame(data: &DataFrame, kind: CrossKind) -> Result<Vec<String>> {
    let points = points_from_frame(data, SMA_SHORT_COLUMN, SMA_LONG_COLUMN)?;
    Ok(points
        .map(|points| labels(detect(&points, kind)))
        .unwrap_or_default())
}

/// Tags golden and death cross labels as events, ordered by date.
///
/// # Errors
/// Returns [`MetricsError::Parse`] if a label is not a date.
pub fn tag_events(golden: &[String], death: &[String]) -> Result<Vec<CrossoverEvent>> {
    let tagged = golden
        .iter()
        .map(|d| (d, CrossKind::GoldenCross))
        .chain(death.iter().map(|d| (d, CrossKind::DeathCross)));

    let mut events = Vec::with_capacity(golden.len() + death.len());
    for (label, kind) in tagged {
        let date = parse_date_label(label)
            .ok_or_else(|| MetricsError::Parse(format!("Invalid signal date {label}")))?;
        events.push(CrossoverEvent { date, kind });
    }
    events.sort_by_key(|e| (e.date, e.kind));
    Ok(events)
}

fn labels(dates: Vec<NaiveDate>) -> Vec<String> {
    dates.into_iter().map(|d| d.format("%Y-%m-%d").to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn points(short: &[f64], long: &[f64]) -> Vec<SmaPoint> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        short
            .iter()
            .zip(long)
            .enumerate()
            .map(|(i, (s, l))| SmaPoint::new(start + Duration::days(i as i64), *s, *l))
            .collect()
    }

    #[test]
    fn test_golden_and_death_cross() {
        let points = points(
            &[1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 3.0, 3.0],
            &[1.0, 1.0, 1.0, 1.0, 1.0, 1.5, 1.7, 2.5, 2.9, 2.0],
        );

        // Equality through index 3, so index 4 is the first cross up.
        assert_eq!(golden_crosses(&points), vec!["2020-01-05", "2020-01-09"]);
        assert_eq!(death_crosses(&points), vec!["2020-01-08"]);
    }

    #[test]
    fn test_first_row_never_crosses() {
        let points = points(&[2.0, 2.0], &[1.0, 1.0]);
        assert!(golden_crosses(&points).is_empty());
        assert!(death_crosses(&points).is_empty());
    }

    #[test]
    fn test_strictly_below_never_crosses() {
        let short: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let long: Vec<f64> = short.iter().map(|s| s + 0.5).collect();
        let points = points(&short, &long);
        assert!(golden_crosses(&points).is_empty());
        assert!(death_crosses(&points).is_empty());
    }

    #[test]
    fn test_equality_then_drop_is_death_cross() {
        let points = points(&[1.0, 1.0, 0.5], &[1.0, 1.0, 1.0]);
        assert_eq!(death_crosses(&points), vec!["2020-01-03"]);
        assert!(golden_crosses(&points).is_empty());
    }

    #[test]
    fn test_unsorted_points_are_sorted() {
        let mut points = points(&[1.0, 2.0, 0.5], &[1.5, 1.5, 1.5]);
        points.reverse();
        assert_eq!(golden_crosses(&points), vec!["2020-01-02"]);
        assert_eq!(death_crosses(&points), vec!["2020-01-03"]);
    }

    #[test]
    fn test_missing_values_never_cross() {
        let mut points = points(&[1.0, 2.0, 3.0], &[1.5, 1.5, 1.5]);
        points[0].long = None;
        assert!(golden_crosses(&points).is_empty());
    }

    #[test]
    fn test_frame_without_sma_columns() {
        let df = DataFrame::new(vec![
            Column::new("date".into(), vec!["2020-01-01", "2020-01-02"]),
            Column::new("close".into(), vec![1.0, 2.0]),
        ])
        .unwrap();
        assert!(crosses_in_frame(&df, CrossKind::GoldenCross).unwrap().is_empty());
        assert!(crosses_in_frame(&df, CrossKind::DeathCross).unwrap().is_empty());
    }

    #[test]
    fn test_frame_with_sma_columns() {
        let df = DataFrame::new(vec![
            Column::new("date".into(), vec!["2020-01-02", "2020-01-01", "2020-01-03"]),
            Column::new(SMA_SHORT_COLUMN.into(), vec![2.0, 1.0, 0.5]),
            Column::new(SMA_LONG_COLUMN.into(), vec![1.5, 1.5, 1.5]),
        ])
        .unwrap();
        assert_eq!(
            crosses_in_frame(&df, CrossKind::GoldenCross).unwrap(),
            vec!["2020-01-02"]
        );
        assert_eq!(
            crosses_in_frame(&df, CrossKind::DeathCross).unwrap(),
            vec!["2020-01-03"]
        );
    }

    #[test]
    fn test_tag_events() {
        let events = tag_events(
            &["2020-01-05".to_string()],
            &["2020-01-03".to_string()],
        )
        .unwrap();
        assert_eq!(events[0].kind, CrossKind::DeathCross);
        assert_eq!(events[1].kind, CrossKind::GoldenCross);
        assert!(tag_events(&["soon".to_string()], &[]).is_err());
    }
}
