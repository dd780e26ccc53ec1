//! Fundamentals merge and valuation ratios.
//!
//! A quarterly report is sparse and its dates rarely fall on trading days.
//! [`merge_report`] carries each field forward so every trading day holds the
//! latest value reported on or before it. [`derive_ratios`] then computes
//! book value per share, price-to-book and enterprise value from the last
//! row and broadcasts them over the whole table.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use equity_core::{
    CompanyInfo, FundamentalField, FundamentalValues, MergeError, MetricsTable, PipelineObserver,
    RawFundamentals, numeric_value, truthy,
};
use tracing::debug;

use crate::normalize::parse_date_label;

/// Recognized fundamentals for one report date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportPoint {
    /// Report date.
    pub date: NaiveDate,
    /// Values given in the report.
    pub values: FundamentalValues,
}

/// Parses a raw report into date-ordered points.
///
/// Unparsable report dates are dropped and reported to `observer`. Unknown
/// fields are ignored and non-numeric values are treated as absent.
///
/// # Errors
/// Returns [`MergeError::NoRecognizedFields`] if no field of the report is
/// recognized, or [`MergeError::ConflictingReports`] if two labels resolve to
/// the same date with different values.
pub fn parse_report(
    report: &RawFundamentals,
    observer: &dyn PipelineObserver,
) -> Result<Vec<ReportPoint>, MergeError> {
    let recognized = report
        .values()
        .flat_map(|fields| fields.keys())
        .any(|name| FundamentalField::from_label(name).is_some());
    if !recognized {
        let mut seen: Vec<&str> = report
            .values()
            .flat_map(|fields| fields.keys())
            .map(String::as_str)
            .collect();
        seen.sort_unstable();
        seen.dedup();
        return Err(MergeError::NoRecognizedFields(seen.join(", ")));
    }

    let mut points: BTreeMap<NaiveDate, FundamentalValues> = BTreeMap::new();
    for (label, fields) in report {
        let Some(date) = parse_date_label(label) else {
            observer.report_date_dropped(label);
            continue;
        };

        let mut values = FundamentalValues::default();
        for (name, value) in fields {
            let Some(field) = FundamentalField::from_label(name) else {
                continue;
            };
            if values.get(field).is_none() {
                values.set(field, numeric_value(value));
            }
        }

        match points.get(&date) {
            Some(existing) if *existing != values => {
                return Err(MergeError::ConflictingReports(date));
            }
            Some(_) => {}
            None => {
                points.insert(date, values);
            }
        }
    }

    Ok(points
        .into_iter()
        .map(|(date, values)| ReportPoint { date, values })
        .collect())
}

/// Forward-fills report points onto the table.
///
/// Each field is carried independently: a row takes, per field, the most
/// recent non-null value reported on or before its date. Rows before the
/// first report keep absent fundamentals.
pub fn forward_fill(table: &mut MetricsTable, points: &[ReportPoint]) {
    let mut carried = FundamentalValues::default();
    let mut next = 0;

    for row in table.rows_mut() {
        while let Some(point) = points.get(next).filter(|p| p.date <= row.date) {
            for field in FundamentalField::ALL {
                if let Some(value) = point.values.get(field) {
                    carried.set(field, Some(value));
                }
            }
            next += 1;
        }
        row.fundamentals = carried;
    }
}

/// Merges an optional fundamentals report onto the table.
///
/// A missing or empty report leaves the table untouched. Merge failures are
/// reported to `observer` and the table is returned without fundamentals.
#[must_use]
pub fn merge_report(
    mut table: MetricsTable,
    report: Option<&RawFundamentals>,
    observer: &dyn PipelineObserver,
) -> MetricsTable {
    let Some(report) = report.filter(|r| !r.is_empty()) else {
        return table;
    };

    match parse_report(report, observer) {
        Ok(points) => {
            debug!(reports = points.len(), "Merging fundamentals");
            forward_fill(&mut table, &points);
        }
        Err(e) => observer.merge_failed(&e),
    }
    table
}

/// Valuation figures broadcast across the table.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ratios {
    /// Book value per share, if positive and derivable.
    pub book_value_per_share: Option<f64>,
    /// Enterprise value, if reported.
    pub enterprise_value: Option<f64>,
}

impl Ratios {
    /// Works out the ratios from company info and the table's last row.
    ///
    /// Book value per share comes from `info` when it is present and
    /// non-zero. Otherwise it is last total assets over last shares
    /// outstanding, falling back to `info` for either figure when the table
    /// has none. It is only kept when positive.
    #[must_use]
    pub fn from_sources(table: &MetricsTable, info: &CompanyInfo) -> Self {
        let last = table.latest().map(|row| row.fundamentals).unwrap_or_default();

        let derived = || {
            let shares = last.shares_outstanding.or(info.shares_outstanding)?;
            let assets = last.total_assets.or(info.total_assets)?;
            (shares > 0.0).then(|| assets / shares)
        };
        let book_value_per_share = truthy(info.book_value)
            .or_else(derived)
            .filter(|bvps| *bvps > 0.0);

        Self {
            book_value_per_share,
            enterprise_value: truthy(info.enterprise_value),
        }
    }
}

/// Fills the ratio columns of every row.
///
/// Price-to-book is close over book value per share; when the latter is
/// undefined both stay absent on every row.
pub fn derive_ratios(table: &mut MetricsTable, info: &CompanyInfo) -> Ratios {
    let ratios = Ratios::from_sources(table, info);
    for row in table.rows_mut() {
        row.book_value_per_share = ratios.book_value_per_share;
        row.price_to_book = ratios.book_value_per_share.map(|bvps| row.close / bvps);
        row.enterprise_value = ratios.enterprise_value;
    }
    ratios
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use equity_core::{DailyBar, MetricsRow, ObservedEvent, RecordingObserver};
    use serde_json::{Value, json};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn table(dates: &[NaiveDate], close: f64) -> MetricsTable {
        let rows = dates
            .iter()
            .map(|d| {
                let bar = DailyBar::new(*d, close, close, close, close, 1).unwrap();
                MetricsRow::from_bar(&bar, close, close, close, Some(0.0))
            })
            .collect();
        MetricsTable::from_rows(rows)
    }

    fn report(entries: &[(&str, Value)]) -> RawFundamentals {
        entries
            .iter()
            .map(|(label, fields)| {
                let fields: BTreeMap<String, Value> = fields
                    .as_object()
                    .unwrap()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                (label.to_string(), fields)
            })
            .collect()
    }

    #[test]
    fn test_forward_fill_as_of_report_dates() {
        let days = [date(3, 28), date(4, 1), date(4, 2), date(6, 28), date(7, 1)];
        let raw = report(&[
            // Sunday quarter end: no trading day matches exactly.
            ("2024-03-31", json!({"TotalAssets": 100.0, "OrdinarySharesNumber": 10.0})),
            ("2024-06-30 00:00:00", json!({"TotalAssets": 120.0, "OrdinarySharesNumber": null})),
        ]);

        let observer = RecordingObserver::new();
        let merged = merge_report(table(&days, 5.0), Some(&raw), &observer);
        let rows = merged.rows();

        assert_eq!(rows[0].fundamentals, FundamentalValues::default());
        assert_eq!(rows[1].fundamentals.total_assets, Some(100.0));
        assert_eq!(rows[2].fundamentals.shares_outstanding, Some(10.0));
        assert_eq!(rows[3].fundamentals.total_assets, Some(100.0));
        assert_eq!(rows[4].fundamentals.total_assets, Some(120.0));
        // A null in a later report does not erase the carried value.
        assert_eq!(rows[4].fundamentals.shares_outstanding, Some(10.0));
        assert_eq!(rows[4].fundamentals.total_liabilities, None);
        assert!(observer.events().is_empty());
    }

    #[test]
    fn test_bad_report_dates_are_dropped() {
        let days = [date(4, 1)];
        let raw = report(&[
            ("not a date", json!({"TotalAssets": 999.0})),
            ("2024-03-31", json!({"TotalAssets": 100.0, "Goodwill": 5.0})),
        ]);

        let observer = RecordingObserver::new();
        let merged = merge_report(table(&days, 5.0), Some(&raw), &observer);

        assert_eq!(merged.rows()[0].fundamentals.total_assets, Some(100.0));
        assert_eq!(
            observer.events(),
            vec![ObservedEvent::ReportDateDropped("not a date".to_string())]
        );
    }

    #[test]
    fn test_unrecognized_report_degrades() {
        let days = [date(4, 1)];
        let raw = report(&[("2024-03-31", json!({"Goodwill": 5.0}))]);

        let observer = RecordingObserver::new();
        let original = table(&days, 5.0);
        let merged = merge_report(original.clone(), Some(&raw), &observer);

        assert_eq!(merged, original);
        assert!(matches!(
            observer.events()[0],
            ObservedEvent::MergeFailed(MergeError::NoRecognizedFields(_))
        ));
    }

    #[test]
    fn test_conflicting_reports_degrade() {
        let raw = report(&[
            ("2024-03-31", json!({"TotalAssets": 100.0})),
            ("2024-03-31T00:00:00", json!({"TotalAssets": 101.0})),
        ]);
        let result = parse_report(&raw, &RecordingObserver::new());
        assert_eq!(result, Err(MergeError::ConflictingReports(date(3, 31))));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let days = [date(3, 28), date(4, 1), date(7, 1)];
        let raw = report(&[("2024-03-31", json!({"TotalAssets": "100", "TotalLiab": 40.0}))]);
        let observer = RecordingObserver::new();

        let once = merge_report(table(&days, 5.0), Some(&raw), &observer);
        let twice = merge_report(table(&days, 5.0), Some(&raw), &observer);
        assert_eq!(once, twice);
        assert_eq!(once.rows()[2].fundamentals.total_liabilities, Some(40.0));
    }

    #[test]
    fn test_missing_report_is_a_no_op() {
        let original = table(&[date(4, 1)], 5.0);
        let observer = RecordingObserver::new();
        assert_eq!(merge_report(original.clone(), None, &observer), original);
        assert_eq!(
            merge_report(original.clone(), Some(&RawFundamentals::new()), &observer),
            original
        );
    }

    #[test]
    fn test_book_value_prefers_company_info() {
        let days = [date(4, 1)];
        let raw = report(&[("2024-03-31", json!({"TotalAssets": 100.0, "OrdinarySharesNumber": 10.0}))]);
        let mut merged = merge_report(table(&days, 20.0), Some(&raw), &RecordingObserver::new());

        let info = CompanyInfo {
            book_value: Some(4.0),
            enterprise_value: Some(1e9),
            ..Default::default()
        };
        let ratios = derive_ratios(&mut merged, &info);
        assert_eq!(ratios.book_value_per_share, Some(4.0));

        let row = &merged.rows()[0];
        assert_eq!(row.book_value_per_share, Some(4.0));
        assert_relative_eq!(row.price_to_book.unwrap(), 5.0);
        assert_eq!(row.enterprise_value, Some(1e9));
    }

    #[test]
    fn test_book_value_derived_from_report() {
        let days = [date(4, 1), date(4, 2)];
        let raw = report(&[("2024-03-31", json!({"TotalAssets": 100.0, "OrdinarySharesNumber": 10.0}))]);
        let mut merged = merge_report(table(&days, 20.0), Some(&raw), &RecordingObserver::new());

        // Zero book value counts as absent.
        let info = CompanyInfo {
            book_value: Some(0.0),
            ..Default::default()
        };
        derive_ratios(&mut merged, &info);

        for row in merged.iter() {
            assert_relative_eq!(row.book_value_per_share.unwrap(), 10.0);
            assert_relative_eq!(row.price_to_book.unwrap(), 2.0);
            assert_eq!(row.enterprise_value, None);
        }
    }

    #[test]
    fn test_book_value_falls_back_to_info_shares() {
        let days = [date(4, 1)];
        let raw = report(&[("2024-03-31", json!({"TotalAssets": 100.0}))]);
        let mut merged = merge_report(table(&days, 20.0), Some(&raw), &RecordingObserver::new());

        let info = CompanyInfo {
            shares_outstanding: Some(50.0),
            ..Default::default()
        };
        let ratios = derive_ratios(&mut merged, &info);
        assert_eq!(ratios.book_value_per_share, Some(2.0));
    }

    #[test]
    fn test_ratios_undefined_without_inputs() {
        let mut merged = table(&[date(4, 1)], 20.0);

        let ratios = derive_ratios(&mut merged, &CompanyInfo::default());
        assert_eq!(ratios, Ratios::default());
        assert_eq!(merged.rows()[0].price_to_book, None);

        // Zero shares and negative book value are both undefined, not zero.
        let info = CompanyInfo {
            total_assets: Some(100.0),
            shares_outstanding: Some(0.0),
            ..Default::default()
        };
        assert_eq!(Ratios::from_sources(&merged, &info).book_value_per_share, None);
        let info = CompanyInfo {
            book_value: Some(-3.0),
            ..Default::default()
        };
        assert_eq!(Ratios::from_sources(&merged, &info).book_value_per_share, None);
    }
}
