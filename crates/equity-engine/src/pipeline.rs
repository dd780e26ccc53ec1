//! Normalize, compute and merge in one call.

use equity_core::{
    IndicatorWindows, MetricsError, MetricsTable, PipelineObserver, RawInput, Result, RowRejection,
    Symbol,
};
use tracing::{debug, info, instrument};

use crate::crossover::{death_crosses, golden_crosses, points_from_table};
use crate::fundamentals::{Ratios, derive_ratios, merge_report};
use crate::indicators::compute;
use crate::normalize::normalize;

/// Output of [`process`].
#[derive(Debug, Clone)]
pub struct Processed {
    /// One metrics row per valid input bar.
    pub table: MetricsTable,
    /// Input rows dropped during normalization.
    pub rejections: Vec<RowRejection>,
    /// Ratios broadcast over the table.
    pub ratios: Ratios,
}

/// Computes the metrics table for one symbol.
///
/// Bad price rows and fundamentals merge failures are reported to
/// `observer` and otherwise absorbed.
///
/// # Errors
/// Returns [`MetricsError::EmptyInput`] if no price row survives
/// normalization, in which case no indicators are computed. Duplicate dates
/// and zero-length windows are also errors.
#[instrument(skip_all, fields(symbol = %symbol, rows = raw.prices.len()))]
pub fn process(
    symbol: &Symbol,
    raw: &RawInput,
    windows: &IndicatorWindows,
    observer: &dyn PipelineObserver,
) -> Result<Processed> {
    let normalized = normalize(&raw.prices, observer)?;
    if normalized.series.is_empty() {
        return Err(MetricsError::EmptyInput(symbol.to_string()));
    }

    let table = compute(&normalized.series, windows)?;
    let mut table = merge_report(table, raw.fundamentals.as_ref(), observer);
    let ratios = derive_ratios(&mut table, &raw.company_info());

    if let Some((start, end)) = normalized.series.date_range() {
        info!(%start, %end, rows = table.len(), "Computed metrics");
    }
    debug!(?ratios, "Derived ratios");

    Ok(Processed {
        table,
        rejections: normalized.rejections,
        ratios,
    })
}

/// Golden and death cross labels for a metrics table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signals {
    /// Golden cross dates, ascending.
    pub golden: Vec<String>,
    /// Death cross dates, ascending.
    pub death: Vec<String>,
}

impl Signals {
    /// Runs both detectors over the table.
    #[must_use]
    pub fn detect(table: &MetricsTable) -> Self {
        let points = points_from_table(table);
        Self {
            golden: golden_crosses(&points),
            death: death_crosses(&points),
        }
    }
}
