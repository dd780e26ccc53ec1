//! End-to-end processing of one symbol with optional persistence.

use std::sync::Arc;

use tracing::{debug, info, warn};

use equity_core::{
    CrossKind, IndicatorWindows, MetricsStore, MetricsTable, PipelineObserver, RawInput, Result,
    RowRejection, Symbol, TracingObserver,
};
use equity_engine::{Signals, Summary, process};

/// Output of [`MetricsRunner::run`].
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Computed metrics, one row per valid input bar.
    pub table: MetricsTable,
    /// Golden cross dates, ascending.
    pub golden: Vec<String>,
    /// Death cross dates, ascending.
    pub death: Vec<String>,
    /// Input rows dropped during normalization.
    pub rejections: Vec<RowRejection>,
    /// Display name from the company metadata, if any.
    pub company_name: Option<String>,
    /// Serializable summary of the latest row and the signals.
    pub summary: Summary,
    /// Whether every store write succeeded. `false` until saved.
    pub persisted: bool,
}

/// Runs the metrics pipeline for a symbol and persists the result.
///
/// The runner owns the indicator windows, the observer that receives
/// recoverable problems, and an optional store. Store failures are logged
/// and reflected in [`RunReport::persisted`]; they never discard the
/// computed report.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use equity::{MetricsRunner, SqliteStore, Symbol};
///
/// let store = SqliteStore::new("financial_data.db")?;
/// let runner = MetricsRunner::new().with_store(Arc::new(store));
/// let report = runner.run(&Symbol::normalized("reliance"), &raw).await?;
/// ```
pub struct MetricsRunner {
    windows: IndicatorWindows,
    observer: Arc<dyn PipelineObserver>,
    store: Option<Arc<dyn MetricsStore>>,
}

impl std::fmt::Debug for MetricsRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRunner")
            .field("windows", &self.windows)
            .field("observer", &self.observer)
            .field("store", &self.store.as_ref().map(|_| "configured"))
            .finish()
    }
}

impl Default for MetricsRunner {
    fn default() -> Self {
        Self {
            windows: IndicatorWindows::default(),
            observer: Arc::new(TracingObserver),
            store: None,
        }
    }
}

impl MetricsRunner {
    /// Create a runner with default windows, a tracing observer and no store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the indicator windows.
    #[must_use]
    pub const fn with_windows(mut self, windows: IndicatorWindows) -> Self {
        self.windows = windows;
        self
    }

    /// Set the observer for rejected rows and merge failures.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Set the store results are persisted to.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn MetricsStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Indicator windows in use.
    #[must_use]
    pub const fn windows(&self) -> &IndicatorWindows {
        &self.windows
    }

    /// Process one symbol: compute metrics, detect crosses, persist, summarize.
    ///
    /// # Errors
    /// Returns [`MetricsError::EmptyInput`](equity_core::MetricsError::EmptyInput)
    /// if no price row is usable, and propagates duplicate-date and window
    /// errors. Nothing is persisted in those cases.
    pub async fn run(&self, symbol: &Symbol, raw: &RawInput) -> Result<RunReport> {
        let processed = process(symbol, raw, &self.windows, self.observer.as_ref())?;
        let signals = Signals::detect(&processed.table);
        info!(
            symbol = %symbol,
            golden = signals.golden.len(),
            death = signals.death.len(),
            "Detected crossover signals"
        );

        let summary = Summary::new(
            symbol.clone(),
            &processed.table,
            signals.golden.clone(),
            signals.death.clone(),
        );

        let mut report = RunReport {
            table: processed.table,
            golden: signals.golden,
            death: signals.death,
            rejections: processed.rejections,
            company_name: raw.company_info().name,
            summary,
            persisted: false,
        };

        if let Some(store) = &self.store {
            report.persist_to(store.as_ref()).await;
        }
        Ok(report)
    }
}

impl RunReport {
    /// Writes the ticker, daily metrics and both signal lists to `store`.
    ///
    /// # Errors
    /// Returns the first store error; earlier writes are not rolled back.
    pub async fn save(&self, store: &dyn MetricsStore) -> Result<()> {
        let symbol = &self.summary.ticker;
        store
            .upsert_ticker(symbol, self.company_name.as_deref())
            .await?;
        let rows = store.upsert_daily_metrics(symbol, &self.table).await?;
        let golden = store
            .upsert_signals(symbol, &self.golden, CrossKind::GoldenCross)
            .await?;
        let death = store
            .upsert_signals(symbol, &self.death, CrossKind::DeathCross)
            .await?;
        debug!(symbol = %symbol, rows, golden, death, "Persisted run");
        Ok(())
    }

    /// Like [`save`](Self::save), but logs a failure and records the outcome
    /// in [`persisted`](Self::persisted).
    pub async fn persist_to(&mut self, store: &dyn MetricsStore) {
        self.persisted = match self.save(store).await {
            Ok(()) => true,
            Err(e) => {
                warn!(symbol = %self.summary.ticker, error = %e, "Failed to persist results");
                false
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use equity_core::{MetricsError, ObservedEvent, RawBar, RecordingObserver, StoredMetric};
    use equity_engine::DataQuality;
    use equity_store::InMemoryStore;
    use serde_json::json;

    /// Store whose every call fails.
    #[derive(Debug)]
    struct UnavailableStore;

    fn unavailable<T>() -> Result<T> {
        Err(MetricsError::Store("database is locked".to_string()))
    }

    #[async_trait]
    impl MetricsStore for UnavailableStore {
        async fn upsert_ticker(&self, _: &Symbol, _: Option<&str>) -> Result<()> {
            unavailable()
        }
        async fn upsert_daily_metrics(&self, _: &Symbol, _: &MetricsTable) -> Result<usize> {
            unavailable()
        }
        async fn upsert_signals(&self, _: &Symbol, _: &[String], _: CrossKind) -> Result<usize> {
            unavailable()
        }
        async fn ticker_name(&self, _: &Symbol) -> Result<Option<String>> {
            unavailable()
        }
        async fn daily_metrics(&self, _: &Symbol) -> Result<Vec<StoredMetric>> {
            unavailable()
        }
        async fn signals(&self, _: &Symbol, _: CrossKind) -> Result<Vec<NaiveDate>> {
            unavailable()
        }
    }

    fn raw_prices(closes: &[f64]) -> Vec<RawBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| RawBar {
                date: json!(format!("2020-01-{:02}", i + 1)),
                open: json!(c),
                high: json!(c + 1.0),
                low: json!(c - 0.5),
                close: json!(c),
                volume: json!(1000),
            })
            .collect()
    }

    fn small_windows() -> IndicatorWindows {
        IndicatorWindows {
            short_window: 2,
            long_window: 3,
            trailing_high_window: 5,
        }
    }

    // SMA2 - SMA3 runs 0, 0, -, -, +, +, +, - over these closes.
    const CLOSES: [f64; 8] = [10.0, 9.0, 8.0, 9.0, 11.0, 12.0, 11.0, 8.0];

    fn sample_input() -> RawInput {
        let mut info = serde_json::Map::new();
        info.insert("longName".to_string(), json!("Sample Industries"));
        RawInput::from_prices(raw_prices(&CLOSES)).with_info(info)
    }

    #[tokio::test]
    async fn test_run_persists_metrics_and_signals() {
        let store = Arc::new(InMemoryStore::new());
        let runner = MetricsRunner::new()
            .with_windows(small_windows())
            .with_store(store.clone());
        let symbol = Symbol::new("SAMPLE.NS");

        let report = runner.run(&symbol, &sample_input()).await.unwrap();

        assert!(report.persisted);
        assert_eq!(report.table.len(), 8);
        assert_eq!(report.golden, vec!["2020-01-05"]);
        assert_eq!(report.death, vec!["2020-01-03", "2020-01-08"]);
        assert_eq!(report.summary.golden_crosses, report.golden);
        assert_eq!(report.summary.data_quality, DataQuality::Partial);

        assert_eq!(store.daily_metrics(&symbol).await.unwrap().len(), 8);
        assert_eq!(
            store
                .signals(&symbol, CrossKind::DeathCross)
                .await
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            store.ticker_name(&symbol).await.unwrap().as_deref(),
            Some("Sample Industries")
        );
    }

    #[tokio::test]
    async fn test_replayed_run_is_idempotent() {
        let store = Arc::new(InMemoryStore::new());
        let runner = MetricsRunner::new()
            .with_windows(small_windows())
            .with_store(store.clone());
        let symbol = Symbol::new("SAMPLE.NS");

        runner.run(&symbol, &sample_input()).await.unwrap();
        runner.run(&symbol, &sample_input()).await.unwrap();

        assert_eq!(store.daily_metrics(&symbol).await.unwrap().len(), 8);
        assert_eq!(store.signal_count().await, 3);
    }

    #[tokio::test]
    async fn test_store_failure_keeps_report() {
        let runner = MetricsRunner::new()
            .with_windows(small_windows())
            .with_store(Arc::new(UnavailableStore));

        let report = runner
            .run(&Symbol::new("SAMPLE.NS"), &sample_input())
            .await
            .unwrap();

        assert!(!report.persisted);
        assert_eq!(report.table.len(), 8);
        assert_eq!(report.golden, vec!["2020-01-05"]);
    }

    #[tokio::test]
    async fn test_empty_input_writes_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let runner = MetricsRunner::new().with_store(store.clone());
        let symbol = Symbol::new("GONE");

        let err = runner
            .run(&symbol, &RawInput::from_prices(Vec::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, MetricsError::EmptyInput(_)));
        assert!(store.daily_metrics(&symbol).await.unwrap().is_empty());
        assert_eq!(store.signal_count().await, 0);
    }

    #[tokio::test]
    async fn test_rejections_reach_observer() {
        let observer = Arc::new(RecordingObserver::new());
        let runner = MetricsRunner::new()
            .with_windows(small_windows())
            .with_observer(observer.clone());

        let mut prices = raw_prices(&CLOSES);
        prices[3].close = json!("n/a");
        let report = runner
            .run(&Symbol::new("SAMPLE.NS"), &RawInput::from_prices(prices))
            .await
            .unwrap();

        assert!(!report.persisted);
        assert_eq!(report.table.len(), 7);
        assert_eq!(report.rejections.len(), 1);
        assert_eq!(report.rejections[0].index, 3);
        let events = observer.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ObservedEvent::RowRejected(_)));
    }
}
