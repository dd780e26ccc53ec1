//! In-memory store implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use equity_core::{
    CrossKind, MetricsStore, MetricsTable, Result, StoredMetric, Symbol, parse_signal_date,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

/// Volatile store keyed the same way as the SQLite tables.
///
/// Suited to tests and to runs where nothing should outlive the process.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tickers: RwLock<HashMap<Symbol, Option<String>>>,
    metrics: RwLock<BTreeMap<(Symbol, NaiveDate), StoredMetric>>,
    signals: RwLock<BTreeSet<(Symbol, CrossKind, NaiveDate)>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored signal events across all symbols.
    pub async fn signal_count(&self) -> usize {
        self.signals.read().await.len()
    }
}

#[async_trait]
impl MetricsStore for InMemoryStore {
    async fn upsert_ticker(&self, symbol: &Symbol, name: Option<&str>) -> Result<()> {
        let mut tickers = self.tickers.write().await;
        let entry = tickers.entry(symbol.clone()).or_default();
        if let Some(name) = name {
            *entry = Some(name.to_string());
        }
        Ok(())
    }

    async fn upsert_daily_metrics(&self, symbol: &Symbol, table: &MetricsTable) -> Result<usize> {
        let mut metrics = self.metrics.write().await;
        for row in table.iter() {
            metrics.insert(
                (symbol.clone(), row.date),
                StoredMetric {
                    date: row.date,
                    close: row.close,
                    sma_short: row.sma_short,
                    sma_long: row.sma_long,
                },
            );
        }
        debug!(symbol = %symbol, rows = table.len(), "Stored daily metrics in memory");
        Ok(table.len())
    }

    async fn upsert_signals(
        &self,
        symbol: &Symbol,
        dates: &[String],
        kind: CrossKind,
    ) -> Result<usize> {
        let parsed = dates
            .iter()
            .map(|d| parse_signal_date(d))
            .collect::<Result<Vec<_>>>()?;

        let mut signals = self.signals.write().await;
        for date in &parsed {
            signals.insert((symbol.clone(), kind, *date));
        }
        Ok(parsed.len())
    }

    async fn ticker_name(&self, symbol: &Symbol) -> Result<Option<String>> {
        Ok(self.tickers.read().await.get(symbol).cloned().flatten())
    }

    async fn daily_metrics(&self, symbol: &Symbol) -> Result<Vec<StoredMetric>> {
        let metrics = self.metrics.read().await;
        Ok(metrics
            .iter()
            .filter(|((s, _), _)| s == symbol)
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn signals(&self, symbol: &Symbol, kind: CrossKind) -> Result<Vec<NaiveDate>> {
        let signals = self.signals.read().await;
        Ok(signals
            .iter()
            .filter(|(s, k, _)| s == symbol && *k == kind)
            .map(|(_, _, d)| *d)
            .collect())
    }
}
