//! SQLite-based store implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use equity_core::{
    CrossKind, MetricsError, MetricsStore, MetricsTable, Result, StoredMetric, Symbol,
    parse_signal_date,
};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, instrument};

/// SQLite-backed store for metrics and signals.
///
/// Three tables: `tickers` keyed by ticker, `daily_metrics` keyed by
/// (ticker, date), and `signal_events` with a surrogate id and a unique
/// (ticker, date, kind) constraint.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| MetricsError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store.
    ///
    /// Useful for testing; data is lost when the store is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| MetricsError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MetricsError::Store(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tickers (
                ticker TEXT PRIMARY KEY,
                name TEXT
            )",
            [],
        )
        .map_err(|e| MetricsError::Store(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS daily_metrics (
                ticker TEXT NOT NULL,
                date TEXT NOT NULL,
                close REAL NOT NULL,
                sma_short REAL NOT NULL,
                sma_long REAL NOT NULL,
                PRIMARY KEY (ticker, date)
            )",
            [],
        )
        .map_err(|e| MetricsError::Store(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS signal_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticker TEXT NOT NULL,
                date TEXT NOT NULL,
                kind TEXT NOT NULL,
                UNIQUE (ticker, date, kind)
            )",
            [],
        )
        .map_err(|e| MetricsError::Store(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_signal_events_ticker_kind
             ON signal_events(ticker, kind)",
            [],
        )
        .map_err(|e| MetricsError::Store(e.to_string()))?;

        debug!("SQLite store schema initialized");
        Ok(())
    }
}

#[async_trait]
impl MetricsStore for SqliteStore {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn upsert_ticker(&self, symbol: &Symbol, name: Option<&str>) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MetricsError::Store(e.to_string()))?;

        conn.execute(
            "INSERT INTO tickers (ticker, name) VALUES (?1, ?2)
             ON CONFLICT(ticker) DO UPDATE SET name = COALESCE(excluded.name, tickers.name)",
            params![symbol.as_str(), name],
        )
        .map_err(|e| MetricsError::Store(e.to_string()))?;

        debug!("Upserted ticker");
        Ok(())
    }

    #[instrument(skip(self, table), fields(symbol = %symbol, rows = table.len()))]
    async fn upsert_daily_metrics(&self, symbol: &Symbol, table: &MetricsTable) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MetricsError::Store(e.to_string()))?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| MetricsError::Store(e.to_string()))?;

        for row in table.iter() {
            tx.execute(
                "INSERT OR REPLACE INTO daily_metrics
                 (ticker, date, close, sma_short, sma_long)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    symbol.as_str(),
                    row.date.to_string(),
                    row.close,
                    row.sma_short,
                    row.sma_long
                ],
            )
            .map_err(|e| MetricsError::Store(e.to_string()))?;
        }

        tx.commit().map_err(|e| MetricsError::Store(e.to_string()))?;
        debug!("Saved {} daily metrics (upserted)", table.len());
        Ok(table.len())
    }

    #[instrument(skip(self, dates), fields(symbol = %symbol, kind = %kind, count = dates.len()))]
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

        let conn = self
            .conn
            .lock()
            .map_err(|e| MetricsError::Store(e.to_string()))?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| MetricsError::Store(e.to_string()))?;

        for date in &parsed {
            tx.execute(
                "INSERT OR IGNORE INTO signal_events (ticker, date, kind)
                 VALUES (?1, ?2, ?3)",
                params![symbol.as_str(), date.to_string(), kind.as_str()],
            )
            .map_err(|e| MetricsError::Store(e.to_string()))?;
        }

        tx.commit().map_err(|e| MetricsError::Store(e.to_string()))?;
        debug!("Saved {} signals (upserted)", parsed.len());
        Ok(parsed.len())
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn ticker_name(&self, symbol: &Symbol) -> Result<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MetricsError::Store(e.to_string()))?;

        let name = conn
            .query_row(
                "SELECT name FROM tickers WHERE ticker = ?1",
                params![symbol.as_str()],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()
            .map_err(|e| MetricsError::Store(e.to_string()))?;

        Ok(name.flatten())
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn daily_metrics(&self, symbol: &Symbol) -> Result<Vec<StoredMetric>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MetricsError::Store(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT date, close, sma_short, sma_long FROM daily_metrics
                 WHERE ticker = ?1
                 ORDER BY date ASC",
            )
            .map_err(|e| MetricsError::Store(e.to_string()))?;

        let rows = stmt
            .query_map(params![symbol.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            })
            .map_err(|e| MetricsError::Store(e.to_string()))?;

        let mut metrics = Vec::new();
        for row in rows {
            let (date, close, sma_short, sma_long) =
                row.map_err(|e| MetricsError::Store(e.to_string()))?;
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|e| MetricsError::Parse(e.to_string()))?;
            metrics.push(StoredMetric {
                date,
                close,
                sma_short,
                sma_long,
            });
        }

        debug!("Found {} stored daily metrics", metrics.len());
        Ok(metrics)
    }

    #[instrument(skip(self), fields(symbol = %symbol, kind = %kind))]
    async fn signals(&self, symbol: &Symbol, kind: CrossKind) -> Result<Vec<NaiveDate>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MetricsError::Store(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT date FROM signal_events
                 WHERE ticker = ?1 AND kind = ?2
                 ORDER BY date ASC",
            )
            .map_err(|e| MetricsError::Store(e.to_string()))?;

        let rows = stmt
            .query_map(params![symbol.as_str(), kind.as_str()], |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| MetricsError::Store(e.to_string()))?;

        let mut dates = Vec::new();
        for row in rows {
            let label = row.map_err(|e| MetricsError::Store(e.to_string()))?;
            dates.push(parse_signal_date(&label)?);
        }
        Ok(dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equity_core::{DailyBar, MetricsRow};

    fn table(days: &[u32], close: f64) -> MetricsTable {
        let rows = days
            .iter()
            .map(|d| {
                let bar = DailyBar::new(
                    NaiveDate::from_ymd_opt(2024, 1, *d).unwrap(),
                    close,
                    close,
                    close,
                    close,
                    100,
                )
                .unwrap();
                MetricsRow::from_bar(&bar, close, close - 1.0, close, Some(0.0))
            })
            .collect();
        MetricsTable::from_rows(rows)
    }

    #[tokio::test]
    async fn test_sqlite_store_initialization() {
        let store = SqliteStore::in_memory();
        assert!(store.is_ok());
    }

    #[tokio::test]
    async fn test_daily_metrics_upsert_is_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        let symbol = Symbol::new("AAPL");

        assert!(store.daily_metrics(&symbol).await.unwrap().is_empty());

        store
            .upsert_daily_metrics(&symbol, &table(&[2, 3], 150.0))
            .await
            .unwrap();
        // Replaying with new values replaces rather than duplicates.
        store
            .upsert_daily_metrics(&symbol, &table(&[3, 4], 151.0))
            .await
            .unwrap();

        let stored = store.daily_metrics(&symbol).await.unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0].close, 150.0);
        assert_eq!(stored[1].close, 151.0);
        assert_eq!(stored[1].sma_long, 150.0);
        assert_eq!(stored[2].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
    }

    #[tokio::test]
    async fn test_signals_upsert_is_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        let symbol = Symbol::new("AAPL");
        let golden = vec!["2024-01-05".to_string(), "2024-01-09".to_string()];

        store
            .upsert_signals(&symbol, &golden, CrossKind::GoldenCross)
            .await
            .unwrap();
        store
            .upsert_signals(&symbol, &golden, CrossKind::GoldenCross)
            .await
            .unwrap();
        store
            .upsert_signals(&symbol, &["2024-01-05".to_string()], CrossKind::DeathCross)
            .await
            .unwrap();

        let stored = store.signals(&symbol, CrossKind::GoldenCross).await.unwrap();
        assert_eq!(stored.len(), 2);
        let stored = store.signals(&symbol, CrossKind::DeathCross).await.unwrap();
        assert_eq!(stored, vec![NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()]);
    }

    #[tokio::test]
    async fn test_invalid_signal_date_is_rejected() {
        let store = SqliteStore::in_memory().unwrap();
        let result = store
            .upsert_signals(&Symbol::new("AAPL"), &["soon".to_string()], CrossKind::GoldenCross)
            .await;
        assert!(matches!(result, Err(MetricsError::Parse(_))));
    }

    #[tokio::test]
    async fn test_ticker_upsert_keeps_name() {
        let store = SqliteStore::in_memory().unwrap();
        let symbol = Symbol::new("AAPL");

        assert_eq!(store.ticker_name(&symbol).await.unwrap(), None);
        store.upsert_ticker(&symbol, Some("Apple Inc.")).await.unwrap();
        store.upsert_ticker(&symbol, None).await.unwrap();
        assert_eq!(
            store.ticker_name(&symbol).await.unwrap().as_deref(),
            Some("Apple Inc.")
        );
    }

    #[tokio::test]
    async fn test_store_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.db");
        let symbol = Symbol::new("MSFT");

        {
            let store = SqliteStore::new(&path).unwrap();
            store
                .upsert_daily_metrics(&symbol, &table(&[2], 400.0))
                .await
                .unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(store.daily_metrics(&symbol).await.unwrap().len(), 1);
    }
}
