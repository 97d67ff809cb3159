use std::future::Future;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::db::models::{SaleRow, ISO_DATE};
use crate::error::{AppError, Result};
use crate::types::Transaction;

const SELECT_SALES: &str = "SELECT id, date, product, quantity, amount FROM sales";

/// Append-only persisted collection of sales.
///
/// Writers are serialized through `write_lock` and each batch runs inside one
/// SQLite transaction, so readers see a batch fully or not at all. Every call is
/// bounded by `timeout`; a write abandoned mid-flight (timeout or a dropped
/// future) drops its open transaction, which rolls it back.
pub struct TransactionStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
    timeout: Duration,
}

impl TransactionStore {
    /// Opens (creating if needed) the database file and applies migrations.
    pub async fn open(db_path: &str, timeout: Duration) -> Result<Self> {
        if let Some(dir) = Path::new(db_path).parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(timeout);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await?;

        let store = Self::from_pool(pool, timeout);
        store.migrate().await?;
        info!("Database ready at {db_path}");
        Ok(store)
    }

    /// Private in-memory database. A single connection that never expires keeps
    /// the data alive for the lifetime of the store.
    #[cfg(test)]
    pub async fn in_memory(timeout: Duration) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self::from_pool(pool, timeout);
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool, timeout: Duration) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
            timeout,
        }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Persists the whole batch or nothing. Returns the number of rows written.
    pub async fn append(&self, transactions: &[Transaction]) -> Result<usize> {
        if transactions.is_empty() {
            return Ok(0);
        }

        let result = self
            .bounded("append", async {
                let _guard = self.write_lock.lock().await;
                let mut tx = self.pool.begin().await?;
                for t in transactions {
                    sqlx::query("INSERT INTO sales (date, product, quantity, amount) VALUES (?, ?, ?, ?)")
                        .bind(t.date.format(ISO_DATE).to_string())
                        .bind(&t.product)
                        .bind(i64::from(t.quantity))
                        .bind(t.amount)
                        .execute(&mut *tx)
                        .await?;
                }
                tx.commit().await?;
                Ok::<_, AppError>(transactions.len())
            })
            .await;

        if let Err(e) = &result {
            error!(rows = transactions.len(), "append rolled back: {e}");
        }
        result
    }

    /// Rows dated within `[start, end]`, both inclusive, in no particular order.
    pub async fn query_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Transaction>> {
        if start > end {
            return Ok(Vec::new());
        }
        let sql = format!("{SELECT_SALES} WHERE date >= ? AND date <= ?");
        self.fetch("query_range", &sql, &[start, end]).await
    }

    /// Rows dated on or before `end`.
    pub async fn query_until(&self, end: NaiveDate) -> Result<Vec<Transaction>> {
        let sql = format!("{SELECT_SALES} WHERE date <= ?");
        self.fetch("query_until", &sql, &[end]).await
    }

    /// Every row, ordered by date then insertion.
    pub async fn query_all(&self) -> Result<Vec<Transaction>> {
        let sql = format!("{SELECT_SALES} ORDER BY date, id");
        self.fetch("query_all", &sql, &[]).await
    }

    pub async fn count(&self) -> Result<i64> {
        self.bounded("count", async {
            let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
                .fetch_one(&self.pool)
                .await?;
            Ok::<_, AppError>(n)
        })
        .await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn fetch(&self, op: &'static str, sql: &str, dates: &[NaiveDate]) -> Result<Vec<Transaction>> {
        self.bounded(op, async {
            let mut query = sqlx::query_as::<_, SaleRow>(sql);
            for d in dates {
                query = query.bind(d.format(ISO_DATE).to_string());
            }
            let rows = query.fetch_all(&self.pool).await?;
            rows.into_iter().map(Transaction::try_from).collect::<Result<Vec<_>>>()
        })
        .await
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res,
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                warn!(op, timeout_ms, "storage call timed out");
                Err(AppError::StorageTimeout { op, timeout_ms })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
