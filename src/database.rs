//! SQLite-backed proxy store
//!
//! One table holds every proxy record, keyed by `(host, port)` through a
//! unique index created when the store is opened.

use crate::config::StoreSettings;
use crate::error::{Error, Result};
use crate::proxy::models::{ProxyKey, ProxyRecord};
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::debug;

/// Rows fetched per page while iterating the whole table
const PAGE_SIZE: i64 = 256;

/// Store adapter for proxy records
#[derive(Clone)]
pub struct ProxyStore {
    pool: SqlitePool,
    table: String,
}

impl ProxyStore {
    /// Open or create the store described by `settings`
    pub async fn open(settings: &StoreSettings) -> Result<Self> {
        settings.validate()?;

        let options = SqliteConnectOptions::from_str(&settings.database_url())?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::with_pool(pool, &settings.collection).await
    }

    /// Open a private in-memory store holding a single connection
    pub async fn open_in_memory(collection: &str) -> Result<Self> {
        StoreSettings::new("sqlite::memory:".to_string(), collection.to_string()).validate()?;

        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // Every connection to :memory: is its own database, so keep exactly one alive
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool, collection).await
    }

    async fn with_pool(pool: SqlitePool, collection: &str) -> Result<Self> {
        let store = Self {
            pool,
            table: collection.to_string(),
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (
                protocol TEXT NOT NULL,
                host TEXT NOT NULL,
                port TEXT NOT NULL,
                country TEXT NOT NULL DEFAULT '',
                status BOOLEAN NOT NULL DEFAULT 0,
                checked_at TEXT
            )",
            self.table
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS \"{0}_host_port\" ON \"{0}\" (host, port)",
            self.table
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a new record; a duplicate `(host, port)` is rejected
    pub async fn insert(&self, proxy: &ProxyRecord) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO \"{}\" (protocol, host, port, country, status, checked_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            self.table
        ))
        .bind(&proxy.scheme)
        .bind(&proxy.host)
        .bind(&proxy.port)
        .bind(&proxy.country)
        .bind(proxy.status)
        .bind(proxy.checked_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Set status and country on an existing record
    ///
    /// Returns `false` when no record matches the key; nothing is written then.
    pub async fn update(&self, key: &ProxyKey, status: bool, country: &str) -> Result<bool> {
        let result = sqlx::query(&format!(
            "UPDATE \"{}\" SET status = ?, country = ?, checked_at = ? WHERE host = ? AND port = ?",
            self.table
        ))
        .bind(status)
        .bind(country)
        .bind(Utc::now())
        .bind(&key.host)
        .bind(&key.port)
        .execute(&self.pool)
        .await?;

        let matched = result.rows_affected() > 0;
        if !matched {
            debug!("No stored proxy for {}, update skipped", key);
        }
        Ok(matched)
    }

    /// Insert the record if its key is absent, otherwise set status and country
    pub async fn upsert(&self, proxy: &ProxyRecord, status: bool) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO \"{}\" (protocol, host, port, country, status, checked_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (host, port) DO UPDATE SET
                status = excluded.status,
                country = excluded.country,
                checked_at = excluded.checked_at",
            self.table
        ))
        .bind(&proxy.scheme)
        .bind(&proxy.host)
        .bind(&proxy.port)
        .bind(&proxy.country)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a single record by key
    pub async fn get(&self, key: &ProxyKey) -> Result<Option<ProxyRecord>> {
        let row = sqlx::query(&format!(
            "SELECT protocol, host, port, country, status, checked_at FROM \"{}\"
             WHERE host = ? AND port = ?",
            self.table
        ))
        .bind(&key.host)
        .bind(&key.port)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM \"{}\"", self.table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Lazily stream every stored record
    ///
    /// Pages are fetched by rowid on demand, so no connection is held
    /// between items and updates may run while the stream is consumed.
    pub fn iter_all(&self) -> BoxStream<'_, Result<ProxyRecord>> {
        stream::try_unfold(Some(0i64), move |cursor| async move {
            let Some(after) = cursor else {
                return Ok::<_, Error>(None);
            };

            let (page, last) = self.fetch_page(after).await?;
            if page.is_empty() {
                return Ok(None);
            }

            let next = if (page.len() as i64) < PAGE_SIZE { None } else { last };
            Ok(Some((stream::iter(page.into_iter().map(Ok::<_, Error>)), next)))
        })
        .try_flatten()
        .boxed()
    }

    /// Fetch up to `PAGE_SIZE` records stored after `after`, with the last rowid seen
    async fn fetch_page(&self, after: i64) -> Result<(Vec<ProxyRecord>, Option<i64>)> {
        let rows = sqlx::query(&format!(
            "SELECT rowid, protocol, host, port, country, status, checked_at FROM \"{}\"
             WHERE rowid > ? ORDER BY rowid LIMIT ?",
            self.table
        ))
        .bind(after)
        .bind(PAGE_SIZE)
        .fetch_all(&self.pool)
        .await?;

        let last = rows
            .last()
            .map(|r| r.try_get::<i64, _>("rowid"))
            .transpose()?;
        let page = rows.iter().map(row_to_record).collect::<Result<Vec<_>>>()?;
        Ok((page, last))
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn row_to_record(row: &SqliteRow) -> Result<ProxyRecord> {
    let checked_at: Option<DateTime<Utc>> = row.try_get("checked_at")?;

    Ok(ProxyRecord {
        scheme: row.try_get("protocol")?,
        host: row.try_get("host")?,
        port: row.try_get("port")?,
        country: row.try_get("country")?,
        status: row.try_get("status")?,
        checked_at,
    })
}
