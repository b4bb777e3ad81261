// SQLite sink. One table for all streams; payloads are version-prefixed wincode blobs.
//
// Inspecting data: `cargo run --example dump_history -- [DB_PATH] [STREAM] [LIMIT]` prints
// recent records as JSON.

use super::PersistenceSink;
use super::blob::{decode_record, encode_record};
use crate::error::PersistenceError;
use crate::models::{MetricFamily, Record};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

/// SQLite integers are signed; timestamps past `i64::MAX` clamp to it.
fn to_sql_ms(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

pub struct SqliteSink {
    pool: SqlitePool,
}

impl SqliteSink {
    /// Opens (creating if missing) the database at `path` with WAL journaling.
    pub async fn connect(path: &str) -> Result<Self, PersistenceError> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{path}"))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS samples (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                stream_tag TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                payload BLOB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_samples_stream_created ON samples(stream_tag, created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_samples_created ON samples(created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Most recent `limit` records of `family`, oldest first.
    pub async fn get_recent(
        &self,
        family: MetricFamily,
        limit: u32,
    ) -> Result<Vec<Record>, PersistenceError> {
        let rows = sqlx::query(
            "SELECT payload FROM samples WHERE stream_tag = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(family.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let payload: Vec<u8> = row.try_get("payload")?;
            match decode_record(family, &payload) {
                Ok(record) => out.push(record),
                Err(e) => tracing::debug!(error = %e, stream = %family, "skipping undecodable row"),
            }
        }
        out.reverse();
        Ok(out)
    }

    pub async fn count(&self) -> Result<u64, PersistenceError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM samples")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }
}

impl PersistenceSink for SqliteSink {
    async fn save(&self, record: &Record) -> Result<(), PersistenceError> {
        self.save_batch(std::slice::from_ref(record)).await
    }

    #[instrument(skip(self, records), fields(sink = "sqlite", operation = "save_batch", records_count = records.len()))]
    async fn save_batch(&self, records: &[Record]) -> Result<(), PersistenceError> {
        if records.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for record in records {
            let payload = encode_record(record)?;
            sqlx::query("INSERT INTO samples (stream_tag, created_at, payload) VALUES ($1, $2, $3)")
                .bind(record.family().as_str())
                .bind(to_sql_ms(record.timestamp()))
                .bind(&payload)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self), fields(sink = "sqlite", operation = "query_range"))]
    async fn query_range(
        &self,
        family: MetricFamily,
        start_ms: u64,
        end_ms: u64,
    ) -> Result<Vec<Record>, PersistenceError> {
        let rows = sqlx::query(
            "SELECT payload FROM samples
             WHERE stream_tag = $1 AND created_at >= $2 AND created_at < $3
             ORDER BY created_at ASC, id ASC",
        )
        .bind(family.as_str())
        .bind(to_sql_ms(start_ms))
        .bind(to_sql_ms(end_ms))
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let payload: Vec<u8> = row.try_get("payload")?;
            match decode_record(family, &payload) {
                Ok(record) => out.push(record),
                Err(e) => tracing::debug!(error = %e, stream = %family, "skipping undecodable row"),
            }
        }
        Ok(out)
    }

    #[instrument(skip(self), fields(sink = "sqlite", operation = "cleanup_older_than"))]
    async fn cleanup_older_than(&self, cutoff_ms: u64) -> Result<u64, PersistenceError> {
        let result = sqlx::query("DELETE FROM samples WHERE created_at < $1")
            .bind(to_sql_ms(cutoff_ms))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(sink = "sqlite", operation = "compact"))]
    async fn compact(&self) -> Result<(), PersistenceError> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }
}
