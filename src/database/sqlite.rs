//! SQLite score store

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use super::{RepositoryError, ScoreRepository, StoredScore};
use crate::core::{Address, CreditScore};

/// File path named by a SQLite URL, or `None` for an in-memory database.
///
/// Accepts `sqlite://path`, `sqlite:path` and bare paths; any `?options`
/// suffix is ignored.
fn database_file_path(database_url: &str) -> Option<&str> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    let path = path.split('?').next().unwrap_or(path);

    if path.is_empty() || path.starts_with(":memory:") {
        None
    } else {
        Some(path)
    }
}

#[derive(Debug, Clone)]
pub struct SqliteScoreRepository {
    pool: SqlitePool,
}

impl SqliteScoreRepository {
    /// Connects to `database_url` (e.g. `sqlite:data/credit.db`) and creates
    /// the score table if needed.
    pub async fn connect(database_url: &str) -> Result<Self, RepositoryError> {
        let db_path = database_file_path(database_url);
        let in_memory = db_path.is_none();

        if let Some(parent) = db_path.and_then(|path| Path::new(path).parent()) {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    RepositoryError::ConnectionError(format!("Failed to create data directory: {}", e))
                })?;
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| RepositoryError::ConnectionError(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(10));
        pool_options = if in_memory {
            // Each in-memory connection is its own database, so pin a single one
            pool_options
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(4).idle_timeout(Duration::from_secs(300))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| RepositoryError::ConnectionError(format!("Failed to connect to database: {}", e)))?;

        let repo = Self { pool };
        repo.run_migrations().await?;

        info!("✅ Score database connected to: {}", database_url);
        Ok(repo)
    }

    async fn run_migrations(&self) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wallet_credit_scores (
                wallet_address TEXT PRIMARY KEY NOT NULL,
                on_chain_credit_score REAL NOT NULL,
                updated_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryError(format!("Failed to create score table: {}", e)))?;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ScoreRepository for SqliteScoreRepository {
    async fn upsert_score(&self, address: &Address, score: CreditScore) -> Result<(), RepositoryError> {
        let timestamp = Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO wallet_credit_scores (wallet_address, on_chain_credit_score, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(wallet_address) DO UPDATE SET
                on_chain_credit_score = excluded.on_chain_credit_score,
                updated_at = excluded.updated_at
        "#,
        )
        .bind(address.as_str())
        .bind(score.value())
        .bind(timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryError(format!("Failed to store credit score: {}", e)))?;

        debug!(address = %address, score = score.value(), "✅ Credit score stored");
        Ok(())
    }

    async fn get_score(&self, address: &Address) -> Result<Option<StoredScore>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT wallet_address, on_chain_credit_score, updated_at
            FROM wallet_credit_scores
            WHERE wallet_address = ?
        "#,
        )
        .bind(address.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let updated_at: i64 = row.try_get("updated_at")?;
        let updated_at = Utc
            .timestamp_opt(updated_at, 0)
            .single()
            .ok_or_else(|| RepositoryError::QueryError(format!("Invalid updated_at timestamp: {}", updated_at)))?;

        Ok(Some(StoredScore {
            wallet_address: row.try_get("wallet_address")?,
            on_chain_credit_score: row.try_get("on_chain_credit_score")?,
            updated_at,
        }))
    }
}
