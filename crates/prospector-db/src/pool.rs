use crate::{DatabaseError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::time::Duration;
use tracing::info;

const CREATE_POOLS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS pools (
    id         TEXT PRIMARY KEY,
    protocol   TEXT NOT NULL,
    token0     TEXT NOT NULL,
    token1     TEXT NOT NULL,
    fee        REAL NOT NULL,
    reserve0   TEXT NOT NULL DEFAULT '0',
    reserve1   TEXT NOT NULL DEFAULT '0',
    created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// SQLite connection wrapper for the pool catalogue.
///
/// A single connection serialises writers; WAL keeps readers concurrent
/// with them.
#[derive(Clone)]
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    pub async fn new(path: &str) -> Result<Self> {
        info!(path, "Opening pool catalogue");

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Create the schema if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_POOLS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        info!("Pool catalogue schema ready");
        Ok(())
    }

    pub fn inner(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        Ok(())
    }

    pub async fn close(&self) {
        info!("Closing pool catalogue");
        self.pool.close().await;
    }
}
