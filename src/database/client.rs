// file: src/database/client.rs
// description: SQLite client wrapper with connection management
// reference: https://docs.rs/sqlx

use crate::config::DatabaseConfig;
use crate::database::schema::column_list;
use crate::error::{PipelineError, Result};
use crate::models::NovelRecord;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone)]
pub struct NovelDbClient {
    pool: SqlitePool,
    config: DatabaseConfig,
}

impl NovelDbClient {
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        info!("Connecting to SQLite at {}", config.url);

        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(30));

        if let Some(parent) = options.get_filename().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| PipelineError::file(parent, e))?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool, config })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    pub async fn ping(&self) -> Result<bool> {
        debug!("Checking SQLite connection");

        let value: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(value == 1)
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    pub async fn count_rows(&self) -> Result<u64> {
        if !self.table_exists(self.table_name()).await? {
            return Ok(0);
        }

        let sql = format!("SELECT COUNT(*) FROM {}", self.table_name());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    /// Lowest ids first.
    pub async fn fetch_first(&self, limit: u32) -> Result<Vec<NovelRecord>> {
        self.fetch_ordered("ASC", limit).await
    }

    /// Highest ids first.
    pub async fn fetch_last(&self, limit: u32) -> Result<Vec<NovelRecord>> {
        self.fetch_ordered("DESC", limit).await
    }

    async fn fetch_ordered(&self, direction: &str, limit: u32) -> Result<Vec<NovelRecord>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id {} LIMIT ?",
            column_list(),
            self.table_name(),
            direction
        );

        let rows = sqlx::query_as::<_, NovelRecord>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
