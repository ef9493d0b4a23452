//! Query execution against the configured relational database.
//!
//! Read statements come back as `QueryResult` rows; anything else runs in a
//! transaction, is committed, and is acknowledged with a fixed message.

use super::decode::{column_names, decode_pg_row, decode_sqlite_row};
use crate::domain::error::{AppError, Result};
use crate::domain::query_result::{ExecutionOutcome, QueryResult};
use async_trait::async_trait;
use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Column, Executor, PgPool, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info};

#[async_trait]
pub trait QueryExecutor {
    async fn execute(&self, sql: &str) -> Result<ExecutionOutcome>;
}

/// Pool settings for the executor
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbExecutorConfig {
    /// Maximum connections in the pool
    pub max_connections: u32,
    /// Acquire timeout in seconds
    pub connect_timeout_secs: u64,
    /// Per-statement timeout in seconds
    pub query_timeout_secs: u64,
}

impl Default for DbExecutorConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            connect_timeout_secs: 10,
            query_timeout_secs: 30,
        }
    }
}

#[derive(Clone)]
enum DbPool {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

pub struct SqlxQueryExecutor {
    pool: DbPool,
    config: DbExecutorConfig,
}

/// Only statements starting with SELECT produce rows.
pub fn is_read_query(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .map(|head| head.eq_ignore_ascii_case("select"))
        .unwrap_or(false)
}

impl SqlxQueryExecutor {
    /// Connect using the URL scheme to pick the driver.
    pub async fn connect(url: &str, config: DbExecutorConfig) -> Result<Self> {
        let acquire_timeout = Duration::from_secs(config.connect_timeout_secs);

        let pool = if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(acquire_timeout)
                .connect(url)
                .await
                .map_err(|e| {
                    error!("Failed to connect to PostgreSQL: {}", e);
                    AppError::DatabaseError(format!("Failed to connect to PostgreSQL: {}", e))
                })?;
            info!("Created PostgreSQL connection pool");
            DbPool::Postgres(pool)
        } else if url.starts_with("sqlite:") {
            let options = SqliteConnectOptions::from_str(url)
                .map_err(|e| AppError::ConfigError(format!("Invalid SQLite URL: {}", e)))?
                .create_if_missing(true);
            // Each in-memory connection is its own database.
            let in_memory = url.contains(":memory:");
            let mut pool_options = SqlitePoolOptions::new()
                .max_connections(if in_memory { 1 } else { config.max_connections })
                .acquire_timeout(acquire_timeout);
            if in_memory {
                pool_options = pool_options.idle_timeout(None).max_lifetime(None);
            }
            let pool = pool_options.connect_with(options).await.map_err(|e| {
                error!("Failed to open SQLite database: {}", e);
                AppError::DatabaseError(format!("Failed to open SQLite database: {}", e))
            })?;
            info!("Created SQLite connection pool");
            DbPool::Sqlite(pool)
        } else {
            return Err(AppError::ConfigError(
                "database.url must start with postgres://, postgresql:// or sqlite:".to_string(),
            ));
        };

        Ok(Self { pool, config })
    }

    pub fn from_sqlite_pool(pool: SqlitePool, config: DbExecutorConfig) -> Self {
        Self {
            pool: DbPool::Sqlite(pool),
            config,
        }
    }

    pub fn driver_name(&self) -> &'static str {
        match self.pool {
            DbPool::Postgres(_) => "postgres",
            DbPool::Sqlite(_) => "sqlite",
        }
    }

    async fn fetch_rows(&self, sql: &str) -> Result<QueryResult> {
        match &self.pool {
            DbPool::Postgres(pool) => {
                let rows = sqlx::query(sql).fetch_all(pool).await?;
                let columns = match rows.first() {
                    Some(row) => column_names(row),
                    None => describe_columns(pool, sql).await,
                };
                let rows = rows.iter().map(decode_pg_row).collect::<Result<Vec<_>>>()?;
                Ok(QueryResult::new(columns, rows))
            }
            DbPool::Sqlite(pool) => {
                let rows = sqlx::query(sql).fetch_all(pool).await?;
                let columns = match rows.first() {
                    Some(row) => column_names(row),
                    None => describe_columns(pool, sql).await,
                };
                let rows = rows
                    .iter()
                    .map(decode_sqlite_row)
                    .collect::<Result<Vec<_>>>()?;
                Ok(QueryResult::new(columns, rows))
            }
        }
    }

    async fn execute_statement(&self, sql: &str) -> Result<u64> {
        match &self.pool {
            DbPool::Postgres(pool) => {
                let mut tx = pool.begin().await?;
                let done = sqlx::query(sql).execute(&mut *tx).await?;
                tx.commit().await?;
                Ok(done.rows_affected())
            }
            DbPool::Sqlite(pool) => {
                let mut tx = pool.begin().await?;
                let done = sqlx::query(sql).execute(&mut *tx).await?;
                tx.commit().await?;
                Ok(done.rows_affected())
            }
        }
    }
}

/// Column names for a statement that returned no rows. Best effort.
async fn describe_columns<'p, DB>(pool: &'p sqlx::Pool<DB>, sql: &str) -> Vec<String>
where
    DB: sqlx::Database,
    &'p sqlx::Pool<DB>: Executor<'p, Database = DB>,
{
    match pool.describe(sql).await {
        Ok(described) => described
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect(),
        Err(e) => {
            debug!("Could not describe empty result set: {}", e);
            Vec::new()
        }
    }
}

#[async_trait]
impl QueryExecutor for SqlxQueryExecutor {
    async fn execute(&self, sql: &str) -> Result<ExecutionOutcome> {
        let timeout_secs = self.config.query_timeout_secs;
        let timed_out = |_| {
            AppError::DatabaseError(format!(
                "Query timed out after {} seconds",
                timeout_secs
            ))
        };

        if is_read_query(sql) {
            let result = tokio::time::timeout(
                Duration::from_secs(timeout_secs),
                self.fetch_rows(sql),
            )
            .await
            .map_err(timed_out)?
            .map_err(|e| {
                error!("Query failed: {}", e);
                e
            })?;
            debug!(
                "Fetched {} rows x {} columns",
                result.rows.len(),
                result.columns.len()
            );
            Ok(ExecutionOutcome::Rows(result))
        } else {
            let affected = tokio::time::timeout(
                Duration::from_secs(timeout_secs),
                self.execute_statement(sql),
            )
            .await
            .map_err(timed_out)?
            .map_err(|e| {
                error!("Statement failed: {}", e);
                e
            })?;
            info!("Statement committed ({} rows affected)", affected);
            Ok(ExecutionOutcome::acknowledged())
        }
    }
}
