//! Database context: schema bootstrap and repository access.

use std::path::Path;

use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel_async::{RunQueryDsl, SimpleAsyncConnection};

use super::batch::JobBatch;
use super::job::JobRepository;
use super::meta::MetaRepository;
use super::pool::{DbError, SqlitePool};

/// Entry point for database operations. Create one per command or server.
///
/// ```ignore
/// let ctx = DbContext::from_url(&settings.database_url());
/// ctx.init_schema().await?;
/// let total = ctx.jobs().count().await?;
/// ```
#[derive(Clone)]
pub struct DbContext {
    pool: SqlitePool,
}

#[derive(QueryableByName)]
struct TableName {
    #[diesel(sql_type = Text)]
    name: String,
}

impl DbContext {
    /// Create a context for a SQLite file.
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: SqlitePool::from_path(db_path),
        }
    }

    /// Create a context from a database URL (`sqlite:path` or a plain path).
    pub fn from_url(database_url: &str) -> Self {
        Self {
            pool: SqlitePool::new(database_url),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn jobs(&self) -> JobRepository {
        JobRepository::new(self.pool.clone())
    }

    pub fn meta(&self) -> MetaRepository {
        MetaRepository::new(self.pool.clone())
    }

    /// Start a write transaction on a dedicated connection.
    pub async fn begin_batch(&self) -> Result<JobBatch, DbError> {
        JobBatch::begin(&self.pool).await
    }

    /// Create tables and indexes if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(
            r#"
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                company TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                source TEXT NOT NULL,
                category TEXT NOT NULL,
                location TEXT NOT NULL,
                salary TEXT,
                posted_at TEXT,
                created_at TEXT NOT NULL,
                hash TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_hash ON jobs(hash);
            CREATE INDEX IF NOT EXISTS idx_jobs_posted_at ON jobs(posted_at);
            CREATE INDEX IF NOT EXISTS idx_jobs_source ON jobs(source);

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .await
    }

    /// Names of user tables, sorted.
    pub async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let mut conn = self.pool.get().await?;
        let rows: Vec<TableName> = diesel::sql_query(
            "SELECT name FROM sqlite_master WHERE type = 'table' \
             AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .load(&mut conn)
        .await?;
        Ok(rows.into_iter().map(|r| r.name).collect())
    }
}
