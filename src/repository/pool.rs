//! SQLite connections.
//!
//! There is no real pool: each `get` opens a fresh connection through
//! diesel-async's `SyncConnectionWrapper`. The API server reads while a fetch
//! run may hold the write lock, so every connection waits on a busy database
//! instead of failing at once.

use std::path::Path;

use diesel::sqlite::SqliteConnection;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::{AsyncConnection, SimpleAsyncConnection};

use super::util::to_diesel_error;

pub type DbError = diesel::result::Error;

pub type SqliteConn = SyncConnectionWrapper<SqliteConnection>;

/// Milliseconds a connection waits on a locked database.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Opens connections to one SQLite file.
#[derive(Debug, Clone)]
pub struct SqlitePool {
    path: String,
}

impl SqlitePool {
    /// Accepts a bare path or a `sqlite:` / `sqlite://` URL.
    pub fn new(database_url: &str) -> Self {
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);
        let path = path.strip_prefix("//").unwrap_or(path);
        Self {
            path: path.to_string(),
        }
    }

    pub fn from_path(path: &Path) -> Self {
        Self::new(&path.display().to_string())
    }

    pub async fn get(&self) -> Result<SqliteConn, DbError> {
        let mut conn = SqliteConn::establish(&self.path)
            .await
            .map_err(to_diesel_error)?;
        conn.batch_execute(&format!("PRAGMA busy_timeout = {};", BUSY_TIMEOUT_MS))
            .await?;
        Ok(conn)
    }

    /// Filesystem path of the database.
    pub fn database_url(&self) -> &str {
        &self.path
    }
}
