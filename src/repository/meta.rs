//! Key/value run metadata.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::pool::{DbError, SqlitePool};
use crate::schema::meta;

/// Unix seconds of the last persisted fetch run.
pub const LAST_FETCH_KEY: &str = "last_fetch_at";

#[derive(Clone)]
pub struct MetaRepository {
    pool: SqlitePool,
}

impl MetaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Raw value for a key.
    pub async fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        let mut conn = self.pool.get().await?;
        meta::table
            .find(key)
            .select(meta::value)
            .first::<String>(&mut conn)
            .await
            .optional()
    }

    /// When the last persisted fetch run finished. Unparseable values read as never.
    pub async fn last_fetch(&self) -> Result<Option<DateTime<Utc>>, DbError> {
        Ok(self
            .get(LAST_FETCH_KEY)
            .await?
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0)))
    }
}
