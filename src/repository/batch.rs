//! Write side of an ingest run.
//!
//! A [`JobBatch`] owns one connection with an open transaction. Every write
//! of a fetch run goes through it and lands atomically on [`JobBatch::commit`].
//! Dropping the batch without committing closes the connection, which makes
//! SQLite discard the transaction.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel_async::{RunQueryDsl, SimpleAsyncConnection};
use tracing::debug;

use super::meta::LAST_FETCH_KEY;
use super::models::NewJob;
use super::pool::{DbError, SqliteConn, SqlitePool};
use crate::models::NormalizedJob;
use crate::schema::{jobs, meta};

/// Format used for `jobs.created_at`.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Stale rows are deleted in chunks to stay under SQLite's variable limit.
const DELETE_CHUNK: usize = 500;

pub struct JobBatch {
    conn: SqliteConn,
}

impl JobBatch {
    /// Open a connection and start a transaction.
    pub async fn begin(pool: &SqlitePool) -> Result<Self, DbError> {
        let mut conn = pool.get().await?;
        conn.batch_execute("BEGIN").await?;
        Ok(Self { conn })
    }

    /// Insert a posting unless its URL is already stored.
    ///
    /// Returns whether a row was added.
    pub async fn insert(&mut self, job: &NormalizedJob, created_at: &str) -> Result<bool, DbError> {
        let hash = job.content_hash();
        let row = NewJob {
            title: &job.title,
            company: &job.company,
            url: &job.url,
            source: &job.source,
            category: &job.category,
            location: &job.location,
            salary: job.salary.as_deref(),
            posted_at: job.posted_at.as_deref(),
            created_at,
            hash: &hash,
        };

        let rows = diesel::insert_or_ignore_into(jobs::table)
            .values(&row)
            .execute(&mut self.conn)
            .await?;
        Ok(rows > 0)
    }

    /// Delete postings of `source` whose URL is not in `seen`.
    pub async fn reconcile_source(
        &mut self,
        source: &str,
        seen: &HashSet<String>,
    ) -> Result<usize, DbError> {
        let stored: Vec<(i32, String)> = jobs::table
            .filter(jobs::source.eq(source))
            .select((jobs::id, jobs::url))
            .load(&mut self.conn)
            .await?;

        let stale: Vec<i32> = stored
            .into_iter()
            .filter(|(_, url)| !seen.contains(url))
            .map(|(id, _)| id)
            .collect();

        let mut removed = 0;
        for chunk in stale.chunks(DELETE_CHUNK) {
            removed += diesel::delete(jobs::table.filter(jobs::id.eq_any(chunk.to_vec())))
                .execute(&mut self.conn)
                .await?;
        }
        debug!("Reconciled {}: {} stale postings removed", source, removed);
        Ok(removed)
    }

    /// Delete postings inserted more than `days` days before `now`.
    ///
    /// A horizon reaching past the representable date range deletes nothing.
    pub async fn prune_older_than(
        &mut self,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<usize, DbError> {
        let Some(cutoff) = now.checked_sub_signed(Duration::days(i64::from(days))) else {
            return Ok(0);
        };
        let cutoff = cutoff.format(CREATED_AT_FORMAT).to_string();
        diesel::delete(jobs::table.filter(jobs::created_at.lt(cutoff)))
            .execute(&mut self.conn)
            .await
    }

    /// Record the completion time of this run for the throttle.
    pub async fn set_last_fetch(&mut self, at: DateTime<Utc>) -> Result<(), DbError> {
        diesel::replace_into(meta::table)
            .values((
                meta::key.eq(LAST_FETCH_KEY),
                meta::value.eq(at.timestamp().to_string()),
            ))
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    pub async fn commit(mut self) -> Result<(), DbError> {
        self.conn.batch_execute("COMMIT").await
    }

    pub async fn rollback(mut self) -> Result<(), DbError> {
        self.conn.batch_execute("ROLLBACK").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawJob;
    use crate::repository::DbContext;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn posting(url: &str, source: &str) -> NormalizedJob {
        RawJob {
            title: Some("Engineer".to_string()),
            url: Some(url.to_string()),
            ..Default::default()
        }
        .normalize(source)
    }

    async fn context() -> (DbContext, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("jobs.sqlite"));
        ctx.init_schema().await.unwrap();
        (ctx, dir)
    }

    #[tokio::test]
    async fn test_duplicate_url_is_ignored() {
        let (ctx, _dir) = context().await;
        let mut batch = ctx.begin_batch().await.unwrap();
        assert!(batch.insert(&posting("https://x/1", "A"), "2024-01-01 00:00:00").await.unwrap());
        assert!(!batch.insert(&posting("https://x/1", "B"), "2024-01-02 00:00:00").await.unwrap());
        batch.commit().await.unwrap();

        assert_eq!(ctx.jobs().count().await.unwrap(), 1);
        let stored = ctx.jobs().get_by_url("https://x/1").await.unwrap().unwrap();
        assert_eq!(stored.source, "A");
    }

    #[tokio::test]
    async fn test_reconcile_only_touches_one_source() {
        let (ctx, _dir) = context().await;
        let mut batch = ctx.begin_batch().await.unwrap();
        for url in ["https://x/a", "https://x/b", "https://x/c"] {
            batch.insert(&posting(url, "S"), "2024-01-01 00:00:00").await.unwrap();
        }
        batch.insert(&posting("https://y/1", "Other"), "2024-01-01 00:00:00").await.unwrap();

        let seen: HashSet<String> = ["https://x/b", "https://x/c", "https://x/d"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(batch.reconcile_source("S", &seen).await.unwrap(), 1);
        batch.commit().await.unwrap();

        assert_eq!(
            ctx.jobs().urls_for_source("S").await.unwrap(),
            ["https://x/b", "https://x/c"]
        );
        assert_eq!(ctx.jobs().urls_for_source("Other").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let (ctx, _dir) = context().await;
        let mut batch = ctx.begin_batch().await.unwrap();
        batch.insert(&posting("https://x/1", "A"), "2024-01-01 00:00:00").await.unwrap();
        batch.set_last_fetch(Utc::now()).await.unwrap();
        batch.rollback().await.unwrap();

        assert_eq!(ctx.jobs().count().await.unwrap(), 0);
        assert!(ctx.meta().last_fetch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_prune_older_than() {
        let (ctx, _dir) = context().await;
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let mut batch = ctx.begin_batch().await.unwrap();
        batch.insert(&posting("https://x/old", "A"), "2024-02-01 00:00:00").await.unwrap();
        batch.insert(&posting("https://x/new", "A"), "2024-03-09 00:00:00").await.unwrap();
        assert_eq!(batch.prune_older_than(7, now).await.unwrap(), 1);
        batch.set_last_fetch(now).await.unwrap();
        batch.commit().await.unwrap();

        assert_eq!(ctx.jobs().urls_for_source("A").await.unwrap(), ["https://x/new"]);
        assert_eq!(ctx.meta().last_fetch().await.unwrap(), Some(now));
    }

    #[tokio::test]
    async fn test_prune_horizon_beyond_date_range_deletes_nothing() {
        let (ctx, _dir) = context().await;
        let mut batch = ctx.begin_batch().await.unwrap();
        batch
            .insert(&posting("https://x/old", "A"), "1971-01-01 00:00:00")
            .await
            .unwrap();
        assert_eq!(batch.prune_older_than(100_000_000, Utc::now()).await.unwrap(), 0);
        assert_eq!(batch.prune_older_than(u32::MAX, Utc::now()).await.unwrap(), 0);
        batch.commit().await.unwrap();

        assert_eq!(ctx.jobs().count().await.unwrap(), 1);
    }
}
