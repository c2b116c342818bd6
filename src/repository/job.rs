//! Job posting queries.

use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::JobRecord;
use super::pool::{DbError, SqlitePool};
use super::util::escape_like;
use crate::models::JobPosting;
use crate::schema::jobs;

/// Result ordering for [`JobQuery`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JobOrder {
    /// Newest `posted_at` first (undated last), then newest row.
    #[default]
    Recent,
    /// Company, then title, ascending.
    Alpha,
}

impl JobOrder {
    /// Parse a query-string value; anything other than `alpha` is `Recent`.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("alpha") {
            Self::Alpha
        } else {
            Self::Recent
        }
    }
}

/// Filters for [`JobRepository::search`]. Blank strings should be passed as `None`.
#[derive(Debug, Clone, Default)]
pub struct JobQuery {
    /// Substring over title, company and category.
    pub text: Option<String>,
    /// Prefix over the source key.
    pub source_prefix: Option<String>,
    /// Substring over category.
    pub category: Option<String>,
    pub order: JobOrder,
    /// `None` returns every match.
    pub limit: Option<i64>,
    pub offset: i64,
}

/// One page of search results.
#[derive(Debug, Clone)]
pub struct JobPage {
    /// Matches before pagination.
    pub total: i64,
    pub jobs: Vec<JobPosting>,
}

// SQLite's LIKE is case-insensitive for ASCII, which covers the filters here.
macro_rules! apply_filters {
    ($query:ident, $filters:expr) => {{
        let filters: &JobQuery = $filters;
        if let Some(text) = &filters.text {
            let pattern = format!("%{}%", escape_like(text));
            $query = $query.filter(
                jobs::title
                    .like(pattern.clone())
                    .escape('\\')
                    .or(jobs::company.like(pattern.clone()).escape('\\'))
                    .or(jobs::category.like(pattern).escape('\\')),
            );
        }
        if let Some(prefix) = &filters.source_prefix {
            let pattern = format!("{}%", escape_like(prefix));
            $query = $query.filter(jobs::source.like(pattern).escape('\\'));
        }
        if let Some(category) = &filters.category {
            let pattern = format!("%{}%", escape_like(category));
            $query = $query.filter(jobs::category.like(pattern).escape('\\'));
        }
    }};
}

/// Read access to stored postings.
#[derive(Clone)]
pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Filter, order and paginate postings.
    pub async fn search(&self, filters: &JobQuery) -> Result<JobPage, DbError> {
        let mut conn = self.pool.get().await?;

        let mut count_query = jobs::table.select(count_star()).into_boxed();
        apply_filters!(count_query, filters);
        let total: i64 = count_query.first(&mut conn).await?;

        let mut query = jobs::table.select(JobRecord::as_select()).into_boxed();
        apply_filters!(query, filters);
        query = match filters.order {
            JobOrder::Recent => query.order((jobs::posted_at.desc(), jobs::id.desc())),
            JobOrder::Alpha => query.order((jobs::company.asc(), jobs::title.asc())),
        };
        // SQLite needs a LIMIT before OFFSET; -1 means no limit.
        let offset = filters.offset.max(0);
        match filters.limit {
            Some(limit) => query = query.limit(limit.max(1)).offset(offset),
            None if offset > 0 => query = query.limit(-1).offset(offset),
            None => {}
        }

        let records: Vec<JobRecord> = query.load(&mut conn).await?;
        Ok(JobPage {
            total,
            jobs: records.into_iter().map(JobPosting::from).collect(),
        })
    }

    /// Total stored postings.
    pub async fn count(&self) -> Result<i64, DbError> {
        let mut conn = self.pool.get().await?;
        jobs::table.select(count_star()).first(&mut conn).await
    }

    /// Posting counts grouped by source key, sorted by key.
    pub async fn counts_by_source(&self) -> Result<Vec<(String, i64)>, DbError> {
        let mut conn = self.pool.get().await?;
        jobs::table
            .group_by(jobs::source)
            .select((jobs::source, count_star()))
            .order(jobs::source.asc())
            .load::<(String, i64)>(&mut conn)
            .await
    }

    /// URLs currently stored for a source key.
    pub async fn urls_for_source(&self, source: &str) -> Result<Vec<String>, DbError> {
        let mut conn = self.pool.get().await?;
        jobs::table
            .filter(jobs::source.eq(source))
            .select(jobs::url)
            .order(jobs::id.asc())
            .load::<String>(&mut conn)
            .await
    }

    /// Look up a posting by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<JobPosting>, DbError> {
        let mut conn = self.pool.get().await?;
        jobs::table
            .filter(jobs::url.eq(url))
            .select(JobRecord::as_select())
            .first::<JobRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(JobPosting::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawJob;
    use crate::repository::DbContext;
    use tempfile::tempdir;

    fn job(
        title: &str,
        company: &str,
        url: &str,
        source: &str,
        category: &str,
        posted: Option<&str>,
    ) -> crate::models::NormalizedJob {
        RawJob {
            title: Some(title.to_string()),
            company: Some(company.to_string()),
            url: Some(url.to_string()),
            category: Some(category.to_string()),
            posted_at: posted.map(|day| format!("{}T00:00:00+00:00", day)),
            ..Default::default()
        }
        .normalize(source)
    }

    async fn seeded() -> (DbContext, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("jobs.sqlite"));
        ctx.init_schema().await.unwrap();

        let mut batch = ctx.begin_batch().await.unwrap();
        let created = "2024-03-05 12:00:00";
        for j in [
            job(
                "Data Engineer",
                "Acme",
                "https://a.example/1",
                "Greenhouse:acme",
                "Data Platform",
                Some("2024-03-01"),
            ),
            job(
                "Rust Developer",
                "Beta",
                "https://b.example/2",
                "Greenhouse:beta",
                "Engineering",
                Some("2024-03-04"),
            ),
            job("Designer", "Zeta", "https://z.example/3", "Remotive", "Design", None),
            job(
                "100% Remote Analyst",
                "Acme",
                "https://a.example/4",
                "Lever:acme",
                "big data",
                Some("2024-02-01"),
            ),
        ] {
            assert!(batch.insert(&j, created).await.unwrap());
        }
        batch.commit().await.unwrap();
        (ctx, dir)
    }

    #[tokio::test]
    async fn test_search_unlimited_recent_order() {
        let (ctx, _dir) = seeded().await;
        let page = ctx.jobs().search(&JobQuery::default()).await.unwrap();

        assert_eq!(page.total, 4);
        let titles: Vec<_> = page.jobs.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(
            titles,
            ["Rust Developer", "Data Engineer", "100% Remote Analyst", "Designer"]
        );
    }

    #[tokio::test]
    async fn test_search_category_is_case_insensitive() {
        let (ctx, _dir) = seeded().await;
        let page = ctx
            .jobs()
            .search(&JobQuery {
                category: Some("DATA".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert!(page
            .jobs
            .iter()
            .all(|j| j.category.to_lowercase().contains("data")));
    }

    #[tokio::test]
    async fn test_search_source_prefix_and_pagination() {
        let (ctx, _dir) = seeded().await;
        let page = ctx
            .jobs()
            .search(&JobQuery {
                source_prefix: Some("greenhouse:".to_string()),
                order: JobOrder::Alpha,
                limit: Some(1),
                offset: 1,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.jobs.len(), 1);
        assert_eq!(page.jobs[0].company, "Beta");
    }

    #[tokio::test]
    async fn test_search_escapes_wildcards() {
        let (ctx, _dir) = seeded().await;
        let page = ctx
            .jobs()
            .search(&JobQuery {
                text: Some("100%".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        let page = ctx
            .jobs()
            .search(&JobQuery {
                text: Some("%".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_counts_by_source() {
        let (ctx, _dir) = seeded().await;
        let counts = ctx.jobs().counts_by_source().await.unwrap();
        assert_eq!(counts.len(), 4);
        assert_eq!(counts[0], ("Greenhouse:acme".to_string(), 1));
        assert_eq!(ctx.jobs().count().await.unwrap(), 4);
    }

    #[test]
    fn test_order_parse() {
        assert_eq!(JobOrder::parse("alpha"), JobOrder::Alpha);
        assert_eq!(JobOrder::parse("ALPHA "), JobOrder::Alpha);
        assert_eq!(JobOrder::parse("recent"), JobOrder::Recent);
        assert_eq!(JobOrder::parse("bogus"), JobOrder::Recent);
    }
}
