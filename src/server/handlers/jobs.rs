//! Job listing endpoint.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::super::AppState;
use super::helpers::{coerce_int, non_empty, store_error};
use crate::models::JobPosting;
use crate::repository::{JobOrder, JobQuery};
use crate::sources::dates::to_iso;

/// Query parameters. Everything arrives as text and is coerced, never rejected.
#[derive(Debug, Default, Deserialize)]
pub struct JobsParams {
    pub q: Option<String>,
    pub source: Option<String>,
    pub category: Option<String>,
    /// An integer, or `all`. Missing or empty means all.
    pub limit: Option<String>,
    pub offset: Option<String>,
    /// `recent` (default) or `alpha`.
    pub order: Option<String>,
}

impl JobsParams {
    pub fn to_query(&self) -> JobQuery {
        let limit = non_empty(&self.limit)
            .filter(|l| !l.eq_ignore_ascii_case("all"))
            .map(|l| coerce_int(&l).max(1));
        // The offset only applies to a bounded listing.
        let offset = match limit {
            Some(_) => self.offset.as_deref().map(coerce_int).unwrap_or(0).max(0),
            None => 0,
        };

        JobQuery {
            text: non_empty(&self.q),
            source_prefix: non_empty(&self.source),
            category: non_empty(&self.category),
            order: self
                .order
                .as_deref()
                .map(JobOrder::parse)
                .unwrap_or_default(),
            limit,
            offset,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobsResponse {
    pub total: i64,
    pub count: usize,
    pub jobs: Vec<JobPosting>,
    pub generated_at: String,
}

/// `GET /api/jobs` (also served at `/jobs_api.php`).
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobsParams>,
) -> Response {
    let query = params.to_query();
    match state.jobs.search(&query).await {
        Ok(page) => Json(JobsResponse {
            total: page.total,
            count: page.jobs.len(),
            jobs: page.jobs,
            generated_at: to_iso(Utc::now()),
        })
        .into_response(),
        Err(e) => store_error(e),
    }
}
