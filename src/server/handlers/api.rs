//! Status and registry endpoints.

use std::collections::HashMap;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

use super::super::AppState;
use super::helpers::store_error;
use crate::sources::dates::to_iso;

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Registry listing with stored posting counts per source.
pub async fn api_sources(State(state): State<AppState>) -> Response {
    let counts: HashMap<String, i64> = match state.jobs.counts_by_source().await {
        Ok(counts) => counts.into_iter().collect(),
        Err(e) => return store_error(e),
    };

    let sources: Vec<_> = state
        .registry
        .all()
        .iter()
        .map(|s| {
            let key = s.source_key();
            serde_json::json!({
                "id": s.id,
                "name": s.label(),
                "kind": s.kind.as_str(),
                "count": counts.get(&key).copied().unwrap_or(0),
                "sourceKey": key,
            })
        })
        .collect();

    Json(sources).into_response()
}

/// Store totals and the time of the last fetch run.
pub async fn api_status(State(state): State<AppState>) -> Response {
    let total = match state.jobs.count().await {
        Ok(total) => total,
        Err(e) => return store_error(e),
    };
    let by_source = match state.jobs.counts_by_source().await {
        Ok(counts) => counts,
        Err(e) => return store_error(e),
    };
    let last_fetch = match state.meta.last_fetch().await {
        Ok(last) => last,
        Err(e) => return store_error(e),
    };

    let sources: Vec<_> = by_source
        .into_iter()
        .map(|(source, count)| serde_json::json!({ "source": source, "count": count }))
        .collect();

    Json(serde_json::json!({
        "total": total,
        "lastFetchAt": last_fetch.map(to_iso),
        "sources": sources,
        "generatedAt": to_iso(Utc::now()),
    }))
    .into_response()
}
