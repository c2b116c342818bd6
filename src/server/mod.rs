//! Read-only JSON API over the job store.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::repository::{DbContext, JobRepository, MetaRepository};
use crate::sources::SourceRegistry;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobRepository>,
    pub meta: Arc<MetaRepository>,
    pub registry: Arc<SourceRegistry>,
}

impl AppState {
    pub fn new(ctx: &DbContext, registry: SourceRegistry) -> Self {
        Self {
            jobs: Arc::new(ctx.jobs()),
            meta: Arc::new(ctx.meta()),
            registry: Arc::new(registry),
        }
    }
}

/// Start the web server.
pub async fn serve(
    settings: &Settings,
    registry: SourceRegistry,
    host: &str,
    port: u16,
) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let app = create_router(AppState::new(&ctx, registry));

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tempfile::tempdir;
    use tower::ServiceExt;

    use crate::models::{RawJob, SourceDescriptor};

    async fn setup_test_app() -> (axum::Router, DbContext, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("jobs.sqlite"));
        ctx.init_schema().await.unwrap();

        let registry = SourceRegistry::new(vec![
            SourceDescriptor::greenhouse("gh-acme", "acme"),
            SourceDescriptor::feed("nodesk", "Nodesk", "https://nodesk.co/remote-jobs/feed/"),
        ])
        .unwrap();

        let app = create_router(AppState::new(&ctx, registry));
        (app, ctx, dir)
    }

    async fn seed(ctx: &DbContext) {
        let rows = [
            ("Data Scientist", "Acme", "Greenhouse:acme", "Data", "2024-03-01"),
            ("Backend Engineer", "Acme", "Greenhouse:acme", "Engineering", "2024-03-03"),
            ("Analytics Lead", "Beta", "Nodesk", "big data", "2024-03-02"),
        ];
        let mut batch = ctx.begin_batch().await.unwrap();
        for (i, (title, company, source, category, posted)) in rows.into_iter().enumerate() {
            let job = RawJob {
                title: Some(title.to_string()),
                company: Some(company.to_string()),
                url: Some(format!("https://jobs.example/{}", i)),
                category: Some(category.to_string()),
                posted_at: Some(format!("{}T00:00:00+00:00", posted)),
                ..Default::default()
            }
            .normalize(source);
            batch.insert(&job, "2024-03-05 00:00:00").await.unwrap();
        }
        batch.set_last_fetch(chrono::Utc::now()).await.unwrap();
        batch.commit().await.unwrap();
    }

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _ctx, _dir) = setup_test_app().await;
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_jobs_empty_store() {
        let (app, _ctx, _dir) = setup_test_app().await;
        let (status, json) = get_json(app, "/api/jobs").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 0);
        assert_eq!(json["count"], 0);
        assert!(json["jobs"].as_array().unwrap().is_empty());
        assert!(json["generatedAt"].as_str().unwrap().ends_with("+00:00"));
    }

    #[tokio::test]
    async fn test_jobs_unlimited_and_all_match() {
        let (app, ctx, _dir) = setup_test_app().await;
        seed(&ctx).await;

        let (_, omitted) = get_json(app.clone(), "/api/jobs").await;
        let (_, all) = get_json(app, "/jobs_api.php?limit=all").await;

        assert_eq!(omitted["count"], 3);
        assert_eq!(all["count"], 3);
        assert_eq!(omitted["jobs"], all["jobs"]);
        assert_eq!(omitted["jobs"][0]["title"], "Backend Engineer");
    }

    #[tokio::test]
    async fn test_jobs_category_filter_and_shape() {
        let (app, ctx, _dir) = setup_test_app().await;
        seed(&ctx).await;

        let (_, json) = get_json(app, "/api/jobs?category=Data&order=alpha").await;
        assert_eq!(json["total"], 2);
        let jobs = json["jobs"].as_array().unwrap();
        assert_eq!(jobs[0]["company"], "Acme");
        assert_eq!(jobs[1]["company"], "Beta");

        let job = jobs[0].as_object().unwrap();
        let mut keys: Vec<_> = job.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(
            keys,
            ["category", "company", "location", "posted_at", "salary", "source", "title", "url"]
        );
    }

    #[tokio::test]
    async fn test_jobs_pagination() {
        let (app, ctx, _dir) = setup_test_app().await;
        seed(&ctx).await;

        let (_, json) = get_json(app, "/api/jobs?limit=1&offset=1").await;
        assert_eq!(json["total"], 3);
        assert_eq!(json["count"], 1);
        assert_eq!(json["jobs"][0]["title"], "Analytics Lead");
    }

    #[tokio::test]
    async fn test_sources_and_status() {
        let (app, ctx, _dir) = setup_test_app().await;
        seed(&ctx).await;

        let (_, sources) = get_json(app.clone(), "/api/sources").await;
        let sources = sources.as_array().unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0]["sourceKey"], "Greenhouse:acme");
        assert_eq!(sources[0]["kind"], "greenhouse");
        assert_eq!(sources[0]["count"], 2);
        assert_eq!(sources[1]["count"], 1);

        let (_, status) = get_json(app, "/api/status").await;
        assert_eq!(status["total"], 3);
        assert!(status["lastFetchAt"].is_string());
        assert_eq!(status["sources"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_store_error_is_500() {
        let dir = tempdir().unwrap();
        // Schema never initialized: every query fails.
        let ctx = DbContext::new(&dir.path().join("empty.sqlite"));
        let app = create_router(AppState::new(&ctx, SourceRegistry::new(vec![]).unwrap()));

        let (status, json) = get_json(app, "/api/jobs").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].is_string());
    }
}
