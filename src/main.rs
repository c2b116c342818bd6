//! jobfeed - remote job postings aggregator.
//!
//! Ingests job boards into a local SQLite store and serves the result
//! through a small JSON query API.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if jobfeed::cli::is_verbose() {
        "jobfeed=info"
    } else {
        "jobfeed=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    jobfeed::cli::run().await
}
