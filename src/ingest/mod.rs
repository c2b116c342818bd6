//! Fetch runs: pull every selected source, map its records, and store them.
//!
//! A run walks the registry one source at a time. Each source goes through
//! fetch, map, age filter, idempotent insert and (optionally) reconciliation
//! against its fresh listing. A source that fails to fetch or parse is
//! reported and skipped; store errors abort the run and roll it back.

mod types;

pub use types::{
    BatchOutcome, BatchReport, IngestError, IngestEvent, IngestOptions, SourceReport, SourceState,
};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::models::{NormalizedJob, SourceDescriptor, SourceKind};
use crate::repository::batch::CREATED_AT_FORMAT;
use crate::repository::{DbContext, JobBatch};
use crate::sources::dates::parse_timestamp;
use crate::sources::mappers::{map_feed_items, map_json_payload};
use crate::sources::{FeedItem, Fetch, FetchError, SourceRegistry};

/// A fetched, not yet mapped payload.
enum Payload {
    Json(Value),
    Feed(Vec<FeedItem>),
}

/// Runs fetch batches against a registry and a store.
pub struct Ingestor {
    fetcher: Arc<dyn Fetch>,
    db: DbContext,
    registry: Arc<SourceRegistry>,
}

impl Ingestor {
    pub fn new(fetcher: Arc<dyn Fetch>, db: DbContext, registry: Arc<SourceRegistry>) -> Self {
        Self {
            fetcher,
            db,
            registry,
        }
    }

    /// Run one batch.
    ///
    /// Progress is sent to `event_tx` when given; the returned report holds
    /// the same per-source results.
    pub async fn run(
        &self,
        options: &IngestOptions,
        event_tx: Option<mpsc::Sender<IngestEvent>>,
    ) -> Result<BatchOutcome, IngestError> {
        let started_at = Utc::now();

        if !options.no_throttle {
            if let Some(elapsed) = self.throttled(options.min_interval, started_at).await? {
                info!("Skipped: throttled ({}s since last run)", elapsed.as_secs());
                return Ok(BatchOutcome::Throttled { elapsed });
            }
        }

        let selected = self.registry.select(&options.only, &options.skip);
        info!(
            "Fetching {} of {} sources{}",
            selected.len(),
            self.registry.len(),
            if options.simulate { " (dry run)" } else { "" }
        );

        let mut batch = if options.simulate {
            None
        } else {
            Some(self.db.begin_batch().await?)
        };

        let result = self
            .run_sources(&selected, options, batch.as_mut(), event_tx.as_ref(), started_at)
            .await;

        let (sources, retention_pruned) = match (result, batch) {
            (Ok(sources), Some(mut batch)) => {
                let finished = Self::finish(&mut batch, options, Utc::now()).await;
                match finished {
                    Ok(pruned) => {
                        batch.commit().await?;
                        (sources, pruned)
                    }
                    Err(e) => {
                        Self::abort(batch).await;
                        return Err(e.into());
                    }
                }
            }
            (Ok(sources), None) => (sources, 0),
            (Err(e), Some(batch)) => {
                Self::abort(batch).await;
                return Err(e);
            }
            (Err(e), None) => return Err(e),
        };

        Ok(BatchOutcome::Completed(BatchReport {
            started_at,
            simulated: options.simulate,
            sources,
            retention_pruned,
        }))
    }

    /// Time since the last persisted run, if it is within `min_interval`.
    async fn throttled(
        &self,
        min_interval: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<Duration>, IngestError> {
        let Some(last) = self.db.meta().last_fetch().await? else {
            return Ok(None);
        };
        let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
        Ok((elapsed < min_interval).then_some(elapsed))
    }

    async fn run_sources(
        &self,
        selected: &[&SourceDescriptor],
        options: &IngestOptions,
        mut batch: Option<&mut JobBatch>,
        event_tx: Option<&mpsc::Sender<IngestEvent>>,
        now: DateTime<Utc>,
    ) -> Result<Vec<SourceReport>, IngestError> {
        let created_at = now.format(CREATED_AT_FORMAT).to_string();
        let mut reports = Vec::with_capacity(selected.len());

        for source in selected {
            let mut report = SourceReport::new(&source.id, source.label(), &source.source_key());

            match self.fetch(source).await {
                Ok(payload) => {
                    report.state = SourceState::Fetched;
                    let jobs = match payload {
                        Payload::Json(value) => map_json_payload(source, &value),
                        Payload::Feed(items) => map_feed_items(source, &items),
                    };
                    report.fetched = jobs.len();
                    report.state = SourceState::Mapped;

                    self.store_source(
                        jobs,
                        &mut report,
                        options,
                        batch.as_deref_mut(),
                        event_tx,
                        &created_at,
                        now,
                    )
                    .await?;

                    info!(
                        "[{}] +{} / -{} pruned ({} fetched, {} new)",
                        report.label,
                        report.accepted,
                        report.pruned,
                        report.fetched,
                        report.inserted
                    );
                }
                Err(e) => {
                    warn!("[{}] Source failed ({}): {}", report.label, source.endpoint(), e);
                    report.state = SourceState::Failed;
                    report.error = Some(e.to_string());
                }
            }

            if let Some(tx) = event_tx {
                let _ = tx.send(IngestEvent::SourceFinished(report.clone())).await;
            }
            reports.push(report);
        }

        Ok(reports)
    }

    async fn fetch(&self, source: &SourceDescriptor) -> Result<Payload, FetchError> {
        let url = source.endpoint();
        match source.kind {
            SourceKind::Feed { .. } => Ok(Payload::Feed(self.fetcher.get_feed(&url).await?)),
            _ => Ok(Payload::Json(self.fetcher.get_json(&url).await?)),
        }
    }

    /// Filter, insert and reconcile one source's mapped records.
    #[allow(clippy::too_many_arguments)]
    async fn store_source(
        &self,
        jobs: Vec<NormalizedJob>,
        report: &mut SourceReport,
        options: &IngestOptions,
        mut batch: Option<&mut JobBatch>,
        event_tx: Option<&mpsc::Sender<IngestEvent>>,
        created_at: &str,
        now: DateTime<Utc>,
    ) -> Result<(), IngestError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut accepted = Vec::new();

        for job in jobs {
            if options.max_per_source > 0 && accepted.len() >= options.max_per_source {
                break;
            }
            if !job.has_url() {
                debug!("[{}] Skipping record without URL: {}", report.label, job.title);
                continue;
            }
            seen.insert(job.url.clone());
            if is_within_horizon(job.posted_at.as_deref(), options.since_days, now) {
                accepted.push(job);
            }
        }
        report.accepted = accepted.len();
        report.state = SourceState::Filtered;

        for job in &accepted {
            match batch.as_deref_mut() {
                Some(batch) => {
                    if batch.insert(job, created_at).await? {
                        report.inserted += 1;
                    }
                }
                None => {
                    debug!(
                        "[dry-run] would insert: {} | {} @ {}",
                        job.source, job.title, job.company
                    );
                    if let Some(tx) = event_tx {
                        let _ = tx
                            .send(IngestEvent::WouldInsert {
                                source: job.source.clone(),
                                title: job.title.clone(),
                                company: job.company.clone(),
                            })
                            .await;
                    }
                }
            }
        }
        report.state = SourceState::Inserted;

        // An empty listing usually means the board misbehaved; keep what we have.
        if let Some(batch) = batch {
            if options.reconcile && report.accepted > 0 {
                report.pruned = batch.reconcile_source(&report.source_key, &seen).await?;
                report.state = SourceState::Reconciled;
            }
        }

        report.state = SourceState::Done;
        Ok(())
    }

    /// Record the run and apply the retention prune.
    async fn finish(
        batch: &mut JobBatch,
        options: &IngestOptions,
        now: DateTime<Utc>,
    ) -> Result<usize, crate::repository::DbError> {
        batch.set_last_fetch(now).await?;
        if options.retention_days > 0 {
            let pruned = batch.prune_older_than(options.retention_days, now).await?;
            info!("Retention prune removed {} postings", pruned);
            return Ok(pruned);
        }
        Ok(0)
    }

    async fn abort(batch: JobBatch) {
        if let Err(e) = batch.rollback().await {
            warn!("Rollback failed: {}", e);
        }
    }
}

/// Whether a posting is recent enough to keep.
///
/// A zero horizon disables the check, as does one reaching past the
/// representable date range; missing or unparseable dates pass.
pub fn is_within_horizon(posted_at: Option<&str>, since_days: u32, now: DateTime<Utc>) -> bool {
    if since_days == 0 {
        return true;
    }
    let Some(posted) = posted_at.and_then(parse_timestamp) else {
        return true;
    };
    match now.checked_sub_signed(chrono::Duration::days(i64::from(since_days))) {
        Some(cutoff) => posted >= cutoff,
        None => true,
    }
}
