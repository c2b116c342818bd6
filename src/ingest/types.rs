//! Options, per-source reports and events for fetch runs.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::FetchSettings;
use crate::repository::DbError;

/// Errors that abort a whole fetch run.
///
/// Source fetch failures are not among them; they are reported per source.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Database error: {0}")]
    Store(#[from] DbError),
}

/// Knobs for one fetch run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Source ids to include; empty means all.
    pub only: Vec<String>,
    /// Source ids to leave out.
    pub skip: Vec<String>,
    pub no_throttle: bool,
    /// Stop a source after this many accepted records; 0 means unlimited.
    pub max_per_source: usize,
    /// Skip postings older than this many days; 0 disables the filter.
    pub since_days: u32,
    /// Dry run: fetch and map, but write nothing.
    pub simulate: bool,
    /// Delete postings that disappeared from their source's listing.
    pub reconcile: bool,
    /// Delete postings stored more than this many days ago; 0 disables.
    pub retention_days: u32,
    /// Minimum time between persisted runs.
    pub min_interval: Duration,
}

impl IngestOptions {
    pub fn from_settings(settings: &FetchSettings) -> Self {
        Self {
            only: Vec::new(),
            skip: Vec::new(),
            no_throttle: false,
            max_per_source: settings.max_per_source,
            since_days: settings.since_days,
            simulate: false,
            reconcile: settings.reconcile,
            retention_days: settings.retention_days,
            min_interval: Duration::from_secs(settings.min_interval_secs),
        }
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::from_settings(&FetchSettings::default())
    }
}

/// Progress of one source through a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceState {
    Pending,
    Fetched,
    Mapped,
    Filtered,
    Inserted,
    Reconciled,
    Done,
    Failed,
}

impl SourceState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// What happened to one source during a run.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub id: String,
    pub label: String,
    pub source_key: String,
    pub state: SourceState,
    /// Records mapped from the payload.
    pub fetched: usize,
    /// Records that had a URL and passed the age filter.
    pub accepted: usize,
    /// Rows actually added (duplicates are ignored).
    pub inserted: usize,
    /// Rows deleted by reconciliation.
    pub pruned: usize,
    pub error: Option<String>,
}

impl SourceReport {
    pub fn new(id: &str, label: &str, source_key: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            source_key: source_key.to_string(),
            state: SourceState::Pending,
            fetched: 0,
            accepted: 0,
            inserted: 0,
            pruned: 0,
            error: None,
        }
    }

    pub fn failed(&self) -> bool {
        self.state == SourceState::Failed
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub simulated: bool,
    pub sources: Vec<SourceReport>,
    /// Rows deleted by the retention prune.
    pub retention_pruned: usize,
}

impl BatchReport {
    pub fn accepted(&self) -> usize {
        self.sources.iter().map(|s| s.accepted).sum()
    }

    pub fn inserted(&self) -> usize {
        self.sources.iter().map(|s| s.inserted).sum()
    }

    pub fn pruned(&self) -> usize {
        self.sources.iter().map(|s| s.pruned).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| s.failed())
    }
}

/// Result of [`super::Ingestor::run`].
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    /// The previous persisted run finished less than `min_interval` ago.
    Throttled { elapsed: Duration },
    Completed(BatchReport),
}

/// Events emitted while a run progresses.
#[derive(Debug, Clone)]
pub enum IngestEvent {
    /// A record a dry run would have inserted.
    WouldInsert {
        source: String,
        title: String,
        company: String,
    },
    /// A source reached a terminal state.
    SourceFinished(SourceReport),
}
