//! Fetch command: run one ingestion batch.

use std::sync::Arc;

use console::style;
use tokio::sync::mpsc;

use crate::config::{Config, Settings};
use crate::ingest::{BatchOutcome, IngestEvent, IngestOptions, Ingestor, SourceReport};
use crate::sources::dates::to_iso;
use crate::sources::HttpClient;

use super::helpers::{load_registry, source_line, truncate};
use super::FetchArgs;

/// Fetch every selected source into the database.
pub async fn cmd_fetch(
    settings: &Settings,
    config: &Config,
    args: FetchArgs,
) -> anyhow::Result<()> {
    let registry = load_registry(config)?;
    let options = build_options(settings, args.overrides());

    if args.print_sources {
        println!("Sources:");
        for source in registry.all() {
            println!("  {}", source_line(source));
        }
        if !options.only.is_empty() {
            println!("ONLY: {}", options.only.join(", "));
        }
        if !options.skip.is_empty() {
            println!("SKIP: {}", options.skip.join(", "));
        }
        if !options.simulate {
            return Ok(());
        }
        println!("(dry-run active)");
    }

    settings.ensure_directories()?;
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let client = HttpClient::new(&settings.http_config())?;
    let ingestor = Ingestor::new(Arc::new(client), ctx, Arc::new(registry));

    let show_pruned = options.reconcile && !options.simulate;
    let (event_tx, mut event_rx) = mpsc::channel::<IngestEvent>(100);
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                IngestEvent::WouldInsert {
                    source,
                    title,
                    company,
                } => {
                    println!(
                        "  {} [{}] {} @ {}",
                        style("[dry-run] would insert").dim(),
                        source,
                        truncate(&title, 60),
                        company
                    );
                }
                IngestEvent::SourceFinished(report) => {
                    println!("{}", source_summary(&report, show_pruned))
                }
            }
        }
    });

    let outcome = ingestor.run(&options, Some(event_tx)).await;
    // The sender is dropped with the run, so the printer drains and exits.
    let _ = printer.await;

    match outcome? {
        BatchOutcome::Throttled { elapsed } => {
            println!(
                "{} Skipped: throttled ({}s since last)",
                style("!").yellow(),
                elapsed.as_secs()
            );
        }
        BatchOutcome::Completed(report) => {
            let failures = report.failures().count();
            if report.retention_pruned > 0 {
                println!(
                    "  {} Retention removed {} postings",
                    style("→").cyan(),
                    report.retention_pruned
                );
            }
            if report.simulated {
                println!(
                    "{} Dry run: {} postings would be inserted @ {}",
                    style("✓").green(),
                    report.accepted(),
                    to_iso(report.started_at)
                );
            } else {
                println!(
                    "{} Inserted up to {} jobs @ {}",
                    style("✓").green(),
                    report.accepted(),
                    to_iso(report.started_at)
                );
            }
            if failures > 0 {
                println!(
                    "{} {} of {} sources failed",
                    style("!").yellow(),
                    failures,
                    report.sources.len()
                );
            }
        }
    }

    Ok(())
}

/// Overrides taken from the command line.
#[derive(Debug, Default)]
struct FetchOverrides {
    only: Vec<String>,
    skip: Vec<String>,
    no_throttle: bool,
    max_per_source: Option<usize>,
    since_days: Option<u32>,
    dry_run: bool,
    prune: Option<bool>,
    retention_days: Option<u32>,
}

impl FetchArgs {
    fn overrides(&self) -> FetchOverrides {
        let prune = if self.no_prune {
            Some(false)
        } else if self.prune {
            Some(true)
        } else {
            None
        };
        FetchOverrides {
            only: self.only.clone(),
            skip: self.skip.clone(),
            no_throttle: self.no_throttle,
            max_per_source: self.max_per_source,
            since_days: self.since_days,
            dry_run: self.dry_run,
            prune,
            retention_days: self.retention_days,
        }
    }
}

/// Layer command-line overrides on top of the configured fetch settings.
fn build_options(settings: &Settings, overrides: FetchOverrides) -> IngestOptions {
    let mut options = IngestOptions::from_settings(&settings.fetch);
    options.only = clean_ids(overrides.only);
    options.skip = clean_ids(overrides.skip);
    options.no_throttle = overrides.no_throttle;
    options.simulate = overrides.dry_run;
    if let Some(max) = overrides.max_per_source {
        options.max_per_source = max;
    }
    if let Some(days) = overrides.since_days {
        options.since_days = days;
    }
    if let Some(prune) = overrides.prune {
        options.reconcile = prune;
    }
    if let Some(days) = overrides.retention_days {
        options.retention_days = days;
    }
    options
}

fn clean_ids(ids: Vec<String>) -> Vec<String> {
    ids.into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

/// One line per finished source. The prune count only means something when
/// the run reconciles and persists.
fn source_summary(report: &SourceReport, show_pruned: bool) -> String {
    if let Some(error) = &report.error {
        return format!(
            "{} {}",
            style(format!("[{}] FAILED:", report.label)).red(),
            error
        );
    }
    if show_pruned {
        format!("[{}] +{} / -{} pruned", report.label, report.accepted, report.pruned)
    } else {
        format!("[{}] +{}", report.label, report.accepted)
    }
}
