//! Database statistics.

use console::style;

use crate::config::{Config, Settings};
use crate::sources::dates::to_iso;

use super::helpers::load_registry;

/// Show posting totals, per-source counts and the last fetch time.
pub async fn cmd_stats(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    if settings.database_url.is_none() && !settings.database_exists() {
        println!(
            "{} No database at {}. Run 'jobfeed init' first.",
            style("!").yellow(),
            settings.database_path().display()
        );
        return Ok(());
    }

    let ctx = settings.create_db_context();
    let jobs = ctx.jobs();
    let total = jobs.count().await?;
    let by_source = jobs.counts_by_source().await?;
    let last_fetch = ctx.meta().last_fetch().await?;

    println!("\n{}", style("Job Store").bold());
    println!("{}", "-".repeat(60));
    println!("{:<20} {}", "Database:", settings.database_url());
    println!("{:<20} {}", "Postings:", total);
    println!(
        "{:<20} {}",
        "Last fetch:",
        last_fetch
            .map(to_iso)
            .unwrap_or_else(|| "never".to_string())
    );

    if by_source.is_empty() {
        return Ok(());
    }

    let registry = load_registry(config)?;
    let known: std::collections::HashSet<String> =
        registry.all().iter().map(|s| s.source_key()).collect();

    println!("\n{:<40} {:>8}", "Source", "Postings");
    println!("{}", "-".repeat(60));
    for (source, count) in by_source {
        let marker = if known.contains(&source) {
            String::new()
        } else {
            format!(" {}", style("(not in registry)").dim())
        };
        println!("{:<40} {:>8}{}", source, count, marker);
    }

    Ok(())
}
