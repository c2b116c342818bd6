//! Source registry listing.

use console::style;

use crate::config::Config;

use super::helpers::{load_registry, source_line};

/// Print every enabled source.
pub fn cmd_sources(config: &Config) -> anyhow::Result<()> {
    let registry = load_registry(config)?;

    println!("\n{}", style("Job Sources").bold());
    println!("{}", "-".repeat(72));
    for source in registry.all() {
        println!("{}", source_line(source));
    }
    println!("{}", "-".repeat(72));
    println!("{} sources", registry.len());

    if !config.disabled.is_empty() {
        println!(
            "{} Disabled in config: {}",
            style("!").yellow(),
            config.disabled.join(", ")
        );
    }

    Ok(())
}
