//! Shared helper functions for CLI commands.

use anyhow::Context;

use crate::config::Config;
use crate::models::SourceDescriptor;
use crate::sources::SourceRegistry;

/// Build the registry from the built-in sources plus config overrides.
pub fn load_registry(config: &Config) -> anyhow::Result<SourceRegistry> {
    SourceRegistry::from_config(config).context("invalid source registry")
}

/// Truncate a string to at most `max_chars` characters, adding "..." when cut.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// One registry line: `id [kind] label`.
pub fn source_line(source: &SourceDescriptor) -> String {
    format!(
        "{:<22} [{:<11}] {}",
        source.id,
        source.kind.as_str(),
        truncate(source.label(), 48)
    )
}
