//! Job posting models.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const DEFAULT_TITLE: &str = "Untitled";
const DEFAULT_COMPANY: &str = "Unknown";
const DEFAULT_CATEGORY: &str = "Unknown";
const DEFAULT_LOCATION: &str = "Remote";

/// Partially populated job record as read from an upstream payload.
///
/// Mappers fill in whatever the source provides, then call
/// [`RawJob::normalize`] to apply the defaults shared by every source.
#[derive(Debug, Clone, Default)]
pub struct RawJob {
    pub title: Option<String>,
    pub company: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub posted_at: Option<String>,
}

impl RawJob {
    /// Apply defaults and attach the source key.
    ///
    /// Blank strings count as missing.
    pub fn normalize(self, source: &str) -> NormalizedJob {
        NormalizedJob {
            title: non_blank(self.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            company: non_blank(self.company).unwrap_or_else(|| DEFAULT_COMPANY.to_string()),
            url: non_blank(self.url).unwrap_or_default(),
            source: source.to_string(),
            category: non_blank(self.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            location: non_blank(self.location).unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            salary: non_blank(self.salary),
            posted_at: non_blank(self.posted_at),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// A job record in the common shape shared by all sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedJob {
    pub title: String,
    pub company: String,
    /// Dedupe key. Empty when the upstream record had no link.
    pub url: String,
    /// Source key (e.g. `Greenhouse:gitlab`), used for reconciliation.
    pub source: String,
    pub category: String,
    pub location: String,
    pub salary: Option<String>,
    /// Canonical ISO-8601 timestamp, if the upstream date could be parsed.
    pub posted_at: Option<String>,
}

impl NormalizedJob {
    /// Whether this record can be stored (it has a URL to dedupe on).
    pub fn has_url(&self) -> bool {
        !self.url.is_empty()
    }

    /// Informational content hash over the lowercased title and company.
    pub fn content_hash(&self) -> String {
        compute_hash(&self.title, &self.company)
    }
}

/// SHA-256 over `lower(title)|lower(company)`, hex encoded.
pub fn compute_hash(title: &str, company: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.to_lowercase().as_bytes());
    hasher.update(b"|");
    hasher.update(company.to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

/// A stored job posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobPosting {
    #[serde(skip)]
    pub id: i32,
    pub title: String,
    pub company: String,
    pub url: String,
    pub source: String,
    pub category: String,
    pub location: String,
    pub salary: Option<String>,
    pub posted_at: Option<String>,
    #[serde(skip)]
    pub created_at: String,
    #[serde(skip)]
    pub hash: String,
}
