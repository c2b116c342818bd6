//! Source models for job boards.

use serde::{Deserialize, Serialize};

/// Source key stored for the Hacker News "Who is hiring?" search.
pub const HN_SOURCE_KEY: &str = "HN:WhoIsHiring";

/// JSON job board APIs with a dedicated mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonBoard {
    Jobicy,
    Remotive,
    RemoteOk,
    Arbeitnow,
    WorkingNomads,
}

impl JsonBoard {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jobicy => "jobicy",
            Self::Remotive => "remotive",
            Self::RemoteOk => "remote_ok",
            Self::Arbeitnow => "arbeitnow",
            Self::WorkingNomads => "working_nomads",
        }
    }
}

/// How a source is fetched and which mapper reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceKind {
    /// A JSON board API.
    Json { board: JsonBoard, url: String },
    /// An RSS or Atom feed.
    #[serde(alias = "rss")]
    Feed { url: String },
    /// A Greenhouse job board, by board token.
    Greenhouse { board: String },
    /// A Lever postings page, by company handle.
    Lever { company: String },
    /// Hacker News stories via the Algolia search API.
    HackerNews { query: String },
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json { .. } => "json",
            Self::Feed { .. } => "feed",
            Self::Greenhouse { .. } => "greenhouse",
            Self::Lever { .. } => "lever",
            Self::HackerNews { .. } => "hacker_news",
        }
    }
}

/// One entry of the source registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Short unique handle used by CLI filters.
    pub id: String,
    /// Human-readable name. For JSON and feed sources this is also the
    /// source key stored with each posting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: SourceKind,
}

impl SourceDescriptor {
    pub fn json(id: &str, name: &str, board: JsonBoard, url: &str) -> Self {
        Self {
            id: id.to_string(),
            name: Some(name.to_string()),
            kind: SourceKind::Json {
                board,
                url: url.to_string(),
            },
        }
    }

    pub fn feed(id: &str, name: &str, url: &str) -> Self {
        Self {
            id: id.to_string(),
            name: Some(name.to_string()),
            kind: SourceKind::Feed {
                url: url.to_string(),
            },
        }
    }

    pub fn greenhouse(id: &str, board: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            kind: SourceKind::Greenhouse {
                board: board.to_string(),
            },
        }
    }

    pub fn lever(id: &str, company: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            kind: SourceKind::Lever {
                company: company.to_string(),
            },
        }
    }

    pub fn hacker_news(id: &str, query: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            kind: SourceKind::HackerNews {
                query: query.to_string(),
            },
        }
    }

    /// URL to GET for this source.
    pub fn endpoint(&self) -> String {
        match &self.kind {
            SourceKind::Json { url, .. } | SourceKind::Feed { url } => url.clone(),
            SourceKind::Greenhouse { board } => {
                format!("https://boards.greenhouse.io/v1/boards/{}/jobs", board)
            }
            SourceKind::Lever { company } => {
                format!("https://api.lever.co/v0/postings/{}?mode=json", company)
            }
            SourceKind::HackerNews { query } => format!(
                "https://hn.algolia.com/api/v1/search?query={}&tags=story",
                urlencoding::encode(query)
            ),
        }
    }

    /// The `source` value stored with every posting from this descriptor.
    ///
    /// Reconciliation deletes by this key, so it must be stable across runs.
    pub fn source_key(&self) -> String {
        match &self.kind {
            SourceKind::Greenhouse { board } => format!("Greenhouse:{}", board),
            SourceKind::Lever { company } => format!("Lever:{}", company),
            SourceKind::HackerNews { .. } => self
                .name
                .clone()
                .unwrap_or_else(|| HN_SOURCE_KEY.to_string()),
            SourceKind::Json { .. } | SourceKind::Feed { .. } => {
                self.name.clone().unwrap_or_else(|| self.id.clone())
            }
        }
    }

    /// Display label for progress output.
    pub fn label(&self) -> &str {
        if let Some(name) = &self.name {
            return name;
        }
        match &self.kind {
            SourceKind::Greenhouse { board } => board,
            SourceKind::Lever { company } => company,
            SourceKind::HackerNews { query } => query,
            SourceKind::Json { .. } | SourceKind::Feed { .. } => &self.id,
        }
    }
}
