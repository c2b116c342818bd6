//! The list of job sources a fetch run can pull from.

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::models::{JsonBoard, SourceDescriptor};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Duplicate source id: {0}")]
    DuplicateId(String),

    #[error("Source {id} has an invalid endpoint: {reason}")]
    InvalidEndpoint { id: String, reason: String },
}

/// We Work Remotely category feeds, as (id, name, category slug).
const WWR_CATEGORIES: &[(&str, &str, &str)] = &[
    ("wwr-prog", "WWR: Programming", "remote-programming-jobs"),
    ("wwr-fs", "WWR: Full-Stack", "remote-full-stack-programming-jobs"),
    ("wwr-be", "WWR: Back-End", "remote-back-end-programming-jobs"),
    ("wwr-fe", "WWR: Front-End", "remote-front-end-programming-jobs"),
    ("wwr-devops", "WWR: DevOps & SysAdmin", "remote-devops-sysadmin-jobs"),
    ("wwr-design", "WWR: Design", "remote-design-jobs"),
    ("wwr-product", "WWR: Product", "remote-product-jobs"),
    ("wwr-sales", "WWR: Sales & Marketing", "remote-sales-and-marketing-jobs"),
    ("wwr-mgmt", "WWR: Management & Finance", "remote-management-and-finance-jobs"),
    ("wwr-other", "WWR: All Other", "all-other-remote-jobs"),
];

const FEEDS: &[(&str, &str, &str)] = &[
    ("remotive-rss", "Remotive (RSS)", "https://remotive.com/remote-jobs/rss-feed"),
    ("remoteok-rss", "Remote OK (RSS)", "https://remoteok.com/remote-jobs.rss"),
    ("jobspresso", "Jobspresso", "https://jobspresso.co/remote-work-rss-feed/"),
    ("nodesk", "Nodesk", "https://nodesk.co/remote-jobs/feed/"),
    ("remoteco", "Remote.co", "https://remote.co/remote-jobs/feed/"),
    ("eu-remote", "EU Remote Jobs", "https://euremotejobs.com/feed/?post_type=job_listing"),
    ("remotees", "Remotees", "https://remotees.com/remote-jobs.rss"),
    ("justremote", "JustRemote", "https://justremote.co/remote-jobs.rss"),
    ("hn-jobs", "HN Jobs (RSS)", "https://hnrss.org/jobs"),
    ("golangproj", "Golang Projects", "https://www.golangprojects.com/rss.xml"),
    ("python-org", "Python.org Jobs", "https://www.python.org/jobs/feed/rss/"),
    ("androidjobs", "Android Jobs", "https://androidjobs.io/rss"),
    ("reactjobs", "React Jobs Board", "https://reactjobsboard.com/feed"),
    ("vuejobs", "VueJobs", "https://vuejobs.com/feed"),
];

/// Greenhouse boards, as (id, board token).
const GREENHOUSE_BOARDS: &[(&str, &str)] = &[
    ("gh-gitlab", "gitlab"),
    ("gh-canonical", "canonical"),
    ("gh-stripe", "stripe"),
    ("gh-hashicorp", "hashicorp"),
    ("gh-datadog", "datadog"),
    ("gh-zapier", "zapier"),
    ("gh-sourcegraph", "sourcegraph"),
    ("gh-cloudflare", "cloudflare"),
    ("gh-github", "github"),
    ("gh-coinbase", "coinbase"),
    ("gh-figma", "figma"),
    ("gh-elastic", "elastic"),
    ("gh-vercel", "vercel"),
    ("gh-notion", "notion"),
    ("gh-dropbox", "dropbox"),
    ("gh-atlassian", "atlassian"),
    ("gh-airbnb", "airbnb"),
    ("gh-digitalocean", "digitalocean"),
    ("gh-snyk", "snyk"),
    ("gh-miro", "miro"),
    ("gh-confluent", "confluent"),
    ("gh-airtale", "airtable"),
    ("gh-airtable", "airtable"),
];

/// Lever postings pages, as (id, company handle).
const LEVER_COMPANIES: &[(&str, &str)] = &[
    ("lv-netlify", "netlify"),
    ("lv-doist", "doist"),
    ("lv-leverdemo", "leverdemo"),
    ("lv-linear", "linear"),
    ("lv-loom", "loom"),
    ("lv-plaidsandbox", "plaid"),
];

/// Every source shipped with jobfeed, in fetch order.
pub fn builtin_sources() -> Vec<SourceDescriptor> {
    let mut sources = vec![
        SourceDescriptor::json(
            "jobicy",
            "Jobicy",
            JsonBoard::Jobicy,
            "https://jobicy.com/api/v2/remote-jobs",
        ),
        SourceDescriptor::json(
            "remotive",
            "Remotive",
            JsonBoard::Remotive,
            "https://remotive.com/api/remote-jobs",
        ),
        SourceDescriptor::json(
            "remoteok",
            "Remote OK",
            JsonBoard::RemoteOk,
            "https://remoteok.com/api",
        ),
        SourceDescriptor::json(
            "arbeitnow",
            "Arbeitnow",
            JsonBoard::Arbeitnow,
            "https://www.arbeitnow.com/api/job-board-api",
        ),
        SourceDescriptor::json(
            "wnomads",
            "Working Nomads",
            JsonBoard::WorkingNomads,
            "https://www.workingnomads.com/api/jobs",
        ),
        SourceDescriptor::feed(
            "wwr-all",
            "We Work Remotely (All)",
            "https://weworkremotely.com/remote-jobs.rss",
        ),
    ];

    sources.extend(WWR_CATEGORIES.iter().map(|(id, name, slug)| {
        SourceDescriptor::feed(
            id,
            name,
            &format!("https://weworkremotely.com/categories/{}.rss", slug),
        )
    }));
    sources.extend(
        FEEDS
            .iter()
            .map(|(id, name, url)| SourceDescriptor::feed(id, name, url)),
    );
    sources.extend(
        GREENHOUSE_BOARDS
            .iter()
            .map(|(id, board)| SourceDescriptor::greenhouse(id, board)),
    );
    sources.extend(
        LEVER_COMPANIES
            .iter()
            .map(|(id, company)| SourceDescriptor::lever(id, company)),
    );
    sources.push(SourceDescriptor::hacker_news(
        "hn-whoishiring",
        "Who is hiring?",
    ));
    sources
}

/// Ordered, validated set of sources.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    /// Validate a list of descriptors: unique ids (case-insensitive) and
    /// endpoints that parse as absolute URLs.
    pub fn new(sources: Vec<SourceDescriptor>) -> Result<Self, RegistryError> {
        let mut ids = HashSet::new();
        for source in &sources {
            if !ids.insert(source.id.to_lowercase()) {
                return Err(RegistryError::DuplicateId(source.id.clone()));
            }
            Url::parse(&source.endpoint()).map_err(|e| RegistryError::InvalidEndpoint {
                id: source.id.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(Self { sources })
    }

    /// Built-ins minus `disabled`, followed by the configured extras.
    pub fn from_config(config: &Config) -> Result<Self, RegistryError> {
        let disabled: HashSet<String> =
            config.disabled.iter().map(|id| id.to_lowercase()).collect();

        let mut sources: Vec<SourceDescriptor> = builtin_sources()
            .into_iter()
            .filter(|s| !disabled.contains(&s.id.to_lowercase()))
            .collect();
        sources.extend(config.sources.iter().cloned());

        Self::new(sources)
    }

    pub fn all(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SourceDescriptor> {
        self.sources.iter().find(|s| s.id.eq_ignore_ascii_case(id))
    }

    /// Sources to fetch: those in `only` (all when empty) and not in `skip`,
    /// compared case-insensitively. Registry order is kept.
    pub fn select(&self, only: &[String], skip: &[String]) -> Vec<&SourceDescriptor> {
        let only: HashSet<String> = only.iter().map(|id| id.trim().to_lowercase()).collect();
        let skip: HashSet<String> = skip.iter().map(|id| id.trim().to_lowercase()).collect();

        self.sources
            .iter()
            .filter(|s| {
                let id = s.id.to_lowercase();
                (only.is_empty() || only.contains(&id)) && !skip.contains(&id)
            })
            .collect()
    }
}
