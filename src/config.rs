//! Settings for jobfeed, layered from defaults, a config file, CLI flags and
//! the environment.
//!
//! Config files are found with the prefer crate (`jobfeed.{toml,yaml,json}`
//! in the usual places) unless one is named explicitly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::SourceDescriptor;
use crate::repository::DbContext;
use crate::sources::http_client::{resolve_user_agent, HttpConfig};

pub const DEFAULT_DATABASE_FILENAME: &str = "jobs.sqlite";

/// Minimum seconds between two persisted fetch runs.
pub const DEFAULT_MIN_INTERVAL_SECS: u64 = 600;

/// Postings older than this many days are skipped at ingest.
pub const DEFAULT_SINCE_DAYS: u32 = 365;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 25;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 12;

/// File names looked up inside a `--target` directory, in order.
const DATA_DIR_CONFIG_NAMES: &[&str] = &[
    "jobfeed.toml",
    "jobfeed.yaml",
    "jobfeed.yml",
    "jobfeed.json",
    "config.toml",
    "config.yaml",
    "config.yml",
    "config.json",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {format} in {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
}

/// Fetch-run tunables, resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub min_interval_secs: u64,
    /// Age horizon; 0 disables the filter.
    pub since_days: u32,
    /// Cap on accepted records per source; 0 means unlimited.
    pub max_per_source: usize,
    /// Global prune by insertion age; 0 disables it.
    pub retention_days: u32,
    /// Delete postings that vanished from their source's listing.
    pub reconcile: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            min_interval_secs: DEFAULT_MIN_INTERVAL_SECS,
            since_days: DEFAULT_SINCE_DAYS,
            max_per_source: 0,
            retention_days: 0,
            reconcile: true,
        }
    }
}

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub database_filename: String,
    /// Full `sqlite:` URL; wins over `data_dir` + `database_filename`.
    /// Usually from `DATABASE_URL`.
    pub database_url: Option<String>,
    pub user_agent: String,
    /// Whole-request timeout, seconds.
    pub request_timeout: u64,
    pub connect_timeout: u64,
    pub fetch: FetchSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            user_agent: resolve_user_agent(None),
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            fetch: FetchSettings::default(),
        }
    }
}

/// `~/.local/share/jobfeed` or the platform equivalent.
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jobfeed")
}

impl Settings {
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Self::default()
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!("sqlite:{}", self.database_path().display()),
        }
    }

    /// Whether the database file is already on disk.
    pub fn database_exists(&self) -> bool {
        let Some(url) = &self.database_url else {
            return self.database_path().exists();
        };
        let path = url.strip_prefix("sqlite:").unwrap_or(url);
        let path = path.strip_prefix("//").unwrap_or(path);
        Path::new(path).exists()
    }

    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("cannot create data directory {}: {}", self.data_dir.display(), e),
            )
        })
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.request_timeout),
            connect_timeout: Duration::from_secs(self.connect_timeout),
        }
    }

    pub fn create_db_context(&self) -> DbContext {
        DbContext::from_url(&self.database_url())
    }
}

/// `[fetch]` table of the config file. Unset keys keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub min_interval_secs: Option<u64>,
    pub since_days: Option<u32>,
    pub max_per_source: Option<usize>,
    pub retention_days: Option<u32>,
    pub reconcile: Option<bool>,
}

impl FetchConfig {
    fn overlay(&self, fetch: &mut FetchSettings) {
        set_if(&mut fetch.min_interval_secs, self.min_interval_secs);
        set_if(&mut fetch.since_days, self.since_days);
        set_if(&mut fetch.max_per_source, self.max_per_source);
        set_if(&mut fetch.retention_days, self.retention_days);
        set_if(&mut fetch.reconcile, self.reconcile);
    }
}

fn set_if<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// On-disk configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Relative paths resolve against the config file's directory.
    #[serde(alias = "target", skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,
    pub fetch: FetchConfig,
    /// Built-in source ids to leave out.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disabled: Vec<String>,
    /// Extra sources appended to the built-in registry.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceDescriptor>,
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Pick a format from the extension; anything unknown is read as JSON.
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::Toml,
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Yaml => "YAML",
            Self::Json => "JSON",
        }
    }

    fn parse(self, contents: &str) -> Result<Config, String> {
        match self {
            Self::Toml => toml::from_str(contents).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(contents).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(contents).map_err(|e| e.to_string()),
        }
    }
}

impl Config {
    /// Discover a `jobfeed` config file with prefer. Missing or broken
    /// files yield the defaults.
    pub async fn load() -> Self {
        let discovered = match prefer::load("jobfeed").await {
            Ok(found) => found,
            Err(_) => return Self::default(),
        };
        match discovered.source_path() {
            Some(path) => Self::read_or_default(path).await,
            None => Self::default(),
        }
    }

    /// Read and parse one config file.
    pub async fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let format = ConfigFormat::of(path);
        let mut config = format.parse(&contents).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            format: format.name(),
            message,
        })?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    async fn read_or_default(path: &Path) -> Self {
        Self::read(path).await.unwrap_or_else(|e| {
            tracing::warn!("Ignoring config file: {}", e);
            Self::default()
        })
    }

    /// Directory holding the config file, if it came from one.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
    }

    /// Expand a leading `~/` and anchor relative paths at `base_dir`.
    pub fn resolve_path(&self, raw: &str, base_dir: &Path) -> PathBuf {
        let expanded = raw
            .strip_prefix("~/")
            .and_then(|rest| dirs::home_dir().map(|home| home.join(rest)))
            .unwrap_or_else(|| PathBuf::from(raw));
        if expanded.is_absolute() {
            expanded
        } else {
            base_dir.join(expanded)
        }
    }

    /// Write every key present in the file over `settings`.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(dir) = &self.data_dir {
            settings.data_dir = self.resolve_path(dir, base_dir);
        }
        set_if(&mut settings.database_filename, self.database.clone());
        if self.user_agent.is_some() {
            settings.user_agent = resolve_user_agent(self.user_agent.as_deref());
        }
        set_if(&mut settings.request_timeout, self.request_timeout);
        set_if(&mut settings.connect_timeout, self.connect_timeout);
        self.fetch.overlay(&mut settings.fetch);
    }
}

/// Command-line inputs that steer where settings come from.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// `--config`: skips discovery.
    pub config_path: Option<PathBuf>,
    /// `--cwd`: resolve relative paths from the working directory.
    pub use_cwd: bool,
    /// `--target`: a data directory or a database file.
    pub target: Option<PathBuf>,
}

/// Where `--target` points the database.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub data_dir: PathBuf,
    pub database_filename: String,
}

impl ResolvedTarget {
    /// A path with a database extension (or an existing file) names the
    /// database itself; anything else is a data directory.
    pub fn from_path(path: &Path) -> Self {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            current_dir().join(path)
        };

        let names_file = path.is_file()
            || matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("db" | "sqlite" | "sqlite3")
            );
        if !names_file {
            return Self {
                data_dir: path,
                database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            };
        }

        Self {
            database_filename: path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(DEFAULT_DATABASE_FILENAME)
                .to_string(),
            data_dir: path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Pick the config file: `--config`, then one inside the target directory,
/// then prefer discovery.
async fn choose_config(options: &LoadOptions, target: Option<&ResolvedTarget>) -> Config {
    if let Some(path) = &options.config_path {
        return Config::read_or_default(path).await;
    }

    let beside_target = target.and_then(|t| {
        DATA_DIR_CONFIG_NAMES
            .iter()
            .map(|name| t.data_dir.join(name))
            .find(|p| p.exists())
    });
    if let Some(path) = beside_target {
        tracing::debug!("Using config next to the database: {}", path.display());
        return Config::read_or_default(&path).await;
    }

    Config::load().await
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// Resolve settings in order: defaults, config file, `--target`, then the
/// `DATABASE_URL` and `JOBFEED_USER_AGENT` environment variables.
///
/// The parsed config is returned too, for the source registry.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let target = options.target.as_deref().map(ResolvedTarget::from_path);
    let config = choose_config(&options, target.as_ref()).await;

    let base_dir = match config.base_dir() {
        Some(dir) if !options.use_cwd => dir,
        _ => current_dir(),
    };

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(target) = target {
        settings.data_dir = target.data_dir;
        settings.database_filename = target.database_filename;
    }

    if let Some(url) = env_var("DATABASE_URL") {
        tracing::debug!("DATABASE_URL overrides the database path: {}", url);
        settings.database_url = Some(url);
    }
    if let Some(agent) = env_var("JOBFEED_USER_AGENT") {
        settings.user_agent = agent;
    }

    (settings, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_toml_config_overlays_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jobfeed.toml");
        std::fs::write(
            &path,
            r#"
            data_dir = "data"
            user_agent = "TestAgent/1.0"
            disabled = ["gh-airtale"]

            [fetch]
            since_days = 30
            reconcile = false

            [[sources]]
            id = "acme"
            type = "lever"
            company = "acme"
            "#,
        )
        .unwrap();

        let config = Config::read(&path).await.unwrap();
        assert_eq!(config.disabled, ["gh-airtale"]);
        assert_eq!(config.sources.len(), 1);
        assert!(matches!(config.sources[0].kind, SourceKind::Lever { .. }));

        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, &config.base_dir().unwrap());
        assert_eq!(settings.data_dir, dir.path().join("data"));
        assert_eq!(settings.user_agent, "TestAgent/1.0");
        assert_eq!(settings.fetch.since_days, 30);
        assert!(!settings.fetch.reconcile);
        assert_eq!(settings.fetch.min_interval_secs, DEFAULT_MIN_INTERVAL_SECS);
    }

    #[tokio::test]
    async fn test_yaml_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "request_timeout: 5\nfetch:\n  retention_days: 90\n").unwrap();

        let config = Config::read(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, dir.path());
        assert_eq!(settings.request_timeout, 5);
        assert_eq!(settings.connect_timeout, DEFAULT_CONNECT_TIMEOUT_SECS);
        assert_eq!(settings.fetch.retention_days, 90);
    }

    #[tokio::test]
    async fn test_bad_config_reports_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jobfeed.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::read(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: "JSON", .. }));

        let missing = Config::read(&dir.path().join("absent.toml")).await.unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }

    #[tokio::test]
    async fn test_config_found_beside_target() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[fetch]\nsince_days = 7\n").unwrap();

        let options = LoadOptions {
            target: Some(dir.path().join("jobs.sqlite")),
            ..LoadOptions::default()
        };
        let target = ResolvedTarget::from_path(dir.path());
        let config = choose_config(&options, Some(&target)).await;
        assert_eq!(config.fetch.since_days, Some(7));
    }

    #[test]
    fn test_resolved_target() {
        let dir = tempdir().unwrap();

        let as_dir = ResolvedTarget::from_path(dir.path());
        assert_eq!(as_dir.data_dir, dir.path());
        assert_eq!(as_dir.database_filename, DEFAULT_DATABASE_FILENAME);

        let as_file = ResolvedTarget::from_path(&dir.path().join("other.db"));
        assert_eq!(as_file.data_dir, dir.path());
        assert_eq!(as_file.database_filename, "other.db");
    }

    #[test]
    fn test_database_url_from_path() {
        let settings = Settings::with_data_dir(PathBuf::from("/var/lib/jobfeed"));
        assert_eq!(settings.database_url(), "sqlite:/var/lib/jobfeed/jobs.sqlite");
        assert_eq!(settings.http_config().timeout, Duration::from_secs(25));
        assert!(!settings.database_exists());
    }
}
