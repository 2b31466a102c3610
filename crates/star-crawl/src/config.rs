use crate::cli::Cli;
use anyhow::{anyhow, Result};
use crawler_core::{FetchOptions, PersistMode};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    util::nest,
    value::Value,
    Figment,
};
use github_backend::DEFAULT_GRAPHQL_URL;
use postgres_store::DatabaseSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const LOCAL_CONFIG_FILE_NAME: &str = "star-crawl.toml";

/// Environment variables and the config keys they populate
const ENV_KEYS: &[(&str, &str)] = &[
    ("CRAWL_MAX_REPOS", "crawl.max_repos"),
    ("CRAWL_REQUEST_DELAY", "crawl.request_delay"),
    ("CRAWL_FALLBACK_DELAY", "crawl.fallback_delay"),
    ("CRAWL_REQUEST_TIMEOUT", "crawl.request_timeout"),
    ("CRAWL_MAX_RETRIES", "crawl.max_retries"),
    ("CRAWL_PERSIST_MODE", "crawl.persist_mode"),
    ("CRAWL_RESUME", "crawl.resume"),
    ("DB_PORT", "database.port"),
];

/// Variables taken verbatim, so `0123` stays a string instead of a number
const STRING_ENV_KEYS: &[(&str, &str)] = &[
    ("GITHUB_TOKEN", "github.token"),
    ("GITHUB_GRAPHQL_URL", "github.endpoint"),
    ("DATABASE_URL", "database.url"),
    ("DB_HOST", "database.host"),
    ("DB_NAME", "database.name"),
    ("DB_USER", "database.user"),
    ("DB_PASS", "database.password"),
];

/// Process configuration, loaded once at startup
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub crawl: CrawlConfig,
    pub database: DatabaseSettings,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub token: Option<String>,
    pub endpoint: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            endpoint: DEFAULT_GRAPHQL_URL.to_string(),
        }
    }
}

/// Crawl loop settings; durations are in seconds
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub max_repos: usize,
    pub request_delay: u64,
    pub fallback_delay: u64,
    pub request_timeout: u64,
    pub max_retries: Option<u32>,
    pub persist_mode: PersistMode,
    pub resume: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        let fetch = FetchOptions::default();
        Self {
            max_repos: fetch.max_count,
            request_delay: fetch.request_delay.as_secs(),
            fallback_delay: fetch.fallback_delay.as_secs(),
            request_timeout: github_backend::DEFAULT_TIMEOUT.as_secs(),
            max_retries: fetch.max_retries,
            persist_mode: PersistMode::default(),
            resume: true,
        }
    }
}

impl Config {
    /// Layer defaults, TOML files and environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        let explicit_path = config_path.as_deref();
        if let Some(path) = explicit_path {
            if !path.exists() {
                return Err(anyhow!("Config file not found: {}", path.display()));
            }
        }

        for path in config_paths(explicit_path) {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(
            Env::raw().filter_map(|key| config_key(ENV_KEYS, key.as_str()).map(Into::into)),
        );

        let strings = Env::raw()
            .filter_map(|key| config_key(STRING_ENV_KEYS, key.as_str()).map(Into::into));
        for (key, value) in strings.iter() {
            figment = figment.merge(Serialized::defaults(nest(key.as_str(), Value::from(value))));
        }

        figment
            .extract()
            .map_err(|e| anyhow!("Failed to load config: {}", e))
    }

    /// Apply command-line overrides on top of the loaded configuration
    pub fn merge_with_cli(&mut self, cli: &Cli) {
        if let Some(max_repos) = cli.max_repos {
            self.crawl.max_repos = max_repos;
        }
        if let Some(delay) = cli.request_delay {
            self.crawl.request_delay = delay;
        }
        if let Some(max_retries) = cli.max_retries {
            self.crawl.max_retries = Some(max_retries);
        }
        if let Some(mode) = cli.mode {
            self.crawl.persist_mode = mode.into();
        }
        if cli.no_resume {
            self.crawl.resume = false;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.github.token.as_deref().is_none_or(|t| t.trim().is_empty()) {
            return Err(anyhow!(
                "GitHub token not configured. Set via GITHUB_TOKEN env var or config file"
            ));
        }
        if self.crawl.request_timeout == 0 {
            return Err(anyhow!("crawl.request_timeout must be at least 1 second"));
        }
        if self.crawl.max_retries == Some(0) {
            return Err(anyhow!(
                "crawl.max_retries must be at least 1; leave it unset to retry forever"
            ));
        }
        Ok(())
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            max_count: self.crawl.max_repos,
            request_delay: Duration::from_secs(self.crawl.request_delay),
            fallback_delay: Duration::from_secs(self.crawl.fallback_delay),
            max_retries: self.crawl.max_retries,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.crawl.request_timeout)
    }
}

fn config_key(keys: &[(&str, &'static str)], var: &str) -> Option<&'static str> {
    keys.iter()
        .find(|(name, _)| var.eq_ignore_ascii_case(name))
        .map(|(_, path)| *path)
}

fn config_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(path) = explicit {
        paths.push(path.to_path_buf());
        return paths;
    }

    if let Some(path) = get_project_config_path() {
        push_unique(&mut paths, path);
    }
    if let Some(path) = get_local_config_path() {
        push_unique(&mut paths, path);
    }

    paths
}

fn push_unique(paths: &mut Vec<PathBuf>, path: PathBuf) {
    if !paths.contains(&path) {
        paths.push(path);
    }
}

fn get_project_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "star-crawl").map(|d| d.config_dir().join("config.toml"))
}

fn get_local_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|dir| dir.join(LOCAL_CONFIG_FILE_NAME))
}
