use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crawldeck_client::{BulkStrategy, ClientSettings, PollSettings, DEFAULT_BASE_URL};
use deck_logging::{deck_info, deck_warn, LogDestination};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

const CONFIG_FILENAME: &str = "crawldeck.ron";
const CONFIG_ENV: &str = "CRAWLDECK_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub jobs_poll_secs: u64,
    pub stats_poll_secs: u64,
    pub request_timeout_secs: u64,
    pub page_limit: u32,
    pub bulk: BulkStrategy,
    pub log_level: String,
    pub log_to_terminal: bool,
    pub log_to_file: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        let poll = PollSettings::default();
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            username: None,
            password: None,
            jobs_poll_secs: poll.jobs_interval.as_secs(),
            stats_poll_secs: poll.stats_interval.as_secs(),
            request_timeout_secs: client.request_timeout.as_secs(),
            page_limit: client.page_limit,
            bulk: BulkStrategy::default(),
            log_level: "info".to_string(),
            log_to_terminal: false,
            log_to_file: true,
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Applies `CRAWLDECK_*` overrides on top of the file contents.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = non_empty("CRAWLDECK_API_URL") {
            self.api_url = url;
        }
        if let Some(token) = non_empty("CRAWLDECK_TOKEN") {
            self.token = Some(token);
        }
        if let (Some(username), Some(password)) =
            (non_empty("CRAWLDECK_USERNAME"), non_empty("CRAWLDECK_PASSWORD"))
        {
            self.username = Some(username);
            self.password = Some(password);
        }
        self
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            page_limit: self.page_limit.max(1),
            ..ClientSettings::default()
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            jobs_interval: Duration::from_secs(self.jobs_poll_secs.max(1)),
            stats_interval: Duration::from_secs(self.stats_poll_secs.max(1)),
        }
    }

    /// With both outputs switched off the log file is kept.
    pub fn log_destination(&self) -> LogDestination {
        match (self.log_to_terminal, self.log_to_file) {
            (true, true) => LogDestination::Both,
            (true, false) => LogDestination::Terminal,
            (false, _) => LogDestination::File,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }
}

/// What happened while loading; reported once the logger is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LoadReport {
    Loaded,
    Missing,
    Unreadable(String),
    Malformed(String),
}

impl LoadReport {
    pub fn log(&self, path: &Path) {
        match self {
            LoadReport::Loaded => deck_info!("Loaded configuration from {:?}", path),
            LoadReport::Missing => deck_info!("No configuration at {:?}; using defaults", path),
            LoadReport::Unreadable(err) => {
                deck_warn!("Failed to read configuration from {:?}: {}", path, err)
            }
            LoadReport::Malformed(err) => {
                deck_warn!("Failed to parse configuration from {:?}: {}", path, err)
            }
        }
    }
}

pub(crate) fn config_path(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup(CONFIG_ENV)
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME))
}

/// Reads the RON configuration. Any problem falls back to defaults.
pub(crate) fn load(path: &Path) -> (AppConfig, LoadReport) {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return (AppConfig::default(), LoadReport::Missing);
        }
        Err(err) => return (AppConfig::default(), LoadReport::Unreadable(err.to_string())),
    };

    match ron::from_str::<AppConfig>(&content) {
        Ok(config) => (config, LoadReport::Loaded),
        Err(err) => (AppConfig::default(), LoadReport::Malformed(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, report) = load(&dir.path().join(CONFIG_FILENAME));

        assert_eq!(config, AppConfig::default());
        assert_eq!(report, LoadReport::Missing);
        assert_eq!(config.poll_settings(), PollSettings::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r#"(api_url: "https://crawl.example.com/api", jobs_poll_secs: 2, bulk: Batched)"#,
        )
        .unwrap();

        let (config, report) = load(&path);

        assert_eq!(report, LoadReport::Loaded);
        assert_eq!(config.api_url, "https://crawl.example.com/api");
        assert_eq!(config.bulk, BulkStrategy::Batched);
        assert_eq!(config.poll_settings().jobs_interval, Duration::from_secs(2));
        assert_eq!(config.stats_poll_secs, 10);
        assert_eq!(config.client_settings().page_limit, 100);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "(api_url: ").unwrap();

        let (config, report) = load(&path);

        assert_eq!(config, AppConfig::default());
        assert!(matches!(report, LoadReport::Malformed(_)));
    }

    #[test]
    fn environment_overrides_file_values() {
        let config = AppConfig {
            token: Some("from-file".to_string()),
            ..AppConfig::default()
        }
        .with_env(env(&[
            ("CRAWLDECK_API_URL", "http://10.0.0.5:8080/api"),
            ("CRAWLDECK_TOKEN", "from-env"),
            ("CRAWLDECK_USERNAME", "admin"),
        ]));

        assert_eq!(config.api_url, "http://10.0.0.5:8080/api");
        assert_eq!(config.token.as_deref(), Some("from-env"));
        // A username without a password is ignored.
        assert_eq!(config.username, None);
    }

    #[test]
    fn config_path_prefers_the_environment() {
        assert_eq!(config_path(env(&[])), PathBuf::from(CONFIG_FILENAME));
        assert_eq!(
            config_path(env(&[(CONFIG_ENV, "/etc/crawldeck.ron")])),
            PathBuf::from("/etc/crawldeck.ron")
        );
    }

    #[test]
    fn unknown_log_level_means_info() {
        let config = AppConfig {
            log_level: "chatty".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.log_level(), LevelFilter::Info);
        assert_eq!(config.log_destination(), LogDestination::File);
    }

    #[test]
    fn log_outputs_select_the_destination() {
        let destination = |log_to_terminal, log_to_file| {
            AppConfig {
                log_to_terminal,
                log_to_file,
                ..AppConfig::default()
            }
            .log_destination()
        };
        assert_eq!(destination(true, true), LogDestination::Both);
        assert_eq!(destination(true, false), LogDestination::Terminal);
        assert_eq!(destination(false, false), LogDestination::File);
    }
}
