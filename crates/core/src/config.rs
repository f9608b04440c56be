//! Run configuration
//!
//! Built once at startup: defaults, then an optional TOML file, then
//! environment overrides for secrets and deployment-specific values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Which removal strategy a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Official playlist API scan + delete
    #[default]
    Api,
    /// Browser-driven removal through the save dialog
    Ui,
}

impl std::str::FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "ui" | "browser" => Ok(Self::Ui),
            other => Err(Error::Config(format!("unknown strategy '{}'", other))),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub strategy: StrategyKind,
    pub notion: NotionConfig,
    pub playlist: PlaylistConfig,
    pub ui: UiConfig,
    pub retry: RetryConfig,
}

/// Document database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionConfig {
    pub api_base: String,
    pub api_version: String,
    pub api_token: String,
    pub database_id: String,
    /// Checkbox marking a record as "to delete"
    pub pending_property: String,
    /// Checkbox set once the removal is confirmed
    pub deleted_property: String,
    pub title_property: String,
    pub link_property: String,
    pub page_size: u32,
    pub request_timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.notion.com/v1".to_string(),
            api_version: "2022-06-28".to_string(),
            api_token: String::new(),
            database_id: String::new(),
            pending_property: "delete".to_string(),
            deleted_property: "deleted".to_string(),
            title_property: "Name".to_string(),
            link_property: "Link".to_string(),
            page_size: 100,
            request_timeout_secs: 30,
        }
    }
}

/// Playlist API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    pub api_base: String,
    /// Reserved id of the Watch Later playlist
    pub playlist_id: String,
    /// Persisted OAuth authorized-user token
    pub token_path: PathBuf,
    pub page_size: u32,
    pub request_timeout_secs: u64,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            playlist_id: "WL".to_string(),
            token_path: PathBuf::from("token.json"),
            page_size: 50,
            request_timeout_secs: 30,
        }
    }
}

/// How a UI element is located
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    Css(String),
    Xpath(String),
    Tag(String),
}

impl Locator {
    pub fn css(value: impl Into<String>) -> Self {
        Self::Css(value.into())
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::Xpath(value.into())
    }

    pub fn tag(value: impl Into<String>) -> Self {
        Self::Tag(value.into())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(v) => write!(f, "css={}", v),
            Self::Xpath(v) => write!(f, "xpath={}", v),
            Self::Tag(v) => write!(f, "tag={}", v),
        }
    }
}

/// Locators for the elements the save flow touches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSelectors {
    pub page_container: Locator,
    pub metadata: Locator,
    pub unavailable: Locator,
    pub overflow_menu: Locator,
    pub save_entry: Locator,
    pub watch_later_checkbox: Locator,
    pub checked_attribute: String,
}

impl Default for UiSelectors {
    fn default() -> Self {
        Self {
            page_container: Locator::tag("ytd-watch-flexy"),
            metadata: Locator::tag("ytd-watch-metadata"),
            unavailable: Locator::css("yt-playability-error-supported-renderers #reason"),
            overflow_menu: Locator::css("#button-shape button"),
            save_entry: Locator::css(
                "ytd-menu-service-item-renderer:nth-child(2) tp-yt-paper-item",
            ),
            watch_later_checkbox: Locator::css(
                "ytd-add-to-playlist-renderer ytd-playlist-add-to-option-renderer:first-of-type tp-yt-paper-checkbox",
            ),
            checked_attribute: "aria-checked".to_string(),
        }
    }
}

/// Browser automation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub webdriver_url: String,
    pub site_url: String,
    pub watch_url_base: String,
    pub element_timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// Pause after the page container appears
    pub load_settle_ms: u64,
    /// Pause after each interactive click
    pub click_settle_ms: u64,
    pub headless: bool,
    pub user_data_dir: Option<PathBuf>,
    pub profile_directory: Option<String>,
    pub window_size: (u32, u32),
    /// Wait for an interactive login before the first task
    pub manual_login: bool,
    pub selectors: UiSelectors,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            site_url: "https://www.youtube.com".to_string(),
            watch_url_base: "https://www.youtube.com/watch".to_string(),
            element_timeout_ms: 10_000,
            poll_interval_ms: 250,
            load_settle_ms: 5_000,
            click_settle_ms: 2_000,
            headless: false,
            user_data_dir: Some(PathBuf::from("./chrome_profile")),
            profile_directory: Some("Profile 1".to_string()),
            window_size: (1920, 1080),
            manual_login: false,
            selectors: UiSelectors::default(),
        }
    }
}

impl UiConfig {
    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn load_settle(&self) -> Duration {
        Duration::from_millis(self.load_settle_ms)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    /// Watch page URL for a content id
    pub fn watch_url(&self, content_id: &str) -> String {
        format!("{}?v={}", self.watch_url_base, content_id)
    }
}

/// Outer retry applied around each removal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 10_000,
        }
    }
}

impl ReconcileConfig {
    /// Load configuration from an optional TOML file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("NOTION_API_TOKEN") {
            self.notion.api_token = token;
        }
        if let Some(id) = lookup("NOTION_DATABASE_ID") {
            self.notion.database_id = id;
        }
        if let Some(path) = lookup("YOUTUBE_TOKEN_FILE") {
            self.playlist.token_path = PathBuf::from(path);
        }
        if let Some(url) = lookup("WL_WEBDRIVER_URL") {
            self.ui.webdriver_url = url;
        }
        if let Some(strategy) = lookup("WL_STRATEGY") {
            match strategy.parse() {
                Ok(kind) => self.strategy = kind,
                Err(e) => tracing::warn!("Ignoring WL_STRATEGY: {}", e),
            }
        }
    }

    /// Reject configurations that cannot possibly work
    pub fn validate(&self) -> Result<()> {
        if self.notion.api_token.trim().is_empty() {
            return Err(Error::Config("NOTION_API_TOKEN is not set".into()));
        }
        if self.notion.database_id.trim().is_empty() {
            return Err(Error::Config("NOTION_DATABASE_ID is not set".into()));
        }
        if self.notion.page_size == 0 || self.notion.page_size > 100 {
            return Err(Error::Config("notion.page_size must be between 1 and 100".into()));
        }
        if self.playlist.page_size == 0 || self.playlist.page_size > 50 {
            return Err(Error::Config("playlist.page_size must be between 1 and 50".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".into()));
        }
        if self.ui.poll_interval_ms == 0 {
            return Err(Error::Config("ui.poll_interval_ms must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn valid_config() -> ReconcileConfig {
        let mut config = ReconcileConfig::default();
        config.notion.api_token = "secret".into();
        config.notion.database_id = "db".into();
        config
    }

    #[test]
    fn test_defaults() {
        let config = ReconcileConfig::default();
        assert_eq!(config.strategy, StrategyKind::Api);
        assert_eq!(config.notion.pending_property, "delete");
        assert_eq!(config.notion.deleted_property, "deleted");
        assert_eq!(config.playlist.playlist_id, "WL");
        assert_eq!(config.ui.element_timeout(), Duration::from_secs(10));
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ReconcileConfig::from_toml(
            r#"
            strategy = "ui"

            [notion]
            database_id = "abc"
            link_property = "URL"

            [ui]
            headless = true
            element_timeout_ms = 3000

            [ui.selectors]
            overflow_menu = { xpath = "//button[@aria-label='More actions']" }
            "#,
        )
        .unwrap();

        assert_eq!(config.strategy, StrategyKind::Ui);
        assert_eq!(config.notion.database_id, "abc");
        assert_eq!(config.notion.link_property, "URL");
        assert_eq!(config.notion.title_property, "Name");
        assert!(config.ui.headless);
        assert_eq!(config.ui.element_timeout_ms, 3000);
        assert_eq!(
            config.ui.selectors.overflow_menu,
            Locator::xpath("//button[@aria-label='More actions']")
        );
        assert_eq!(config.ui.selectors.metadata, Locator::tag("ytd-watch-metadata"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[playlist]\nplaylist_id = \"PLcustom\"").unwrap();

        let config = ReconcileConfig::from_file(file.path()).unwrap();
        assert_eq!(config.playlist.playlist_id, "PLcustom");
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = ReconcileConfig::from_toml("strategy = 12").unwrap_err();
        assert!(matches!(err, Error::TomlDecode(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("NOTION_API_TOKEN", "secret_token"),
            ("NOTION_DATABASE_ID", "db123"),
            ("YOUTUBE_TOKEN_FILE", "/tmp/yt.json"),
            ("WL_STRATEGY", "browser"),
        ]
        .into_iter()
        .collect();

        let mut config = ReconcileConfig::default();
        config.apply_env_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.notion.api_token, "secret_token");
        assert_eq!(config.notion.database_id, "db123");
        assert_eq!(config.playlist.token_path, PathBuf::from("/tmp/yt.json"));
        assert_eq!(config.strategy, StrategyKind::Ui);
        assert_eq!(config.ui.webdriver_url, "http://localhost:9515");
    }

    #[test]
    fn test_validate() {
        assert!(valid_config().validate().is_ok());

        let missing_token = ReconcileConfig::default();
        assert!(matches!(missing_token.validate(), Err(Error::Config(_))));

        let mut bad_retry = valid_config();
        bad_retry.retry.max_attempts = 0;
        assert!(bad_retry.validate().is_err());

        let mut bad_page = valid_config();
        bad_page.notion.page_size = 500;
        assert!(bad_page.validate().is_err());
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("API".parse::<StrategyKind>().unwrap(), StrategyKind::Api);
        assert_eq!("ui".parse::<StrategyKind>().unwrap(), StrategyKind::Ui);
        assert!("selenium".parse::<StrategyKind>().is_err());
    }
}
