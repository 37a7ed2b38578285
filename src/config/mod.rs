use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Result, SearchError};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserSettings,
    pub search: SearchSettings,
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Chrome/Chromium executable; auto-detected when unset
    pub driver_path: Option<PathBuf>,
    pub headless: bool,
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchSettings {
    pub provider_url: String,
    pub page_budget: u32,
    #[serde(with = "humantime_serde")]
    pub load_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub pagination_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// wait for fresh result containers after each "more results" click
    pub rewait_results: bool,
}

/// CSS selectors for the provider's result markup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub result: String,
    pub title_link: String,
    pub snippet: String,
    pub more_results: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub screenshot_file: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            provider_url: "https://duckduckgo.com/".to_string(),
            page_budget: 1,
            load_timeout: Duration::from_secs(10),
            pagination_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
            rewait_results: true,
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            result: r#"article[data-testid="result"]"#.to_string(),
            title_link: r#"h2 a[data-testid="result-title-a"]"#.to_string(),
            snippet: r#"div[data-result="snippet"]"#.to_string(),
            more_results: "#more-results".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            screenshot_file: "error_screenshot.png".to_string(),
        }
    }
}

impl Config {
    pub fn screenshot_path(&self) -> PathBuf {
        self.output.directory.join(&self.output.screenshot_file)
    }

    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        // checking browser config
        if let Some(ref driver_path) = self.browser.driver_path {
            if !driver_path.is_file() {
                return Err(SearchError::Config(format!(
                    "driver_path {:?} does not point to an executable file",
                    driver_path
                )));
            }
        }

        // checking search config
        let search = &self.search;
        if !search.provider_url.starts_with("http://") && !search.provider_url.starts_with("https://") {
            return Err(SearchError::Config(
                "provider_url must start with http:// or https://".to_string(),
            ));
        }
        url::Url::parse(&search.provider_url)?;

        if search.page_budget == 0 {
            return Err(SearchError::Config("page_budget must be at least 1".to_string()));
        }
        if search.load_timeout.is_zero() || search.pagination_timeout.is_zero() {
            return Err(SearchError::Config("timeouts must be greater than zero".to_string()));
        }
        if search.poll_interval.is_zero() {
            return Err(SearchError::Config("poll_interval must be greater than zero".to_string()));
        }
        if search.poll_interval >= search.load_timeout {
            return Err(SearchError::Config(
                "poll_interval must be shorter than load_timeout".to_string(),
            ));
        }

        // checking selectors
        for (name, selector) in [
            ("result", &self.selectors.result),
            ("title_link", &self.selectors.title_link),
            ("snippet", &self.selectors.snippet),
            ("more_results", &self.selectors.more_results),
        ] {
            if selector.trim().is_empty() {
                return Err(SearchError::Config(format!("selector '{}' cannot be empty", name)));
            }
            scraper::Selector::parse(selector).map_err(|e| {
                SearchError::Config(format!("selector '{}' is invalid: {}", name, e))
            })?;
        }

        // checking output config
        if self.output.screenshot_file.trim().is_empty() {
            return Err(SearchError::Config("screenshot_file cannot be empty".to_string()));
        }

        debug!("Configuration validation passed");
        Ok(())
    }
}

#[async_trait::async_trait]
pub trait ConfigManager {
    async fn load_config(&self) -> Result<Config>;
    async fn save_config(&self, config: &Config) -> Result<()>;
    fn validate_config(&self, config: &Config) -> Result<()>;
}

pub struct FileConfigManager {
    config_path: PathBuf,
}

impl FileConfigManager {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }
}

#[async_trait::async_trait]
impl ConfigManager for FileConfigManager {
    async fn load_config(&self) -> Result<Config> {
        info!("Loading configuration from {:?}", self.config_path);

        // check if config file exists, create default if not
        if !self.config_path.exists() {
            warn!("Configuration file not found, creating default config at {:?}", self.config_path);
            self.create_default_config().await?;
        }

        let config_content = fs::read_to_string(&self.config_path)
            .map_err(|e| SearchError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&config_content)
            .map_err(|e| SearchError::Config(format!("Failed to parse TOML config: {}", e)))?;

        self.validate_config(&config)?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    async fn save_config(&self, config: &Config) -> Result<()> {
        info!("Saving configuration to {:?}", self.config_path);

        let toml_content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, toml_content)
            .map_err(|e| SearchError::Config(format!("Failed to write config file: {}", e)))?;

        info!("Configuration saved successfully");
        Ok(())
    }

    fn validate_config(&self, config: &Config) -> Result<()> {
        config.validate()
    }
}

impl FileConfigManager {
    /// Create a default configuration file
    async fn create_default_config(&self) -> Result<()> {
        let toml_content = toml::to_string_pretty(&Config::default())
            .map_err(|e| SearchError::Config(format!("Failed to serialize default config: {}", e)))?;

        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    SearchError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        fs::write(&self.config_path, toml_content)
            .map_err(|e| SearchError::Config(format!("Failed to write default config: {}", e)))?;

        info!("Default configuration file created at {:?}", self.config_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("duck-dorker.toml");
        let manager = FileConfigManager::new(config_path.clone());

        let config = manager.load_config().await.unwrap();

        assert_eq!(config.search.page_budget, 1);
        assert_eq!(config.search.load_timeout, Duration::from_secs(10));
        assert_eq!(config.selectors, SelectorConfig::default());
        assert!(!config.browser.headless);
        assert!(config_path.exists());
    }

    #[tokio::test]
    async fn test_partial_file_keeps_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("duck-dorker.toml");
        fs::write(
            &config_path,
            "[search]\npage_budget = 4\npagination_timeout = \"3s\"\n\n[browser]\nheadless = true\n",
        )
        .unwrap();

        let config = FileConfigManager::new(config_path).load_config().await.unwrap();

        assert_eq!(config.search.page_budget, 4);
        assert_eq!(config.search.pagination_timeout, Duration::from_secs(3));
        assert_eq!(config.search.poll_interval, Duration::from_millis(250));
        assert!(config.browser.headless);
        assert_eq!(config.output.screenshot_file, "error_screenshot.png");
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let temp_dir = tempdir().unwrap();
        let manager = FileConfigManager::new(temp_dir.path().join("saved.toml"));

        let mut config = Config::default();
        config.search.page_budget = 7;
        config.browser.extra_args = vec!["--lang=en-US".to_string()];
        manager.save_config(&config).await.unwrap();

        let loaded = manager.load_config().await.unwrap();
        assert_eq!(loaded.search.page_budget, 7);
        assert_eq!(loaded.browser.extra_args, vec!["--lang=en-US"]);
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());

        let mut invalid = Config::default();
        invalid.search.page_budget = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = Config::default();
        invalid.search.provider_url = "ftp://duckduckgo.com".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = Config::default();
        invalid.search.poll_interval = Duration::from_secs(30);
        assert!(invalid.validate().is_err());

        let mut invalid = Config::default();
        invalid.selectors.snippet = "div[".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = Config::default();
        invalid.selectors.more_results = "  ".to_string();
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_missing_driver_path_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let mut config = Config::default();
        config.browser.driver_path = Some(temp_dir.path().join("chromedriver"));

        let err = config.validate().unwrap_err();
        assert!(matches!(err, SearchError::Config(ref msg) if msg.contains("driver_path")));
    }

    #[test]
    fn test_screenshot_path() {
        let mut config = Config::default();
        config.output.directory = PathBuf::from("/tmp/out");
        assert_eq!(config.screenshot_path(), PathBuf::from("/tmp/out/error_screenshot.png"));
    }
}
