/// Configuration for the course player
///
/// Values are layered: built-in defaults, then an optional TOML file, then
/// environment variables (a `.env` file is honoured).
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEVELOPMENT_URL: &str = "http://127.0.0.1:5000/api";
const PRODUCTION_URL: &str = "https://blujay-backend.onrender.com/api";

/// Deployment the player talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub environment: Environment,
    pub development_url: String,
    pub production_url: String,
    /// Explicit override; wins over the environment-selected URL
    pub base_url: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            development_url: DEVELOPMENT_URL.to_string(),
            production_url: PRODUCTION_URL.to_string(),
            base_url: None,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            user_agent: concat!("courseplayer/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ApiConfig {
    /// Resolves the backend base URL for the configured environment.
    pub fn resolved_base_url(&self) -> &str {
        if let Some(url) = &self.base_url {
            return url;
        }
        match self.environment {
            Environment::Development => &self.development_url,
            Environment::Production => &self.production_url,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Playback behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Pause between a confirmed completion and moving to the next lesson
    pub auto_advance_delay_ms: u64,
    pub curriculum_cache_ttl_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            auto_advance_delay_ms: 1000,
            curriculum_cache_ttl_secs: 5 * 60,
        }
    }
}

impl TrackerConfig {
    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }

    pub fn curriculum_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.curriculum_cache_ttl_secs)
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `courseplayer=debug`
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Top-level player configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub api: ApiConfig,
    pub player: TrackerConfig,
    pub logging: LoggingConfig,
}

impl PlayerConfig {
    /// Loads defaults, the optional TOML file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parses a TOML file. Missing sections fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("COURSEPLAYER_API_URL") {
            self.api.base_url = Some(url);
        }
        if let Some(environment) = lookup("COURSEPLAYER_ENV") {
            self.api.environment = match environment.to_ascii_lowercase().as_str() {
                "production" | "prod" => Environment::Production,
                "development" | "dev" => Environment::Development,
                other => anyhow::bail!("unknown COURSEPLAYER_ENV value {other:?}"),
            };
        }
        if let Some(level) = lookup("COURSEPLAYER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(delay) = lookup("COURSEPLAYER_AUTO_ADVANCE_MS") {
            self.player.auto_advance_delay_ms = delay
                .parse()
                .with_context(|| format!("invalid COURSEPLAYER_AUTO_ADVANCE_MS value {delay:?}"))?;
        }
        Ok(())
    }
}
