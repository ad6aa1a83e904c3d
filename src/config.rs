use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub user_name: String,
    pub password: String,
    /// Seconds between friends-timeline polls.
    pub update_interval: u64,
    pub api_base: String,
    pub search_base: String,
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_name: String::new(),
            password: String::new(),
            update_interval: 60,
            api_base: "http://twitter.com".to_string(),
            search_base: "http://search.twitter.com".to_string(),
            timeout: 20,
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("termfeed").join("config.toml"))
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.update_interval = config.update_interval.max(1);
        Ok(config)
    }

    /// Fill credentials from `TERMFEED_USER` / `TERMFEED_PASSWORD` when set.
    pub fn apply_env(&mut self) {
        if let Ok(user) = std::env::var("TERMFEED_USER") {
            self.user_name = user;
        }
        if let Ok(password) = std::env::var("TERMFEED_PASSWORD") {
            self.password = password;
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval.max(1))
    }
}
