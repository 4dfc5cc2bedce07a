/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed client, polling, and logging configuration
[POS]:    Configuration layer - CLI session setup
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use serde::{Deserialize, Serialize};

use cardloom_adapter::{ClientConfig, Credentials};

use crate::poller::PollConfig;

const CONFIG_DIR_NAME: &str = "cardloom";
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Top-level configuration for the cardloom CLI
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Directory for the local task journal; platform data dir when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Backend endpoint and credentials
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token issued by the BaaS
    pub access_token: String,
    pub user_id: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Unset means wait until the task settles or the user interrupts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration_secs: Option<u64>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_duration_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// EnvFilter directive, e.g. "info" or "cardloom_workflow=debug"
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also append logs to this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_base_url() -> String {
    "https://api.cardloom.app".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_interval_secs() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/cardloom/config.yaml` or the platform equivalent
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        url::Url::parse(&self.api.base_url)
            .with_context(|| format!("api.base_url {:?} is not a valid URL", self.api.base_url))?;
        if self.api.access_token.trim().is_empty() {
            bail!("api.access_token must not be empty");
        }
        if self.api.user_id.trim().is_empty() {
            bail!("api.user_id must not be empty");
        }
        if self.api.timeout_secs == 0 {
            bail!("api.timeout_secs must be positive");
        }
        if self.polling.interval_secs == 0 {
            bail!("polling.interval_secs must be positive");
        }
        if self.polling.max_duration_secs == Some(0) {
            bail!("polling.max_duration_secs must be positive when set");
        }
        Ok(())
    }
}

impl ApiConfig {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            ..ClientConfig::default()
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            access_token: self.access_token.clone(),
            user_id: self.user_id.clone(),
        }
    }
}

impl PollingConfig {
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(self.interval_secs),
            max_duration: self.max_duration_secs.map(Duration::from_secs),
        }
    }
}
