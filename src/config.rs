use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Accounts to run the funnel with
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    /// Proxy endpoints used to diversify account traffic
    #[serde(default)]
    pub proxies: Vec<String>,
    /// Ticket page to monitor
    #[serde(default)]
    pub target_match_url: String,
    /// Availability poll interval in milliseconds
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// Reserved for retry policy
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Reserved pacing between page actions
    #[serde(default = "default_delay_between_actions_ms")]
    pub delay_between_actions_ms: u64,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One account credential pair
#[derive(Clone, Deserialize)]
pub struct AccountConfig {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Maximum admission polls before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Interval between admission polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Bound on queue-entry confirmation in milliseconds
    #[serde(default = "default_entry_timeout_ms")]
    pub entry_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Bound on one availability fetch in milliseconds
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_refresh_interval_ms() -> u64 {
    5000
}

fn default_max_retries() -> u32 {
    3
}

fn default_delay_between_actions_ms() -> u64 {
    1000
}

fn default_max_attempts() -> u32 {
    120
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_entry_timeout_ms() -> u64 {
    15_000
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
            entry_timeout_ms: default_entry_timeout_ms(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            proxies: Vec::new(),
            target_match_url: String::new(),
            refresh_interval_ms: default_refresh_interval_ms(),
            max_retries: default_max_retries(),
            delay_between_actions_ms: default_delay_between_actions_ms(),
            queue: QueueConfig::default(),
            monitor: MonitorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("target_match_url", "")?
            .set_default("refresh_interval_ms", 5000)?
            .set_default("max_retries", 3)?
            .set_default("delay_between_actions_ms", 1000)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("MATCHDAY_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (MATCHDAY_TARGET_MATCH_URL, etc.)
            .add_source(
                Environment::with_prefix("MATCHDAY")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.accounts.is_empty() {
            errors.push("at least one account must be configured".to_string());
        }

        if self.target_match_url.is_empty() {
            errors.push("target_match_url must be set".to_string());
        }

        if self.refresh_interval_ms < 1000 {
            errors.push("refresh_interval_ms must be at least 1000".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
