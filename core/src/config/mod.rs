//! Configuration management
//!
//! The bus reads a small TOML file, by default
//! `$XDG_CONFIG_HOME/cmdbus/config.toml`:
//!
//! ```toml
//! enabled = true
//! command_file = "/tmp/cmdbus-commands"
//! follow_up_delay_ms = 500
//! poll_interval_ms = 2000
//! ```

pub mod manager;

pub use manager::{ConfigError, ConfigManager};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_FOLLOW_UP_DELAY_MS: u64 = 500;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
const COMMAND_FILE_NAME: &str = "cmdbus-commands";

/// Bus configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Whether the watch loop should be running
    pub enabled: bool,
    /// The shared inbox file producers append to
    pub command_file: PathBuf,
    /// Delay before the second step of a two-step command
    pub follow_up_delay_ms: u64,
    /// How often the config file is checked for changes
    pub poll_interval_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command_file: default_command_file(),
            follow_up_delay_ms: DEFAULT_FOLLOW_UP_DELAY_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl BusConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_file.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue(
                "command_file must not be empty".to_string(),
            ));
        }
        if self.command_file.is_dir() {
            return Err(ConfigError::InvalidValue(format!(
                "command_file {} is a directory",
                self.command_file.display()
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn follow_up_delay(&self) -> Duration {
        Duration::from_millis(self.follow_up_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Read a config file without creating it; a missing file yields defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: BusConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

/// Values given on the command line; they win over the file on every reload
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub command_file: Option<PathBuf>,
    pub enabled: Option<bool>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut BusConfig) {
        if let Some(path) = &self.command_file {
            config.command_file = path.clone();
        }
        if let Some(enabled) = self.enabled {
            config.enabled = enabled;
        }
    }
}

/// Well-known inbox location in the system temp directory
pub fn default_command_file() -> PathBuf {
    std::env::temp_dir().join(COMMAND_FILE_NAME)
}

/// Get the configuration directory path
pub fn get_config_dir() -> Option<PathBuf> {
    use dirs::config_dir;
    use home::home_dir;

    if let Some(dir) = config_dir() {
        return Some(dir.join("cmdbus"));
    }

    if let Some(home) = home_dir() {
        return Some(home.join(".config").join("cmdbus"));
    }

    None
}
