//! Configuration Manager with hot-reload
//!
//! Loads the bus configuration, creates it with defaults when missing, and
//! polls the file for changes. Every reload that validates is published on a
//! `watch` channel; subscribers get notified only when a value changed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::fs;
use tokio::sync::{watch, RwLock};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{get_config_dir, BusConfig, ConfigOverrides};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error occurred while reading/writing config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Configuration Manager with hot-reload support
pub struct ConfigManager {
    /// Path to config file
    config_path: PathBuf,
    /// Applied on top of every load
    overrides: ConfigOverrides,
    /// Current configuration, doubling as the change notification
    current: watch::Sender<BusConfig>,
    /// Last known modification time for file watching
    last_modified: RwLock<Option<SystemTime>>,
}

impl ConfigManager {
    /// Load `config_path`, writing a default config there if it doesn't exist
    pub async fn load(
        config_path: PathBuf,
        overrides: ConfigOverrides,
    ) -> Result<Arc<Self>, ConfigError> {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut config = if config_path.exists() {
            read_config(&config_path).await?
        } else {
            let config = BusConfig::default();
            let toml_string = toml::to_string_pretty(&config)?;
            fs::write(&config_path, toml_string).await?;
            info!(path = %config_path.display(), "created default config");
            config
        };
        overrides.apply(&mut config);
        config.validate()?;

        let modified = modified_time(&config_path).await;
        let (current, _) = watch::channel(config);

        Ok(Arc::new(Self {
            config_path,
            overrides,
            current,
            last_modified: RwLock::new(modified),
        }))
    }

    /// Get the default config path: `$XDG_CONFIG_HOME/cmdbus/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let dir = get_config_dir().ok_or_else(|| {
            ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Snapshot of the current config
    pub fn current(&self) -> BusConfig {
        self.current.borrow().clone()
    }

    /// Receiver that is notified whenever a reload changes the config
    pub fn subscribe(&self) -> watch::Receiver<BusConfig> {
        self.current.subscribe()
    }

    /// Reload configuration from disk. Returns whether anything changed.
    pub async fn reload(&self) -> Result<bool, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Config file not found: {:?}", self.config_path),
            )));
        }

        let mut new_config = read_config(&self.config_path).await?;
        self.overrides.apply(&mut new_config);
        new_config.validate()?;

        *self.last_modified.write().await = modified_time(&self.config_path).await;

        let changed = self.current.send_if_modified(|current| {
            if *current == new_config {
                false
            } else {
                *current = new_config;
                true
            }
        });
        if changed {
            info!(path = %self.config_path.display(), "config reloaded");
        } else {
            debug!(path = %self.config_path.display(), "config file touched, no change");
        }
        Ok(changed)
    }

    /// Start a task that polls the config file for changes until `cancel`
    /// fires. A reload that fails keeps the previous config in effect.
    pub fn start_watcher(self: &Arc<Self>, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        let manager = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                let poll_interval = manager.current.borrow().poll_interval();
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(poll_interval) => {}
                }

                match fs::metadata(&manager.config_path).await {
                    Ok(metadata) => {
                        let Ok(modified) = metadata.modified() else {
                            continue;
                        };
                        let should_reload = match *manager.last_modified.read().await {
                            Some(last) => modified > last,
                            None => true,
                        };

                        if should_reload {
                            if let Err(e) = manager.reload().await {
                                warn!(error = %e, "config reload failed, keeping previous config");
                                *manager.last_modified.write().await = Some(modified);
                            }
                        }
                    }
                    Err(e) => {
                        debug!(error = %e, "cannot read config file metadata");
                    }
                }
            }
        })
    }

    /// Get config path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

async fn read_config(path: &Path) -> Result<BusConfig, ConfigError> {
    let content = fs::read_to_string(path).await?;
    Ok(toml::from_str(&content)?)
}

async fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).await.ok()?.modified().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let manager = ConfigManager::load(path.clone(), ConfigOverrides::default())
            .await
            .unwrap();
        assert!(path.exists());
        assert_eq!(manager.current(), BusConfig::default());
    }

    #[tokio::test]
    async fn test_reload_notifies_only_on_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let manager = ConfigManager::load(path.clone(), ConfigOverrides::default())
            .await
            .unwrap();
        let mut rx = manager.subscribe();

        assert!(!manager.reload().await.unwrap());
        assert!(!rx.has_changed().unwrap());

        let mut config = manager.current();
        config.enabled = false;
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        assert!(manager.reload().await.unwrap());
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().enabled);
    }

    #[tokio::test]
    async fn test_invalid_reload_keeps_previous() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let manager = ConfigManager::load(path.clone(), ConfigOverrides::default())
            .await
            .unwrap();

        std::fs::write(&path, "poll_interval_ms = 0\n").unwrap();
        assert!(matches!(
            manager.reload().await,
            Err(ConfigError::InvalidValue(_))
        ));
        std::fs::write(&path, "enabled = [").unwrap();
        assert!(matches!(manager.reload().await, Err(ConfigError::TomlParse(_))));
        assert_eq!(manager.current(), BusConfig::default());
    }

    #[tokio::test]
    async fn test_overrides_survive_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let inbox = dir.path().join("inbox");
        let overrides = ConfigOverrides {
            command_file: Some(inbox.clone()),
            enabled: None,
        };
        let manager = ConfigManager::load(path.clone(), overrides).await.unwrap();
        assert_eq!(manager.current().command_file, inbox);

        std::fs::write(&path, "command_file = \"/somewhere/else\"\nenabled = false\n").unwrap();
        manager.reload().await.unwrap();
        let config = manager.current();
        assert_eq!(config.command_file, inbox);
        assert!(!config.enabled);
    }

    #[tokio::test]
    async fn test_watcher_picks_up_edits() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "poll_interval_ms = 20\n").unwrap();
        let manager = ConfigManager::load(path.clone(), ConfigOverrides::default())
            .await
            .unwrap();
        let mut rx = manager.subscribe();

        let cancel = CancellationToken::new();
        let task = manager.start_watcher(cancel.clone());

        // coarse mtime resolution on some filesystems
        tokio::time::sleep(Duration::from_millis(1100)).await;
        std::fs::write(&path, "poll_interval_ms = 20\nenabled = false\n").unwrap();

        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("config change within timeout")
            .unwrap();
        assert!(!rx.borrow().enabled);

        cancel.cancel();
        task.await.unwrap();
    }
}
