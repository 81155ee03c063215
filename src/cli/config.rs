use anyhow::{Context, Result};
use console::Style;
use std::path::{Path, PathBuf};

use cmdbus_core::config::{BusConfig, ConfigManager, ConfigOverrides};

use super::ConfigCommand;

/// Explicit `--config` path or the default location
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => ConfigManager::default_config_path().context("Failed to locate config directory"),
    }
}

/// Config file plus command-line overrides, without creating anything on disk
pub fn load_effective(path: &Path, overrides: &ConfigOverrides) -> Result<BusConfig> {
    let mut config = BusConfig::load_or_default(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    overrides.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

pub fn handle_config(
    cmd: Option<ConfigCommand>,
    path: &Path,
    overrides: &ConfigOverrides,
) -> Result<()> {
    match cmd.unwrap_or(ConfigCommand::Show) {
        ConfigCommand::Show => {
            let config = load_effective(path, overrides)?;
            let dim = Style::new().dim();
            println!("{}", dim.apply_to(format!("# {}", path.display())));
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigCommand::Path => println!("{}", path.display()),
        ConfigCommand::Init { force } => {
            let green = Style::new().green();
            if init_config(path, force)? {
                println!("{} {}", green.apply_to("Wrote"), path.display());
            } else {
                println!("Config already exists at {} (use --force to overwrite)", path.display());
            }
        }
    }
    Ok(())
}

/// Write the default config. Returns false if a file exists and `force` is off.
fn init_config(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(&BusConfig::default())?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_respects_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cmdbus").join("config.toml");

        assert!(init_config(&path, false).unwrap());
        std::fs::write(&path, "enabled = false\n").unwrap();
        assert!(!init_config(&path, false).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "enabled = false\n");

        assert!(init_config(&path, true).unwrap());
        assert_eq!(BusConfig::load_or_default(&path).unwrap(), BusConfig::default());
    }

    #[test]
    fn test_effective_config_applies_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "follow_up_delay_ms = 50\n").unwrap();

        let overrides = ConfigOverrides {
            command_file: Some(dir.path().join("inbox")),
            enabled: None,
        };
        let config = load_effective(&path, &overrides).unwrap();
        assert_eq!(config.follow_up_delay_ms, 50);
        assert_eq!(config.command_file, dir.path().join("inbox"));
    }
}
