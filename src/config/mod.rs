//! Configuration module
//!
//! Handles finding, loading and layering the harness configuration.

pub mod env;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::clock::ClockKind;
use crate::output::OutputFormat;
use crate::utils::logger::LogLevel;
use env::EnvConfig;

/// Configuration file locations relative to the working directory, in order
/// of precedence
const LOCAL_CONFIG_LOCATIONS: &[&str] = &["./sunit-async.yaml", "./.sunit-async.yaml"];

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Overall deadline for one suite run in milliseconds
    pub harness_timeout_ms: u64,

    /// Clock driving the run
    pub clock: ClockKind,

    /// Output format (table, json, json-pretty, csv, summary)
    pub format: String,

    /// Colorize table output
    pub colorize: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            harness_timeout_ms: 200,
            clock: ClockKind::Manual,
            format: "table".to_string(),
            colorize: true,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Find a configuration file in the standard locations
    pub fn find() -> Option<PathBuf> {
        LOCAL_CONFIG_LOCATIONS
            .iter()
            .map(PathBuf::from)
            .chain(user_config_path())
            .find(|path| path.exists())
    }

    /// Load from `path`, or from the first standard location, or defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path.map(Path::to_path_buf).or_else(Self::find) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.harness_timeout_ms == 0 {
            anyhow::bail!("harness_timeout_ms must be greater than zero");
        }
        if OutputFormat::from_str(&self.format).is_none() {
            anyhow::bail!(
                "Invalid format '{}'. Valid: table, json, json-pretty, csv, summary",
                self.format
            );
        }
        if LogLevel::from_str(&self.log_level).is_none() {
            anyhow::bail!(
                "Invalid log level '{}'. Valid: trace, debug, info, warn, error",
                self.log_level
            );
        }
        Ok(())
    }

    /// Apply environment overrides on top of this configuration
    pub fn merge_env(&mut self, env: &EnvConfig) {
        if let Some(timeout) = env.harness_timeout_ms {
            self.harness_timeout_ms = timeout;
        }
        if let Some(clock) = env.clock {
            self.clock = clock;
        }
        if let Some(format) = &env.format {
            self.format = format.clone();
        }
        if let Some(colorize) = env.colorize {
            self.colorize = colorize;
        }
        if let Some(level) = &env.log_level {
            self.log_level = level.clone();
        }
    }

    pub fn harness_timeout(&self) -> Duration {
        Duration::from_millis(self.harness_timeout_ms)
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_str(&self.format).unwrap_or(OutputFormat::Table)
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_str(&self.log_level).unwrap_or(LogLevel::Info)
    }
}

/// `<config dir>/sunit-async/config.yaml`
fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sunit-async").join("config.yaml"))
}

fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.harness_timeout_ms, 200);
        assert_eq!(config.clock, ClockKind::Manual);
        assert_eq!(config.output_format(), OutputFormat::Table);
        assert_eq!(config.log_level(), LogLevel::Info);
        config.validate().unwrap();
    }

    #[test]
    fn test_config_save_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let config = AppConfig {
            harness_timeout_ms: 500,
            clock: ClockKind::Runtime,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_save_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let config = AppConfig {
            format: "csv".to_string(),
            colorize: false,
            ..Default::default()
        };
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.yaml");
        std::fs::write(&path, "clock: runtime\n").unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.clock, ClockKind::Runtime);
        assert_eq!(loaded.harness_timeout_ms, 200);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_format = AppConfig {
            format: "xml".to_string(),
            ..Default::default()
        };
        assert!(bad_format.validate().is_err());

        let zero_timeout = AppConfig {
            harness_timeout_ms: 0,
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_load_or_default_with_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("explicit.yaml");
        std::fs::write(&path, "harness_timeout_ms: 50\n").unwrap();

        let loaded = AppConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(loaded.harness_timeout(), Duration::from_millis(50));
    }

    #[test]
    fn test_merge_env_overrides() {
        let mut config = AppConfig::default();
        let env = EnvConfig {
            harness_timeout_ms: Some(1_000),
            colorize: Some(false),
            ..Default::default()
        };
        config.merge_env(&env);

        assert_eq!(config.harness_timeout_ms, 1_000);
        assert!(!config.colorize);
        assert_eq!(config.format, "table");
    }
}
