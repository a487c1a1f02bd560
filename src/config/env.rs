//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

use crate::clock::ClockKind;

/// Environment variable prefix
const ENV_PREFIX: &str = "SUNIT_ASYNC";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Harness deadline from SUNIT_ASYNC_HARNESS_TIMEOUT (milliseconds)
    pub harness_timeout_ms: Option<u64>,
    /// Clock from SUNIT_ASYNC_CLOCK
    pub clock: Option<ClockKind>,
    /// Output format from SUNIT_ASYNC_FORMAT
    pub format: Option<String>,
    /// Colorized output from SUNIT_ASYNC_COLOR
    pub colorize: Option<bool>,
    /// Log level from SUNIT_ASYNC_LOG
    pub log_level: Option<String>,
    /// Config file from SUNIT_ASYNC_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            harness_timeout_ms: get_env_parse("HARNESS_TIMEOUT"),
            clock: get_env("CLOCK").and_then(|v| ClockKind::from_str(&v)),
            format: get_env("FORMAT"),
            colorize: get_env_bool("COLOR"),
            log_level: get_env("LOG"),
            config_file: get_env("CONFIG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.harness_timeout_ms.is_some()
            || self.clock.is_some()
            || self.format.is_some()
            || self.colorize.is_some()
            || self.log_level.is_some()
            || self.config_file.is_some()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_HARNESS_TIMEOUT: {:?}", ENV_PREFIX, self.harness_timeout_ms);
        println!("  {}_CLOCK:           {:?}", ENV_PREFIX, self.clock);
        println!("  {}_FORMAT:          {:?}", ENV_PREFIX, self.format);
        println!("  {}_COLOR:           {:?}", ENV_PREFIX, self.colorize);
        println!("  {}_LOG:             {:?}", ENV_PREFIX, self.log_level);
        println!("  {}_CONFIG:          {:?}", ENV_PREFIX, self.config_file);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables in tests
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    pub fn harness_timeout(mut self, ms: u64) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_HARNESS_TIMEOUT"), ms.to_string()));
        self
    }

    pub fn clock(mut self, clock: ClockKind) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_CLOCK"), clock.to_string()));
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_FORMAT"), format.into()));
        self
    }

    pub fn color(mut self, colorize: bool) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_COLOR"), colorize.to_string()));
        self
    }

    pub fn log(mut self, level: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_LOG"), level.into()));
        self
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all SUNIT_ASYNC environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_HARNESS_TIMEOUT  Overall suite deadline in milliseconds");
    println!("  {ENV_PREFIX}_CLOCK            Clock driving the run (manual, runtime)");
    println!("  {ENV_PREFIX}_FORMAT           Output format (table, json, json-pretty, csv, summary)");
    println!("  {ENV_PREFIX}_COLOR            Colorize table output (true/false)");
    println!("  {ENV_PREFIX}_LOG              Log level (trace, debug, info, warn, error)");
    println!("  {ENV_PREFIX}_CONFIG           Path to configuration file");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_CLOCK=runtime");
    println!("  sunit-async run --suite async");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::default();
        assert!(config.clock.is_none());
        assert!(!config.has_any());
    }

    #[test]
    fn test_env_builder() {
        let _guard = EnvBuilder::new()
            .harness_timeout(750)
            .clock(ClockKind::Runtime)
            .apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(config.harness_timeout_ms, Some(750));
        assert_eq!(config.clock, Some(ClockKind::Runtime));
        assert!(config.has_any());
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = EnvBuilder::new().color(false).apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(config.colorize, Some(false));
    }

    #[test]
    fn test_env_guard_restores() {
        {
            let _guard = EnvBuilder::new().log("trace").apply_scoped();
            assert_eq!(EnvConfig::load().log_level, Some("trace".to_string()));
        }
        assert_eq!(env::var(format!("{ENV_PREFIX}_LOG")).ok(), None);
    }
}
