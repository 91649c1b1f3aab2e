//! Configuration management for the CLI

use anyhow::{Context, Result};
use rollout_lib::{QueryFailurePolicy, WaitConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::WaitArgs;

/// Deployment service URL used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// CLI configuration
///
/// Read from `~/.config/rollout/config.json` and `ROLLOUT_*` environment
/// variables; command-line flags take precedence over both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    /// Deployment service URL
    pub api_url: Option<String>,
    /// Bearer token for the deployment service
    pub token: Option<String>,
    /// Timeout used when `--timeout` is not given
    pub default_timeout_secs: Option<i64>,
    /// Pause between status queries while waiting
    pub poll_interval_ms: Option<u64>,
}

impl CliConfig {
    /// Load configuration from the default file location and environment
    pub fn load() -> Result<Self> {
        let path = Self::config_path().ok();
        Self::load_from(path.as_deref())
    }

    /// Load configuration from `path` (if it exists) and environment
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        builder
            .add_source(config::Environment::with_prefix("ROLLOUT").try_parsing(true))
            .build()
            .context("Failed to read config file")?
            .try_deserialize()
            .context("Failed to parse config file")
    }

    /// Service URL: flag, then config, then the built-in default
    pub fn api_url(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Token: flag, then config
    pub fn token(&self, flag: Option<String>) -> Option<String> {
        flag.or_else(|| self.token.clone())
    }

    /// Wait loop settings for a mutation command
    pub fn wait_config(&self, args: &WaitArgs) -> WaitConfig {
        let timeout = args
            .timeout
            .or(self.default_timeout_secs)
            .unwrap_or(rollout_lib::wait::DEFAULT_TIMEOUT_SECS);
        let policy = if args.fail_fast {
            QueryFailurePolicy::Abort
        } else {
            QueryFailurePolicy::Tolerate
        };

        let mut wait = WaitConfig::new(timeout).on_query_error(policy);
        if let Some(ms) = self.poll_interval_ms {
            wait = wait.poll_interval(Duration::from_millis(ms));
        }
        wait
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("rollout").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn wait_args(timeout: Option<i64>, fail_fast: bool) -> WaitArgs {
        WaitArgs {
            no_wait: false,
            timeout,
            fail_fast,
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"api_url": "https://edi.example.com", "default_timeout_secs": 120, "poll_interval_ms": 250}"#,
        )
        .unwrap();

        let config = CliConfig::load_from(Some(&path)).unwrap();

        assert_eq!(config.api_url(None), "https://edi.example.com");
        assert_eq!(config.api_url(Some("http://other:5000".to_string())), "http://other:5000");

        let wait = config.wait_config(&wait_args(None, false));
        assert_eq!(wait.timeout_secs, 120);
        assert_eq!(wait.poll_interval, Duration::from_millis(250));
        assert_eq!(wait.on_query_error, QueryFailurePolicy::Tolerate);
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let config = CliConfig::load_from(Some(&dir.path().join("absent.json")));

        assert!(config.is_ok());
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(CliConfig::load_from(Some(&path)).is_err());
    }

    #[test]
    fn test_wait_config_flags_win() {
        let config = CliConfig {
            default_timeout_secs: Some(60),
            ..CliConfig::default()
        };

        let wait = config.wait_config(&wait_args(Some(5), true));
        assert_eq!(wait.timeout_secs, 5);
        assert_eq!(wait.on_query_error, QueryFailurePolicy::Abort);
        assert_eq!(wait.poll_interval, Duration::from_secs(1));

        let defaults = CliConfig::default().wait_config(&wait_args(None, false));
        assert_eq!(defaults.timeout_secs, 300);
    }
}
