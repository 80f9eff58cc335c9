//! Queue configuration.
//!
//! Configuration is consumed once when a [`Queue`](crate::Queue) is built and is
//! not retained afterwards. It can be assembled with the builder helpers or
//! loaded from TOML:
//!
//! ```toml
//! locator = "data/jobs.db"
//! reset = false
//! idle_interval_ms = 2000
//!
//! [restart]
//! max_restarts = 5
//! window_ms = 10000
//! cooldown_ms = 5000
//! ```

use std::path::Path;
use std::time::Duration;

use litequeue_db::{Locator, TRANSIENT_LOCATORS};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, CoreError, Result};

/// Configuration for a queue engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Storage target. Empty or absent means a fresh transient queue.
    pub locator: Option<String>,

    /// Purge the persisted store before opening (ignored for transient targets)
    pub reset: bool,

    /// How long the dispatcher waits on an empty queue before polling again
    pub idle_interval_ms: u64,

    /// Bounds on how fast a faulting dispatcher is restarted
    pub restart: RestartPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            locator: None,
            reset: false,
            idle_interval_ms: 2_000,
            restart: RestartPolicy::default(),
        }
    }
}

impl QueueConfig {
    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    pub fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_restart_policy(mut self, restart: RestartPolicy) -> Self {
        self.restart = restart;
        self
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.idle_interval_ms == 0 {
            return Err(CoreError::invalid_config(
                "idle_interval_ms",
                "must be greater than zero",
            ));
        }
        if self.restart.window_ms == 0 {
            return Err(CoreError::invalid_config(
                "restart.window_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Storage target this configuration names, allocating a transient one
    /// when none is given.
    pub fn resolve_locator(&self) -> Locator {
        match self.locator.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Locator::parse(raw),
            _ => TRANSIENT_LOCATORS.next(),
        }
    }
}

/// Restart throttling for the dispatch supervisor.
///
/// When more than `max_restarts` restarts happen within `window_ms`, the
/// supervisor waits `cooldown_ms` before spawning the next worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartPolicy {
    pub max_restarts: u32,
    pub window_ms: u64,
    pub cooldown_ms: u64,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_restarts: 5,
            window_ms: 10_000,
            cooldown_ms: 5_000,
        }
    }
}

impl RestartPolicy {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.idle_interval(), Duration::from_secs(2));
        assert!(!config.reset);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_huge_idle_interval_saturates() {
        let config = QueueConfig::default().with_idle_interval(Duration::MAX);
        assert_eq!(config.idle_interval_ms, u64::MAX);

        let config = QueueConfig::default().with_idle_interval(Duration::from_millis(1_500));
        assert_eq!(config.idle_interval_ms, 1_500);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = QueueConfig::from_toml_str(
            r#"
            locator = "jobs.db"
            reset = true

            [restart]
            cooldown_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(
            config,
            QueueConfig {
                locator: Some("jobs.db".to_string()),
                reset: true,
                idle_interval_ms: 2_000,
                restart: RestartPolicy {
                    cooldown_ms: 250,
                    ..RestartPolicy::default()
                },
            }
        );
    }

    #[test]
    fn test_rejects_zero_idle_interval() {
        let err = QueueConfig::from_toml_str("idle_interval_ms = 0").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "idle_interval_ms"
        ));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = QueueConfig::from_toml_str("reset = \"maybe\"").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_missing_locator_allocates_distinct_transients() {
        let config = QueueConfig::default().with_locator("  ");
        let a = config.resolve_locator();
        let b = config.resolve_locator();

        assert!(a.is_transient());
        assert_ne!(a, b);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("queue.toml");
        std::fs::write(&path, "idle_interval_ms = 50\n").unwrap();

        let config = QueueConfig::load(&path).unwrap();
        assert_eq!(config.idle_interval(), Duration::from_millis(50));

        let missing = QueueConfig::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, CoreError::Config(ConfigError::Io(_))));
    }
}
