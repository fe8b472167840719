//! Typed configuration for a tenure process

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default lock name shared by cooperating processes
pub const DEFAULT_LOCK_NAME: &str = "services/leader";
/// Default staleness timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
/// Default poll interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Complete process configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TenureConfig {
    /// Lock settings
    pub lock: LockSettings,
    /// Election loop settings
    pub election: ElectionSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// `[lock]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    /// Logical lock name
    pub name: String,
    /// Age after which an unrefreshed record is stale
    pub timeout_ms: u64,
    /// Shared directory holding the lock record; system temp dir when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_LOCK_NAME.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            directory: None,
        }
    }
}

/// `[election]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectionSettings {
    /// Delay between polls
    pub poll_interval_ms: u64,
    /// Optional bound on a single acquisition attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquire_timeout_ms: Option<u64>,
}

impl Default for ElectionSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            acquire_timeout_ms: None,
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Append logs to this file instead of stderr
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl TenureConfig {
    /// Staleness timeout
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock.timeout_ms)
    }

    /// Delay between polls
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.election.poll_interval_ms)
    }

    /// Per-attempt acquisition bound
    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.election.acquire_timeout_ms.map(Duration::from_millis)
    }

    /// Directory holding the lock record
    pub fn lock_directory(&self) -> PathBuf {
        self.lock
            .directory
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Reject configurations the election cannot run with
    ///
    /// The poll interval must be strictly below the lock timeout, otherwise a live
    /// leader's record goes stale between two refreshes.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.lock.name.trim().is_empty() {
            return Err(ConfigError::validation("lock.name must not be empty"));
        }
        if self.lock.timeout_ms == 0 {
            return Err(ConfigError::validation(
                "lock.timeout_ms must be greater than zero",
            ));
        }
        if self.election.poll_interval_ms == 0 {
            return Err(ConfigError::validation(
                "election.poll_interval_ms must be greater than zero",
            ));
        }
        if self.election.poll_interval_ms >= self.lock.timeout_ms {
            return Err(ConfigError::validation(format!(
                "election.poll_interval_ms ({}) must be smaller than lock.timeout_ms ({})",
                self.election.poll_interval_ms, self.lock.timeout_ms
            )));
        }
        if self.election.acquire_timeout_ms == Some(0) {
            return Err(ConfigError::validation(
                "election.acquire_timeout_ms must be greater than zero when set",
            ));
        }
        Ok(())
    }
}
