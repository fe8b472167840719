//! Layered configuration for tenure processes
//!
//! Settings are merged with [Figment](https://docs.rs/figment) from built-in defaults,
//! `tenure.{toml,yaml,yml,json}` files in `~/.tenure/` and `./.tenure/`, an explicit file,
//! `TENURE_*` environment variables and command line overrides, in that order.
//!
//! ```no_run
//! use tenure_config::{ConfigOverrides, ConfigProvider};
//!
//! let config = ConfigProvider::new()
//!     .with_overrides(ConfigOverrides {
//!         lock_name: Some("billing/scheduler".to_string()),
//!         ..Default::default()
//!     })
//!     .load()?;
//! assert!(config.poll_interval() < config.lock_timeout());
//! # Ok::<(), tenure_config::ConfigError>(())
//! ```
//!
//! Nested keys are separated by `__` in environment variables, so
//! `TENURE_LOCK__TIMEOUT_MS=20000` sets `lock.timeout_ms`.

pub mod discovery;
pub mod error;
pub mod provider;
pub mod types;

pub use discovery::{ConfigFile, ConfigFormat, ConfigScope, FileDiscovery};
pub use error::{ConfigError, ConfigResult};
pub use provider::{load, ConfigOverrides, ConfigProvider, ENV_PREFIX, ENV_SEPARATOR};
pub use types::{
    ElectionSettings, LockSettings, LoggingSettings, TenureConfig, DEFAULT_LOCK_NAME,
    DEFAULT_LOG_LEVEL, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS,
};
