//! Configuration provider using Figment

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use tracing::{debug, info, trace};

use crate::{
    discovery::{ConfigFormat, FileDiscovery},
    error::{ConfigError, ConfigResult},
    types::TenureConfig,
};

/// Prefix of environment variables read by the provider
pub const ENV_PREFIX: &str = "TENURE_";

/// Separator between nested keys in environment variable names
pub const ENV_SEPARATOR: &str = "__";

/// Values supplied on the command line
///
/// Every field that is set wins over all other sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub lock_name: Option<String>,
    pub lock_directory: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub log_level: Option<String>,
}

impl ConfigOverrides {
    fn figment(&self) -> Figment {
        let mut figment = Figment::new();
        if let Some(ref name) = self.lock_name {
            figment = figment.merge(Serialized::default("lock.name", name));
        }
        if let Some(ref directory) = self.lock_directory {
            figment = figment.merge(Serialized::default("lock.directory", directory));
        }
        if let Some(timeout_ms) = self.timeout_ms {
            figment = figment.merge(Serialized::default("lock.timeout_ms", timeout_ms));
        }
        if let Some(poll_interval_ms) = self.poll_interval_ms {
            figment = figment.merge(Serialized::default(
                "election.poll_interval_ms",
                poll_interval_ms,
            ));
        }
        if let Some(ref level) = self.log_level {
            figment = figment.merge(Serialized::default("logging.level", level));
        }
        figment
    }
}

/// Loads [`TenureConfig`] from every source in precedence order
///
/// Later sources override earlier ones:
/// 1. Built-in defaults
/// 2. `~/.tenure/tenure.*`
/// 3. `./.tenure/tenure.*`
/// 4. An explicitly named file
/// 5. `TENURE_*` environment variables, `__` separating nested keys
/// 6. Command line overrides
///
/// Nothing is cached; each [`load`](Self::load) reads the sources afresh.
#[derive(Debug, Clone, Default)]
pub struct ConfigProvider {
    discovery: FileDiscovery,
    explicit_file: Option<PathBuf>,
    overrides: ConfigOverrides,
}

impl ConfigProvider {
    /// Provider using the default discovery locations
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the discovery used for global and project files
    pub fn with_discovery(mut self, discovery: FileDiscovery) -> Self {
        self.discovery = discovery;
        self
    }

    /// Also read this file, after the discovered ones
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    /// Apply command line overrides last
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Merge all sources, extract and validate the result
    pub fn load(&self) -> ConfigResult<TenureConfig> {
        let figment = self.build_figment()?;
        let config: TenureConfig = figment.extract()?;
        config.validate()?;

        info!(
            lock = %config.lock.name,
            timeout_ms = config.lock.timeout_ms,
            poll_interval_ms = config.election.poll_interval_ms,
            "Loaded configuration"
        );
        Ok(config)
    }

    fn build_figment(&self) -> ConfigResult<Figment> {
        debug!("Building figment configuration with precedence order");

        let mut figment = Figment::from(Serialized::defaults(TenureConfig::default()));

        for config_file in self.discovery.discover_all() {
            trace!(
                "Loading config file: {} ({:?}, {:?})",
                config_file.path.display(),
                config_file.format,
                config_file.scope
            );
            figment = figment.merge(Self::file_provider(&config_file.path, config_file.format));
        }

        if let Some(ref path) = self.explicit_file {
            figment = figment.merge(Self::load_explicit_file(path)?);
        }

        Ok(figment
            .merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR))
            .merge(self.overrides.figment()))
    }

    fn load_explicit_file(path: &Path) -> ConfigResult<Figment> {
        if !path.is_file() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let format =
            ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
                format: path
                    .extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            })?;
        debug!("Loading explicit config file: {}", path.display());
        Ok(Self::file_provider(path, format))
    }

    fn file_provider(path: &Path, format: ConfigFormat) -> Figment {
        match format {
            ConfigFormat::Toml => Figment::from(Toml::file(path)),
            ConfigFormat::Yaml => Figment::from(Yaml::file(path)),
            ConfigFormat::Json => Figment::from(Json::file(path)),
        }
    }
}

/// Convenience wrapper over [`ConfigProvider`]
pub fn load(
    explicit_file: Option<&Path>,
    overrides: ConfigOverrides,
) -> ConfigResult<TenureConfig> {
    let mut provider = ConfigProvider::new().with_overrides(overrides);
    if let Some(path) = explicit_file {
        provider = provider.with_file(path);
    }
    provider.load()
}
