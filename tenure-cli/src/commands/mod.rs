//! Command dispatch

pub mod run;
pub mod status;

use anyhow::Context;
use tenure_config::{ConfigOverrides, TenureConfig};
use tenure_lock::{FileLock, LockConfig};

use crate::cli::{Cli, Commands};
use crate::logging;

/// Command line flags that override configuration values
pub fn overrides(cli: &Cli) -> ConfigOverrides {
    ConfigOverrides {
        lock_name: cli.lock_name.clone(),
        lock_directory: cli.lock_dir.clone(),
        timeout_ms: cli.timeout_ms,
        poll_interval_ms: cli.poll_interval_ms,
        log_level: cli.log_level.clone(),
    }
}

/// Merge configuration sources for this invocation
pub fn load_config(cli: &Cli) -> anyhow::Result<TenureConfig> {
    tenure_config::load(cli.config.as_deref(), overrides(cli))
        .context("Failed to load configuration")
}

/// Lock handle for the configured name, directory and timeout
pub fn open_lock(config: &TenureConfig) -> anyhow::Result<FileLock> {
    let lock_config =
        LockConfig::new(config.lock_timeout()).with_directory(config.lock_directory());
    FileLock::create(config.lock.name.clone(), lock_config)
        .with_context(|| format!("Failed to open lock '{}'", config.lock.name))
}

/// Load configuration, install logging and run the selected command
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    logging::init(&config.logging, cli.debug)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run::run_election(&config).await,
        Commands::Status { json } => status::run_status(&config, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_overrides_from_flags() {
        let cli = Cli::parse_from([
            "tenure",
            "--lock-name",
            "jobs/cron",
            "--lock-dir",
            "/var/lock/tenure",
            "--timeout-ms",
            "4000",
            "status",
            "--log-level",
            "tenure_lock=trace",
        ]);
        let overrides = overrides(&cli);
        assert_eq!(overrides.lock_name.as_deref(), Some("jobs/cron"));
        assert_eq!(
            overrides.lock_directory,
            Some(std::path::PathBuf::from("/var/lock/tenure"))
        );
        assert_eq!(overrides.timeout_ms, Some(4000));
        assert_eq!(overrides.poll_interval_ms, None);
        assert_eq!(overrides.log_level.as_deref(), Some("tenure_lock=trace"));
    }

    #[test]
    fn test_cli_defaults_to_run() {
        let cli = Cli::parse_from(["tenure"]);
        assert!(cli.command.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_status_json_after_global_flags() {
        let cli = Cli::parse_from(["tenure", "status", "--json", "--debug"]);
        assert_eq!(cli.command, Some(Commands::Status { json: true }));
        assert!(cli.debug);
    }

    #[test]
    fn test_open_lock_uses_configured_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = TenureConfig::default();
        config.lock.directory = Some(dir.path().to_path_buf());
        let lock = open_lock(&config).unwrap();
        assert_eq!(lock.path(), dir.path().join("services_leader.lock"));
    }
}
