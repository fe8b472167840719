//! CLI definition for the tenure command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tenure - leader election between processes sharing a lock directory.
///
/// Every process started with the same lock name and directory competes for
/// one lock record. The holder is the leader; the others stand by and take over
/// once the leader releases the lock or stops refreshing it for longer than the
/// lock timeout.
#[derive(Parser, Debug)]
#[command(name = "tenure")]
#[command(version)]
#[command(about = "Leader election between processes sharing a lock directory")]
#[command(
    long_about = "Tenure elects one leader among processes that share a lock directory.\n\n\
    Configuration is read from ~/.tenure/tenure.toml, ./.tenure/tenure.toml, --config,\n\
    TENURE_* environment variables and the flags below, later sources winning.\n\n\
    Environment variables:\n  \
    TENURE_LOCK__NAME               Lock name\n  \
    TENURE_LOCK__TIMEOUT_MS         Staleness timeout in milliseconds\n  \
    TENURE_ELECTION__POLL_INTERVAL_MS  Poll interval in milliseconds\n  \
    RUST_LOG                        Log filter, overrides --debug and logging.level"
)]
pub struct Cli {
    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Read this configuration file after the discovered ones
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logical lock name shared by all contenders
    #[arg(long, global = true, value_name = "NAME")]
    pub lock_name: Option<String>,

    /// Shared directory holding the lock record
    #[arg(long, global = true, value_name = "DIR")]
    pub lock_dir: Option<PathBuf>,

    /// Age in milliseconds after which an unrefreshed lock is stale
    #[arg(long, global = true, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Delay in milliseconds between acquisition attempts
    #[arg(long, global = true, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Log filter used when RUST_LOG is unset, such as `info` or `tenure_lock=debug`
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Defaults to `run`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Compete for leadership until interrupted with Ctrl-C
    ///
    /// Logs every change between Active and Standby. On shutdown the lock is
    /// released so a standby process can take over immediately.
    Run,

    /// Show who currently holds the lock
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
