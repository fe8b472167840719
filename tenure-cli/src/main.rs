//! Tenure CLI - leader election between processes sharing a lock directory.
//!
//! Commands:
//! - `tenure run`: Compete for leadership until Ctrl-C (the default)
//! - `tenure status [--json]`: Show the current lock holder
//!
//! Exit codes:
//! - 0: Success
//! - 1: Configuration or runtime error

use clap::Parser;

use tenure::commands;
use tenure::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let exit_code = match commands::execute(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}
