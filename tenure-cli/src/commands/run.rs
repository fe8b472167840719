//! `tenure run`

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use tenure_config::TenureConfig;
use tenure_leader_election::{ElectionConfig, ElectionState, LeaderElectionService};
use tenure_lock::DistributedLock;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::open_lock;

/// Compete for leadership until Ctrl-C
pub async fn run_election(config: &TenureConfig) -> anyhow::Result<()> {
    run_until(config, async {
        signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl+C")
    })
    .await
}

/// Compete for leadership until `shutdown` resolves, then stop and release the lock
pub async fn run_until<F>(config: &TenureConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = anyhow::Result<()>>,
{
    let lock = Arc::new(open_lock(config)?);
    let election = ElectionConfig::new()
        .with_poll_interval(config.poll_interval())
        .with_acquire_timeout(config.acquire_timeout());
    let service = LeaderElectionService::new(lock.clone(), election)?;

    service.subscribe(|event| match event.state() {
        ElectionState::Active => info!("Active: this process is now the leader"),
        ElectionState::Standby => info!("Standby: leadership lost"),
    });

    info!(
        lock = %config.lock.name,
        path = %lock.path().display(),
        pid = lock.actor().process_id,
        "Joining election"
    );
    service.start()?;

    let waited = shutdown.await;

    info!("Shutting down");
    service.stop();
    service.stopped().await;
    lock.release(&CancellationToken::new())
        .await
        .context("Failed to release lock")?;
    info!(lock = %config.lock.name, "Left election");

    waited
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use tenure_lock::record_path;

    #[tokio::test]
    async fn test_run_until_leads_then_releases() {
        let dir = TempDir::new().unwrap();
        let mut config = TenureConfig::default();
        config.lock.name = "run/test".to_string();
        config.lock.directory = Some(dir.path().to_path_buf());
        config.lock.timeout_ms = 2_000;
        config.election.poll_interval_ms = 20;

        let path = record_path(dir.path(), "run/test");
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let runner = {
            let config = config.clone();
            tokio::spawn(async move {
                run_until(&config, async {
                    let _ = rx.await;
                    Ok(())
                })
                .await
            })
        };

        tokio::time::timeout(Duration::from_secs(5), async {
            while !path.exists() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        tx.send(()).unwrap();
        runner.await.unwrap().unwrap();
        assert!(!path.exists());
    }
}
