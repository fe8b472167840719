//! Polling leader election service
//!
//! A single task acquires the lock, sleeps for the poll interval, and repeats. The next
//! poll is only scheduled once the previous one has finished, so polls never overlap even
//! when an acquisition takes longer than the interval.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use tenure_lock::DistributedLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::error::{ElectionError, Result};
use crate::event::{ElectionState, LeaderChanged, Observers, SubscriptionId};

/// Default delay between the end of one poll and the start of the next
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Election tuning
///
/// Keep `poll_interval` well below the lock timeout so a live leader refreshes its
/// record before peers consider it stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionConfig {
    poll_interval: Duration,
    acquire_timeout: Option<Duration>,
}

impl ElectionConfig {
    /// Default configuration: 5 second polls, unbounded acquisition
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            acquire_timeout: None,
        }
    }

    /// Set the delay between polls
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Bound each acquisition attempt
    ///
    /// Without a bound a hung storage layer stalls the poll loop indefinitely.
    /// An attempt that exceeds the bound counts as a failed attempt.
    pub fn with_acquire_timeout(mut self, acquire_timeout: Option<Duration>) -> Self {
        self.acquire_timeout = acquire_timeout;
        self
    }

    /// Delay between polls
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Per-attempt bound, if any
    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout
    }
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self::new()
    }
}

struct Shared {
    lock: Arc<dyn DistributedLock>,
    config: ElectionConfig,
    last_known_held: AtomicBool,
    poll_step: tokio::sync::Mutex<()>,
    observers: Observers,
    cancellation: CancellationToken,
}

impl Shared {
    async fn poll(&self) -> bool {
        let _step = self.poll_step.lock().await;

        self.attempt_acquire().await;

        // `is_held` rather than the return value: a reacquire-in-place also counts.
        let held = self.lock.is_held();
        debug!(
            "Lock '{}' status is ({})",
            self.lock.name(),
            ElectionState::from_held(held)
        );
        self.transition(held);
        held
    }

    async fn attempt_acquire(&self) {
        let attempt = AssertUnwindSafe(self.lock.acquire(&self.cancellation)).catch_unwind();

        let outcome = match self.config.acquire_timeout {
            Some(limit) => match tokio::time::timeout(limit, attempt).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(
                        "Acquiring lock '{}' exceeded {:?}; treating as not acquired",
                        self.lock.name(),
                        limit
                    );
                    return;
                }
            },
            None => attempt.await,
        };

        match outcome {
            Ok(Ok(acquired)) => trace!("Acquire of '{}' returned {}", self.lock.name(), acquired),
            Ok(Err(e)) => warn!("Acquiring lock '{}' failed: {}", self.lock.name(), e),
            Err(_) => warn!("Acquiring lock '{}' panicked", self.lock.name()),
        }
    }

    fn transition(&self, held: bool) {
        if self.last_known_held.swap(held, Ordering::SeqCst) == held {
            return;
        }

        let event = LeaderChanged { is_leader: held };
        info!(
            "Leadership of '{}' changed to {}",
            self.lock.name(),
            event.state()
        );
        self.observers.notify(&event);
    }

    async fn run(self: Arc<Self>) {
        loop {
            if self.cancellation.is_cancelled() {
                break;
            }

            self.poll().await;

            tokio::select! {
                _ = self.cancellation.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
        debug!("Election loop for '{}' stopped", self.lock.name());
    }
}

/// Leader election over a [`DistributedLock`]
///
/// Starts in `Standby`. Observers are told about every change of the held-state,
/// synchronously on the polling task, in registration order.
pub struct LeaderElectionService {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LeaderElectionService {
    /// Create a service for `lock`
    pub fn new(lock: Arc<dyn DistributedLock>, config: ElectionConfig) -> Result<Self> {
        if lock.name().is_empty() {
            return Err(ElectionError::EmptyLockName);
        }
        if config.poll_interval.is_zero() {
            return Err(ElectionError::InvalidPollInterval);
        }

        Ok(Self {
            shared: Arc::new(Shared {
                lock,
                config,
                last_known_held: AtomicBool::new(false),
                poll_step: tokio::sync::Mutex::new(()),
                observers: Observers::default(),
                cancellation: CancellationToken::new(),
            }),
            task: Mutex::new(None),
        })
    }

    /// Register an observer for leadership changes
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&LeaderChanged) + Send + Sync + 'static,
    {
        self.shared.observers.subscribe(observer)
    }

    /// Remove an observer; returns whether it was registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.observers.unsubscribe(id)
    }

    /// Start polling on the current tokio runtime
    ///
    /// The first poll runs immediately.
    pub fn start(&self) -> Result<()> {
        if self.shared.cancellation.is_cancelled() {
            return Err(ElectionError::Stopped);
        }

        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if task.is_some() {
            return Err(ElectionError::AlreadyStarted);
        }

        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ElectionError::NoRuntime)?;
        *task = Some(runtime.spawn(self.shared.clone().run()));

        info!(
            "Started leader election for '{}' (poll every {:?})",
            self.shared.lock.name(),
            self.shared.config.poll_interval
        );
        Ok(())
    }

    /// Ask the polling loop to exit
    ///
    /// An in-flight poll completes; no further poll is scheduled.
    pub fn stop(&self) {
        if !self.shared.cancellation.is_cancelled() {
            info!("Stopping leader election for '{}'", self.shared.lock.name());
            self.shared.cancellation.cancel();
        }
    }

    /// Wait for the polling loop to exit after `stop`
    pub async fn stopped(&self) {
        let handle = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Election loop ended abnormally: {}", e);
            }
        }
    }

    /// Run one poll step: acquire, read the held-state, notify on change
    ///
    /// Returns the held-state observed by this step. Steps never overlap with
    /// each other or with the background loop.
    pub async fn poll(&self) -> bool {
        self.shared.poll().await
    }

    /// Last notified leadership
    pub fn is_leader(&self) -> bool {
        self.shared.last_known_held.load(Ordering::SeqCst)
    }

    /// Last notified state
    pub fn state(&self) -> ElectionState {
        ElectionState::from_held(self.is_leader())
    }

    /// The lock this service competes for
    pub fn lock(&self) -> &Arc<dyn DistributedLock> {
        &self.shared.lock
    }

    /// Election configuration
    pub fn config(&self) -> &ElectionConfig {
        &self.shared.config
    }
}

impl Drop for LeaderElectionService {
    fn drop(&mut self) {
        self.shared.cancellation.cancel();
    }
}
