//! Polling leader election built on a TTL lock.
//!
//! A process competes for leadership by repeatedly acquiring a [`DistributedLock`].
//! Whenever the held-state observed after a poll differs from the last one, every
//! registered observer receives a [`LeaderChanged`] event.
//!
//! # Overview
//!
//! - **Polling, not leases**: the lock has no keep-alive; the leader stays leader by
//!   refreshing its record on every poll
//! - **Non-overlapping**: each poll is scheduled only after the previous one finished
//! - **Debounced**: observers hear about changes only, starting from `Standby`
//! - **Isolated failures**: acquisition errors and panicking observers are logged and
//!   never stop the loop
//!
//! Loss of leadership is detected at the next poll, and a crashed leader's lock can
//! only be reclaimed once the lock timeout has elapsed. Keep the poll interval well
//! below the lock timeout (5 s against 10 s by default).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tenure_leader_election::{ElectionConfig, LeaderElectionService};
//! use tenure_lock::{FileLock, LockConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let lock = FileLock::create("services/leader", LockConfig::new(Duration::from_secs(10)))?;
//! let service = LeaderElectionService::new(Arc::new(lock), ElectionConfig::default())?;
//!
//! service.subscribe(|event| {
//!     println!("{}", event.state());
//! });
//! service.start()?;
//!
//! // ... later
//! service.stop();
//! service.stopped().await;
//! # Ok(())
//! # }
//! ```

mod election;
mod error;
mod event;

pub use election::{ElectionConfig, LeaderElectionService, DEFAULT_POLL_INTERVAL};
pub use error::{ElectionError, Result};
pub use event::{ElectionState, LeaderChanged, SubscriptionId};
pub use tenure_lock::DistributedLock;
