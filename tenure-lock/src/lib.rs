//! TTL-based mutual exclusion over a shared lock record.
//!
//! A lock is a named record holding the owner's identity and the time it was last
//! written. Acquiring succeeds when the record is absent, unusable, already ours, or
//! older than the lock timeout. There is no background renewal: the holder keeps the
//! lock by acquiring again before the timeout elapses.
//!
//! # Guarantees
//!
//! This is not a consensus protocol. Within one process, operations on a handle are
//! serialized. Across processes the only coordination is the record itself, with
//! last-writer-wins semantics; two actors racing on a vacant or stale record can both
//! observe success. Sharing a lock across machines is only meaningful when the lock
//! directory is a shared filesystem with atomic rename.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tenure_lock::{DistributedLock, FileLock, LockConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> tenure_lock::Result<()> {
//! let lock = FileLock::create("services/leader", LockConfig::new(Duration::from_secs(10)))?;
//! let cancel = CancellationToken::new();
//!
//! if lock.acquire(&cancel).await? {
//!     // refresh well before the timeout to stay the holder
//!     lock.release(&cancel).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod clock;
mod error;
mod file_lock;
mod identity;
mod record;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{LockError, Result};
pub use file_lock::{record_path, FileLock, LockConfig};
pub use identity::{generate_instance_id, sanitize_lock_name, ActorIdentity};
pub use record::LockRecord;

/// Capability set of a TTL lock
///
/// Any backend (file, database row, key-value entry) that can answer these calls
/// can drive leader election.
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Logical lock name
    fn name(&self) -> &str;

    /// Whether this handle last saw itself as the holder
    ///
    /// Becomes `true` only after a successful write of this actor's record. It says
    /// nothing about whether the record still exists at any later instant.
    fn is_held(&self) -> bool;

    /// Try to take or refresh the lock
    ///
    /// `Ok(false)` means the lock is busy or the attempt was cancelled.
    async fn acquire(&self, cancel: &CancellationToken) -> Result<bool>;

    /// Give up the lock if this actor can still prove ownership
    async fn release(&self, cancel: &CancellationToken) -> Result<()>;

    /// Forced cleanup of the persisted lock
    async fn destroy(&self, cancel: &CancellationToken) -> Result<()>;
}
