//! TTL lock backed by a JSON record file in a shared directory
//!
//! There is no keep-alive. A holder refreshes its record by acquiring again, and
//! competitors judge staleness purely by the age of the record at the moment they
//! look. Two processes writing a fresh record at the same instant can both believe
//! they won; the last rename wins. Cross-machine safety holds only when the lock
//! directory is a shared filesystem with atomic rename.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{LockError, Result};
use crate::identity::{sanitize_lock_name, ActorIdentity};
use crate::record::LockRecord;
use crate::DistributedLock;

/// Extension appended to the sanitized lock name
const RECORD_EXTENSION: &str = "lock";

/// Windows `ERROR_SHARING_VIOLATION`
const ERROR_SHARING_VIOLATION: i32 = 32;
/// Windows `ERROR_LOCK_VIOLATION`
const ERROR_LOCK_VIOLATION: i32 = 33;

/// Construction options for a [`FileLock`]
#[derive(Clone)]
pub struct LockConfig {
    timeout: Duration,
    directory: PathBuf,
    actor: ActorIdentity,
    clock: Arc<dyn Clock>,
}

impl LockConfig {
    /// Options with the given staleness timeout, the system temp directory,
    /// the current process as actor and the system clock
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            directory: std::env::temp_dir(),
            actor: ActorIdentity::current(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Directory shared by every cooperating process
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Identity written into records and compared for ownership
    pub fn with_actor(mut self, actor: ActorIdentity) -> Self {
        self.actor = actor;
        self
    }

    /// Clock used to stamp and age records
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl std::fmt::Debug for LockConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockConfig")
            .field("timeout", &self.timeout)
            .field("directory", &self.directory)
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}

/// What was found at the record path
#[derive(Debug)]
enum Inspection {
    /// No record file
    Vacant,
    /// A file exists but holds no usable record
    Unusable,
    /// Another actor has exclusive access at the storage layer
    Contended,
    /// A decoded record
    Record(LockRecord),
}

/// A named TTL lock persisted as `<directory>/<sanitized name>.lock`
///
/// All operations on one handle run one at a time behind an async mutex. Their
/// filesystem work runs on the blocking pool while that mutex is held, so a caller
/// can abandon a hung operation (through `tokio::time::timeout`, say) and the next
/// operation still waits for it instead of overlapping it.
pub struct FileLock {
    state: Arc<LockState>,
    guard: Arc<Mutex<()>>,
}

/// Everything the blocking critical sections touch
struct LockState {
    name: String,
    timeout: Duration,
    path: PathBuf,
    actor: ActorIdentity,
    clock: Arc<dyn Clock>,
    held: AtomicBool,
}

impl FileLock {
    /// Create a handle for `name`
    ///
    /// Nothing is written until the first `acquire`.
    pub fn create(name: impl Into<String>, config: LockConfig) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(LockError::EmptyName);
        }

        let path = record_path(&config.directory, &name);
        debug!("Lock '{}' uses record {}", name, path.display());

        Ok(Self {
            state: Arc::new(LockState {
                name,
                timeout: config.timeout,
                path,
                actor: config.actor,
                clock: config.clock,
                held: AtomicBool::new(false),
            }),
            guard: Arc::new(Mutex::new(())),
        })
    }

    /// Staleness timeout
    pub fn timeout(&self) -> Duration {
        self.state.timeout
    }

    /// Path of the record file
    pub fn path(&self) -> &Path {
        &self.state.path
    }

    /// Identity this handle acquires as
    pub fn actor(&self) -> &ActorIdentity {
        &self.state.actor
    }

    /// Read the current record without taking part in the protocol
    ///
    /// Unlike `acquire`, storage and decode failures are reported.
    pub fn read_record(&self) -> Result<Option<LockRecord>> {
        let path = &self.state.path;
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LockError::io(path, e)),
        };
        LockRecord::decode(&bytes).map_err(|e| LockError::record(path, e))
    }

    /// Current time according to this handle's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.state.clock.now()
    }

    /// Wait for the serialization guard unless cancelled first
    async fn enter(&self, cancel: &CancellationToken) -> Option<OwnedMutexGuard<()>> {
        if cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            guard = self.guard.clone().lock_owned() => {
                trace!("Entered guard for lock '{}'", self.state.name);
                Some(guard)
            }
        }
    }

    /// Run `section` on the blocking pool, releasing `guard` only when it returns
    async fn critical<T, F>(&self, guard: OwnedMutexGuard<()>, section: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&LockState) -> T + Send + 'static,
    {
        let state = self.state.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            section(&state)
        })
        .await
        .map_err(|e| {
            LockError::other(format!(
                "Lock '{}' storage task failed: {}",
                self.state.name, e
            ))
        })
    }
}

impl LockState {
    fn inspect(&self) -> Inspection {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Inspection::Vacant,
            Err(e) if is_sharing_violation(&e) => return Inspection::Contended,
            Err(e) => {
                warn!(
                    "Cannot open lock record {}: {}; treating as absent",
                    self.path.display(),
                    e
                );
                return Inspection::Unusable;
            }
        };

        // A writer that holds an exclusive advisory lock must not be clobbered.
        if let Err(e) = fs2::FileExt::try_lock_shared(&file) {
            if is_sharing_violation(&e) {
                return Inspection::Contended;
            }
            trace!("Advisory locking unavailable for {}: {}", self.path.display(), e);
        }

        let mut bytes = Vec::new();
        if let Err(e) = file.read_to_end(&mut bytes) {
            if is_sharing_violation(&e) {
                return Inspection::Contended;
            }
            warn!(
                "Cannot read lock record {}: {}; treating as absent",
                self.path.display(),
                e
            );
            return Inspection::Unusable;
        }

        match LockRecord::decode(&bytes) {
            Ok(Some(record)) => Inspection::Record(record),
            Ok(None) => Inspection::Unusable,
            Err(e) => {
                warn!(
                    "Corrupt lock record {}: {}; treating as absent",
                    self.path.display(),
                    e
                );
                Inspection::Unusable
            }
        }
    }

    /// Whether the acquire check would let this actor claim the lock now
    fn may_claim(&self, inspection: &Inspection, now: DateTime<Utc>) -> bool {
        match inspection {
            Inspection::Vacant | Inspection::Unusable => true,
            Inspection::Contended => false,
            Inspection::Record(record) => {
                self.actor.owns(record.owner_process_id) || record.is_stale(now, self.timeout)
            }
        }
    }

    /// Persist a fresh record, replacing any previous one in a single rename
    fn write_record(&self, now: DateTime<Utc>) -> io::Result<()> {
        let directory = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(directory)?;

        let record = LockRecord::claim(&self.actor, now);
        let bytes = record.encode().map_err(io::Error::other)?;

        let mut staged = NamedTempFile::new_in(directory)?;
        staged.write_all(&bytes)?;
        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove_record(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed lock record {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove lock record {}: {}",
                self.path.display(),
                e
            ),
        }
    }

    fn try_acquire(&self) -> bool {
        let now = self.clock.now();
        let inspection = self.inspect();
        match &inspection {
            Inspection::Vacant => debug!("Lock '{}' is vacant", self.name),
            Inspection::Unusable => debug!("Lock '{}' has no usable record", self.name),
            Inspection::Contended => debug!("Lock '{}' is contended", self.name),
            Inspection::Record(record) if self.actor.owns(record.owner_process_id) => {
                debug!("Reacquiring lock '{}' in place", self.name)
            }
            Inspection::Record(record) if record.is_stale(now, self.timeout) => debug!(
                "Taking over stale lock '{}' from pid {} (age {:?})",
                self.name,
                record.owner_process_id,
                record.age(now)
            ),
            Inspection::Record(record) => debug!(
                "Lock '{}' is held by pid {} ({})",
                self.name, record.owner_process_id, record.owner_instance_id
            ),
        }

        if !self.may_claim(&inspection, now) {
            self.held.store(false, Ordering::SeqCst);
            return false;
        }

        match self.write_record(now) {
            Ok(()) => {
                self.held.store(true, Ordering::SeqCst);
                true
            }
            Err(e) => {
                // An unwritten refresh proves nothing; a healthy peer may take over.
                warn!(
                    "Failed to write lock record {}: {}",
                    self.path.display(),
                    e
                );
                self.held.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    fn release_record(&self) {
        let inspection = self.inspect();
        if self.may_claim(&inspection, self.clock.now()) {
            if !matches!(inspection, Inspection::Vacant) {
                self.remove_record();
            }
        } else {
            debug!(
                "Lock '{}' now belongs to another actor; leaving its record",
                self.name
            );
        }
        self.held.store(false, Ordering::SeqCst);
    }

    fn destroy_record(&self) {
        debug!("Destroying lock '{}'", self.name);
        self.remove_record();
        self.held.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl DistributedLock for FileLock {
    fn name(&self) -> &str {
        &self.state.name
    }

    fn is_held(&self) -> bool {
        self.state.held.load(Ordering::SeqCst)
    }

    /// Storage faults degrade to a fresh write or to `false`; `Err` only reports a
    /// storage task that died.
    async fn acquire(&self, cancel: &CancellationToken) -> Result<bool> {
        let Some(guard) = self.enter(cancel).await else {
            debug!("Acquire of '{}' cancelled", self.state.name);
            return Ok(false);
        };
        self.critical(guard, LockState::try_acquire).await
    }

    async fn release(&self, cancel: &CancellationToken) -> Result<()> {
        let Some(guard) = self.enter(cancel).await else {
            return Ok(());
        };

        if !self.is_held() {
            trace!("Release of '{}' skipped: not held", self.state.name);
            return Ok(());
        }
        self.critical(guard, LockState::release_record).await
    }

    async fn destroy(&self, cancel: &CancellationToken) -> Result<()> {
        let Some(guard) = self.enter(cancel).await else {
            return Ok(());
        };
        self.critical(guard, LockState::destroy_record).await
    }
}

impl std::fmt::Debug for FileLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLock")
            .field("name", &self.state.name)
            .field("timeout", &self.state.timeout)
            .field("path", &self.state.path)
            .field("actor", &self.state.actor)
            .field("held", &self.is_held())
            .finish()
    }
}

/// Deterministic record location for a lock name
pub fn record_path(directory: &Path, name: &str) -> PathBuf {
    directory.join(format!("{}.{}", sanitize_lock_name(name), RECORD_EXTENSION))
}

fn is_sharing_violation(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }
    cfg!(windows)
        && matches!(
            err.raw_os_error(),
            Some(ERROR_SHARING_VIOLATION) | Some(ERROR_LOCK_VIOLATION)
        )
}
