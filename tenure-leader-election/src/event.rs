//! Leadership-changed notifications and the observer registry

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::error;

/// Observable election state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElectionState {
    /// Not the leader
    #[default]
    Standby,
    /// Holding the lock
    Active,
}

impl ElectionState {
    /// State for a held/not-held lock
    pub fn from_held(held: bool) -> Self {
        if held {
            Self::Active
        } else {
            Self::Standby
        }
    }

    /// Whether this is the leader state
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for ElectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standby => write!(f, "Standby"),
            Self::Active => write!(f, "Active"),
        }
    }
}

/// Delivered to observers whenever the held-state flips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderChanged {
    /// Whether this process is now the leader
    pub is_leader: bool,
}

impl LeaderChanged {
    /// State this event moves to
    pub fn state(&self) -> ElectionState {
        ElectionState::from_held(self.is_leader)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Arc<dyn Fn(&LeaderChanged) + Send + Sync>;

/// Ordered list of observer callbacks
#[derive(Default)]
pub(crate) struct Observers {
    next_id: AtomicU64,
    entries: Mutex<Vec<(SubscriptionId, Observer)>>,
}

impl Observers {
    pub(crate) fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&LeaderChanged) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock_entries().push((id, Arc::new(observer)));
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.lock_entries().len()
    }

    /// Invoke every observer in registration order
    ///
    /// The list is snapshotted first so observers may subscribe or unsubscribe
    /// from inside a callback. A panicking observer is logged and skipped.
    pub(crate) fn notify(&self, event: &LeaderChanged) {
        let snapshot: Vec<Observer> = self
            .lock_entries()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();

        for (index, observer) in snapshot.iter().enumerate() {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| observer(event))) {
                error!(
                    "Leadership observer #{} failed on {}: {}",
                    index,
                    event.state(),
                    panic_message(&*panic)
                );
            }
        }
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Observer)>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
