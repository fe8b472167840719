//! Persisted lock record

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{generate_instance_id, ActorIdentity};

/// Contents of a held lock, written wholesale on every successful acquisition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Process id of the holder
    pub owner_process_id: u32,
    /// Process name of the holder
    pub owner_process_name: String,
    /// When the holder last wrote the record
    pub acquired_at: DateTime<Utc>,
    /// `<host>:<uuid>`, fresh for every write
    pub owner_instance_id: String,
}

impl LockRecord {
    /// Build a record claiming the lock for `actor` at `now`
    pub fn claim(actor: &ActorIdentity, now: DateTime<Utc>) -> Self {
        Self {
            owner_process_id: actor.process_id,
            owner_process_name: actor.process_name.clone(),
            acquired_at: now,
            owner_instance_id: generate_instance_id(),
        }
    }

    /// Absolute age of the record relative to `now`
    ///
    /// A record stamped in the future by a skewed clock ages the same way
    /// as one stamped in the past.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.acquired_at).abs().to_std().unwrap_or(Duration::MAX)
    }

    /// Whether the record is older than `timeout`
    pub fn is_stale(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        self.age(now) > timeout
    }

    /// Decode a record
    ///
    /// A `null` document yields `Ok(None)`; missing fields are a decode error.
    pub fn decode(bytes: &[u8]) -> serde_json::Result<Option<Self>> {
        serde_json::from_slice(bytes)
    }

    /// Encode a record
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}
