//! `tenure status`

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tenure_config::TenureConfig;
use tenure_lock::{DistributedLock, FileLock, LockError};

use super::open_lock;

/// What the lock record currently says
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    /// No record
    Vacant,
    /// Held and refreshed within the timeout
    Live,
    /// Older than the timeout and free to claim
    Stale,
    /// Present but unreadable
    Unusable,
}

/// Snapshot printed by `tenure status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub lock: String,
    pub path: String,
    pub state: RecordState,
    pub timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<Holder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Holder {
    pub process_id: u32,
    pub process_name: String,
    pub instance_id: String,
    pub acquired_at: DateTime<Utc>,
    pub age_ms: u64,
}

/// Inspect the record without competing for it
pub fn inspect(lock: &FileLock) -> anyhow::Result<StatusReport> {
    let mut report = StatusReport {
        lock: lock.name().to_string(),
        path: lock.path().display().to_string(),
        state: RecordState::Vacant,
        timeout_ms: duration_ms(lock.timeout()),
        holder: None,
    };

    let record = match lock.read_record() {
        Ok(record) => record,
        Err(LockError::Record { .. }) => {
            report.state = RecordState::Unusable;
            return Ok(report);
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(record) = record {
        let now = lock.now();
        report.state = if record.is_stale(now, lock.timeout()) {
            RecordState::Stale
        } else {
            RecordState::Live
        };
        report.holder = Some(Holder {
            process_id: record.owner_process_id,
            age_ms: duration_ms(record.age(now)),
            process_name: record.owner_process_name,
            instance_id: record.owner_instance_id,
            acquired_at: record.acquired_at,
        });
    }
    Ok(report)
}

/// Human readable rendering
pub fn render(report: &StatusReport) -> String {
    let mut out = format!("{} ({})\n", report.lock, report.path);
    match (&report.state, &report.holder) {
        (RecordState::Vacant, _) => out.push_str("vacant\n"),
        (RecordState::Unusable, _) => out.push_str("unusable: record cannot be decoded\n"),
        (state, Some(holder)) => {
            let label = if *state == RecordState::Live { "live" } else { "stale" };
            out.push_str(&format!(
                "{}: held by {} (pid {}) on {}\n",
                label, holder.process_name, holder.process_id, holder.instance_id
            ));
            out.push_str(&format!(
                "acquired {} ({} ms ago, timeout {} ms)\n",
                holder.acquired_at.to_rfc3339(),
                holder.age_ms,
                report.timeout_ms
            ));
        }
        (_, None) => out.push_str("vacant\n"),
    }
    out
}

pub fn run_status(config: &TenureConfig, json: bool) -> anyhow::Result<()> {
    let lock = open_lock(config)?;
    let report = inspect(&lock)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render(&report));
    }
    Ok(())
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
