//! Actor identity and lock-name sanitization

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Characters that cannot appear in a file name on any supported platform,
/// plus a trailing run of dots which Windows silently strips.
static INVALID_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([<>:"/\\|?*\x00-\x1F]*\.+$)|([<>:"/\\|?*\x00-\x1F]+)"#)
        .expect("file name pattern is valid")
});

/// Replacement used for every run of illegal characters
const PLACEHOLDER: &str = "_";

/// Map a logical lock name onto a safe file name
///
/// Each run of illegal characters becomes a single `_`, as does a trailing run of dots.
/// `"services/leader"` becomes `"services_leader"`.
pub fn sanitize_lock_name(name: &str) -> String {
    INVALID_FILE_NAME.replace_all(name, PLACEHOLDER).into_owned()
}

/// The actor that competes for a lock
///
/// Ownership of a lock record is decided by `process_id` alone. Tests give two
/// handles different ids to simulate two processes inside one test binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorIdentity {
    /// Process id recorded as the owner
    pub process_id: u32,
    /// Human-readable process name recorded alongside the id
    pub process_name: String,
}

impl ActorIdentity {
    /// Create an identity with explicit values
    pub fn new(process_id: u32, process_name: impl Into<String>) -> Self {
        Self {
            process_id,
            process_name: process_name.into(),
        }
    }

    /// Identity of the running OS process
    pub fn current() -> Self {
        let process_name = std::env::current_exe()
            .ok()
            .and_then(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            process_id: std::process::id(),
            process_name,
        }
    }

    /// Whether this actor owns a record written with `process_id`
    pub fn owns(&self, process_id: u32) -> bool {
        self.process_id == process_id
    }
}

impl Default for ActorIdentity {
    fn default() -> Self {
        Self::current()
    }
}

/// Generate a globally unique owner-instance id: `<host>:<uuid>`
///
/// Falls back to the bare UUID when the host name cannot be determined.
pub fn generate_instance_id() -> String {
    let token = uuid::Uuid::new_v4().to_string();
    match host_name() {
        Some(host) => format!("{}:{}", host.to_lowercase(), token),
        None => token,
    }
}

fn host_name() -> Option<String> {
    sysinfo::System::host_name()
        .or_else(|| std::env::var("HOSTNAME").ok())
        .or_else(|| std::env::var("COMPUTERNAME").ok())
        .filter(|name| !name.trim().is_empty())
}
