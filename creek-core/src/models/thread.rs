use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::RECORD_ID_HEX_LEN;

/// Lifecycle of a thread. Resolved is reachable only through an explicit
/// external action; Dissolved only when re-detection finds the membership
/// minimum no longer met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    Active,
    Dormant,
    Resolved,
    Dissolved,
}

/// A recurring topic: fragments that kept resonating inside a sliding
/// temporal window, ordered by creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    /// Deterministic identifier derived from founding membership.
    pub id: String,
    pub title: String,
    pub status: ThreadStatus,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Member fragment ids, ascending by creation time.
    pub members: Vec<String>,
    /// Dominant (dimension, label) pairs across members.
    pub label_affinity: Vec<(String, String)>,
}

impl Thread {
    /// Identifier over the founding membership. Detection keys groups back
    /// to prior records by member overlap, so growth never re-keys a thread.
    pub fn derive_id(founding_members: &[String]) -> String {
        let mut sorted: Vec<&str> = founding_members.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        let mut hasher = blake3::Hasher::new();
        for member in sorted {
            hasher.update(member.as_bytes());
            hasher.update(&[0x1f]);
        }
        let hex = hasher.finalize().to_hex();
        format!("thread-{}", &hex[..RECORD_ID_HEX_LEN])
    }

    pub fn contains(&self, fragment_id: &str) -> bool {
        self.members.iter().any(|m| m == fragment_id)
    }

    pub fn is_active(&self) -> bool {
        self.status == ThreadStatus::Active
    }

    /// Close a thread by hand. The detector never calls this.
    pub fn resolve(&mut self) {
        self.status = ThreadStatus::Resolved;
    }
}

impl PartialEq for Thread {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
