use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::RECORD_ID_HEX_LEN;

/// The same idea surfacing in unrelated places: two fragments from
/// different platforms, far apart in time, nearly identical in meaning, and
/// not already travelling together in an active thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynchronicityRecord {
    pub id: String,
    /// Endpoint fragment ids, ascending.
    pub a: String,
    pub b: String,
    pub similarity: f64,
    pub gap_days: i64,
    pub noted_at: DateTime<Utc>,
}

impl SynchronicityRecord {
    pub fn new(
        x: impl Into<String>,
        y: impl Into<String>,
        similarity: f64,
        gap_days: i64,
        noted_at: DateTime<Utc>,
    ) -> Self {
        let (x, y) = (x.into(), y.into());
        let (a, b) = if x <= y { (x, y) } else { (y, x) };
        let mut hasher = blake3::Hasher::new();
        hasher.update(a.as_bytes());
        hasher.update(&[0x1f]);
        hasher.update(b.as_bytes());
        let hex = hasher.finalize().to_hex();
        Self {
            id: format!("sync-{}", &hex[..RECORD_ID_HEX_LEN]),
            a,
            b,
            similarity,
            gap_days,
            noted_at,
        }
    }
}

impl PartialEq for SynchronicityRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
