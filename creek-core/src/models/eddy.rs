use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::RECORD_ID_HEX_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EddyStatus {
    Active,
    Dissolved,
}

/// A gravity well: a connected component of semantic resonance that pulled
/// in enough fragments, regardless of when they were written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Eddy {
    /// Deterministic identifier derived from founding membership.
    pub id: String,
    pub title: String,
    pub status: EddyStatus,
    pub formed: DateTime<Utc>,
    /// Member fragment ids, ascending by id.
    pub members: Vec<String>,
}

impl Eddy {
    pub fn derive_id(founding_members: &[String]) -> String {
        let mut sorted: Vec<&str> = founding_members.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        let mut hasher = blake3::Hasher::new();
        for member in sorted {
            hasher.update(member.as_bytes());
            hasher.update(&[0x1f]);
        }
        let hex = hasher.finalize().to_hex();
        format!("eddy-{}", &hex[..RECORD_ID_HEX_LEN])
    }

    pub fn contains(&self, fragment_id: &str) -> bool {
        self.members.iter().any(|m| m == fragment_id)
    }
}

impl PartialEq for Eddy {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
