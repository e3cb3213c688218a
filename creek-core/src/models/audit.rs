use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One redaction, recorded for later human review. Carries everything a
/// reviewer needs to locate the span and verify a restore candidate against
/// the salted hash, and nothing that reveals the matched text itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub fragment_id: String,
    pub origin_path: String,
    /// 1-based line of the match within the original text.
    pub line: usize,
    /// Byte offsets of the match within the original text.
    pub start: usize,
    pub end: usize,
    /// Name of the pattern rule that fired.
    pub rule: String,
    /// blake3 of salt followed by the matched text.
    pub salted_hash: String,
    pub at: DateTime<Utc>,
}
