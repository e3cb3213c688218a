use serde::{Deserialize, Serialize};

/// A record the pipeline refused, with the reason. Rejection is per-record;
/// the batch keeps going.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub origin_path: String,
    pub reason: String,
}

/// What one batch run did. Every stage reports its counts here; warnings
/// collect anything non-fatal a human should see, including recomputation
/// disagreements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub records_in: usize,
    pub fragments_out: usize,
    pub rejected: Vec<RejectedRecord>,
    pub redaction_matches: usize,
    pub accepted_on_rules: usize,
    pub secondary_invoked: usize,
    pub secondary_failures: usize,
    pub review_entries: usize,
    pub contradiction_marks: usize,
    pub semantic_edges: usize,
    pub temporal_edges: usize,
    pub threads_formed: usize,
    pub threads_updated: usize,
    pub threads_dissolved: usize,
    pub eddies_formed: usize,
    pub eddies_updated: usize,
    pub eddies_dissolved: usize,
    pub paradoxes: usize,
    pub synchronicities: usize,
    pub warnings: Vec<String>,
    pub cancelled: bool,
    pub elapsed_ms: u64,
}
