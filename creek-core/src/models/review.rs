use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a fragment was queued for a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewReason {
    /// The source platform is configured for unconditional review.
    AlwaysReviewSource,
    /// The secondary pass was needed but failed or timed out.
    SecondaryFailed,
    /// The two passes disagreed strongly on at least one dimension.
    Contradiction,
}

/// A review queue entry. The queue is a plain value the router returns,
/// not shared state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub fragment_id: String,
    pub reason: ReviewReason,
    pub noted_at: DateTime<Utc>,
}
