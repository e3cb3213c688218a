use serde::{Deserialize, Serialize};

use super::defaults;

/// Pattern detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// Minimum members before a group becomes a thread.
    pub thread_min_fragments: usize,
    /// Sliding window for thread grouping; also the dormancy horizon.
    pub thread_window_hours: i64,
    /// Minimum members before a component becomes an eddy.
    pub eddy_min_fragments: usize,
    /// Similarity floor for synchronicity, stricter than the linking
    /// threshold.
    pub synchronicity_threshold: f64,
    /// Minimum gap between a synchronistic pair.
    pub synchronicity_min_gap_days: i64,
    /// Both sides of a paradox must be at or above this confidence.
    pub paradox_confidence_floor: f64,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            thread_min_fragments: defaults::DEFAULT_THREAD_MIN_FRAGMENTS,
            thread_window_hours: defaults::DEFAULT_THREAD_WINDOW_HOURS,
            eddy_min_fragments: defaults::DEFAULT_EDDY_MIN_FRAGMENTS,
            synchronicity_threshold: defaults::DEFAULT_SYNCHRONICITY_THRESHOLD,
            synchronicity_min_gap_days: defaults::DEFAULT_SYNCHRONICITY_MIN_GAP_DAYS,
            paradox_confidence_floor: defaults::DEFAULT_PARADOX_FLOOR,
        }
    }
}
