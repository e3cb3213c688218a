use serde::{Deserialize, Serialize};

use super::defaults;
use crate::fragment::{AggregateMode, SourcePlatform};

/// Secondary-pass dispatch limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryConfig {
    pub enabled: bool,
    /// Per-call deadline. A call past this counts as a failure.
    pub timeout_ms: u64,
    /// Maximum concurrent secondary calls.
    pub max_in_flight: usize,
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: defaults::DEFAULT_SECONDARY_TIMEOUT_MS,
            max_in_flight: defaults::DEFAULT_SECONDARY_MAX_IN_FLIGHT,
        }
    }
}

/// Classifier and router configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Aggregate confidence at or above this accepts the rule vector
    /// without a secondary pass.
    pub accept_threshold: f64,
    pub aggregate: AggregateMode,
    /// Density score at which confidence saturates to 1.0.
    pub confidence_saturation: f64,
    /// A runner-up within this fraction of the top score produces a dual
    /// reading (dual-capable dimensions only).
    pub dual_margin: f64,
    /// Both passes at or above this with different labels on one dimension
    /// is a contradiction, marked instead of resolved.
    pub contradiction_floor: f64,
    /// Platforms eligible for the secondary pass.
    pub auto_classify_sources: Vec<SourcePlatform>,
    /// Platforms always queued for human review.
    pub always_review_sources: Vec<SourcePlatform>,
    pub secondary: SecondaryConfig,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            accept_threshold: defaults::DEFAULT_ACCEPT_THRESHOLD,
            aggregate: AggregateMode::Min,
            confidence_saturation: defaults::DEFAULT_CONFIDENCE_SATURATION,
            dual_margin: defaults::DEFAULT_DUAL_MARGIN,
            contradiction_floor: defaults::DEFAULT_CONTRADICTION_FLOOR,
            auto_classify_sources: vec![
                SourcePlatform::Claude,
                SourcePlatform::Chatgpt,
                SourcePlatform::Discord,
            ],
            always_review_sources: vec![SourcePlatform::Journal],
            secondary: SecondaryConfig::default(),
        }
    }
}
