pub mod classify_config;
pub mod defaults;
pub mod detect_config;
pub mod embedding_config;
pub mod linking_config;
pub mod redaction_config;

pub use classify_config::{ClassifyConfig, SecondaryConfig};
pub use detect_config::DetectConfig;
pub use embedding_config::EmbeddingConfig;
pub use linking_config::{LinkingConfig, SimilarityMetric};
pub use redaction_config::{CustomPattern, RedactionConfig};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{ConfigError, CreekResult};
use crate::taxonomy::TaxonomySchema;

/// Pipeline execution knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run the scan and classify stages on the rayon pool. Off means
    /// strictly sequential, useful for debugging ordering questions.
    pub parallel: bool,
    /// Recompute the edge set after each batch and surface any disagreement
    /// with the live graph as a report warning. Costs a full relink per
    /// batch, so off by default.
    pub verify_links: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            verify_links: false,
        }
    }
}

/// The whole configuration surface. Immutable once loaded; every stage
/// receives it (or its section) explicitly at construction. No global
/// registry, no mid-run mutation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreekConfig {
    pub redaction: RedactionConfig,
    pub taxonomy: TaxonomySchema,
    pub classify: ClassifyConfig,
    pub embedding: EmbeddingConfig,
    pub linking: LinkingConfig,
    pub detect: DetectConfig,
    pub pipeline: PipelineConfig,
}

impl CreekConfig {
    /// Load from a TOML file and validate. A missing section falls back to
    /// its default; a value that fails validation is fatal.
    pub fn load(path: &Path) -> CreekResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> CreekResult<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Structural validation. Called by `load`; call it directly when
    /// building a config in code.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.taxonomy.validate()?;

        for (name, value) in [
            ("classify.accept_threshold", self.classify.accept_threshold),
            ("classify.dual_margin", self.classify.dual_margin),
            (
                "classify.contradiction_floor",
                self.classify.contradiction_floor,
            ),
            (
                "linking.similarity_threshold",
                self.linking.similarity_threshold,
            ),
            (
                "detect.synchronicity_threshold",
                self.detect.synchronicity_threshold,
            ),
            (
                "detect.paradox_confidence_floor",
                self.detect.paradox_confidence_floor,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold {
                    name: name.to_string(),
                    value,
                });
            }
        }

        if self.classify.confidence_saturation <= 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "classify.confidence_saturation".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.classify.secondary.max_in_flight == 0 {
            return Err(ConfigError::InvalidValue {
                name: "classify.secondary.max_in_flight".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.embedding.dimensions == 0 {
            return Err(ConfigError::InvalidValue {
                name: "embedding.dimensions".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.linking.temporal_window_hours < 1 {
            return Err(ConfigError::InvalidValue {
                name: "linking.temporal_window_hours".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.detect.thread_window_hours < 1 {
            return Err(ConfigError::InvalidValue {
                name: "detect.thread_window_hours".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.detect.thread_min_fragments < 2 {
            return Err(ConfigError::InvalidValue {
                name: "detect.thread_min_fragments".to_string(),
                message: "must be at least 2".to_string(),
            });
        }
        if self.detect.eddy_min_fragments < 2 {
            return Err(ConfigError::InvalidValue {
                name: "detect.eddy_min_fragments".to_string(),
                message: "must be at least 2".to_string(),
            });
        }
        if self.detect.synchronicity_min_gap_days < 1 {
            return Err(ConfigError::InvalidValue {
                name: "detect.synchronicity_min_gap_days".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        // Synchronicity is defined as a stricter cut than ordinary linking.
        if self.detect.synchronicity_threshold < self.linking.similarity_threshold {
            return Err(ConfigError::InvalidValue {
                name: "detect.synchronicity_threshold".to_string(),
                message: format!(
                    "must not be below linking.similarity_threshold ({})",
                    self.linking.similarity_threshold
                ),
            });
        }
        for pattern in &self.redaction.custom_patterns {
            if pattern.name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    name: "redaction.custom_patterns".to_string(),
                    message: "pattern name must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}
