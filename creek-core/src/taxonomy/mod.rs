pub mod defaults;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::ConfigError;

/// How signal terms are located in fragment text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Case-insensitive substring match. Catches inflections ("drive" in
    /// "driven") at the cost of occasional over-matching.
    #[default]
    Substring,
    /// Match only at word boundaries.
    WholeWord,
}

/// One dimension of the taxonomy, declared as data. Adding a dimension is a
/// schema change, not a classifier change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSchema {
    pub name: String,
    /// Known labels. For open-set dimensions these are seeds, not bounds.
    pub labels: Vec<String>,
    /// Open-set dimensions accept labels beyond `labels` from the secondary
    /// pass; the rule pass only ever scores the seeded signal table.
    #[serde(default)]
    pub open_set: bool,
    /// Signal vocabulary per label. A label with no signals is invisible to
    /// the rule pass and can only arrive via the secondary pass.
    #[serde(default)]
    pub signals: BTreeMap<String, Vec<String>>,
    /// Minimum density score for a primary reading.
    #[serde(default = "defaults::primary_floor")]
    pub primary_floor: f64,
    /// Minimum density score for a secondary label.
    #[serde(default = "defaults::secondary_floor")]
    pub secondary_floor: f64,
    /// Whether a close runner-up produces a dual reading instead of being
    /// demoted to secondary.
    #[serde(default)]
    pub dual_reading: bool,
    #[serde(default)]
    pub match_mode: MatchMode,
}

impl DimensionSchema {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// The full taxonomy: every dimension the classifier scores and the router
/// gates on. Defaults to the nine-dimension archive taxonomy; loadable from
/// configuration to add or replace dimensions without code changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomySchema {
    pub dimensions: BTreeMap<String, DimensionSchema>,
}

impl TaxonomySchema {
    pub fn dimension(&self, name: &str) -> Option<&DimensionSchema> {
        self.dimensions.get(name)
    }

    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    /// Structural checks, fatal at configuration load.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dimensions.is_empty() {
            return Err(ConfigError::InvalidTaxonomy {
                message: "taxonomy has no dimensions".to_string(),
            });
        }
        for (key, dim) in &self.dimensions {
            if key != &dim.name {
                return Err(ConfigError::InvalidTaxonomy {
                    message: format!("dimension key '{key}' does not match name '{}'", dim.name),
                });
            }
            if dim.labels.is_empty() {
                return Err(ConfigError::InvalidTaxonomy {
                    message: format!("dimension '{key}' has no labels"),
                });
            }
            let mut seen = std::collections::BTreeSet::new();
            for label in &dim.labels {
                if !seen.insert(label.as_str()) {
                    return Err(ConfigError::InvalidTaxonomy {
                        message: format!("dimension '{key}' repeats label '{label}'"),
                    });
                }
            }
            if !dim.open_set {
                for label in dim.signals.keys() {
                    if !dim.has_label(label) {
                        return Err(ConfigError::InvalidTaxonomy {
                            message: format!(
                                "dimension '{key}' has signals for unknown label '{label}'"
                            ),
                        });
                    }
                }
            }
            for (name, value) in [
                ("primary_floor", dim.primary_floor),
                ("secondary_floor", dim.secondary_floor),
            ] {
                if !(0.0..=1.0).contains(&value) {
                    return Err(ConfigError::InvalidThreshold {
                        name: format!("{key}.{name}"),
                        value,
                    });
                }
            }
            if dim.secondary_floor > dim.primary_floor {
                return Err(ConfigError::InvalidTaxonomy {
                    message: format!(
                        "dimension '{key}': secondary floor {} above primary floor {}",
                        dim.secondary_floor, dim.primary_floor
                    ),
                });
            }
            if dim.dual_reading && dim.labels.len() < 2 {
                return Err(ConfigError::InvalidTaxonomy {
                    message: format!("dimension '{key}' allows dual readings with fewer than two labels"),
                });
            }
        }
        Ok(())
    }
}

impl Default for TaxonomySchema {
    fn default() -> Self {
        defaults::default_taxonomy()
    }
}
