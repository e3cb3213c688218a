use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::confidence::Confidence;
use crate::taxonomy::TaxonomySchema;

/// The value a dimension holds for one fragment. Ambiguity is first-class:
/// a dimension that genuinely reads two ways carries both labels instead of
/// being collapsed to one, and absence of evidence is `Unclassified`, never
/// a guessed label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
#[serde(rename_all = "snake_case")]
pub enum LabelReading {
    Single(String),
    Dual(String, String),
    Unclassified,
}

impl LabelReading {
    pub fn is_classified(&self) -> bool {
        !matches!(self, Self::Unclassified)
    }

    /// All labels this reading asserts. Empty for `Unclassified`.
    pub fn labels(&self) -> Vec<&str> {
        match self {
            Self::Single(a) => vec![a.as_str()],
            Self::Dual(a, b) => vec![a.as_str(), b.as_str()],
            Self::Unclassified => Vec::new(),
        }
    }

    /// The leading label, when one exists.
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::Single(a) | Self::Dual(a, _) => Some(a.as_str()),
            Self::Unclassified => None,
        }
    }
}

/// One dimension's reading: the label value, runner-up labels that also
/// cleared the secondary floor, and the confidence in the leading value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionReading {
    pub label: LabelReading,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary: Vec<String>,
    pub confidence: Confidence,
}

impl DimensionReading {
    pub fn unclassified() -> Self {
        Self {
            label: LabelReading::Unclassified,
            secondary: Vec::new(),
            confidence: Confidence::zero(),
        }
    }

    pub fn single(label: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            label: LabelReading::Single(label.into()),
            secondary: Vec::new(),
            confidence,
        }
    }

    pub fn dual(a: impl Into<String>, b: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            label: LabelReading::Dual(a.into(), b.into()),
            secondary: Vec::new(),
            confidence,
        }
    }
}

/// How per-dimension confidences combine into the router's gating value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateMode {
    /// The weakest classified dimension decides. Default.
    Min,
    /// Arithmetic mean over classified dimensions.
    Mean,
}

/// One reading per taxonomy dimension. A BTreeMap so that iteration and
/// serialization order are stable across runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationVector {
    pub dimensions: BTreeMap<String, DimensionReading>,
}

impl ClassificationVector {
    /// A vector with every dimension of the schema present and unclassified.
    pub fn unclassified(taxonomy: &TaxonomySchema) -> Self {
        let dimensions = taxonomy
            .dimensions
            .keys()
            .map(|name| (name.clone(), DimensionReading::unclassified()))
            .collect();
        Self { dimensions }
    }

    pub fn get(&self, dimension: &str) -> Option<&DimensionReading> {
        self.dimensions.get(dimension)
    }

    pub fn classified_count(&self) -> usize {
        self.dimensions
            .values()
            .filter(|r| r.label.is_classified())
            .count()
    }

    pub fn is_fully_unclassified(&self) -> bool {
        self.classified_count() == 0
    }

    /// Aggregate confidence over classified dimensions. Unclassified
    /// dimensions are excluded so one silent dimension does not drag every
    /// fragment below the acceptance threshold; a vector with nothing
    /// classified aggregates to zero.
    pub fn aggregate(&self, mode: AggregateMode) -> Confidence {
        let values: Vec<f64> = self
            .dimensions
            .values()
            .filter(|r| r.label.is_classified())
            .map(|r| r.confidence.value())
            .collect();
        if values.is_empty() {
            return Confidence::zero();
        }
        let combined = match mode {
            AggregateMode::Min => values.iter().cloned().fold(f64::INFINITY, f64::min),
            AggregateMode::Mean => values.iter().sum::<f64>() / values.len() as f64,
        };
        Confidence::new(combined)
    }

    /// Dimensions where both vectors hold a classified reading sharing at
    /// least one label.
    pub fn shared_labels<'a>(&'a self, other: &'a Self) -> Vec<(&'a str, &'a str)> {
        let mut shared = Vec::new();
        for (dim, mine) in &self.dimensions {
            let Some(theirs) = other.dimensions.get(dim) else {
                continue;
            };
            for label in mine.label.labels() {
                if theirs.label.labels().contains(&label) {
                    shared.push((dim.as_str(), label));
                }
            }
        }
        shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(entries: &[(&str, DimensionReading)]) -> ClassificationVector {
        ClassificationVector {
            dimensions: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn aggregate_min_ignores_unclassified() {
        let v = vector(&[
            ("frequency", DimensionReading::single("f3", Confidence::new(0.9))),
            ("phase", DimensionReading::unclassified()),
            ("mode", DimensionReading::single("express", Confidence::new(0.6))),
        ]);
        assert_eq!(v.aggregate(AggregateMode::Min).value(), 0.6);
    }

    #[test]
    fn aggregate_of_empty_vector_is_zero() {
        let v = vector(&[("frequency", DimensionReading::unclassified())]);
        assert_eq!(v.aggregate(AggregateMode::Min).value(), 0.0);
        assert!(v.is_fully_unclassified());
    }

    #[test]
    fn aggregate_mean() {
        let v = vector(&[
            ("frequency", DimensionReading::single("f3", Confidence::new(0.8))),
            ("mode", DimensionReading::single("express", Confidence::new(0.4))),
        ]);
        let mean = v.aggregate(AggregateMode::Mean).value();
        assert!((mean - 0.6).abs() < 1e-9);
    }

    #[test]
    fn dual_reading_carries_both_labels() {
        let r = DimensionReading::dual("medicine", "toxic", Confidence::new(0.7));
        assert_eq!(r.label.labels(), vec!["medicine", "toxic"]);
        assert_eq!(r.label.primary(), Some("medicine"));
    }

    #[test]
    fn shared_labels_matches_dual_against_single() {
        let a = vector(&[(
            "dosage",
            DimensionReading::dual("medicine", "toxic", Confidence::new(0.7)),
        )]);
        let b = vector(&[(
            "dosage",
            DimensionReading::single("toxic", Confidence::new(0.9)),
        )]);
        assert_eq!(a.shared_labels(&b), vec![("dosage", "toxic")]);
    }

    #[test]
    fn reading_serializes_with_stable_tags() {
        let r = DimensionReading::single("f3", Confidence::new(0.5));
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"kind\":\"single\""));
        let back: DimensionReading = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
