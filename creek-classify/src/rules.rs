//! Rule-based classification from per-label signal vocabularies.
//!
//! Each dimension scores by signal density: occurrences of the label's
//! signal terms divided by the fragment's token count. Density at or above
//! the dimension's primary floor yields a reading; a close runner-up on a
//! dual-capable dimension yields a dual reading instead of a forced choice.
//! No evidence means `Unclassified`, never a default label.

use std::collections::BTreeMap;

use creek_core::fragment::{ClassificationVector, Confidence, DimensionReading, LabelReading};
use creek_core::taxonomy::{DimensionSchema, MatchMode, TaxonomySchema};
use tracing::trace;

/// One label's density score within a dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub hits: usize,
    pub score: f64,
}

/// Deterministic signal-table classifier.
///
/// Pure with respect to its inputs: the same text and schema always produce
/// the same vector, which re-classification runs rely on.
pub struct SignalClassifier {
    taxonomy: TaxonomySchema,
    /// Density at which confidence saturates to 1.0.
    saturation: f64,
    /// A runner-up within this fraction of the top score reads as dual.
    dual_margin: f64,
}

impl SignalClassifier {
    pub fn new(taxonomy: TaxonomySchema, saturation: f64, dual_margin: f64) -> Self {
        Self {
            taxonomy,
            saturation,
            dual_margin,
        }
    }

    pub fn taxonomy(&self) -> &TaxonomySchema {
        &self.taxonomy
    }

    /// Classify one fragment's redacted text across every dimension.
    pub fn classify(&self, text: &str) -> ClassificationVector {
        let lowered = text.to_lowercase();
        let token_count = lowered.split_whitespace().count();

        let dimensions: BTreeMap<String, DimensionReading> = self
            .taxonomy
            .dimensions
            .iter()
            .map(|(name, dim)| {
                let reading = if token_count == 0 {
                    DimensionReading::unclassified()
                } else {
                    self.score_dimension(dim, &lowered, token_count)
                };
                trace!(dimension = %name, label = ?reading.label, "dimension scored");
                (name.clone(), reading)
            })
            .collect();

        ClassificationVector { dimensions }
    }

    /// Score every label of one dimension and fold the scores into a reading.
    fn score_dimension(
        &self,
        dim: &DimensionSchema,
        lowered: &str,
        token_count: usize,
    ) -> DimensionReading {
        let mut scored: Vec<LabelScore> = dim
            .signals
            .iter()
            .filter_map(|(label, terms)| {
                let hits: usize = terms
                    .iter()
                    .map(|t| count_occurrences(lowered, t, dim.match_mode))
                    .sum();
                if hits == 0 {
                    return None;
                }
                Some(LabelScore {
                    label: label.clone(),
                    hits,
                    score: hits as f64 / token_count as f64,
                })
            })
            .collect();

        // Score order, label name as the deterministic tie-break.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.label.cmp(&b.label))
        });
        scored.retain(|s| s.score >= dim.secondary_floor);

        let Some(top) = scored.first().cloned() else {
            return DimensionReading::unclassified();
        };
        if top.score < dim.primary_floor {
            return DimensionReading::unclassified();
        }

        let confidence = Confidence::new((top.score / self.saturation).min(1.0));
        let runner = scored.get(1).cloned();

        let (label, claimed) = match runner {
            Some(ref r)
                if dim.dual_reading
                    && r.score >= dim.primary_floor
                    && r.score >= top.score * (1.0 - self.dual_margin) =>
            {
                (LabelReading::Dual(top.label.clone(), r.label.clone()), 2)
            }
            _ => (LabelReading::Single(top.label.clone()), 1),
        };

        let secondary = scored
            .iter()
            .skip(claimed)
            .map(|s| s.label.clone())
            .collect();

        DimensionReading {
            label,
            secondary,
            confidence,
        }
    }
}

/// Count non-overlapping occurrences of a signal term.
fn count_occurrences(haystack: &str, term: &str, mode: MatchMode) -> usize {
    if term.is_empty() {
        return 0;
    }
    match mode {
        MatchMode::Substring => haystack.matches(term).count(),
        MatchMode::WholeWord => haystack
            .match_indices(term)
            .filter(|(at, _)| {
                let before_ok = haystack[..*at]
                    .chars()
                    .next_back()
                    .map_or(true, |c| !c.is_alphanumeric() && c != '_');
                let after_ok = haystack[at + term.len()..]
                    .chars()
                    .next()
                    .map_or(true, |c| !c.is_alphanumeric() && c != '_');
                before_ok && after_ok
            })
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use creek_core::taxonomy::defaults::default_taxonomy;

    fn classifier() -> SignalClassifier {
        SignalClassifier::new(default_taxonomy(), 0.12, 0.25)
    }

    #[test]
    fn discipline_reads_as_agency() {
        let v = classifier().classify("I need to ship this project by Friday, building discipline daily");
        let frequency = v.get("frequency").unwrap();
        assert_eq!(frequency.label, LabelReading::Single("f3_agency".into()));
        assert!(frequency.confidence.value() > 0.0);
    }

    #[test]
    fn commitment_vocabulary_reads_as_agency() {
        let v = classifier().classify("finally submitted the plan, committed to the habit");
        let frequency = v.get("frequency").unwrap();
        assert_eq!(frequency.label, LabelReading::Single("f3_agency".into()));
    }

    #[test]
    fn signal_free_text_is_fully_unclassified() {
        let v = classifier()
            .classify("Meeting notes: Q3 budget review moved to Thursday. Action items attached.");
        assert!(v.is_fully_unclassified());
        for reading in v.dimensions.values() {
            assert_eq!(reading.confidence.value(), 0.0);
        }
    }

    #[test]
    fn empty_text_is_fully_unclassified() {
        let v = classifier().classify("");
        assert!(v.is_fully_unclassified());
        assert_eq!(v.dimensions.len(), 9);
    }

    #[test]
    fn density_drives_confidence() {
        let c = classifier();
        // One hit in four tokens saturates; one in forty does not.
        let dense = c.classify("discipline wins every time");
        let sparse = c.classify(
            "discipline one two three four five six seven eight nine ten eleven twelve \
             thirteen fourteen fifteen sixteen seventeen eighteen nineteen twenty \
             twentyone twentytwo twentythree twentyfour twentyfive twentysix twentyseven \
             twentyeight twentynine thirty thirtyone thirtytwo thirtythree thirtyfour \
             thirtyfive thirtysix thirtyseven thirtyeight thirtynine",
        );
        let dense_conf = dense.get("frequency").unwrap().confidence.value();
        let sparse_conf = sparse.get("frequency").unwrap().confidence.value();
        assert_eq!(dense_conf, 1.0);
        assert!(sparse_conf < dense_conf);
        assert!(sparse_conf > 0.0);
    }

    #[test]
    fn below_primary_floor_is_unclassified() {
        // One hit in sixty tokens sits under the 0.02 primary floor.
        let filler = "word ".repeat(59);
        let text = format!("{filler}discipline");
        let v = classifier().classify(&text);
        assert_eq!(v.get("frequency").unwrap().label, LabelReading::Unclassified);
    }

    #[test]
    fn close_runner_up_on_dual_dimension_reads_dual() {
        let v = classifier().classify("building and making all day, then feeling the heart of it");
        let orientation = v.get("orientation").unwrap();
        assert_eq!(
            orientation.label,
            LabelReading::Dual("do".into(), "feel".into())
        );
    }

    #[test]
    fn distant_runner_up_stays_single_with_secondary() {
        // Three do-signals against one feel-signal: outside the dual margin.
        let v = classifier().classify("building making shipping feeling");
        let orientation = v.get("orientation").unwrap();
        assert_eq!(orientation.label, LabelReading::Single("do".into()));
        assert_eq!(orientation.secondary, vec!["feel".to_string()]);
    }

    #[test]
    fn non_dual_dimension_never_reads_dual() {
        // Equal-density hits on two frequency labels; frequency is not
        // dual-capable, so the tie breaks to one label plus a secondary.
        let v = classifier().classify("survival and belonging");
        let frequency = v.get("frequency").unwrap();
        assert!(matches!(frequency.label, LabelReading::Single(_)));
        assert_eq!(frequency.secondary.len(), 1);
    }

    #[test]
    fn tied_scores_break_by_label_name() {
        let v = classifier().classify("survival and belonging");
        let frequency = v.get("frequency").unwrap();
        // f1_survival sorts before f2_belonging at equal density.
        assert_eq!(frequency.label, LabelReading::Single("f1_survival".into()));
    }

    #[test]
    fn substring_mode_catches_inflections() {
        assert_eq!(count_occurrences("driven to commit", "commit", MatchMode::Substring), 1);
        assert_eq!(count_occurrences("committed and committing", "commit", MatchMode::Substring), 2);
    }

    #[test]
    fn whole_word_mode_requires_boundaries() {
        assert_eq!(count_occurrences("the rage inside", "rage", MatchMode::WholeWord), 1);
        assert_eq!(count_occurrences("the storage unit", "rage", MatchMode::WholeWord), 0);
        assert_eq!(count_occurrences("storage", "rage", MatchMode::Substring), 1);
    }

    #[test]
    fn classification_is_deterministic() {
        let c = classifier();
        let text = "building discipline daily, feeling the drive, certain of the plan";
        assert_eq!(c.classify(text), c.classify(text));
    }
}
