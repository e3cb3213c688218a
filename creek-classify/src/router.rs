//! Confidence-gated routing between the rule pass, the secondary pass, and
//! the human review queue.
//!
//! The router never errors a fragment out of the batch: a failed or missing
//! secondary degrades to the rule vector plus a forced review entry, and a
//! strong cross-pass disagreement is held as a contradiction mark rather
//! than resolved by fiat.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use creek_core::config::ClassifyConfig;
use creek_core::errors::ClassifyError;
use creek_core::fragment::{ClassificationVector, Confidence, Fragment, LabelReading};
use creek_core::models::{ContradictionMark, ReviewEntry, ReviewReason};
use creek_core::taxonomy::TaxonomySchema;
use creek_core::traits::ISecondaryClassifier;

/// What happened to one fragment's classification vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    /// The rule vector stands, untouched by a secondary pass.
    AcceptedOnRules,
    /// The secondary pass ran; the vector is the dimension-wise merge.
    Merged,
    /// The secondary pass was needed but failed; the rule vector stands
    /// and the fragment is queued for review.
    Degraded,
}

/// Per-fragment routing result. A plain value: the review entry and
/// contradiction marks ride along instead of mutating shared queues.
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    pub fragment_id: String,
    pub vector: ClassificationVector,
    pub aggregate: Confidence,
    pub decision: RouteDecision,
    pub review: Option<ReviewEntry>,
    pub contradictions: Vec<ContradictionMark>,
}

/// Confidence-gated router over an optional secondary classifier.
pub struct Router {
    config: ClassifyConfig,
    taxonomy: TaxonomySchema,
    secondary: Option<Arc<dyn ISecondaryClassifier>>,
    /// Bounds concurrent secondary calls. A permit is held for the full
    /// duration of the blocking call, so an abandoned (timed-out) call
    /// still throttles later dispatches until it actually returns.
    limiter: Arc<Semaphore>,
}

impl Router {
    pub fn new(
        config: ClassifyConfig,
        taxonomy: TaxonomySchema,
        secondary: Option<Arc<dyn ISecondaryClassifier>>,
    ) -> Self {
        let limiter = Arc::new(Semaphore::new(config.secondary.max_in_flight.max(1)));
        Self {
            config,
            taxonomy,
            secondary,
            limiter,
        }
    }

    /// Route one fragment's rule vector.
    ///
    /// Policy, in order: a source on the always-review list is queued for a
    /// human and the rule vector stands; aggregate confidence at or above
    /// the acceptance threshold accepts the rule vector unchanged; below
    /// threshold, a source on the auto-classify list gets a secondary pass
    /// merged in; any other source keeps its rule vector without review.
    pub async fn route(
        &self,
        fragment: &Fragment,
        rules: ClassificationVector,
        now: DateTime<Utc>,
    ) -> RouteOutcome {
        let platform = fragment.source.platform;
        let aggregate = rules.aggregate(self.config.aggregate);

        if self.config.always_review_sources.contains(&platform) {
            debug!(fragment_id = %fragment.id, %platform, "source is always-review");
            return RouteOutcome {
                fragment_id: fragment.id.clone(),
                vector: rules,
                aggregate,
                decision: RouteDecision::AcceptedOnRules,
                review: Some(review(&fragment.id, ReviewReason::AlwaysReviewSource, now)),
                contradictions: Vec::new(),
            };
        }

        if aggregate.value() >= self.config.accept_threshold {
            debug!(
                fragment_id = %fragment.id,
                aggregate = %aggregate,
                "rule vector accepted"
            );
            return RouteOutcome {
                fragment_id: fragment.id.clone(),
                vector: rules,
                aggregate,
                decision: RouteDecision::AcceptedOnRules,
                review: None,
                contradictions: Vec::new(),
            };
        }

        if !self.config.auto_classify_sources.contains(&platform) {
            // Not eligible for the secondary pass and not sensitive enough
            // to force review. The rule vector stands as-is.
            return RouteOutcome {
                fragment_id: fragment.id.clone(),
                vector: rules,
                aggregate,
                decision: RouteDecision::AcceptedOnRules,
                review: None,
                contradictions: Vec::new(),
            };
        }

        match self.invoke_secondary(fragment.text.clone()).await {
            Ok(second) => {
                let (merged, contradictions) = merge_vectors(
                    &fragment.id,
                    &self.taxonomy,
                    &rules,
                    &second,
                    self.config.contradiction_floor,
                );
                let aggregate = merged.aggregate(self.config.aggregate);
                let review = if contradictions.is_empty() {
                    None
                } else {
                    Some(review(&fragment.id, ReviewReason::Contradiction, now))
                };
                debug!(
                    fragment_id = %fragment.id,
                    aggregate = %aggregate,
                    contradictions = contradictions.len(),
                    "secondary pass merged"
                );
                RouteOutcome {
                    fragment_id: fragment.id.clone(),
                    vector: merged,
                    aggregate,
                    decision: RouteDecision::Merged,
                    review,
                    contradictions,
                }
            }
            Err(err) => {
                warn!(fragment_id = %fragment.id, error = %err, "secondary pass failed");
                RouteOutcome {
                    fragment_id: fragment.id.clone(),
                    vector: rules,
                    aggregate,
                    decision: RouteDecision::Degraded,
                    review: Some(review(&fragment.id, ReviewReason::SecondaryFailed, now)),
                    contradictions: Vec::new(),
                }
            }
        }
    }

    /// Run the secondary classifier under the concurrency bound and the
    /// configured deadline. The classifier call is blocking, so it runs on
    /// the blocking pool; a timeout abandons the await but the call itself
    /// runs to completion with its permit.
    async fn invoke_secondary(
        &self,
        text: String,
    ) -> Result<ClassificationVector, ClassifyError> {
        let Some(secondary) = self.secondary.clone() else {
            return Err(ClassifyError::SecondaryUnavailable {
                reason: "no secondary classifier configured".to_string(),
            });
        };
        if !self.config.secondary.enabled {
            return Err(ClassifyError::SecondaryUnavailable {
                reason: "secondary pass disabled by configuration".to_string(),
            });
        }
        if !secondary.is_available() {
            return Err(ClassifyError::SecondaryUnavailable {
                reason: format!("'{}' reports unavailable", secondary.name()),
            });
        }

        let permit = self
            .limiter
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ClassifyError::SecondaryUnavailable {
                reason: "dispatch limiter closed".to_string(),
            })?;

        let taxonomy = self.taxonomy.clone();
        let deadline = Duration::from_millis(self.config.secondary.timeout_ms);
        let started = Instant::now();
        let call = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            secondary.classify(&text, &taxonomy)
        });

        match tokio::time::timeout(deadline, call).await {
            Err(_) => Err(ClassifyError::SecondaryTimeout {
                elapsed_ms: started.elapsed().as_millis() as u64,
            }),
            Ok(Err(join_err)) => Err(ClassifyError::SecondaryFailed {
                message: join_err.to_string(),
            }),
            Ok(Ok(Err(err))) => Err(ClassifyError::SecondaryFailed {
                message: err.to_string(),
            }),
            Ok(Ok(Ok(vector))) => Ok(vector),
        }
    }
}

fn review(fragment_id: &str, reason: ReviewReason, now: DateTime<Utc>) -> ReviewEntry {
    ReviewEntry {
        fragment_id: fragment_id.to_string(),
        reason,
        noted_at: now,
    }
}

/// Merge the secondary vector into the rule vector, dimension by dimension.
///
/// A classified reading always beats `Unclassified`; when both passes hold a
/// reading, the higher confidence wins and ties keep the rule reading. Two
/// single readings with no shared label, both at or above the contradiction
/// floor, are a contradiction: the rule reading stands and a mark records
/// both sides. Secondary labels outside a closed dimension's schema are
/// dropped, so a misbehaving secondary cannot widen the taxonomy.
pub fn merge_vectors(
    fragment_id: &str,
    taxonomy: &TaxonomySchema,
    rules: &ClassificationVector,
    second: &ClassificationVector,
    contradiction_floor: f64,
) -> (ClassificationVector, Vec<ContradictionMark>) {
    let mut merged = ClassificationVector::default();
    let mut contradictions = Vec::new();

    for (name, dim) in &taxonomy.dimensions {
        let rule = rules
            .get(name)
            .cloned()
            .unwrap_or_else(creek_core::fragment::DimensionReading::unclassified);
        let Some(from_second) = second.get(name).cloned() else {
            merged.dimensions.insert(name.clone(), rule);
            continue;
        };

        // Closed dimensions only admit schema labels from the secondary.
        if !dim.open_set
            && from_second
                .label
                .labels()
                .iter()
                .any(|l| !dim.has_label(l))
        {
            warn!(
                fragment_id,
                dimension = %name,
                label = ?from_second.label,
                "secondary returned a label outside the schema; dropped"
            );
            merged.dimensions.insert(name.clone(), rule);
            continue;
        }

        let chosen = match (&rule.label, &from_second.label) {
            (LabelReading::Unclassified, LabelReading::Unclassified) => rule.clone(),
            (LabelReading::Unclassified, _) => from_second.clone(),
            (_, LabelReading::Unclassified) => rule.clone(),
            (mine, theirs) => {
                let disjoint = !mine.labels().iter().any(|l| theirs.labels().contains(l));
                let both_confident = rule.confidence.value() >= contradiction_floor
                    && from_second.confidence.value() >= contradiction_floor;
                if disjoint && both_confident {
                    if let (Some(rule_label), Some(second_label)) =
                        (mine.primary(), theirs.primary())
                    {
                        contradictions.push(ContradictionMark {
                            fragment_id: fragment_id.to_string(),
                            dimension: name.clone(),
                            rule_label: rule_label.to_string(),
                            rule_confidence: rule.confidence,
                            secondary_label: second_label.to_string(),
                            secondary_confidence: from_second.confidence,
                        });
                    }
                    rule.clone()
                } else if from_second.confidence.value() > rule.confidence.value() {
                    from_second.clone()
                } else {
                    rule.clone()
                }
            }
        };
        merged.dimensions.insert(name.clone(), chosen);
    }

    (merged, contradictions)
}
