use crate::errors::CreekResult;
use crate::fragment::ClassificationVector;
use crate::taxonomy::TaxonomySchema;

/// The secondary classification capability the router falls back to when
/// rule confidence is low. Implementations live outside this workspace
/// (typically a model-backed service); the call is blocking and the router
/// wraps it with its own concurrency bound and deadline.
///
/// Implementations must return a vector covering the schema's dimensions,
/// leaving genuinely unreadable ones `Unclassified` rather than guessing.
pub trait ISecondaryClassifier: Send + Sync {
    fn classify(&self, text: &str, taxonomy: &TaxonomySchema) -> CreekResult<ClassificationVector>;

    /// Human-readable name for logs and reports.
    fn name(&self) -> &str;

    /// Whether the capability is reachable right now. The router treats
    /// `false` the same as a failed call: degrade and queue for review.
    fn is_available(&self) -> bool;
}
