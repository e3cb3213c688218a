//! Classification for redacted fragments: a deterministic signal-table pass
//! and the confidence-gated router that decides whether that pass stands,
//! a secondary classifier is consulted, or a human gets the fragment.

pub mod router;
pub mod rules;

pub use router::{merge_vectors, RouteDecision, RouteOutcome, Router};
pub use rules::{LabelScore, SignalClassifier};
