//! Pattern detection over the linked archive.
//!
//! Four detectors run against a consistent snapshot of the fragment
//! collection and its resonance graph: threads (recurring topics inside a
//! sliding window), eddies (semantic gravity wells, time-independent),
//! paradoxes (held contradictions from router marks), and synchronicities
//! (the same idea surfacing in unrelated places). All outputs are additive:
//! records are keyed by deterministic ids, matched back to prior records by
//! member overlap, and transition to an explicit dissolved state when their
//! membership invariant breaks. Nothing is ever silently removed.

pub mod eddies;
pub mod engine;
pub mod paradox;
pub mod synchronicity;
pub mod threads;

pub use engine::{DetectEngine, DetectOutcome};
pub use synchronicity::SynchronicityHit;
pub use threads::ThreadGroup;
