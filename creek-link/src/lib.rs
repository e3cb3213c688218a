//! # creek-link
//!
//! The similarity and linking engine. Consumes embedded fragments, produces
//! the resonance edge graph: semantic edges from embedding similarity and
//! temporal edges from shared labels within a time window. Edge insertion
//! is serialized behind a single-writer guard, and the whole computation is
//! deterministic: relinking an unchanged collection reproduces the same
//! edge set, ids included.

pub mod engine;
pub mod graph;
pub mod index;
pub mod similarity;
pub mod temporal;

pub use engine::{LinkOutcome, LinkingEngine};
pub use graph::EdgeGraph;
pub use index::{Scored, SemanticIndex};
pub use temporal::{TemporalProfile, WindowIndex};
