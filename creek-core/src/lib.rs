//! # creek-core
//!
//! Foundation crate for the Creek archive pipeline.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod fragment;
pub mod models;
pub mod taxonomy;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::CreekConfig;
pub use errors::{CreekError, CreekResult};
pub use fragment::{
    ClassificationVector, Confidence, Fragment, LabelReading, Resonance, ResonanceKind,
    SourcePlatform, SourceRecord,
};
pub use taxonomy::TaxonomySchema;
