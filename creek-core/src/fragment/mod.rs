pub mod base;
pub mod classification;
pub mod confidence;
pub mod resonance;

pub use base::{Fragment, Provenance, SourcePlatform, SourceRecord};
pub use classification::{AggregateMode, ClassificationVector, DimensionReading, LabelReading};
pub use confidence::Confidence;
pub use resonance::{Resonance, ResonanceKind};
