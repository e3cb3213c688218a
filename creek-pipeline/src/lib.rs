//! # creek-pipeline
//!
//! The batch orchestrator. Takes raw source records through redaction,
//! classification, routing, embedding, linking, and detection in one
//! blocking call, and commits the survivors to the in-memory archive.
//! Stages run in a fixed order; scan and classify fan out over a thread
//! pool when configured to, and a cancel token can stop the run between
//! fragments without leaving a half-committed batch behind.

pub mod cancel;
pub mod engine;

pub use cancel::CancelToken;
pub use engine::{BatchOutput, PipelineEngine};
