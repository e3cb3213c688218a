//! # creek-redact
//!
//! The sensitive-content scanner. Detects secrets and personal identifiers
//! with an ordered pattern table, replaces them with `[REDACTED:<rule>]`
//! placeholders, and records every replacement in an append-only audit log
//! keyed by salted hashes. Raw text stops existing at this crate's boundary.

pub mod audit;
pub mod engine;
pub mod patterns;
pub mod scanner;

pub use audit::{AuditLog, ScanReport};
pub use engine::RedactionEngine;
pub use scanner::{placeholder_for, RawMatch, Scanner};
