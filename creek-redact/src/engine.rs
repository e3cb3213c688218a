use chrono::{DateTime, Utc};

use creek_core::config::RedactionConfig;
use creek_core::errors::CreekResult;
use creek_core::fragment::{ClassificationVector, Fragment, Provenance, SourceRecord};
use creek_core::models::AuditEntry;

use crate::scanner::{self, RawMatch, Scanner};

/// The scanner boundary: consumes a `SourceRecord` (the last place raw text
/// exists) and produces a redacted `Fragment` plus its audit entries.
pub struct RedactionEngine {
    scanner: Scanner,
    salt: [u8; 16],
    dry_run: bool,
}

impl RedactionEngine {
    /// Build from config with a fresh per-process salt. Custom patterns are
    /// compiled here; failure is fatal before any record is touched.
    pub fn new(config: &RedactionConfig) -> CreekResult<Self> {
        Self::with_salt(config, *uuid::Uuid::new_v4().as_bytes())
    }

    /// Build with an explicit salt. Used by tests and by callers that need
    /// hashes comparable across processes.
    pub fn with_salt(config: &RedactionConfig, salt: [u8; 16]) -> CreekResult<Self> {
        let scanner = Scanner::new(config)?;
        Ok(Self {
            scanner,
            salt,
            dry_run: config.dry_run,
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Scan and redact one record. Returns the fragment and the audit
    /// entries for every replaced span; the caller appends the entries to
    /// the audit log as one batch.
    pub fn process(
        &self,
        record: &SourceRecord,
        ingested_at: DateTime<Utc>,
    ) -> (Fragment, Vec<AuditEntry>) {
        let created_at = record.created_at.with_timezone(&Utc);
        let id = Fragment::compute_id(
            record.platform,
            &record.origin_path,
            created_at,
            &record.raw_text,
        );
        let matches = self.scanner.scan(&record.raw_text);
        let entries = self.audit_entries(&id, record, &matches, ingested_at);
        let text = scanner::apply(&record.raw_text, &matches);
        tracing::debug!(
            fragment_id = %id,
            matches = matches.len(),
            "record scanned"
        );
        let fragment = Fragment {
            id,
            title: record.title.clone(),
            source: Provenance::from_record(record),
            created_at,
            ingested_at,
            text,
            raw_hash: Fragment::compute_raw_hash(&self.salt, &record.raw_text),
            classification: ClassificationVector::default(),
            embedding: None,
            links: Vec::new(),
            redaction_count: matches.len(),
        };
        (fragment, entries)
    }

    /// Dry-run support: detect and audit without producing a fragment, so
    /// nothing carrying raw text ever leaves this call.
    pub fn scan_only(
        &self,
        record: &SourceRecord,
        ingested_at: DateTime<Utc>,
    ) -> Vec<AuditEntry> {
        let created_at = record.created_at.with_timezone(&Utc);
        let id = Fragment::compute_id(
            record.platform,
            &record.origin_path,
            created_at,
            &record.raw_text,
        );
        let matches = self.scanner.scan(&record.raw_text);
        self.audit_entries(&id, record, &matches, ingested_at)
    }

    /// Re-scan already-redacted fragment text. Used to verify idempotence;
    /// a non-empty result on pipeline output is a bug.
    pub fn rescan(&self, text: &str) -> Vec<RawMatch> {
        self.scanner.scan(text)
    }

    fn audit_entries(
        &self,
        fragment_id: &str,
        record: &SourceRecord,
        matches: &[RawMatch],
        at: DateTime<Utc>,
    ) -> Vec<AuditEntry> {
        matches
            .iter()
            .map(|m| AuditEntry {
                fragment_id: fragment_id.to_string(),
                origin_path: record.origin_path.clone(),
                line: line_of(&record.raw_text, m.start),
                start: m.start,
                end: m.end,
                rule: m.rule.clone(),
                salted_hash: Fragment::compute_raw_hash(
                    &self.salt,
                    &record.raw_text[m.start..m.end],
                ),
                at,
            })
            .collect()
    }
}

/// 1-based line number of a byte offset.
fn line_of(text: &str, offset: usize) -> usize {
    text.as_bytes()[..offset.min(text.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_numbers_are_one_based() {
        let text = "first\nsecond\nthird";
        assert_eq!(line_of(text, 0), 1);
        assert_eq!(line_of(text, 6), 2);
        assert_eq!(line_of(text, 14), 3);
    }
}
