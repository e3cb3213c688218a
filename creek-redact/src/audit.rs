use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use creek_core::errors::{CreekResult, RedactError};
use creek_core::models::AuditEntry;

/// Match counts grouped for the review tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub total: usize,
    pub by_rule: BTreeMap<String, usize>,
    pub by_origin: BTreeMap<String, usize>,
}

impl ScanReport {
    pub fn from_entries(entries: &[AuditEntry]) -> Self {
        let mut report = Self {
            total: entries.len(),
            ..Default::default()
        };
        for entry in entries {
            *report.by_rule.entry(entry.rule.clone()).or_default() += 1;
            *report.by_origin.entry(entry.origin_path.clone()).or_default() += 1;
        }
        report
    }
}

/// Append-only redaction log. There is no update or delete: restoring a
/// false positive happens in the archive, not by rewriting history here.
///
/// Appends are serialized through one mutex and batched per fragment, so
/// concurrent scanning never interleaves one fragment's entries with
/// another's and a fragment's entries land atomically.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one fragment's entries under a single lock acquisition.
    pub fn append_batch(&self, batch: Vec<AuditEntry>) -> CreekResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut entries = self.entries.lock().map_err(|_| RedactError::LogPoisoned)?;
        entries.extend(batch);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the log for review tooling.
    pub fn snapshot(&self) -> CreekResult<Vec<AuditEntry>> {
        let entries = self.entries.lock().map_err(|_| RedactError::LogPoisoned)?;
        Ok(entries.clone())
    }

    pub fn report(&self) -> CreekResult<ScanReport> {
        Ok(ScanReport::from_entries(&self.snapshot()?))
    }

    /// The log as JSON, for export alongside the archive. The salt is not
    /// part of the export.
    pub fn export_json(&self) -> CreekResult<String> {
        let entries = self.snapshot()?;
        serde_json::to_string_pretty(&entries).map_err(|e| {
            RedactError::ExportFailed {
                message: e.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(fragment: &str, rule: &str, origin: &str) -> AuditEntry {
        AuditEntry {
            fragment_id: fragment.to_string(),
            origin_path: origin.to_string(),
            line: 1,
            start: 0,
            end: 5,
            rule: rule.to_string(),
            salted_hash: "ab".repeat(32),
            at: Utc::now(),
        }
    }

    #[test]
    fn batches_append_in_order() {
        let log = AuditLog::new();
        log.append_batch(vec![entry("frag-1", "aws_key", "a.md")]).unwrap();
        log.append_batch(vec![
            entry("frag-2", "email", "b.md"),
            entry("frag-2", "email", "b.md"),
        ])
        .unwrap();
        let snapshot = log.snapshot().unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].fragment_id, "frag-1");
        assert_eq!(snapshot[2].fragment_id, "frag-2");
    }

    #[test]
    fn report_groups_by_rule_and_origin() {
        let log = AuditLog::new();
        log.append_batch(vec![
            entry("frag-1", "aws_key", "a.md"),
            entry("frag-1", "email", "a.md"),
            entry("frag-2", "email", "b.md"),
        ])
        .unwrap();
        let report = log.report().unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.by_rule["email"], 2);
        assert_eq!(report.by_origin["a.md"], 2);
    }

    #[test]
    fn concurrent_appends_do_not_interleave_batches() {
        use std::sync::Arc;
        let log = Arc::new(AuditLog::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let log = Arc::clone(&log);
            handles.push(std::thread::spawn(move || {
                let fragment = format!("frag-{i}");
                let batch: Vec<_> = (0..5).map(|_| entry(&fragment, "email", "x.md")).collect();
                log.append_batch(batch).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        let snapshot = log.snapshot().unwrap();
        assert_eq!(snapshot.len(), 40);
        // Each fragment's five entries must be contiguous.
        let mut i = 0;
        while i < snapshot.len() {
            let id = &snapshot[i].fragment_id;
            assert!(snapshot[i..i + 5].iter().all(|e| &e.fragment_id == id));
            i += 5;
        }
    }

    #[test]
    fn export_is_valid_json() {
        let log = AuditLog::new();
        log.append_batch(vec![entry("frag-1", "aws_key", "a.md")]).unwrap();
        let json = log.export_json().unwrap();
        let parsed: Vec<AuditEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
    }
}
