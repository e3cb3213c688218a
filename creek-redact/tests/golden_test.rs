//! Golden dataset tests for the scanner.
//!
//! Loads each redaction fixture, runs the engine over every sample, and
//! checks the output against the recorded expectations.

use chrono::{TimeZone, Utc};

use creek_core::config::RedactionConfig;
use creek_core::fragment::{SourcePlatform, SourceRecord};
use creek_redact::RedactionEngine;
use test_fixtures::load_fixture_value;

fn record(raw_text: &str) -> SourceRecord {
    SourceRecord {
        platform: SourcePlatform::Journal,
        origin_path: "journal/entry.md".to_string(),
        conversation_id: None,
        channel: None,
        interlocutor: None,
        original_encoding: None,
        created_at: Utc
            .with_ymd_and_hms(2024, 3, 1, 9, 30, 0)
            .unwrap()
            .fixed_offset(),
        title: "entry".to_string(),
        raw_text: raw_text.to_string(),
    }
}

fn engine() -> RedactionEngine {
    RedactionEngine::with_salt(&RedactionConfig::default(), [7u8; 16]).unwrap()
}

/// Personal identifiers: exact output and rule attribution per sample.
#[test]
fn golden_pii_samples() {
    let fixture = load_fixture_value("golden/redaction/pii_samples.json");
    let engine = engine();
    let samples = fixture["input"]["samples"].as_array().unwrap();

    for sample in samples {
        let id = sample["id"].as_str().unwrap_or("?");
        let text = sample["text"].as_str().unwrap();
        let expected = sample["expected_output"].as_str().unwrap();

        let (fragment, entries) = engine.process(&record(text), Utc::now());
        assert_eq!(fragment.text, expected, "Sample '{}': output mismatch", id);

        let expected_rules: Vec<&str> = sample["expected_rules"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        let rules: Vec<&str> = entries.iter().map(|e| e.rule.as_str()).collect();
        assert_eq!(
            rules, expected_rules,
            "Sample '{}': rule attribution mismatch",
            id
        );
        assert_eq!(fragment.redaction_count, expected_rules.len());
    }
}

/// Credential shapes: every sample must be caught by its expected rule.
#[test]
fn golden_secret_samples() {
    let fixture = load_fixture_value("golden/redaction/secret_samples.json");
    let engine = engine();
    let samples = fixture["input"]["samples"].as_array().unwrap();

    for sample in samples {
        let id = sample["id"].as_str().unwrap_or("?");
        let text = sample["text"].as_str().unwrap();
        let rule = sample["expected_rule"].as_str().unwrap();

        let (fragment, entries) = engine.process(&record(text), Utc::now());
        assert_eq!(
            fragment.text,
            sample["expected_output"].as_str().unwrap(),
            "Secret '{}': output mismatch",
            id
        );
        assert!(
            entries.iter().any(|e| e.rule == rule),
            "Secret '{}': no audit entry for rule '{}', got {:?}",
            id,
            rule,
            entries.iter().map(|e| &e.rule).collect::<Vec<_>>()
        );
    }
}

/// Strings that resemble sensitive shapes must pass through untouched.
#[test]
fn golden_false_positives() {
    let fixture = load_fixture_value("golden/redaction/false_positives.json");
    let engine = engine();
    let samples = fixture["input"]["samples"].as_array().unwrap();

    for sample in samples {
        let id = sample["id"].as_str().unwrap_or("?");
        let text = sample["text"].as_str().unwrap();

        let (fragment, entries) = engine.process(&record(text), Utc::now());
        assert_eq!(fragment.text, text, "False positive '{}': text changed", id);
        assert!(
            entries.is_empty(),
            "False positive '{}': unexpected audit entries {:?}",
            id,
            entries.iter().map(|e| &e.rule).collect::<Vec<_>>()
        );
        assert_eq!(fragment.redaction_count, 0);
    }
}

/// A second scan over redacted output must find nothing to replace.
#[test]
fn golden_idempotency() {
    let fixture = load_fixture_value("golden/redaction/idempotency.json");
    let engine = engine();
    let samples = fixture["input"]["samples"].as_array().unwrap();

    for sample in samples {
        let id = sample["id"].as_str().unwrap_or("?");
        let original = sample["original"].as_str().unwrap();
        let expected_redactions = sample["expected_redactions"].as_u64().unwrap() as usize;

        let (fragment, entries) = engine.process(&record(original), Utc::now());
        assert_eq!(
            entries.len(),
            expected_redactions,
            "Idempotency '{}': first-pass count mismatch, output: {}",
            id,
            fragment.text
        );

        let rematches = engine.rescan(&fragment.text);
        assert!(
            rematches.is_empty(),
            "Idempotency '{}': second scan still matches {:?} in: {}",
            id,
            rematches.iter().map(|m| &m.rule).collect::<Vec<_>>(),
            fragment.text
        );
    }
}

#[test]
fn golden_all_redaction_files_load() {
    let files = test_fixtures::list_fixtures("golden/redaction");
    assert_eq!(files.len(), 4, "Expected 4 redaction golden files");
}
