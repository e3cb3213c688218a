//! Golden dataset test for the linking engine.
//!
//! Builds the small fixture collection, links it, and checks the resulting
//! edge graph against the recorded edges, then verifies the run is a no-op
//! the second time around.

use chrono::{DateTime, Utc};
use serde_json::Value;

use creek_core::config::LinkingConfig;
use creek_core::fragment::{
    ClassificationVector, Confidence, DimensionReading, Fragment, Provenance, ResonanceKind,
    SourcePlatform,
};
use creek_link::{LinkOutcome, LinkingEngine};
use test_fixtures::load_fixture_value;

fn parse_platform(s: &str) -> SourcePlatform {
    match s {
        "claude" => SourcePlatform::Claude,
        "chatgpt" => SourcePlatform::Chatgpt,
        "discord" => SourcePlatform::Discord,
        "essay" => SourcePlatform::Essay,
        "code" => SourcePlatform::Code,
        "email" => SourcePlatform::Email,
        "image_ocr" => SourcePlatform::ImageOcr,
        "journal" => SourcePlatform::Journal,
        _ => SourcePlatform::Other,
    }
}

fn parse_kind(s: &str) -> ResonanceKind {
    match s {
        "semantic" => ResonanceKind::Semantic,
        "temporal" => ResonanceKind::Temporal,
        _ => ResonanceKind::Synchronicity,
    }
}

fn fragment_from_fixture(value: &Value) -> Fragment {
    let created_at: DateTime<Utc> = value["created_at"]
        .as_str()
        .unwrap()
        .parse()
        .expect("fixture timestamp");
    let embedding: Vec<f32> = value["embedding"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap() as f32)
        .collect();
    let mut classification = ClassificationVector::default();
    for (dimension, label) in value["singles"].as_object().unwrap() {
        classification.dimensions.insert(
            dimension.clone(),
            DimensionReading::single(label.as_str().unwrap(), Confidence::new(0.8)),
        );
    }
    let platform = parse_platform(value["platform"].as_str().unwrap());
    Fragment {
        id: value["id"].as_str().unwrap().to_string(),
        title: value["title"].as_str().unwrap().to_string(),
        source: Provenance {
            platform,
            origin_path: format!("{platform}/fixture.md"),
            conversation_id: None,
            channel: None,
            interlocutor: None,
            original_encoding: None,
            utc_offset_minutes: 0,
        },
        created_at,
        ingested_at: created_at,
        text: value["text"].as_str().unwrap().to_string(),
        raw_hash: "00".repeat(32),
        classification,
        embedding: Some(embedding),
        links: Vec::new(),
        redaction_count: 0,
    }
}

#[test]
fn golden_small_collection() {
    let fixture = load_fixture_value("golden/linking/small_collection.json");
    let config = LinkingConfig {
        similarity_threshold: fixture["config"]["similarity_threshold"].as_f64().unwrap(),
        temporal_window_hours: fixture["config"]["temporal_window_hours"].as_i64().unwrap(),
        ..LinkingConfig::default()
    };
    let fragments: Vec<Fragment> = fixture["input"]["fragments"]
        .as_array()
        .unwrap()
        .iter()
        .map(fragment_from_fixture)
        .collect();

    let engine = LinkingEngine::new(config);
    let outcome = engine.link_batch(&fragments, Utc::now()).unwrap();
    assert_eq!(outcome.registered, fragments.len());

    let expected_edges = fixture["expected"]["edges"].as_array().unwrap();
    let expected_count = fixture["expected"]["edge_count"].as_u64().unwrap() as usize;
    assert_eq!(engine.edge_count(), expected_count);

    let graph = engine.graph_snapshot().unwrap();
    for edge in expected_edges {
        let kind = parse_kind(edge["kind"].as_str().unwrap());
        let a = edge["a"].as_str().unwrap();
        let b = edge["b"].as_str().unwrap();
        let strength = edge["strength"].as_f64().unwrap();

        let found = graph.between(kind, a, b).unwrap_or_else(|| {
            panic!("missing {:?} edge between {} and {}", kind, a, b)
        });
        assert!(
            (found.strength - strength).abs() < 1e-6,
            "{:?} edge {}..{}: strength {} != expected {}",
            kind,
            a,
            b,
            found.strength,
            strength
        );
    }
}

#[test]
fn golden_small_collection_relinks_as_noop() {
    let fixture = load_fixture_value("golden/linking/small_collection.json");
    let config = LinkingConfig {
        similarity_threshold: fixture["config"]["similarity_threshold"].as_f64().unwrap(),
        temporal_window_hours: fixture["config"]["temporal_window_hours"].as_i64().unwrap(),
        ..LinkingConfig::default()
    };
    let fragments: Vec<Fragment> = fixture["input"]["fragments"]
        .as_array()
        .unwrap()
        .iter()
        .map(fragment_from_fixture)
        .collect();

    let engine = LinkingEngine::new(config);
    engine.link_batch(&fragments, Utc::now()).unwrap();
    let edges_before = engine.edges().unwrap();

    let second = engine.link_batch(&fragments, Utc::now()).unwrap();
    assert_eq!(second, LinkOutcome::default());
    assert_eq!(engine.edges().unwrap(), edges_before);

    let drift = engine.relink_check().unwrap();
    assert!(drift.is_empty(), "unexpected drift: {:?}", drift);
}
