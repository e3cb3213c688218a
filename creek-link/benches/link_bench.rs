use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};

use creek_core::config::LinkingConfig;
use creek_core::fragment::{
    ClassificationVector, Confidence, DimensionReading, Fragment, Provenance, SourcePlatform,
};
use creek_link::LinkingEngine;

/// Deterministic pseudo-random unit vector. A local xorshift keeps the bench
/// free of a rand dependency and makes runs comparable.
fn unit_vector(mut seed: u64, dims: usize) -> Vec<f32> {
    let mut v = Vec::with_capacity(dims);
    for _ in 0..dims {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        v.push((seed >> 40) as f32 / (1u64 << 24) as f32 - 0.5);
    }
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(f32::EPSILON);
    v.iter().map(|x| x / norm).collect()
}

/// Build `n` fragments spread one day apart so the temporal window stays
/// around two weeks of neighbours per fragment.
fn make_batch(n: usize, dims: usize) -> Vec<Fragment> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let created = start + Duration::days(i as i64);
            let mut classification = ClassificationVector::default();
            let label = if i % 2 == 0 { "steering" } else { "drifting" };
            classification.dimensions.insert(
                "f3_agency".to_string(),
                DimensionReading::single(label, Confidence::new(0.8)),
            );
            Fragment {
                id: format!("frag-{i:016x}"),
                title: format!("entry {i}"),
                source: Provenance {
                    platform: SourcePlatform::Journal,
                    origin_path: format!("journal/{i}.md"),
                    conversation_id: None,
                    channel: None,
                    interlocutor: None,
                    original_encoding: None,
                    utc_offset_minutes: 0,
                },
                created_at: created,
                ingested_at: created,
                text: format!("entry {i}"),
                raw_hash: format!("{i:064x}"),
                classification,
                embedding: Some(unit_vector(0x9e37_79b9_7f4a_7c15 ^ i as u64, dims)),
                links: Vec::new(),
                redaction_count: 0,
            }
        })
        .collect()
}

fn bench_link_batch_exact(c: &mut Criterion) {
    let batch = make_batch(256, 64);

    c.bench_function("link_batch_exact_256", |b| {
        b.iter(|| {
            let engine = LinkingEngine::new(LinkingConfig::default());
            engine.link_batch(&batch, Utc::now()).unwrap();
        });
    });
}

fn bench_link_batch_ann(c: &mut Criterion) {
    let config = LinkingConfig {
        exact_search_limit: 64,
        ..LinkingConfig::default()
    };
    let batch = make_batch(1024, 64);

    c.bench_function("link_batch_ann_1k", |b| {
        b.iter(|| {
            let engine = LinkingEngine::new(config.clone());
            engine.link_batch(&batch, Utc::now()).unwrap();
        });
    });
}

fn bench_relink_check(c: &mut Criterion) {
    let batch = make_batch(256, 64);
    let engine = LinkingEngine::new(LinkingConfig::default());
    engine.link_batch(&batch, Utc::now()).unwrap();

    c.bench_function("relink_check_256", |b| {
        b.iter(|| {
            engine.relink_check().unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_link_batch_exact,
    bench_link_batch_ann,
    bench_relink_check
);
criterion_main!(benches);
