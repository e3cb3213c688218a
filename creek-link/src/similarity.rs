//! Similarity metrics over embedding vectors.
//!
//! Accumulation runs in f64 whatever the storage type, and every metric is
//! symmetric in its arguments: `score(a, b) == score(b, a)` exactly. Edge
//! determinism depends on that symmetry, since a pair can be scored from
//! either side depending on which fragment arrived later.

use creek_core::config::SimilarityMetric;

/// Cosine similarity, clamped to [-1, 1]. Mismatched lengths and
/// zero-magnitude vectors score 0.0 rather than erroring; the index layer
/// rejects bad dimensions before scoring ever sees them.
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut mag_a, mut mag_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }
    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}

/// Dot product. A meaningful similarity only over normalized vectors,
/// which the embedding stage guarantees for its own output.
pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| *x as f64 * *y as f64)
        .sum()
}

/// Score a pair under the configured metric.
pub fn score(metric: SimilarityMetric, a: &[f32], b: &[f32]) -> f64 {
    match metric {
        SimilarityMetric::Cosine => cosine(a, b),
        SimilarityMetric::Dot => dot(a, b),
    }
}
