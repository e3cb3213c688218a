//! Hashed term-frequency embedding provider.
//!
//! Buckets terms into a fixed-dimension vector by hash and weights them by
//! in-text frequency. Fully deterministic and dependency-free, so the same
//! redacted text always lands on the same vector regardless of host.

use std::collections::HashMap;

use creek_core::errors::CreekResult;
use creek_core::traits::IEmbeddingProvider;

/// Bucket a term with FNV-1a.
fn term_bucket(term: &str, dims: usize) -> usize {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in term.as_bytes() {
        h ^= u64::from(*b);
        h = h.wrapping_mul(0x100000001b3);
    }
    (h as usize) % dims
}

/// Split text into lowercase terms of at least two characters.
///
/// Underscores count as word characters so identifiers in journal or code
/// fragments survive as single terms.
fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| t.len() >= 2)
        .map(str::to_lowercase)
        .collect()
}

/// Deterministic hashed term-frequency provider.
///
/// Not as expressive as a neural model, but it never needs a download, a
/// GPU, or a network, and identical inputs give identical vectors, which
/// the linking layer depends on.
pub struct HashedTermFrequency {
    dimensions: usize,
}

impl HashedTermFrequency {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let terms = terms(text);
        if terms.is_empty() {
            return vec![0.0; self.dimensions];
        }

        let mut counts: HashMap<&str, f32> = HashMap::new();
        for t in &terms {
            *counts.entry(t.as_str()).or_default() += 1.0;
        }

        let total = terms.len() as f32;
        let mut out = vec![0.0f32; self.dimensions];
        for (term, count) in &counts {
            // Longer terms carry more signal; short ones are mostly stopwords.
            let weight = (count / total) * (1.0 + (term.len() as f32).ln());
            out[term_bucket(term, self.dimensions)] += weight;
        }

        let norm: f32 = out.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut out {
                *v /= norm;
            }
        }
        out
    }
}

impl IEmbeddingProvider for HashedTermFrequency {
    fn embed(&self, text: &str) -> CreekResult<Vec<f32>> {
        Ok(self.vector(text))
    }

    fn embed_batch(&self, texts: &[String]) -> CreekResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashed-term-frequency"
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_maps_to_zero_vector() {
        let p = HashedTermFrequency::new(128);
        let v = p.embed("").unwrap();
        assert_eq!(v.len(), 128);
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn output_has_configured_dimensions() {
        let p = HashedTermFrequency::new(384);
        let v = p.embed("river carries sediment downstream").unwrap();
        assert_eq!(v.len(), 384);
    }

    #[test]
    fn nonempty_output_is_unit_norm() {
        let p = HashedTermFrequency::new(256);
        let v = p.embed("discipline is the ship steering itself").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "expected unit norm, got {norm}");
    }

    #[test]
    fn identical_text_identical_vector() {
        let p = HashedTermFrequency::new(256);
        assert_eq!(
            p.embed("same words in").unwrap(),
            p.embed("same words in").unwrap()
        );
    }

    #[test]
    fn batch_agrees_with_single_calls() {
        let p = HashedTermFrequency::new(128);
        let texts = vec!["first entry".to_string(), "second entry here".to_string()];
        let batch = p.embed_batch(&texts).unwrap();
        for (i, text) in texts.iter().enumerate() {
            assert_eq!(batch[i], p.embed(text).unwrap());
        }
    }

    #[test]
    fn overlapping_texts_score_closer_than_disjoint() {
        let p = HashedTermFrequency::new(256);
        let a = p.embed("steering the ship through discipline").unwrap();
        let b = p.embed("steering the ship with intention").unwrap();
        let c = p.embed("quarterly budget meeting agenda").unwrap();

        let cos_ab: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        let cos_ac: f32 = a.iter().zip(&c).map(|(x, y)| x * y).sum();
        assert!(cos_ab > cos_ac);
    }

    #[test]
    fn single_char_terms_are_ignored() {
        let p = HashedTermFrequency::new(64);
        let v = p.embed("a b c d e").unwrap();
        assert!(v.iter().all(|&x| x == 0.0));
    }
}
