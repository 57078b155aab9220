//! Deterministic hashed embeddings.
//!
//! Terms are FNV-1a hashed into fixed-dimension buckets and weighted by
//! term frequency times a length-damped IDF stand-in. Far from a neural
//! model semantically, but dependency-free and always available.

use std::collections::HashMap;

/// Dimension of every vector produced by [`HashedEmbedder`].
pub const EMBED_DIM: usize = 384;

/// Deterministic text embedder: equal text always embeds to equal vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedEmbedder;

impl HashedEmbedder {
  /// Hash a term into a bucket index using FNV-1a.
  fn hash_term(term: &str) -> usize {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in term.as_bytes() {
      h ^= *b as u64;
      h = h.wrapping_mul(0x100000001b3);
    }
    (h as usize) % EMBED_DIM
  }

  /// Tokenize into lowercase alphanumeric terms of at least two chars.
  fn tokenize(text: &str) -> Vec<String> {
    text
      .split(|c: char| !c.is_alphanumeric() && c != '_')
      .filter(|s| s.len() >= 2)
      .map(|s| s.to_lowercase())
      .collect()
  }

  /// Embed `text` into a unit-length vector; blank text embeds to zero.
  pub fn embed(&self, text: &str) -> Vec<f32> {
    let tokens = Self::tokenize(text);
    if tokens.is_empty() {
      return vec![0.0; EMBED_DIM];
    }

    let mut tf: HashMap<String, f32> = HashMap::new();
    for tok in &tokens {
      *tf.entry(tok.clone()).or_default() += 1.0;
    }

    let total = tokens.len() as f32;
    let mut vec = vec![0.0f32; EMBED_DIM];

    for (term, count) in &tf {
      let freq = count / total;
      // Short terms are usually stopwords; damp them.
      let idf = 1.0 + (term.len() as f32).ln();
      vec[Self::hash_term(term)] += freq * idf;
    }

    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
      for v in &mut vec {
        *v /= norm;
      }
    }

    vec
  }
}
