//! Hashed term-frequency embeddings.
//!
//! Always available and fully deterministic, used when no ONNX model is
//! configured. Terms are hashed (FNV-1a) into fixed buckets, weighted by term
//! frequency and a length-based IDF approximation, then L2-normalized.

use std::collections::HashMap;

use crate::{Embed, normalize};

#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let terms = tokenize(text);
        let mut v = vec![0.0f32; self.dim];
        if terms.is_empty() {
            return v;
        }

        let mut tf: HashMap<&str, f32> = HashMap::new();
        for term in &terms {
            *tf.entry(term.as_str()).or_default() += 1.0;
        }

        let total = terms.len() as f32;
        for (term, count) in tf {
            let idf = 1.0 + (term.len() as f32).ln();
            v[bucket(term, self.dim)] += count / total * idf;
        }

        normalize(&mut v);
        v
    }
}

impl Embed for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

/// Lowercase alphanumeric terms of two or more characters.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| s.chars().count() >= 2)
        .map(|s| s.to_lowercase())
        .collect()
}

fn bucket(term: &str, dim: usize) -> usize {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in term.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    (h % dim as u64) as usize
}
