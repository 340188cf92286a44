//! AI layer: sentence embeddings plus the completion-backed ticket stages
//! (classification, response drafting, response review).

pub mod classifier;
mod hashing;
pub mod responder;
pub mod reviewer;

#[cfg(feature = "onnx")]
mod embedder;

#[cfg(test)]
mod testing;

pub use classifier::{Classification, Classifier};
#[cfg(feature = "onnx")]
pub use embedder::Embedder;
pub use hashing::HashEmbedder;
pub use responder::ResponseGenerator;
pub use reviewer::{Decision, Reviewer, should_regenerate};

/// Text embedding model producing fixed-width vectors.
pub trait Embed: Send {
    /// Embedding dimensionality.
    fn dim(&self) -> usize;

    /// Embed a batch of texts, returning one vector per input in order.
    fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    fn embed(&mut self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// L2-normalize a vector in place.
pub(crate) fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
