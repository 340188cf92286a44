//! ONNX Runtime sentence embeddings for ticket segments.
//!
//! Expects a sentence-transformers export (all-MiniLM-L6-v2 by default):
//! a directory holding `model.onnx` and `tokenizer.json`. Output vectors are
//! mean-pooled over the attention mask and L2-normalized.

use std::path::Path;

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Encoding, PaddingParams, Tokenizer, TruncationParams};
use tracing::info;

use crate::{Embed, normalize};

/// Token limit of the MiniLM family.
const MAX_TOKENS: usize = 256;
const FALLBACK_DIM: usize = 384;

/// Flattened `[batch, seq_len]` model inputs.
struct Inputs {
    ids: Vec<i64>,
    mask: Vec<i64>,
    type_ids: Vec<i64>,
    seq_len: usize,
}

/// Sentence embedding model running on ONNX Runtime.
pub struct Embedder {
    session: Session,
    tokenizer: Tokenizer,
    dim: usize,
}

impl Embedder {
    /// Load a model directory containing `model.onnx` and `tokenizer.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let dim = output_dim(session.outputs()[0].dtype()).unwrap_or(FALLBACK_DIM);

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(Some(PaddingParams::default()));

        info!(dim, model = %model_path.display(), "loaded ticket embedding model");
        Ok(Self {
            session,
            tokenizer,
            dim,
        })
    }

    fn encode(&self, texts: &[&str]) -> anyhow::Result<Inputs> {
        let encodings: Vec<Encoding> = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let seq_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        let size = encodings.len() * seq_len;
        let mut inputs = Inputs {
            ids: vec![0; size],
            mask: vec![0; size],
            type_ids: vec![0; size],
            seq_len,
        };

        for (row, encoding) in encodings.iter().enumerate() {
            let offset = row * seq_len;
            let tokens = encoding
                .get_ids()
                .iter()
                .zip(encoding.get_attention_mask())
                .zip(encoding.get_type_ids());
            for (col, ((&id, &mask), &type_id)) in tokens.enumerate() {
                inputs.ids[offset + col] = id as i64;
                inputs.mask[offset + col] = mask as i64;
                inputs.type_ids[offset + col] = type_id as i64;
            }
        }

        Ok(inputs)
    }
}

impl Embed for Embedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch = texts.len();
        let inputs = self.encode(texts)?;
        let shape = [batch as i64, inputs.seq_len as i64];

        let outputs = self.session.run(ort::inputs![
            "input_ids" => Tensor::from_array((shape, inputs.ids.into_boxed_slice()))?,
            "attention_mask" => Tensor::from_array((shape, inputs.mask.clone().into_boxed_slice()))?,
            "token_type_ids" => Tensor::from_array((shape, inputs.type_ids.into_boxed_slice()))?,
        ])?;

        // Token embeddings: [batch, seq_len, dim].
        let (out_shape, hidden) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = out_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] as usize == batch && dims[2] as usize == self.dim,
            "unexpected output shape {dims:?}, expected [{batch}, {}, {}]",
            inputs.seq_len,
            self.dim
        );

        let out_len = dims[1] as usize;
        Ok((0..batch)
            .map(|row| {
                let mask = &inputs.mask[row * inputs.seq_len..(row + 1) * inputs.seq_len];
                let tokens = &hidden[row * out_len * self.dim..(row + 1) * out_len * self.dim];
                mean_pool(tokens, mask, self.dim)
            })
            .collect())
    }
}

/// Average token vectors where the attention mask is set, then normalize.
fn mean_pool(tokens: &[f32], mask: &[i64], dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dim];
    let mut count = 0.0f32;

    for (token, &m) in tokens.chunks_exact(dim).zip(mask) {
        if m > 0 {
            for (p, &v) in pooled.iter_mut().zip(token) {
                *p += v;
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        for p in &mut pooled {
            *p /= count;
        }
    }
    normalize(&mut pooled);
    pooled
}

/// Last dimension of the model's output tensor, if static.
fn output_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn require_model() -> PathBuf {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("models")
            .join("all-MiniLM-L6-v2");
        if !dir.join("model.onnx").exists() {
            panic!(
                "Model not found. Download from HuggingFace:\n  \
                 curl -L -o models/all-MiniLM-L6-v2/model.onnx \
                 https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/onnx/model.onnx"
            );
        }
        dir
    }

    fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn mean_pool_ignores_masked_tokens() {
        let tokens = [1.0, 0.0, 0.0, 1.0, 5.0, 5.0];
        let pooled = mean_pool(&tokens, &[1, 1, 0], 2);
        let expected = 1.0 / 2.0f32.sqrt();
        assert!((pooled[0] - expected).abs() < 1e-6);
        assert!((pooled[1] - expected).abs() < 1e-6);
    }

    #[test]
    fn embeds_tickets_with_unit_norm() {
        let mut embedder = Embedder::load(&require_model()).unwrap();
        assert_eq!(embedder.dim(), 384);

        let vecs = embedder
            .embed_batch(&["I was charged twice", "The app crashes on launch"])
            .unwrap();
        assert_eq!(vecs.len(), 2);
        for v in &vecs {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4, "expected unit norm, got {norm}");
        }
        assert!(embedder.embed_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn similar_tickets_closer() {
        let mut embedder = Embedder::load(&require_model()).unwrap();
        let refund = embedder.embed("Please refund my duplicate payment").unwrap();
        let charge = embedder.embed("My card was billed two times").unwrap();
        let login = embedder.embed("Two-factor code never arrives").unwrap();

        assert!(cosine_sim(&refund, &charge) > cosine_sim(&refund, &login));
    }
}
