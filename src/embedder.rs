use anyhow::{Context, Result};
use ort::value::Tensor;
use std::path::Path;
use tokenizers::{Tokenizer, TruncationParams};

/// ONNX Runtime wrapper that turns text into MiniLM sentence embeddings.
///
/// Movie overviews fit comfortably inside the model's token window, so
/// longer inputs are simply truncated by the tokenizer.
pub struct Embedder {
    session: ort::session::Session,
    tokenizer: Tokenizer,
}

impl Embedder {
    /// Output dimension of all-MiniLM-L6-v2.
    pub const DIMENSION: usize = 384;

    /// Token window of the model.
    const MAX_TOKENS: usize = 512;

    /// Loads the ONNX model and tokenizer from the given directory.
    pub fn new(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        let session = ort::session::Session::builder()
            .context("Failed to create ONNX session builder")?
            .with_intra_threads(1)
            .context("Failed to set thread count")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {:?}", model_path))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: Self::MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        Ok(Self { session, tokenizer })
    }

    /// Embeds one text: tokenize, run the model, attention mean-pool,
    /// L2-normalize. Empty input maps to the zero vector.
    pub fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(vec![0.0; Self::DIMENSION]);
        }

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let input_ids = encoding.get_ids();
        let attention_mask = encoding.get_attention_mask();
        let seq_len = input_ids.len();
        let shape = vec![1i64, seq_len as i64];

        let ids_i64: Vec<i64> = input_ids.iter().map(|&x| x as i64).collect();
        let mask_i64: Vec<i64> = attention_mask.iter().map(|&x| x as i64).collect();
        let type_ids = vec![0i64; seq_len];

        let ids_tensor = Tensor::from_array((shape.clone(), ids_i64))
            .context("Failed to create input_ids tensor")?;
        let mask_tensor = Tensor::from_array((shape.clone(), mask_i64))
            .context("Failed to create attention_mask tensor")?;
        let type_ids_tensor = Tensor::from_array((shape, type_ids))
            .context("Failed to create token_type_ids tensor")?;

        let outputs = self
            .session
            .run(ort::inputs! {
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => type_ids_tensor,
            })
            .context("ONNX inference failed")?;

        // last_hidden_state: [1, seq_len, DIMENSION] as a flat slice
        let (_shape, hidden) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract output tensor")?;

        let mut pooled = mean_pool(hidden, attention_mask, seq_len, Self::DIMENSION);
        l2_normalize(&mut pooled);
        Ok(pooled)
    }
}

/// Attention-masked mean pooling over the token axis of a flat
/// `[1, seq_len, dim]` tensor.
fn mean_pool(hidden: &[f32], mask: &[u32], seq_len: usize, dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dim];
    let mut weight = 0.0f32;

    for (token, &m) in mask.iter().enumerate().take(seq_len) {
        if m == 0 {
            continue;
        }
        weight += 1.0;
        let offset = token * dim;
        for (j, p) in pooled.iter_mut().enumerate() {
            *p += hidden[offset + j];
        }
    }

    if weight > 0.0 {
        for p in &mut pooled {
            *p /= weight;
        }
    }

    pooled
}

/// Scales a vector to unit length in place; the zero vector is untouched.
fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v {
            *x /= norm;
        }
    }
}
