//! # E5 Embedder
//!
//! Local E5 text embeddings on a BERT encoder using candle, without any
//! Python or network dependency at inference time.

use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use serde::Deserialize;
use tokenizers::{
    PaddingParams, PaddingStrategy, Tokenizer as HfTokenizer, TruncationParams,
};
use tracing::{debug, info};

use super::{Embedder, frame_passage, frame_query};
use crate::error::{Result, ShotseekError};

/// Longest token sequence fed to the encoder.
const MAX_SEQ_LEN: usize = 512;

#[derive(Deserialize)]
struct EncoderShape {
    hidden_size: usize,
}

/// E5 embedder backed by a BERT-architecture checkpoint.
///
/// The model directory must contain `config.json`, `tokenizer.json` and
/// `model.safetensors`, as exported for `intfloat/multilingual-e5-small`.
pub struct E5Embedder {
    model_id: String,
    model: BertModel,
    tokenizer: HfTokenizer,
    device: Device,
    dim: usize,
}

impl E5Embedder {
    /// Loads the tokenizer and weights from `model_dir`.
    ///
    /// # Errors
    ///
    /// Returns `ShotseekError::ModelLoadError` if any model file is missing
    /// or malformed, and `ShotseekError::TokenizerError` if the tokenizer
    /// cannot be configured.
    pub fn load(model_dir: impl AsRef<Path>, model_id: impl Into<String>) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let device = Device::Cpu;

        let config_path = model_dir.join("config.json");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let weights_path = model_dir.join("model.safetensors");

        for path in [&config_path, &tokenizer_path, &weights_path] {
            if !path.exists() {
                return Err(ShotseekError::ModelLoadError(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let config_str = std::fs::read_to_string(&config_path).map_err(|e| {
            ShotseekError::ModelLoadError(format!("failed to read config: {e}"))
        })?;
        let config: BertConfig = serde_json::from_str(&config_str).map_err(|e| {
            ShotseekError::ModelLoadError(format!("failed to parse config: {e}"))
        })?;
        let shape: EncoderShape = serde_json::from_str(&config_str).map_err(|e| {
            ShotseekError::ModelLoadError(format!("config has no hidden_size: {e}"))
        })?;

        let mut tokenizer = HfTokenizer::from_file(&tokenizer_path)
            .map_err(|e| ShotseekError::TokenizerError(e.to_string()))?;
        let pad_id = tokenizer
            .token_to_id("<pad>")
            .or_else(|| tokenizer.token_to_id("[PAD]"))
            .unwrap_or(0);
        let pad_token = tokenizer
            .id_to_token(pad_id)
            .unwrap_or_else(|| "[PAD]".to_string());
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            pad_id,
            pad_token,
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| ShotseekError::TokenizerError(e.to_string()))?;

        // The weights file is mapped read-only and must not change while loaded.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[&weights_path], DTYPE, &device) }
            .map_err(|e| ShotseekError::ModelLoadError(e.to_string()))?;
        let model = BertModel::load(vb, &config)
            .map_err(|e| ShotseekError::ModelLoadError(e.to_string()))?;

        let model_id = model_id.into();
        info!(model = %model_id, dim = shape.hidden_size, dir = %model_dir.display(), "loaded E5 embedder");

        Ok(Self {
            model_id,
            model,
            tokenizer,
            device,
            dim: shape.hidden_size,
        })
    }

    /// Runs one forward pass over already-framed texts.
    fn embed_framed(&self, framed: &[String]) -> Result<Vec<Vec<f32>>> {
        if framed.is_empty() {
            return Ok(Vec::new());
        }

        let inputs: Vec<&str> = framed.iter().map(String::as_str).collect();
        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| ShotseekError::TokenizerError(format!("tokenize error: {e}")))?;

        let ids = encodings
            .iter()
            .map(|enc| Tensor::new(enc.get_ids(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()?;
        let masks = encodings
            .iter()
            .map(|enc| Tensor::new(enc.get_attention_mask(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()?;

        let input_ids = Tensor::stack(&ids, 0)?;
        let attention_mask = Tensor::stack(&masks, 0)?;
        let token_type_ids = input_ids.zeros_like()?;

        // [batch, seq, hidden]
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(|e| ShotseekError::InferenceError(e.to_string()))?;

        // Mean pooling over real tokens only.
        let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?.maximum(1e-9)?;
        let pooled = summed.broadcast_div(&counts)?;

        let norms = pooled.sqr()?.sum_keepdim(1)?.sqrt()?.maximum(1e-12)?;
        let normalized = pooled.broadcast_div(&norms)?;

        let rows = normalized.to_vec2::<f32>()?;
        debug!(batch = rows.len(), seq_len = input_ids.dim(1)?, "encoded batch");
        Ok(rows)
    }
}

impl Embedder for E5Embedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn encode_passages(&self, texts: &[&str], batch_size: usize) -> Result<Vec<Vec<f32>>> {
        let batch_size = batch_size.max(1);
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(batch_size) {
            let framed: Vec<String> = chunk.iter().map(|t| frame_passage(t)).collect();
            out.extend(self.embed_framed(&framed)?);
        }
        Ok(out)
    }

    fn encode_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut rows = self.embed_framed(&[frame_query(text)])?;
        rows.pop()
            .ok_or_else(|| ShotseekError::InferenceError("encoder returned no rows".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_dir_fails_cleanly() {
        let dir = std::env::temp_dir().join("shotseek-no-such-model-dir");
        let err = E5Embedder::load(&dir, "intfloat/multilingual-e5-small")
            .err()
            .expect("loading from a missing directory must fail");
        assert!(matches!(err, ShotseekError::ModelLoadError(_)));
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn embedder_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<E5Embedder>();
    }
}
