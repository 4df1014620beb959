//! Local transformer sentence embedder running on candle.
//!
//! The model directory must contain `config.json`, `tokenizer.json` and either
//! `model.safetensors` or `pytorch_model.bin`. BERT-family checkpoints (e.g.
//! all-MiniLM-L6-v2, 384-d) and XLM-RoBERTa checkpoints (e.g. bge-m3, 1024-d)
//! are supported; `model_type` in `config.json` selects the backbone.

use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use docrag_core::traits::Embedder;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::{apply_truncation, tokenize_batch};

/// Batches slower than this get a warning.
const SLOW_BATCH_MS: u128 = 2_000;

enum Backbone {
    Bert(BertModel),
    XlmRoberta(XLMRobertaModel),
}

impl Backbone {
    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = match self {
            Self::Bert(m) => m.forward(input_ids, &token_type_ids, Some(attention_mask))?,
            Self::XlmRoberta(m) => m.forward(input_ids, attention_mask, &token_type_ids, None, None, None)?,
        };
        Ok(hidden)
    }
}

pub struct SentenceEmbedder {
    model: Backbone,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    id: String,
}

impl SentenceEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        apply_truncation(&mut tokenizer, max_len)?;

        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path).with_context(|| format!("reading {}", config_path.display()))?;
        let config_json: serde_json::Value = serde_json::from_str(&raw_config)?;
        let dim = config_json
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .and_then(|d| usize::try_from(d).ok())
            .ok_or_else(|| anyhow!("{} has no hidden_size", config_path.display()))?;
        let model_type = config_json.get("model_type").and_then(serde_json::Value::as_str).unwrap_or("bert").to_string();

        let vb = VarBuilder::from_tensors(load_weights(model_dir, &device)?, DType::F32, &device);
        let model = match model_type.as_str() {
            "xlm-roberta" => Backbone::XlmRoberta(XLMRobertaModel::new(&serde_json::from_str::<XLMRobertaConfig>(&raw_config)?, vb)?),
            "bert" => Backbone::Bert(BertModel::load(vb, &serde_json::from_str::<BertConfig>(&raw_config)?)?),
            other => bail!("unsupported model_type '{other}' in {}", config_path.display()),
        };

        let name = model_dir.file_name().map_or_else(|| "model".to_string(), |n| n.to_string_lossy().to_string());
        let id = format!("local:{name}:d{dim}");
        info!(id = %id, "embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len, id })
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        return Ok(candle_core::pickle::read_all(&pickle)?.into_iter().collect());
    }
    bail!("no model.safetensors or pytorch_model.bin in {}", model_dir.display())
}

impl Embedder for SentenceEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_batch(&self.tokenizer, texts, self.max_len, &self.device)?;
        let hidden = self.model.forward(&input_ids, &attention_mask)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        let elapsed = start.elapsed().as_millis();
        if elapsed > SLOW_BATCH_MS {
            warn!(batch = texts.len(), elapsed_ms = elapsed, "slow embedding batch");
        } else {
            debug!(batch = texts.len(), elapsed_ms = elapsed, "embedded batch");
        }
        Ok(vectors)
    }
}
