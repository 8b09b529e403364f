//! Local embedding backend: runs a sentence-transformer on your hardware.
//!
//! Uses [Candle](https://github.com/huggingface/candle) (Rust-native ML) to run
//! BERT-family encoders with mean pooling. Weights are fetched once from the
//! HuggingFace Hub and cached; after that no network is needed.
//!
//! # Example
//! ```toml
//! [embedding]
//! backend = "local"
//! model = "all-minilm-l6-v2"
//! ```

use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::api::sync::Api;
use parley_core::embedding::{Embedder, Embedding};
use parley_core::error::EmbeddingError;
use std::sync::Arc;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer};
use tokio::sync::Mutex;
use tracing::info;

/// Resolve a friendly alias to a HuggingFace repo.
fn resolve_repo(alias: &str) -> String {
    match alias.to_lowercase().as_str() {
        "all-minilm-l6-v2" | "minilm" | "minilm-l6" => {
            "sentence-transformers/all-MiniLM-L6-v2".into()
        }
        "all-minilm-l12-v2" | "minilm-l12" => "sentence-transformers/all-MiniLM-L12-v2".into(),
        "bge-small" | "bge-small-en" => "BAAI/bge-small-en-v1.5".into(),
        _ => alias.to_string(),
    }
}

/// An embedder backed by a local BERT encoder.
///
/// The model sits behind a Mutex and is loaded on first use; inference runs
/// on a blocking thread.
pub struct LocalEmbedder {
    inner: Arc<Mutex<Option<EncoderState>>>,
    name: String,
    repo: String,
}

struct EncoderState {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl LocalEmbedder {
    /// `model` is an alias (`"all-minilm-l6-v2"`) or a HuggingFace repo id.
    pub fn new(model: &str) -> Self {
        let repo = resolve_repo(model);
        Self {
            inner: Arc::new(Mutex::new(None)),
            name: format!("local:{repo}"),
            repo,
        }
    }
}

impl EncoderState {
    fn load(repo_id: &str) -> Result<Self, EmbeddingError> {
        let device = Device::Cpu;

        info!(repo = repo_id, "Downloading/loading local embedding model");

        let api = Api::new().map_err(|e| {
            EmbeddingError::Network(format!("Failed to initialize HuggingFace Hub API: {e}"))
        })?;
        let repo = api.model(repo_id.to_string());

        let fetch = |file: &str| {
            repo.get(file).map_err(|e| {
                EmbeddingError::Network(format!("Failed to download '{file}' from '{repo_id}': {e}"))
            })
        };
        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;

        let config_text = std::fs::read_to_string(&config_path)
            .map_err(|e| EmbeddingError::Model(format!("Failed to read model config: {e}")))?;
        let config: Config = serde_json::from_str(&config_text)
            .map_err(|e| EmbeddingError::Model(format!("Failed to parse model config: {e}")))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbeddingError::Model(format!("Failed to load tokenizer: {e}")))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        // SAFETY: the weights file is owned by the hf-hub cache and not modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)
                .map_err(map_candle_err)?
        };
        let model = BertModel::load(vb, &config).map_err(map_candle_err)?;

        info!(repo = repo_id, hidden = config.hidden_size, "Local embedding model loaded");

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    /// Encode a batch and mean-pool over non-padding tokens.
    fn encode(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::Model(format!("Tokenization failed: {e}")))?;

        let ids = encodings
            .iter()
            .map(|e| Tensor::new(e.get_ids(), &self.device))
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_candle_err)?;
        let masks = encodings
            .iter()
            .map(|e| Tensor::new(e.get_attention_mask(), &self.device))
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_candle_err)?;

        let ids = Tensor::stack(&ids, 0).map_err(map_candle_err)?;
        let mask = Tensor::stack(&masks, 0).map_err(map_candle_err)?;
        let token_types = ids.zeros_like().map_err(map_candle_err)?;

        // (batch, tokens, hidden)
        let hidden = self
            .model
            .forward(&ids, &token_types, Some(&mask))
            .map_err(map_candle_err)?;

        let mask = mask
            .to_dtype(DTYPE)
            .and_then(|m| m.unsqueeze(2))
            .map_err(map_candle_err)?;
        let summed = hidden
            .broadcast_mul(&mask)
            .and_then(|t| t.sum(1))
            .map_err(map_candle_err)?;
        let counts = mask.sum(1).map_err(map_candle_err)?;
        let pooled = summed.broadcast_div(&counts).map_err(map_candle_err)?;

        pooled.to_vec2::<f32>().map_err(map_candle_err)
    }
}

fn map_candle_err(e: candle_core::Error) -> EmbeddingError {
    EmbeddingError::Model(format!("Candle inference error: {e}"))
}

#[async_trait]
impl Embedder for LocalEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        {
            let mut state = self.inner.lock().await;
            if state.is_none() {
                let repo = self.repo.clone();
                let loaded = tokio::task::spawn_blocking(move || EncoderState::load(&repo))
                    .await
                    .map_err(|e| EmbeddingError::Model(format!("Model loading task failed: {e}")))??;
                *state = Some(loaded);
            }
        }

        let inner = self.inner.clone();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || {
            let guard = inner.blocking_lock();
            let state = guard
                .as_ref()
                .ok_or_else(|| EmbeddingError::Model("Model not loaded".into()))?;
            state.encode(&texts)
        })
        .await
        .map_err(|e| EmbeddingError::Model(format!("Inference task panicked: {e}")))?
    }
}
