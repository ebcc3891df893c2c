//! Sentence embeddings using Hugging Face Candle
//!
//! Runs a BERT-architecture encoder locally and mean-pools the last hidden
//! state into one vector per text. The default model is
//! `shibing624/text2vec-base-chinese`.

use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{embedding, layer_norm, linear, Activation, Embedding, LayerNorm, Linear, VarBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use crate::config::ModelConfig;
use crate::error::CorpusError;

type Result<T> = std::result::Result<T, CorpusError>;

/// Longest token sequence fed to the model
pub const MAX_SEQ_LEN: usize = 512;

/// Anything that turns texts into fixed-size vectors
pub trait TextEncoder {
    /// Length of every vector returned by `encode`
    fn dimension(&self) -> usize;

    /// One vector per input text, in input order
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;
}

/// Model configuration loaded from config.json
#[derive(Debug, Clone, Deserialize)]
pub struct BertConfig {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    #[serde(default = "default_hidden_act")]
    pub hidden_act: String,
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
}

fn default_hidden_act() -> String {
    "gelu".to_string()
}

fn default_type_vocab_size() -> usize {
    2
}

fn default_layer_norm_eps() -> f64 {
    1e-12
}

/// The three files a model directory must provide
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelFiles {
    /// Locate the model files in a local directory
    pub fn in_dir(dir: &Path) -> Result<Self> {
        let files = Self {
            config: dir.join("config.json"),
            tokenizer: dir.join("tokenizer.json"),
            weights: dir.join("model.safetensors"),
        };
        for path in [&files.config, &files.tokenizer, &files.weights] {
            if !path.exists() {
                return Err(CorpusError::Model(format!("{} not found", path.display())));
            }
        }
        Ok(files)
    }

    /// Download (or reuse the cached copy of) a model from the Hugging Face Hub
    pub fn fetch(repo_id: &str) -> Result<Self> {
        use hf_hub::api::sync::Api;

        info!("Fetching {} from Hugging Face Hub", repo_id);

        let api = Api::new().map_err(|e| CorpusError::Model(e.to_string()))?;
        let repo = api.model(repo_id.to_string());
        let get = |name: &str| {
            repo.get(name)
                .map_err(|e| CorpusError::Model(format!("{}: {}", name, e)))
        };

        Ok(Self {
            config: get("config.json")?,
            tokenizer: get("tokenizer.json")?,
            weights: get("model.safetensors")?,
        })
    }
}

struct BertEmbeddings {
    word_embeddings: Embedding,
    position_embeddings: Embedding,
    token_type_embeddings: Embedding,
    layer_norm: LayerNorm,
}

impl BertEmbeddings {
    fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        Ok(Self {
            word_embeddings: embedding(
                config.vocab_size,
                config.hidden_size,
                vb.pp("word_embeddings"),
            )?,
            position_embeddings: embedding(
                config.max_position_embeddings,
                config.hidden_size,
                vb.pp("position_embeddings"),
            )?,
            token_type_embeddings: embedding(
                config.type_vocab_size,
                config.hidden_size,
                vb.pp("token_type_embeddings"),
            )?,
            layer_norm: layer_norm(config.hidden_size, config.layer_norm_eps, vb.pp("LayerNorm"))?,
        })
    }

    fn forward(&self, input_ids: &Tensor, token_type_ids: &Tensor, position_ids: &Tensor) -> Result<Tensor> {
        let word_embeds = self.word_embeddings.forward(input_ids)?;
        let position_embeds = self.position_embeddings.forward(position_ids)?;
        let token_type_embeds = self.token_type_embeddings.forward(token_type_ids)?;

        let embeddings = ((word_embeds + position_embeds)? + token_type_embeds)?;
        Ok(self.layer_norm.forward(&embeddings)?)
    }
}

struct BertSelfAttention {
    query: Linear,
    key: Linear,
    value: Linear,
    num_attention_heads: usize,
    attention_head_size: usize,
}

impl BertSelfAttention {
    fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        let attention_head_size = config.hidden_size / config.num_attention_heads;
        let all_head_size = config.num_attention_heads * attention_head_size;

        Ok(Self {
            query: linear(config.hidden_size, all_head_size, vb.pp("query"))?,
            key: linear(config.hidden_size, all_head_size, vb.pp("key"))?,
            value: linear(config.hidden_size, all_head_size, vb.pp("value"))?,
            num_attention_heads: config.num_attention_heads,
            attention_head_size,
        })
    }

    /// [batch, seq, hidden] -> [batch, heads, seq, head_size]
    fn transpose_for_scores(&self, x: &Tensor) -> Result<Tensor> {
        let mut new_shape = x.dims().to_vec();
        new_shape.pop();
        new_shape.push(self.num_attention_heads);
        new_shape.push(self.attention_head_size);
        Ok(x.reshape(new_shape)?.transpose(1, 2)?.contiguous()?)
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let query_layer = self.transpose_for_scores(&self.query.forward(hidden_states)?)?;
        let key_layer = self.transpose_for_scores(&self.key.forward(hidden_states)?)?;
        let value_layer = self.transpose_for_scores(&self.value.forward(hidden_states)?)?;

        let attention_scores = query_layer.matmul(&key_layer.t()?)?;
        let attention_scores = (attention_scores / (self.attention_head_size as f64).sqrt())?;
        let attention_scores = attention_scores.broadcast_add(attention_mask)?;
        let attention_probs = candle_nn::ops::softmax_last_dim(&attention_scores)?;

        let context_layer = attention_probs.matmul(&value_layer)?;
        let context_layer = context_layer.transpose(1, 2)?.contiguous()?;

        let mut new_shape = context_layer.dims().to_vec();
        new_shape.pop();
        new_shape.pop();
        new_shape.push(self.num_attention_heads * self.attention_head_size);

        Ok(context_layer.reshape(new_shape)?)
    }
}

/// Dense projection followed by a residual layer norm
struct BertResidual {
    dense: Linear,
    layer_norm: LayerNorm,
}

impl BertResidual {
    fn load(vb: VarBuilder, in_dim: usize, config: &BertConfig) -> Result<Self> {
        Ok(Self {
            dense: linear(in_dim, config.hidden_size, vb.pp("dense"))?,
            layer_norm: layer_norm(config.hidden_size, config.layer_norm_eps, vb.pp("LayerNorm"))?,
        })
    }

    fn forward(&self, hidden_states: &Tensor, input_tensor: &Tensor) -> Result<Tensor> {
        let hidden_states = self.dense.forward(hidden_states)?;
        Ok(self.layer_norm.forward(&(hidden_states + input_tensor)?)?)
    }
}

struct BertLayer {
    self_attention: BertSelfAttention,
    attention_output: BertResidual,
    intermediate: Linear,
    activation: Activation,
    output: BertResidual,
}

impl BertLayer {
    fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        let activation = match config.hidden_act.as_str() {
            "relu" => Activation::Relu,
            "gelu_new" => Activation::NewGelu,
            _ => Activation::Gelu,
        };

        Ok(Self {
            self_attention: BertSelfAttention::load(vb.pp("attention").pp("self"), config)?,
            attention_output: BertResidual::load(
                vb.pp("attention").pp("output"),
                config.hidden_size,
                config,
            )?,
            intermediate: linear(
                config.hidden_size,
                config.intermediate_size,
                vb.pp("intermediate").pp("dense"),
            )?,
            activation,
            output: BertResidual::load(vb.pp("output"), config.intermediate_size, config)?,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let attended = self.self_attention.forward(hidden_states, attention_mask)?;
        let attention_output = self.attention_output.forward(&attended, hidden_states)?;

        let intermediate = self.intermediate.forward(&attention_output)?;
        let intermediate = self.activation.forward(&intermediate)?;
        self.output.forward(&intermediate, &attention_output)
    }
}

struct BertModel {
    embeddings: BertEmbeddings,
    layers: Vec<BertLayer>,
}

impl BertModel {
    fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        let embeddings = BertEmbeddings::load(vb.pp("embeddings"), config)?;

        let vb_l = vb.pp("encoder").pp("layer");
        let layers = (0..config.num_hidden_layers)
            .map(|i| BertLayer::load(vb_l.pp(i), config))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { embeddings, layers })
    }

    fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        position_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let mut hidden_states = self.embeddings.forward(input_ids, token_type_ids, position_ids)?;
        for layer in &self.layers {
            hidden_states = layer.forward(&hidden_states, attention_mask)?;
        }
        Ok(hidden_states)
    }
}

/// BERT sentence encoder with mean pooling
pub struct BertEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    hidden_size: usize,
    normalize: bool,
}

impl BertEncoder {
    /// Load from a local directory or the Hub, as configured
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let files = match &config.local_dir {
            Some(dir) => ModelFiles::in_dir(dir)?,
            None => ModelFiles::fetch(&config.repo_id)?,
        };
        Self::load(&files, config.normalize)
    }

    pub fn load(files: &ModelFiles, normalize: bool) -> Result<Self> {
        // Determine device (prefer CUDA if available)
        let device = if candle_core::utils::cuda_is_available() {
            Device::new_cuda(0)?
        } else if candle_core::utils::metal_is_available() {
            Device::new_metal(0)?
        } else {
            Device::Cpu
        };

        info!("Loading embedding model on device: {:?}", device);

        let config_str = std::fs::read_to_string(&files.config)?;
        let config: BertConfig = serde_json::from_str(&config_str)
            .map_err(|e| CorpusError::Model(format!("failed to parse config.json: {}", e)))?;

        info!(
            "Loaded config: {} layers, {} hidden size, {} attention heads",
            config.num_hidden_layers, config.hidden_size, config.num_attention_heads
        );

        let max_seq_len = config.max_position_embeddings.min(MAX_SEQ_LEN);
        let mut tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| CorpusError::Tokenizer(e.to_string()))?;
        limit_sequence_length(&mut tokenizer, max_seq_len)?;

        info!("Loading model weights from {}", files.weights.display());

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[files.weights.clone()], DType::F32, &device)?
        };

        // Checkpoints exported from task heads nest the encoder under a prefix
        let vb = ["bert", "roberta"]
            .iter()
            .map(|prefix| vb.pp(*prefix))
            .find(|vb| vb.contains_tensor("embeddings.word_embeddings.weight"))
            .unwrap_or(vb);

        let model = BertModel::load(vb, &config)?;

        info!("Model loaded successfully");

        Ok(Self {
            model,
            tokenizer,
            device,
            hidden_size: config.hidden_size,
            normalize,
        })
    }

    /// Embedding of a single text
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| CorpusError::Tokenizer(e.to_string()))?;

        let input_ids = encoding.get_ids();
        let attention_mask = encoding.get_attention_mask();
        let seq_len = input_ids.len();
        let position_ids: Vec<u32> = (0..seq_len as u32).collect();

        let input_ids = Tensor::new(input_ids, &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let position_ids = Tensor::new(&position_ids[..], &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(attention_mask, &self.device)?
            .to_dtype(DType::F32)?
            .unsqueeze(0)?;

        let extended_mask = extended_attention_mask(&attention_mask)?;
        let output = self
            .model
            .forward(&input_ids, &token_type_ids, &position_ids, &extended_mask)?;

        let pooled = mean_pooling(&output, &attention_mask)?;
        let pooled = if self.normalize {
            l2_normalize(&pooled)?
        } else {
            pooled
        };

        Ok(pooled.to_vec1::<f32>()?)
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

impl TextEncoder for BertEncoder {
    fn dimension(&self) -> usize {
        self.hidden_size
    }

    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Truncate encodings to `max_len` tokens, special tokens included, so
/// `[CLS]` and `[SEP]` survive on long paragraphs
fn limit_sequence_length(tokenizer: &mut Tokenizer, max_len: usize) -> Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_len,
            ..Default::default()
        }))
        .map_err(|e| CorpusError::Tokenizer(e.to_string()))?;
    Ok(())
}

/// [1, seq] mask of 1/0 -> [1, 1, 1, seq] additive mask of 0/-10000
fn extended_attention_mask(attention_mask: &Tensor) -> Result<Tensor> {
    let mask = attention_mask.affine(-1.0, 1.0)?;
    let mask = (mask * -10000.0)?;
    Ok(mask.unsqueeze(1)?.unsqueeze(1)?)
}

/// Average of the token states where the mask is set
///
/// `output` is [1, seq, hidden], `attention_mask` is [1, seq]; the result is
/// [hidden].
fn mean_pooling(output: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let mask = attention_mask.unsqueeze(2)?;
    let sum = output.broadcast_mul(&mask)?.sum(1)?;
    let count = mask.sum(1)?;
    Ok(sum.broadcast_div(&count)?.squeeze(0)?)
}

fn l2_normalize(tensor: &Tensor) -> Result<Tensor> {
    let norm = (tensor.sqr()?.sum_all()?.sqrt()? + 1e-12)?;
    Ok(tensor.broadcast_div(&norm)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_pooling_ignores_masked_tokens() {
        let device = Device::Cpu;
        let output = Tensor::new(&[[[1f32, 2.0], [3.0, 4.0], [100.0, 100.0]]], &device).unwrap();
        let mask = Tensor::new(&[[1f32, 1.0, 0.0]], &device).unwrap();

        let pooled = mean_pooling(&output, &mask).unwrap();
        assert_eq!(pooled.to_vec1::<f32>().unwrap(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_l2_normalize_gives_unit_length() {
        let device = Device::Cpu;
        let v = Tensor::new(&[3f32, 4.0], &device).unwrap();
        let n = l2_normalize(&v).unwrap().to_vec1::<f32>().unwrap();
        assert!((n[0] - 0.6).abs() < 1e-6);
        assert!((n[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_extended_mask_blocks_padding() {
        let device = Device::Cpu;
        let mask = Tensor::new(&[[1f32, 0.0]], &device).unwrap();
        let extended = extended_attention_mask(&mask).unwrap();
        assert_eq!(extended.dims(), &[1, 1, 1, 2]);
        let values = extended.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(values, vec![0.0, -10000.0]);
    }

    #[test]
    fn test_truncation_keeps_special_tokens() {
        use std::str::FromStr;

        let mut tokenizer = Tokenizer::from_str(
            r#"{
                "version": "1.0",
                "truncation": null,
                "padding": null,
                "added_tokens": [],
                "normalizer": null,
                "pre_tokenizer": { "type": "Whitespace" },
                "post_processor": {
                    "type": "BertProcessing",
                    "sep": ["[SEP]", 2],
                    "cls": ["[CLS]", 1]
                },
                "decoder": null,
                "model": {
                    "type": "WordLevel",
                    "vocab": { "[UNK]": 0, "[CLS]": 1, "[SEP]": 2, "碳": 3 },
                    "unk_token": "[UNK]"
                }
            }"#,
        )
        .unwrap();
        limit_sequence_length(&mut tokenizer, 4).unwrap();

        let encoding = tokenizer.encode("碳 碳 碳 碳 碳 碳", true).unwrap();
        assert_eq!(encoding.get_ids(), &[1, 3, 3, 2]);
    }

    #[test]
    fn test_bert_config_defaults() {
        let config: BertConfig = serde_json::from_str(
            r#"{
                "vocab_size": 21128,
                "hidden_size": 768,
                "num_hidden_layers": 12,
                "num_attention_heads": 12,
                "intermediate_size": 3072,
                "max_position_embeddings": 512
            }"#,
        )
        .unwrap();
        assert_eq!(config.hidden_act, "gelu");
        assert_eq!(config.type_vocab_size, 2);
    }

    #[test]
    fn test_missing_model_dir_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelFiles::in_dir(dir.path()).unwrap_err();
        assert!(matches!(err, CorpusError::Model(_)));
    }
}
