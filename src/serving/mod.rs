//! Serving config artifacts written next to a trained checkpoint
//!
//! The inference engine reads three files from a model directory:
//! `config.json` (which encoder to build and where its pieces live),
//! `zh_config.json` (the encoder network hyperparameters) and
//! `zh_vocab.txt` (the tokenizer vocabulary). The train command writes
//! default versions of all three, but only when they do not exist yet, so
//! hand-edited files survive a re-run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::model::EncoderKind;
use crate::utils;

pub const SERVING_CONFIG_FILE: &str = "config.json";
pub const NET_CONFIG_FILE: &str = "zh_config.json";
pub const VOCAB_FILE: &str = "zh_vocab.txt";

/// Top-level serving config (`config.json`), tagged by `model_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model_type", rename_all = "snake_case")]
pub enum ServingConfig {
    DualEncoder {
        q_max_seq_len: usize,
        p_max_seq_len: usize,
        model_conf_path: String,
        model_vocab_path: String,
        model_checkpoint_path: String,
        for_cn: bool,
        share_parameter: u32,
    },
    CrossEncoder {
        max_seq_len: usize,
        model_conf_path: String,
        model_vocab_path: String,
        model_checkpoint_path: String,
        for_cn: bool,
        share_parameter: u32,
    },
}

impl ServingConfig {
    /// Default serving config for a freshly trained encoder of `kind`.
    pub fn defaults_for(kind: EncoderKind) -> Self {
        match kind {
            EncoderKind::Dual => Self::DualEncoder {
                q_max_seq_len: 32,
                p_max_seq_len: 384,
                model_conf_path: NET_CONFIG_FILE.to_string(),
                model_vocab_path: VOCAB_FILE.to_string(),
                model_checkpoint_path: kind.params_dir_name().to_string(),
                for_cn: true,
                share_parameter: 0,
            },
            EncoderKind::Cross => Self::CrossEncoder {
                max_seq_len: 384,
                model_conf_path: NET_CONFIG_FILE.to_string(),
                model_vocab_path: VOCAB_FILE.to_string(),
                model_checkpoint_path: kind.params_dir_name().to_string(),
                for_cn: true,
                share_parameter: 0,
            },
        }
    }

    pub fn kind(&self) -> EncoderKind {
        match self {
            Self::DualEncoder { .. } => EncoderKind::Dual,
            Self::CrossEncoder { .. } => EncoderKind::Cross,
        }
    }

    /// Parse and validate a serving config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read serving config: {:?}", path))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid serving config: {:?}", path))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Encoder network hyperparameters (`zh_config.json`).
///
/// The defaults describe the 12-layer Chinese encoder the pretrained zh
/// models were built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderNetConfig {
    pub attention_probs_dropout_prob: f64,
    pub hidden_act: String,
    pub hidden_dropout_prob: f64,
    pub hidden_size: usize,
    pub initializer_range: f64,
    pub max_position_embeddings: usize,
    pub num_attention_heads: usize,
    pub num_hidden_layers: usize,
    pub type_vocab_size: usize,
    pub vocab_size: usize,
}

impl Default for EncoderNetConfig {
    fn default() -> Self {
        Self {
            attention_probs_dropout_prob: 0.1,
            hidden_act: "relu".to_string(),
            hidden_dropout_prob: 0.1,
            hidden_size: 768,
            initializer_range: 0.02,
            max_position_embeddings: 513,
            num_attention_heads: 12,
            num_hidden_layers: 12,
            type_vocab_size: 2,
            vocab_size: 18000,
        }
    }
}

/// Resolve the encoder kind for a model identifier.
///
/// Identifiers are either registry names carrying a kind suffix, or paths
/// to an existing serving config file whose `model_type` names the kind.
pub fn resolve_encoder_kind(identifier: &str) -> Result<EncoderKind> {
    let path = Path::new(identifier);
    if path.is_file() {
        return Ok(ServingConfig::from_file(path)?.kind());
    }
    EncoderKind::from_model_name(identifier)
}

/// Create `dir/filename` with generated content, unless it already exists.
///
/// Returns whether the file was written. Existing files are never touched.
pub fn write_if_absent(
    dir: &Path,
    filename: &str,
    gen_content: impl FnOnce() -> Result<String>,
) -> Result<bool> {
    let path = dir.join(filename);
    if path.exists() {
        tracing::debug!("Keeping existing {:?}", path);
        return Ok(false);
    }
    let content = gen_content()?;
    fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;
    tracing::info!("Wrote {:?}", path);
    Ok(true)
}

/// Vocabulary content for a base model, taken from the framework's model
/// cache. Empty when the cache holds no vocab for this model.
pub fn vocab_from_cache(base_model: &str) -> Result<String> {
    let vocab = utils::cache_dir()?.join(base_model).join(VOCAB_FILE);
    if !vocab.exists() {
        return Ok(String::new());
    }
    fs::read_to_string(&vocab).with_context(|| format!("Failed to read vocab: {:?}", vocab))
}

/// Write the default serving artifacts for a trained model, skipping any
/// file that already exists.
pub fn write_default_artifacts(out_dir: &Path, base_model: &str, kind: EncoderKind) -> Result<()> {
    write_if_absent(out_dir, SERVING_CONFIG_FILE, || {
        ServingConfig::defaults_for(kind).to_json()
    })?;
    write_if_absent(out_dir, NET_CONFIG_FILE, || {
        Ok(serde_json::to_string_pretty(&EncoderNetConfig::default())?)
    })?;
    write_if_absent(out_dir, VOCAB_FILE, || vocab_from_cache(base_model))?;
    Ok(())
}
