//! Seam to the external training framework
//!
//! All numerical work (the training loop, the inference graph, checkpoint
//! serialization) happens inside the framework; this module only describes
//! the calls the CLI makes across that boundary, so command flows can be
//! tested with a stand-in backend.

use anyhow::Result;
use std::path::Path;

use crate::export::ExportContract;
use crate::model::EncoderKind;

pub mod python;

pub use python::PythonBackend;

/// Options passed when loading an encoder.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub use_cuda: bool,
    pub device_id: u32,
    pub batch_size: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            use_cuda: false,
            device_id: 0,
            batch_size: 32,
        }
    }
}

impl LoadOptions {
    pub fn with_cuda(use_cuda: bool) -> Self {
        Self {
            use_cuda,
            ..Default::default()
        }
    }
}

/// Options forwarded to the framework's train call.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub epoch: usize,
    pub save_steps: usize,
    pub learning_rate: f64,
}

/// A loaded dual or cross encoder.
pub trait Encoder {
    fn kind(&self) -> EncoderKind;

    /// Run the framework's training loop, saving checkpoints under
    /// `save_path`.
    fn train(&self, train_set: &Path, save_path: &Path, opts: &TrainOptions) -> Result<()>;

    /// Run the framework's inference-model export with the feed and fetch
    /// variables named by `contract`.
    fn export(&self, contract: &ExportContract, path_prefix: &str) -> Result<()>;
}

/// Loads encoders by model identifier.
pub trait Backend {
    fn load(&self, model: &str, opts: &LoadOptions) -> Result<Box<dyn Encoder>>;
}
