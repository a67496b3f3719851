//! Python-side driver for the framework
//!
//! The framework's training and export entry points are Python API calls.
//! Each operation serializes a job description to JSON, hands it to a
//! small embedded driver script via argv, and waits for the interpreter to
//! exit. Stdio is inherited so the framework's own training progress
//! output streams through unchanged.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::Path;
use std::process::{Command, Stdio};

use super::{Backend, Encoder, LoadOptions, TrainOptions};
use crate::export::ExportContract;
use crate::model::EncoderKind;
use crate::serving;

/// Environment variable naming the Python interpreter to use.
pub const PYTHON_ENV: &str = "RQT_PYTHON";

const DEFAULT_INTERPRETER: &str = "python";

const TRAIN_DRIVER: &str = r#"
import json, sys
import rocketqa

job = json.loads(sys.argv[1])
encoder = rocketqa.load_model(
    model=job["model"],
    use_cuda=job["use_cuda"],
    device_id=job["device_id"],
    batch_size=job["batch_size"],
)
encoder.train(
    job["train_set"],
    job["epoch"],
    job["save_path"],
    save_steps=job["save_steps"],
    learning_rate=job["learning_rate"],
)
"#;

const EXPORT_DRIVER: &str = r#"
import json, sys
import paddle
import rocketqa

job = json.loads(sys.argv[1])
encoder = rocketqa.load_model(
    model=job["model"],
    use_cuda=job["use_cuda"],
    device_id=job["device_id"],
    batch_size=job["batch_size"],
)
block = encoder.test_prog.global_block()
paddle.static.save_inference_model(
    path_prefix=job["path_prefix"],
    feed_vars=[block.var(name) for name in job["feed_vars"]],
    fetch_vars=[encoder.graph_vars[name] for name in job["fetch_vars"]],
    executor=encoder.exe,
    program=encoder.test_prog,
)
"#;

#[derive(Serialize)]
struct TrainJob<'a> {
    model: &'a str,
    use_cuda: bool,
    device_id: u32,
    batch_size: usize,
    train_set: &'a Path,
    save_path: &'a Path,
    epoch: usize,
    save_steps: usize,
    learning_rate: f64,
}

#[derive(Serialize)]
struct ExportJob<'a> {
    model: &'a str,
    use_cuda: bool,
    device_id: u32,
    batch_size: usize,
    path_prefix: &'a str,
    feed_vars: Vec<String>,
    fetch_vars: Vec<String>,
}

/// Backend that drives the framework through a Python subprocess.
#[derive(Debug, Clone, Default)]
pub struct PythonBackend {
    interpreter: Option<String>,
}

impl PythonBackend {
    /// Backend using the interpreter from `RQT_PYTHON`, falling back to
    /// `python` on PATH.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interpreter(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: Some(interpreter.into()),
        }
    }

    fn interpreter(&self) -> String {
        self.interpreter
            .clone()
            .or_else(|| std::env::var(PYTHON_ENV).ok())
            .unwrap_or_else(|| DEFAULT_INTERPRETER.to_string())
    }

    fn run(&self, driver: &str, job: &impl Serialize) -> Result<()> {
        let interpreter = self.interpreter();
        let payload = serde_json::to_string(job)?;
        tracing::debug!("Running framework driver via {}", interpreter);

        let status = Command::new(&interpreter)
            .arg("-c")
            .arg(driver)
            .arg(payload)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to launch framework interpreter: {}", interpreter))?;

        if !status.success() {
            bail!("Framework driver exited with {}", status);
        }
        Ok(())
    }
}

impl Backend for PythonBackend {
    fn load(&self, model: &str, opts: &LoadOptions) -> Result<Box<dyn Encoder>> {
        let kind = serving::resolve_encoder_kind(model)?;
        tracing::info!("Loading {} ({})", model, kind);
        Ok(Box::new(PythonEncoder {
            backend: self.clone(),
            model: model.to_string(),
            load: opts.clone(),
            kind,
        }))
    }
}

/// An encoder handle; the framework-side load happens inside the driver
/// together with the train or export call, one subprocess per operation.
struct PythonEncoder {
    backend: PythonBackend,
    model: String,
    load: LoadOptions,
    kind: EncoderKind,
}

impl Encoder for PythonEncoder {
    fn kind(&self) -> EncoderKind {
        self.kind
    }

    fn train(&self, train_set: &Path, save_path: &Path, opts: &TrainOptions) -> Result<()> {
        tracing::info!(
            "Training {} for {} epoch(s), lr {}",
            self.model,
            opts.epoch,
            opts.learning_rate
        );
        self.backend.run(
            TRAIN_DRIVER,
            &TrainJob {
                model: &self.model,
                use_cuda: self.load.use_cuda,
                device_id: self.load.device_id,
                batch_size: self.load.batch_size,
                train_set,
                save_path,
                epoch: opts.epoch,
                save_steps: opts.save_steps,
                learning_rate: opts.learning_rate,
            },
        )
    }

    fn export(&self, contract: &ExportContract, path_prefix: &str) -> Result<()> {
        tracing::info!("Exporting {} to {}", self.model, path_prefix);
        self.backend.run(
            EXPORT_DRIVER,
            &ExportJob {
                model: &self.model,
                use_cuda: self.load.use_cuda,
                device_id: self.load.device_id,
                batch_size: self.load.batch_size,
                path_prefix,
                feed_vars: contract.feed_names(),
                fetch_vars: contract.fetch_names(),
            },
        )
    }
}
