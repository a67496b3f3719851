//! Command-line interface
//!
//! Provides the train, save and models commands.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::backend::{Backend, LoadOptions, TrainOptions};
use crate::checkpoint;
use crate::export::ExportContract;
use crate::model;
use crate::serving;

/// Execute the train command
pub async fn train(
    backend: &dyn Backend,
    base_model: String,
    train_set: String,
    use_cuda: bool,
    epoch: usize,
    out_path: String,
    save_steps: usize,
    learning_rate: f64,
) -> Result<()> {
    if !model::is_available(&base_model) {
        bail!(
            "Unknown base model: {} (available: {})",
            base_model,
            model::available_models().join(", ")
        );
    }
    let kind = model::EncoderKind::from_model_name(&base_model)?;

    tracing::info!("Starting training run");
    tracing::info!("  Base model: {} ({})", base_model, kind);
    tracing::info!("  Train set: {}", train_set);
    tracing::info!("  Epochs: {}", epoch);
    tracing::info!("  Learning rate: {}", learning_rate);
    tracing::info!("  Save steps: {}", save_steps);
    tracing::info!("  CUDA: {}", use_cuda);

    let out_dir = Path::new(&out_path);
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_path))?;

    // Train into a scratch directory; the checkpoint is promoted from
    // there once the framework is done with it.
    let scratch_dir = out_dir.join("temp");
    let encoder = backend.load(&base_model, &LoadOptions::with_cuda(use_cuda))?;
    encoder.train(
        Path::new(&train_set),
        &scratch_dir,
        &TrainOptions {
            epoch,
            save_steps,
            learning_rate,
        },
    )?;

    let dest = out_dir.join(kind.params_dir_name());
    let promoted = checkpoint::promote(&scratch_dir, &dest)?;

    serving::write_default_artifacts(out_dir, &base_model, kind)?;

    println!("\nTraining Summary:");
    println!("  Base model: {}", base_model);
    println!("  Checkpoint: {}", promoted.display());
    println!("  Output directory: {}", out_path);

    Ok(())
}

/// Execute the save command
pub async fn save(backend: &dyn Backend, model_id: String, out_path: Option<String>) -> Result<()> {
    let encoder = backend.load(&model_id, &LoadOptions::default())?;
    let kind = encoder.kind();
    let contract = ExportContract::for_kind(kind);
    let path_prefix = out_path.unwrap_or_else(|| model_id.clone());

    tracing::info!("Exporting inference model");
    tracing::info!("  Model: {} ({})", model_id, kind);
    tracing::info!("  Feeds: {:?}", contract.feed_names());
    tracing::info!("  Fetches: {:?}", contract.fetch_names());

    encoder.export(&contract, &path_prefix)?;

    println!("\nExport Summary:");
    println!("  Model: {}", model_id);
    println!("  Output prefix: {}", path_prefix);

    Ok(())
}

/// Execute the models command
pub async fn models() -> Result<()> {
    println!("Available base models:");
    for name in model::available_models() {
        let kind = model::EncoderKind::from_model_name(name)?;
        println!("  {:<24} {}", name, kind);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Encoder;
    use crate::model::EncoderKind;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<String>>>;

    /// Stand-in for the framework: records calls and fabricates the
    /// on-disk layout a real training run leaves behind.
    struct MockBackend {
        calls: CallLog,
    }

    impl MockBackend {
        fn new() -> Self {
            Self {
                calls: Rc::new(RefCell::new(Vec::new())),
            }
        }
    }

    impl Backend for MockBackend {
        fn load(&self, model: &str, opts: &LoadOptions) -> Result<Box<dyn Encoder>> {
            let kind = serving::resolve_encoder_kind(model)?;
            self.calls
                .borrow_mut()
                .push(format!("load {} cuda={}", model, opts.use_cuda));
            Ok(Box::new(MockEncoder {
                kind,
                calls: Rc::clone(&self.calls),
            }))
        }
    }

    struct MockEncoder {
        kind: EncoderKind,
        calls: CallLog,
    }

    impl Encoder for MockEncoder {
        fn kind(&self) -> EncoderKind {
            self.kind
        }

        fn train(&self, train_set: &Path, save_path: &Path, opts: &TrainOptions) -> Result<()> {
            let step_dir = save_path.join("step_1000");
            fs::create_dir_all(&step_dir)?;
            fs::write(step_dir.join("encoder_layer_0_w"), b"w")?;
            fs::write(step_dir.join("encoder_layer_0_w_moment1_0"), b"m1")?;
            fs::write(step_dir.join("encoder_layer_0_w_moment2_0"), b"m2")?;
            self.calls.borrow_mut().push(format!(
                "train {} epoch={} save_steps={} lr={}",
                train_set.display(),
                opts.epoch,
                opts.save_steps,
                opts.learning_rate
            ));
            Ok(())
        }

        fn export(&self, contract: &ExportContract, path_prefix: &str) -> Result<()> {
            self.calls.borrow_mut().push(format!(
                "export prefix={} feeds={} fetches={}",
                path_prefix,
                contract.feed_names().join(","),
                contract.fetch_names().join(",")
            ));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_train_flow() {
        let temp = tempfile::tempdir().unwrap();
        let out: PathBuf = temp.path().join("models");
        let backend = MockBackend::new();

        train(
            &backend,
            "zh_dureader_de".to_string(),
            "train.tsv".to_string(),
            false,
            2,
            out.to_string_lossy().into_owned(),
            1000,
            1e-5,
        )
        .await
        .unwrap();

        // Checkpoint promoted, moments pruned, scratch removed.
        assert!(out.join("dual_params").join("encoder_layer_0_w").exists());
        assert!(!out
            .join("dual_params")
            .join("encoder_layer_0_w_moment1_0")
            .exists());
        assert!(!out.join("temp").exists());

        // Serving artifacts in place.
        assert!(out.join(serving::SERVING_CONFIG_FILE).exists());
        assert!(out.join(serving::NET_CONFIG_FILE).exists());
        assert!(out.join(serving::VOCAB_FILE).exists());

        let calls = backend.calls.borrow();
        assert_eq!(calls[0], "load zh_dureader_de cuda=false");
        assert_eq!(calls[1], "train train.tsv epoch=2 save_steps=1000 lr=0.00001");
    }

    #[tokio::test]
    async fn test_train_keeps_existing_config() {
        let temp = tempfile::tempdir().unwrap();
        let out: PathBuf = temp.path().join("models");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join(serving::SERVING_CONFIG_FILE), "{\"custom\": 1}").unwrap();

        let backend = MockBackend::new();
        train(
            &backend,
            "zh_dureader_ce".to_string(),
            "train.tsv".to_string(),
            false,
            2,
            out.to_string_lossy().into_owned(),
            1000,
            1e-5,
        )
        .await
        .unwrap();

        assert_eq!(
            fs::read_to_string(out.join(serving::SERVING_CONFIG_FILE)).unwrap(),
            "{\"custom\": 1}"
        );
        assert!(out.join("cross_params").exists());
    }

    #[tokio::test]
    async fn test_train_rejects_unknown_model() {
        let backend = MockBackend::new();
        let err = train(
            &backend,
            "bert_base".to_string(),
            "train.tsv".to_string(),
            false,
            2,
            "./out".to_string(),
            1000,
            1e-5,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Unknown base model"));
        assert!(backend.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_save_flow_defaults_prefix_to_model() {
        let backend = MockBackend::new();
        save(&backend, "zh_dureader_ce".to_string(), None)
            .await
            .unwrap();

        let calls = backend.calls.borrow();
        assert_eq!(
            calls[1],
            "export prefix=zh_dureader_ce \
             feeds=read_file_0.tmp_0,read_file_0.tmp_1,read_file_0.tmp_2,read_file_0.tmp_4 \
             fetches=probs"
        );
    }

    #[tokio::test]
    async fn test_save_flow_dual_fetches_both_reps() {
        let backend = MockBackend::new();
        save(
            &backend,
            "v2_marco_de".to_string(),
            Some("./out/marco".to_string()),
        )
        .await
        .unwrap();

        let calls = backend.calls.borrow();
        assert!(calls[1].starts_with("export prefix=./out/marco "));
        assert!(calls[1].ends_with("fetches=q_rep,p_rep"));
    }
}
