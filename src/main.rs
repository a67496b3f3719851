use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rqt::backend::PythonBackend;
use rqt::cli;

#[derive(Parser)]
#[command(name = "rqt")]
#[command(about = "Training and export tooling for RocketQA dual/cross encoder retrieval models", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train or finetune a dual/cross encoder from a base model
    Train {
        /// Base model to finetune (see `rqt models`)
        base_model: String,

        /// Training set path
        train_set: String,

        /// Run the training on GPU
        #[arg(long)]
        use_cuda: bool,

        /// Number of training epochs
        #[arg(long, default_value = "2")]
        epoch: usize,

        /// Output directory for the trained model
        #[arg(long, default_value = "./models")]
        out_path: String,

        /// Save a checkpoint every N steps
        #[arg(long, default_value = "1000")]
        save_steps: usize,

        /// Learning rate
        #[arg(long, default_value = "1e-5")]
        learning_rate: f64,
    },

    /// Export the inference model from a raw dual/cross encoder
    Save {
        /// Model name or serving config path
        model: String,

        /// Output path prefix (default: the model name)
        #[arg(long)]
        out_path: Option<String>,
    },

    /// List the base models the framework can load by name
    Models,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rqt=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let backend = PythonBackend::new();

    match cli.command {
        Commands::Train {
            base_model,
            train_set,
            use_cuda,
            epoch,
            out_path,
            save_steps,
            learning_rate,
        } => {
            cli::train(
                &backend,
                base_model,
                train_set,
                use_cuda,
                epoch,
                out_path,
                save_steps,
                learning_rate,
            )
            .await?;
        }

        Commands::Save { model, out_path } => {
            cli::save(&backend, model, out_path).await?;
        }

        Commands::Models => {
            cli::models().await?;
        }
    }

    Ok(())
}
