//! VisionCloud CLI: run images through the quality-gated enhancement pipeline
//! and inspect the categorized object store.
//!
//! Configuration comes from the environment (or `.env`): STORAGE_BACKEND,
//! QUALITY_THRESHOLD, UPSCALE_SCALE, UPSCALE_SCRIPT and friends.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use visioncloud_cli::{collect_inputs, init_tracing, load_images};
use visioncloud_core::{Category, Config};
use visioncloud_processing::PipelineOrchestrator;
use visioncloud_storage::{create_storage, keys::validate_key};

#[derive(Parser)]
#[command(name = "visioncloud", about = "Quality-gated image enhancement pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess, enhance if needed, and store one or more images
    Process {
        /// Image files, or directories of jpg/jpeg/png/webp files
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Abort processing after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Object key to store under (single file only; defaults to the file name)
        #[arg(long)]
        key: Option<String>,
    },
    /// List object keys in a category
    List {
        /// good_quality, upscaled or could_not_upscale
        category: Category,
    },
    /// Download an object to a local file
    Get {
        category: Category,
        key: String,
        /// Destination path
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Delete an object
    Delete { category: Category, key: String },
    /// Print the locator of an object without touching storage
    Locate { category: Category, key: String },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Token cancelled on Ctrl-C or once the optional deadline passes.
fn cancellation_token(timeout_secs: Option<u64>) -> CancellationToken {
    let cancel = CancellationToken::new();

    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    if let Some(secs) = timeout_secs {
        let on_deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            tracing::warn!(timeout_secs = secs, "Deadline reached, cancelling");
            on_deadline.cancel();
        });
    }

    cancel
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid configuration")?;

    let storage = create_storage(&config.storage)
        .await
        .with_context(|| format!("Failed to initialize {} storage", config.storage.backend))?;

    tracing::debug!(backend = %storage.backend_type(), "Storage initialized");

    match cli.command {
        Commands::Process {
            paths,
            timeout_secs,
            key,
        } => {
            let files = collect_inputs(&paths)?;
            if files.is_empty() {
                anyhow::bail!("No image files found");
            }
            if key.is_some() && files.len() > 1 {
                anyhow::bail!("--key can only be used with a single file");
            }

            let pipeline = PipelineOrchestrator::with_script_enhancer(&config.pipeline, storage);
            let cancel = cancellation_token(timeout_secs);

            let results = match (files.as_slice(), key) {
                ([file], key) => {
                    let key = match key {
                        Some(key) => key,
                        None => visioncloud_cli::object_key_for(file)?,
                    };
                    validate_key(&key)?;
                    let data = tokio::fs::read(file)
                        .await
                        .with_context(|| format!("Failed to read {}", file.display()))?;
                    vec![pipeline.process(&cancel, data.into(), &key).await]
                }
                (files, _) => {
                    let images = load_images(files)?;
                    pipeline.process_batch(&cancel, images).await
                }
            };

            print_json(&results)?;

            if results.iter().all(|r| r.is_success()) {
                return Ok(ExitCode::SUCCESS);
            }
            return Ok(ExitCode::FAILURE);
        }
        Commands::List { category } => {
            let keys = storage.list(category).await?;
            print_json(&serde_json::json!({ "category": category, "keys": keys }))?;
        }
        Commands::Get {
            category,
            key,
            output,
        } => {
            let data = storage.get(category, &key).await?;
            tokio::fs::write(&output, &data)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            print_json(&serde_json::json!({
                "category": category,
                "key": key,
                "bytes": data.len(),
                "output": output.display().to_string(),
            }))?;
        }
        Commands::Delete { category, key } => {
            storage.delete(category, &key).await?;
            print_json(&serde_json::json!({
                "success": true,
                "message": format!("{}/{} deleted", category, key),
            }))?;
        }
        Commands::Locate { category, key } => {
            validate_key(&key)?;
            print_json(&serde_json::json!({ "locator": storage.locator(category, &key) }))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
