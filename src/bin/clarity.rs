//! CLI binary for clarity.

use anyhow::Context;
use clap::{Parser, Subcommand};
use clarity::audio::CpalSink;
use clarity::server::ChatServer;
use clarity::{ClarityConfig, ClarityError};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Clarity: sentiment-aware empathetic replies.
#[derive(Parser)]
#[command(name = "clarity", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, env = "CLARITY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the JSON API (default).
    Serve,

    /// Chat in the terminal by typing messages.
    Chat,

    /// Print the sentiment of a piece of text.
    Classify {
        /// Text to classify.
        text: String,
    },

    /// List available audio output devices.
    Devices,

    /// Write the default configuration file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("clarity=info,ort=warn,hf_hub=warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_serve(load_config(cli.config.as_ref())?).await,
        Command::Chat => run_chat(load_config(cli.config.as_ref())?).await,
        Command::Classify { text } => run_classify(load_config(cli.config.as_ref())?, text).await,
        Command::Devices => list_devices(),
        Command::InitConfig { force } => init_config(cli.config, force),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ClarityConfig> {
    ClarityConfig::load(path.map(PathBuf::as_path)).context("failed to load config")
}

async fn run_serve(config: ClarityConfig) -> anyhow::Result<()> {
    println!("Clarity v{}", env!("CARGO_PKG_VERSION"));

    let pipeline = Arc::new(clarity::startup::initialize_pipeline(&config).await?);
    let server = ChatServer::start(Arc::clone(&pipeline), &config.server).await?;
    println!("\nReady on http://{}. Press Ctrl+C to stop.\n", server.addr());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    info!("received Ctrl+C, shutting down...");
    server.shutdown();
    server.wait().await?;
    pipeline.drain_speech().await;
    Ok(())
}

async fn run_chat(config: ClarityConfig) -> anyhow::Result<()> {
    println!("Clarity v{}", env!("CARGO_PKG_VERSION"));

    let pipeline = clarity::startup::initialize_pipeline(&config).await?;
    println!("\nReady! Type a message, or 'quit' to exit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        match pipeline.respond(line).await {
            Ok(envelope) => {
                println!("[{}] {}", envelope.sentiment, envelope.reply);
                if let Some(note) = envelope.speak_note {
                    println!("  ({note})");
                }
            }
            Err(ClarityError::EmptyInput) => continue,
            Err(e) => eprintln!("Error: {e}"),
        }
        println!();
    }

    pipeline.drain_speech().await;
    println!("Goodbye.");
    Ok(())
}

async fn run_classify(config: ClarityConfig, text: String) -> anyhow::Result<()> {
    let classifier = clarity::startup::load_classifier(&config).await?;
    let result = tokio::task::spawn_blocking(move || classifier.classify(&text)).await??;

    println!("{} (confidence {:.3})", result.label, result.confidence);
    for (label, p) in clarity::SentimentLabel::ALL
        .iter()
        .zip(result.probabilities)
    {
        println!("  {label:<8} {p:.3}");
    }
    Ok(())
}

fn list_devices() -> anyhow::Result<()> {
    println!("Output devices:");
    for name in CpalSink::list_output_devices()? {
        println!("  {name}");
    }
    Ok(())
}

fn init_config(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(ClarityConfig::default_config_path);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    ClarityConfig::default().save_to_file(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
