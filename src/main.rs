//! obsfs command-line client

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use obsfs::client::s3::S3ObjectClient;
use obsfs::config::{AppConfig, LogFormat};
use obsfs::{FilesystemAdapter, ObsAdapter, SignMethod, Visibility, WriteConfig};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Configuration file; defaults to $OBSFS_CONFIG or ./obsfs.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a directory
    Ls {
        #[arg(default_value = "")]
        path: String,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Print a file to stdout
    Cat { path: String },
    /// Upload a local file
    Put {
        path: String,
        file: PathBuf,
        #[arg(long)]
        visibility: Option<Visibility>,
        #[arg(long)]
        mime_type: Option<String>,
    },
    Rm { path: String },
    Rmdir { path: String },
    Mkdir { path: String },
    Cp { source: String, destination: String },
    Mv { source: String, destination: String },
    /// Show object attributes
    Stat { path: String },
    /// Set visibility (public or private)
    Chmod { path: String, visibility: Visibility },
    /// Print the public link
    Url { path: String },
    /// Print a presigned link
    Sign {
        path: String,
        #[arg(long, default_value_t = 3600)]
        expires: u64,
        #[arg(long, default_value = "get")]
        method: SignMethod,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
    .context("failed to load configuration")?;

    init_tracing(&config)?;

    let client = S3ObjectClient::new(config.client_config()?)
        .await
        .context("failed to build OBS client")?;
    let adapter = ObsAdapter::new(Arc::new(client), config.adapter_config()?)
        .context("invalid adapter configuration")?;

    run(&adapter, cli.command).await
}

async fn run(adapter: &ObsAdapter, command: Command) -> anyhow::Result<()> {
    let defaults = WriteConfig::default();

    match command {
        Command::Ls { path, recursive } => {
            let entries: Vec<_> = adapter.list_contents(&path, recursive).try_collect().await?;
            print_json(&entries)?;
        }
        Command::Cat { path } => {
            let mut reader = adapter.read_stream(&path).await?;
            tokio::io::copy(&mut reader, &mut tokio::io::stdout()).await?;
        }
        Command::Put {
            path,
            file,
            visibility,
            mime_type,
        } => {
            let contents = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let mut write = WriteConfig::new();
            write.visibility = visibility;
            write.mime_type = mime_type;
            adapter.write(&path, Bytes::from(contents), &write).await?;
            tracing::info!(%path, "uploaded");
        }
        Command::Rm { path } => adapter.delete(&path).await?,
        Command::Rmdir { path } => adapter.delete_directory(&path).await?,
        Command::Mkdir { path } => adapter.create_directory(&path, &defaults).await?,
        Command::Cp {
            source,
            destination,
        } => adapter.copy(&source, &destination, &defaults).await?,
        Command::Mv {
            source,
            destination,
        } => adapter.move_file(&source, &destination, &defaults).await?,
        Command::Stat { path } => {
            print_json(&adapter.metadata(&path).await?)?;
        }
        Command::Chmod { path, visibility } => adapter.set_visibility(&path, visibility).await?,
        Command::Url { path } => println!("{}", adapter.public_url(&path)),
        Command::Sign {
            path,
            expires,
            method,
        } => {
            let url = adapter
                .sign_url(&path, Duration::from_secs(expires), &[], method)
                .await?;
            print_json(&json!({ "path": path, "method": method, "url": url }))?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.logging.level.clone()))
        .unwrap_or_else(|_| EnvFilter::new("obsfs=info"));

    // Logs go to stderr so command output stays parseable.
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
