//! `quiet-bundler` downloads quiet-js and writes it out as one self-contained module.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use quiet_bundler::{BundleBuilder, BundleConfig};

#[derive(Parser)]
#[command(
  name = "quiet-bundler",
  about = "Bundle quiet-js into a single self-contained script",
  version
)]
struct Cli {
  /// Configuration file (defaults to quiet-bundle.config.json in the working directory)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Override the output path
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
    )
    .with_target(false)
    .init();

  let mut config = match &cli.config {
    Some(path) => BundleConfig::load(path)?,
    None => {
      let cwd = std::env::current_dir().context("failed to read working directory")?;
      BundleConfig::discover(&cwd)
    }
  };
  if let Some(output) = cli.output {
    config.output_path = output;
  }

  let report = BundleBuilder::new(&config)
    .build()
    .await
    .with_context(|| format!("failed to bundle into {}", config.output_path.display()))?;

  info!(
    path = %report.output_path.display(),
    bytes = report.bytes_written,
    "Finished! Module ready to use!"
  );
  Ok(())
}
