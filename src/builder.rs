//! Bundle orchestrator: resolves the remote assets, assembles them and writes the artifact.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::bundle::assemble::Assembler;
use crate::bundle::resolve::{AssetFetcher, HttpFetcher, resolve_assets};
use crate::config::BundleConfig;
use crate::error::{BundleError, Result};

/// Summary of a completed bundling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
  /// Path the artifact was written to.
  pub output_path: PathBuf,
  /// Size of the artifact in bytes.
  pub bytes_written: usize,
  /// Number of statements in the artifact.
  pub statements: usize,
}

/// Runs one complete resolve, assemble and write cycle.
pub struct BundleBuilder<'a> {
  config: &'a BundleConfig,
}

impl<'a> BundleBuilder<'a> {
  /// Create a builder for the provided configuration.
  pub fn new(config: &'a BundleConfig) -> Self {
    Self { config }
  }

  /// Build the bundle, fetching assets over HTTP.
  pub async fn build(&self) -> Result<BuildReport> {
    let fetcher = HttpFetcher::new(self.config.request_timeout())?;
    self.build_with(&fetcher).await
  }

  /// Build the bundle using the given fetcher.
  ///
  /// Nothing is written unless every asset resolved and every patch applied.
  pub async fn build_with<F>(&self, fetcher: &F) -> Result<BuildReport>
  where
    F: AssetFetcher + ?Sized,
  {
    info!("Downloading requirements...");
    let assets = resolve_assets(fetcher, &self.config.sources()).await?;

    info!("Bundling...");
    let output = Assembler::from_config(self.config).assemble(&assets)?;
    let code = output.render();

    write_artifact(&self.config.output_path, &code)?;

    Ok(BuildReport {
      output_path: self.config.output_path.clone(),
      bytes_written: code.len(),
      statements: output.fragments().len(),
    })
  }
}

/// Write `contents` to `path` through a temporary sibling file.
///
/// The destination only ever holds a complete artifact.
pub fn write_artifact(path: &Path, contents: &str) -> Result<()> {
  let write_error = |source: std::io::Error| BundleError::Write {
    path: path.to_path_buf(),
    source,
  };

  if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
    fs::create_dir_all(parent).map_err(write_error)?;
  }

  let partial = partial_path(path);
  let written = fs::write(&partial, contents).and_then(|()| fs::rename(&partial, path));
  if let Err(err) = written {
    discard_partial(&partial);
    return Err(write_error(err));
  }
  Ok(())
}

fn discard_partial(partial: &Path) {
  match fs::remove_file(partial) {
    Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
      warn!(path = %partial.display(), error = %err, "failed to remove partial artifact");
    }
    _ => {}
  }
}

fn partial_path(path: &Path) -> PathBuf {
  let mut file_name = path
    .file_name()
    .map(|name| name.to_os_string())
    .unwrap_or_default();
  file_name.push(".partial");
  path.with_file_name(file_name)
}
