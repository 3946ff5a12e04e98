//! Error types shared by the bundling pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::AssetKind;

/// Every failure that can abort a bundling run.
#[derive(Debug, Error)]
pub enum BundleError {
  /// The HTTP client could not be constructed.
  #[error("failed to build HTTP client: {0}")]
  HttpClient(#[source] reqwest::Error),

  /// The HTTP request for an asset could not be completed.
  #[error("failed to fetch `{name}` from {url}: {source}")]
  Fetch {
    /// Logical asset name.
    name: String,
    /// Location that was requested.
    url: String,
    /// Underlying transport error.
    #[source]
    source: reqwest::Error,
  },

  /// The server answered with a non-success status.
  #[error("fetching `{name}` from {url} returned status {status}")]
  Status {
    /// Logical asset name.
    name: String,
    /// Location that was requested.
    url: String,
    /// HTTP status code returned by the server.
    status: u16,
  },

  /// The anchor text used to locate a function does not occur in the source.
  #[error("anchor `{anchor}` not found in source text")]
  AnchorNotFound {
    /// Anchor that was searched for.
    anchor: String,
  },

  /// Brace depth never returned to zero within the scanned region.
  #[error("body following `{anchor}` is unbalanced after scanning {scanned} bytes")]
  UnbalancedBody {
    /// Anchor whose body was being located.
    anchor: String,
    /// Number of bytes examined before giving up.
    scanned: usize,
  },

  /// A required asset is absent from the resolved mapping.
  #[error("asset `{name}` was not resolved")]
  MissingAsset {
    /// Logical asset name.
    name: String,
  },

  /// A resolved asset does not carry the content kind the assembler needs.
  #[error("asset `{name}` is not {expected} content")]
  UnexpectedAssetKind {
    /// Logical asset name.
    name: String,
    /// Kind the assembler expected.
    expected: AssetKind,
  },

  /// A configuration file could not be read.
  #[error("failed to read configuration {}: {source}", path.display())]
  ConfigRead {
    /// Path of the configuration file.
    path: PathBuf,
    /// Underlying I/O error.
    #[source]
    source: std::io::Error,
  },

  /// A configuration file is not valid JSON for [`crate::BundleConfig`].
  #[error("failed to parse configuration {}: {source}", path.display())]
  ConfigParse {
    /// Path of the configuration file.
    path: PathBuf,
    /// Underlying parse error.
    #[source]
    source: serde_json::Error,
  },

  /// The assembled artifact could not be persisted.
  #[error("failed to write {}: {source}", path.display())]
  Write {
    /// Destination path of the artifact.
    path: PathBuf,
    /// Underlying I/O error.
    #[source]
    source: std::io::Error,
  },
}

/// Result alias used by the library.
pub type Result<T> = std::result::Result<T, BundleError>;
