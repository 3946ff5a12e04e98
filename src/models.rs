//! Data structures passed between the resolver, the assembler and the builder.

use std::collections::BTreeMap;
use std::fmt;

/// Separator placed between assembled statements.
pub const STATEMENT_SEPARATOR: &str = ";\n";

/// Suffix marking a location whose content must be fetched as raw bytes.
pub const BINARY_MARKER: &str = "mem";

/// Logical name of the emscripten runtime module.
pub const RUNTIME_ASSET: &str = "quietEs";
/// Logical name of the runtime's memory initializer blob.
pub const RUNTIME_MEMORY_ASSET: &str = "quietEsMem";
/// Logical name of the transmission profiles document.
pub const PROFILES_ASSET: &str = "quietProfiles";
/// Logical name of the quiet.js loader module.
pub const LOADER_ASSET: &str = "quietBase";

/// Whether an asset is decoded text or raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
  /// UTF-8 decoded text.
  Text,
  /// Raw bytes.
  Binary,
}

impl AssetKind {
  /// Classify a location by its suffix.
  pub fn classify(location: &str) -> Self {
    if location.ends_with(BINARY_MARKER) {
      AssetKind::Binary
    } else {
      AssetKind::Text
    }
  }
}

impl fmt::Display for AssetKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AssetKind::Text => f.write_str("text"),
      AssetKind::Binary => f.write_str("binary"),
    }
  }
}

/// Fetched content of a single asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asset {
  /// Text content.
  Text(String),
  /// Binary content.
  Binary(Vec<u8>),
}

impl Asset {
  /// Kind of content held by the asset.
  pub fn kind(&self) -> AssetKind {
    match self {
      Asset::Text(_) => AssetKind::Text,
      Asset::Binary(_) => AssetKind::Binary,
    }
  }

  /// Borrow the text content, if any.
  pub fn as_text(&self) -> Option<&str> {
    match self {
      Asset::Text(text) => Some(text),
      Asset::Binary(_) => None,
    }
  }

  /// Borrow the binary content, if any.
  pub fn as_bytes(&self) -> Option<&[u8]> {
    match self {
      Asset::Binary(bytes) => Some(bytes),
      Asset::Text(_) => None,
    }
  }

  /// Size of the content in bytes.
  pub fn len(&self) -> usize {
    match self {
      Asset::Text(text) => text.len(),
      Asset::Binary(bytes) => bytes.len(),
    }
  }

  /// Returns `true` when the asset carries no content.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Remote location of an asset together with its logical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSource {
  /// Stable logical name used as the mapping key.
  pub name: String,
  /// Absolute URL the asset is fetched from.
  pub url: String,
  /// Content kind derived from the URL.
  pub kind: AssetKind,
}

impl AssetSource {
  /// Build a source, classifying its kind from the URL.
  pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
    let url = url.into();
    Self {
      name: name.into(),
      kind: AssetKind::classify(&url),
      url,
    }
  }
}

/// Resolved assets keyed by logical name.
pub type AssetMap = BTreeMap<String, Asset>;

/// Ordered statements making up the final script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledOutput {
  fragments: Vec<String>,
}

impl AssembledOutput {
  /// Start an empty output.
  pub fn new() -> Self {
    Self::default()
  }

  /// Append the next statement.
  pub fn push(&mut self, fragment: impl Into<String>) {
    self.fragments.push(fragment.into());
  }

  /// Statements in emission order.
  pub fn fragments(&self) -> &[String] {
    &self.fragments
  }

  /// Join the statements into the emitted script.
  pub fn render(&self) -> String {
    self.fragments.join(STATEMENT_SEPARATOR)
  }
}
