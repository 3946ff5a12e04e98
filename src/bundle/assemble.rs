//! Splices the resolved quiet-js assets into a single self-contained script.

use tracing::debug;

use crate::bundle::encode::{encode_binary_literal, template_literal};
use crate::bundle::js_patch::{BodyReplacer, BraceScanner};
use crate::config::BundleConfig;
use crate::error::{BundleError, Result};
use crate::models::{
  AssembledOutput, Asset, AssetKind, AssetMap, LOADER_ASSET, PROFILES_ASSET, RUNTIME_ASSET,
  RUNTIME_MEMORY_ASSET,
};

/// Anchor of the loader function that downloads the profiles document.
pub const PROFILES_ANCHOR: &str = "setProfilesPrefix";
/// Anchor of the runtime function that loads the memory initializer.
pub const READ_ASYNC_ANCHOR: &str = "Module[\"readAsync\"]";
/// Name of the binding holding the memory initializer bytes.
pub const MEMORY_BINDING: &str = "mem";

/// Builds the bundle statements from a complete asset mapping.
#[derive(Debug, Clone)]
pub struct Assembler<R = BraceScanner> {
  replacer: R,
  profiles_prefix: String,
  memory_initializer_prefix: String,
}

impl Assembler<BraceScanner> {
  /// Assembler using the brace scanner and the prefixes from `config`.
  pub fn from_config(config: &BundleConfig) -> Self {
    Self::new(
      BraceScanner::new(config.max_scan_len),
      config.profiles_prefix.clone(),
      config.memory_initializer_prefix.clone(),
    )
  }
}

impl<R: BodyReplacer> Assembler<R> {
  /// Create an assembler with an explicit body replacer.
  pub fn new(
    replacer: R,
    profiles_prefix: impl Into<String>,
    memory_initializer_prefix: impl Into<String>,
  ) -> Self {
    Self {
      replacer,
      profiles_prefix: profiles_prefix.into(),
      memory_initializer_prefix: memory_initializer_prefix.into(),
    }
  }

  /// Produce the six bundle statements in emission order.
  ///
  /// Later statements refer to names defined by earlier ones (`mem`, `Quiet`, `Module`), so
  /// the order is fixed.
  pub fn assemble(&self, assets: &AssetMap) -> Result<AssembledOutput> {
    let memory = binary_asset(assets, RUNTIME_MEMORY_ASSET)?;
    let profiles = text_asset(assets, PROFILES_ASSET)?;
    let loader = text_asset(assets, LOADER_ASSET)?;
    let runtime = text_asset(assets, RUNTIME_ASSET)?;

    let mut output = AssembledOutput::new();
    output.push(format!(
      "let {MEMORY_BINDING}={}",
      encode_binary_literal(memory)
    ));

    debug!(anchor = PROFILES_ANCHOR, "inlining transmission profiles");
    output.push(self.replacer.replace_body(
      loader,
      PROFILES_ANCHOR,
      &format!("onProfilesFetch({})", template_literal(profiles)),
    )?);

    output.push(format!(
      "Quiet.init({{profilesPrefix: {}, memoryInitializerPrefix: {}}})",
      js_string(&self.profiles_prefix),
      js_string(&self.memory_initializer_prefix)
    ));

    debug!(anchor = READ_ASYNC_ANCHOR, "inlining memory initializer");
    output.push(self.replacer.replace_body(
      runtime,
      READ_ASYNC_ANCHOR,
      &format!("onload({MEMORY_BINDING});"),
    )?);

    output.push("Quiet.Module=Module");
    output.push("module.exports=Quiet");
    Ok(output)
  }
}

fn js_string(value: &str) -> String {
  serde_json::Value::String(value.to_string()).to_string()
}

fn lookup<'a>(assets: &'a AssetMap, name: &str) -> Result<&'a Asset> {
  assets.get(name).ok_or_else(|| BundleError::MissingAsset {
    name: name.to_string(),
  })
}

fn text_asset<'a>(assets: &'a AssetMap, name: &str) -> Result<&'a str> {
  lookup(assets, name)?
    .as_text()
    .ok_or_else(|| BundleError::UnexpectedAssetKind {
      name: name.to_string(),
      expected: AssetKind::Text,
    })
}

fn binary_asset<'a>(assets: &'a AssetMap, name: &str) -> Result<&'a [u8]> {
  lookup(assets, name)?
    .as_bytes()
    .ok_or_else(|| BundleError::UnexpectedAssetKind {
      name: name.to_string(),
      expected: AssetKind::Binary,
    })
}
