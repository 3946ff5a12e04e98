//! Bundle configuration describing where assets live and where the artifact goes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::bundle::js_patch::DEFAULT_MAX_SCAN_LEN;
use crate::error::{BundleError, Result};
use crate::models::{
    AssetSource, LOADER_ASSET, PROFILES_ASSET, RUNTIME_ASSET, RUNTIME_MEMORY_ASSET,
};

/// File name searched for when discovering configuration.
pub const DEFAULT_CONFIG_FILE: &str = "quiet-bundle.config.json";

const QUIET_REPOSITORY: &str =
    "https://raw.githubusercontent.com/quiet/quiet-js/708084716f20d21c420df18ed8812a72105e8783/";
const QUIET_HOSTED_PREFIX: &str = "https://quiet.github.io/quiet-js/javascripts/";

/// Locations, prefixes and limits used by a bundling run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Base URL every asset file name is resolved against.
    pub repository_base_url: String,
    /// File name of the emscripten runtime module.
    pub runtime_file: String,
    /// File name of the runtime memory initializer.
    pub runtime_memory_file: String,
    /// File name of the transmission profiles document.
    pub profiles_file: String,
    /// File name of the quiet.js loader module.
    pub loader_file: String,
    /// `profilesPrefix` passed to `Quiet.init`.
    pub profiles_prefix: String,
    /// `memoryInitializerPrefix` passed to `Quiet.init`.
    pub memory_initializer_prefix: String,
    /// Path the assembled script is written to.
    pub output_path: PathBuf,
    /// Upper bound on bytes examined while locating a function body.
    pub max_scan_len: usize,
    /// Timeout applied to each asset request.
    pub request_timeout_secs: u64,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            repository_base_url: QUIET_REPOSITORY.into(),
            runtime_file: "quiet-emscripten.js".into(),
            runtime_memory_file: "quiet-emscripten.js.mem".into(),
            profiles_file: "quiet-profiles.json".into(),
            loader_file: "quiet.js".into(),
            profiles_prefix: QUIET_HOSTED_PREFIX.into(),
            memory_initializer_prefix: QUIET_HOSTED_PREFIX.into(),
            output_path: PathBuf::from("_bundle.js"),
            max_scan_len: DEFAULT_MAX_SCAN_LEN,
            request_timeout_secs: 120,
        }
    }
}

impl BundleConfig {
    /// Attempt to load configuration from the provided directory.
    ///
    /// A missing or unparseable file falls back to the built-in defaults.
    pub fn discover(dir: &Path) -> Self {
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        Self::from_path(&candidate).unwrap_or_default()
    }

    /// Read configuration from a specific JSON file, discarding the failure cause.
    pub fn from_path(path: &Path) -> Option<Self> {
        Self::load(path).ok()
    }

    /// Read configuration from a specific JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| BundleError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| BundleError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Remote sources for the four assets, in a stable order.
    pub fn sources(&self) -> Vec<AssetSource> {
        vec![
            AssetSource::new(RUNTIME_ASSET, self.asset_url(&self.runtime_file)),
            AssetSource::new(RUNTIME_MEMORY_ASSET, self.asset_url(&self.runtime_memory_file)),
            AssetSource::new(PROFILES_ASSET, self.asset_url(&self.profiles_file)),
            AssetSource::new(LOADER_ASSET, self.asset_url(&self.loader_file)),
        ]
    }

    /// Timeout applied to each asset request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn asset_url(&self, file: &str) -> String {
        format!(
            "{}/{}",
            self.repository_base_url.trim_end_matches('/'),
            file.trim_start_matches('/')
        )
    }
}
