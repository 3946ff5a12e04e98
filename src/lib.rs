#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod builder;
pub mod bundle;
pub mod config;
pub mod error;
pub mod models;

pub use builder::{BuildReport, BundleBuilder};
pub use bundle::assemble::Assembler;
pub use bundle::js_patch::{BodyReplacer, BraceScanner, replace_function_body};
pub use config::BundleConfig;
pub use error::{BundleError, Result};
pub use models::{AssembledOutput, Asset, AssetKind, AssetMap, AssetSource};
