//! Building blocks for turning the fetched quiet-js assets into a single script.

pub mod assemble;
pub mod encode;
pub mod js_patch;
pub mod resolve;
