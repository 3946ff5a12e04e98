//! Encoders turning fetched content into JavaScript literals.

use std::sync::OnceLock;

use base64::{Engine as _, engine::general_purpose};
use regex::Regex;

/// Encode bytes as an expression that rebuilds a `Uint8Array` when evaluated.
pub fn encode_binary_literal(bytes: &[u8]) -> String {
  format!(
    "Uint8Array.from(atob(`{}`), c => c.charCodeAt(0))",
    general_purpose::STANDARD.encode(bytes)
  )
}

fn binary_literal_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"^Uint8Array\.from\(atob\(`([A-Za-z0-9+/]*={0,2})`\), c => c\.charCodeAt\(0\)\)$")
      .expect("invalid binary literal regex")
  })
}

/// Recover the bytes from a literal produced by [`encode_binary_literal`].
pub fn decode_binary_literal(literal: &str) -> Option<Vec<u8>> {
  let caps = binary_literal_pattern().captures(literal)?;
  let payload = caps.get(1)?.as_str();
  general_purpose::STANDARD.decode(payload).ok()
}

/// Wrap text in a template literal that evaluates back to the same characters.
pub fn template_literal(text: &str) -> String {
  let escaped = text
    .replace('\\', "\\\\")
    .replace('`', "\\`")
    .replace("${", "\\${")
    .replace('\r', "\\r");
  format!("`{escaped}`")
}
