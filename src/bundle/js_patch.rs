//! Lexical replacement of JavaScript function bodies.
//!
//! The scanner does not parse JavaScript. It finds an anchor, takes the first `{` after it
//! as the start of the body and tracks brace depth until the matching `}`. Braces inside
//! strings, comments or template text are counted like any other brace, so it is only
//! suitable for sources whose shape around the anchor is known in advance.

use tracing::debug;

use crate::error::{BundleError, Result};

/// Default upper bound on bytes examined after the anchor.
pub const DEFAULT_MAX_SCAN_LEN: usize = 64 * 1024 * 1024;

/// Byte range of a function body, excluding its enclosing braces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodySpan {
  /// Offset just past the opening brace.
  pub start: usize,
  /// Offset of the matching closing brace.
  pub end: usize,
}

/// Replaces the body of the function introduced by an anchor.
pub trait BodyReplacer {
  /// Return `source` with the body following `anchor` replaced by `replacement`.
  fn replace_body(&self, source: &str, anchor: &str, replacement: &str) -> Result<String>;
}

/// Brace-depth scanner with an explicit scan bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BraceScanner {
  max_scan_len: usize,
}

impl Default for BraceScanner {
  fn default() -> Self {
    Self::new(DEFAULT_MAX_SCAN_LEN)
  }
}

impl BraceScanner {
  /// Create a scanner that gives up after `max_scan_len` bytes past the anchor.
  pub fn new(max_scan_len: usize) -> Self {
    Self { max_scan_len }
  }

  /// Locate the body following the first occurrence of `anchor`.
  pub fn locate(&self, source: &str, anchor: &str) -> Result<BodySpan> {
    locate_function_body(source, anchor, self.max_scan_len)
  }
}

impl BodyReplacer for BraceScanner {
  fn replace_body(&self, source: &str, anchor: &str, replacement: &str) -> Result<String> {
    let span = self.locate(source, anchor)?;
    debug!(
      anchor,
      start = span.start,
      end = span.end,
      replaced = span.end - span.start,
      "patched function body"
    );

    let mut patched =
      String::with_capacity(source.len() - (span.end - span.start) + replacement.len());
    patched.push_str(&source[..span.start]);
    patched.push_str(replacement);
    patched.push_str(&source[span.end..]);
    Ok(patched)
  }
}

#[derive(Debug, Clone, Copy)]
enum ScanState {
  SeekingOpen,
  InsideBody { start: usize, depth: usize },
}

/// Find the body of the function introduced by the first occurrence of `anchor`.
///
/// Closing braces met before the first opening brace are ignored. Scanning stops at the
/// end of `source` or after `max_scan_len` bytes, whichever comes first, and reports
/// [`BundleError::UnbalancedBody`] when the depth never returned to zero.
pub fn locate_function_body(source: &str, anchor: &str, max_scan_len: usize) -> Result<BodySpan> {
  let anchor_pos = source
    .find(anchor)
    .ok_or_else(|| BundleError::AnchorNotFound {
      anchor: anchor.to_string(),
    })?;
  let limit = source
    .len()
    .min(anchor_pos.saturating_add(max_scan_len));

  // `{` and `}` are ASCII, so every offset recorded here is a char boundary.
  let bytes = source.as_bytes();
  let mut state = ScanState::SeekingOpen;
  for (pos, byte) in bytes.iter().enumerate().take(limit).skip(anchor_pos) {
    state = match (state, *byte) {
      (ScanState::SeekingOpen, b'{') => ScanState::InsideBody {
        start: pos + 1,
        depth: 1,
      },
      (ScanState::InsideBody { start, depth }, b'{') => ScanState::InsideBody {
        start,
        depth: depth + 1,
      },
      (ScanState::InsideBody { start, depth: 1 }, b'}') => {
        return Ok(BodySpan { start, end: pos });
      }
      (ScanState::InsideBody { start, depth }, b'}') => ScanState::InsideBody {
        start,
        depth: depth - 1,
      },
      (state, _) => state,
    };
  }

  Err(BundleError::UnbalancedBody {
    anchor: anchor.to_string(),
    scanned: limit - anchor_pos,
  })
}

/// Replace the body following `anchor` using the default scan bound.
pub fn replace_function_body(source: &str, anchor: &str, replacement: &str) -> Result<String> {
  BraceScanner::default().replace_body(source, anchor, replacement)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn replaces_body_with_nested_braces() {
    let patched = replace_function_body("foo(){ if(x){y}; }", "foo", "Z").unwrap();
    assert_eq!(patched, "foo(){Z}");
  }

  #[test]
  fn preserves_prefix_and_suffix() {
    let source = "var a={k:1};\nfunction setProfilesPrefix(p){ fetch(p).then(function(r){ go(r); }); }\nvar b={};";
    let patched = replace_function_body(source, "setProfilesPrefix", "onProfilesFetch(`{}`)").unwrap();

    let span = locate_function_body(source, "setProfilesPrefix", DEFAULT_MAX_SCAN_LEN).unwrap();
    assert_eq!(&patched[..span.start], &source[..span.start]);
    assert!(patched.ends_with(&source[span.end..]));
    assert_eq!(
      patched,
      "var a={k:1};\nfunction setProfilesPrefix(p){onProfilesFetch(`{}`)}\nvar b={};"
    );
  }

  #[test]
  fn handles_bracketed_anchor_text() {
    let source = "Module[\"readAsync\"] = function(url, onload, onerror){ legacyLoad(url); };";
    let patched = replace_function_body(source, "Module[\"readAsync\"]", "onload(mem);").unwrap();
    assert_eq!(
      patched,
      "Module[\"readAsync\"] = function(url, onload, onerror){onload(mem);};"
    );
  }

  #[test]
  fn only_first_occurrence_is_patched() {
    let source = "foo(){a} foo(){b}";
    assert_eq!(replace_function_body(source, "foo", "Z").unwrap(), "foo(){Z} foo(){b}");
  }

  #[test]
  fn missing_anchor_is_reported() {
    let err = replace_function_body("foo(){ if(x){y}; }", "bar", "Z").unwrap_err();
    assert!(matches!(err, BundleError::AnchorNotFound { ref anchor } if anchor == "bar"));
  }

  #[test]
  fn unbalanced_body_is_reported() {
    let err = replace_function_body("foo(){ if(x){y}; ", "foo", "Z").unwrap_err();
    assert!(matches!(err, BundleError::UnbalancedBody { scanned: 17, .. }));

    let err = replace_function_body("foo()", "foo", "Z").unwrap_err();
    assert!(matches!(err, BundleError::UnbalancedBody { .. }));
  }

  #[test]
  fn scan_bound_stops_long_bodies() {
    let scanner = BraceScanner::new(8);
    let err = scanner.replace_body("foo(){ aaaaaaaa }", "foo", "Z").unwrap_err();
    assert!(matches!(err, BundleError::UnbalancedBody { scanned: 8, .. }));
    assert_eq!(BraceScanner::new(64).replace_body("foo(){ aaaaaaaa }", "foo", "Z").unwrap(), "foo(){Z}");
  }

  #[test]
  fn braces_in_strings_count_as_nesting() {
    let source = "foo(){ s=\"{\"; } bar(){}";
    let err = replace_function_body(source, "foo", "Z").unwrap_err();
    assert!(matches!(err, BundleError::UnbalancedBody { .. }));
  }

  #[test]
  fn closing_brace_before_body_is_ignored() {
    let source = "x} foo(a='}'){ body }";
    assert_eq!(replace_function_body(source, "foo", "Z").unwrap(), "x} foo(a='}'){Z}");
  }

  #[test]
  fn multibyte_text_keeps_char_boundaries() {
    let source = "/* é */ foo(){ \"ünïcode\" } // ✓";
    assert_eq!(
      replace_function_body(source, "foo", "ß").unwrap(),
      "/* é */ foo(){ß} // ✓"
    );
  }
}
