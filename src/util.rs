//! Small utility helpers used across modules.

/// True if unicode char belongs to CJK ranges.
pub fn is_cjk(ch: char) -> bool {
  (ch >= '\u{4E00}' && ch <= '\u{9FFF}')
    || (ch >= '\u{3400}' && ch <= '\u{4DBF}')
    || (ch >= '\u{20000}' && ch <= '\u{2A6DF}')
    || (ch >= '\u{2A700}' && ch <= '\u{2B73F}')
    || (ch >= '\u{2B740}' && ch <= '\u{2B81F}')
    || (ch >= '\u{2B820}' && ch <= '\u{2CEAF}')
    || (ch >= '\u{F900}' && ch <= '\u{FAFF}')
}

/// Log-safe truncation for large strings, respecting char boundaries.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detects_han_characters() {
    assert!(is_cjk('水'));
    assert!(!is_cjk('a'));
    assert!(!is_cjk('ñ'));
  }

  #[test]
  fn truncation_never_splits_a_character() {
    assert_eq!(trunc_for_log("short", 10), "short");
    let t = trunc_for_log("你好世界", 4);
    assert!(t.starts_with("你…"));
    assert!(t.ends_with("(12 bytes total)"));
  }
}
