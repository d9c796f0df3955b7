//! Answer normalization and accepted-answer sets.
//!
//! Normalization makes "Hola ", "hola" and "hólá" compare equal: the text is
//! lowercased, decomposed (NFD), stripped of combining diacritics
//! (U+0300..=U+036F) and trimmed. Hanzi never goes through here.

use std::collections::HashSet;

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

use crate::domain::Variants;

/// The field has no variant left after normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("field has no accepted answers")]
pub struct EmptyField;

fn is_combining_diacritic(c: char) -> bool {
  ('\u{0300}'..='\u{036F}').contains(&c)
}

/// Canonical comparison form of user input or stored answers.
pub fn normalize(text: &str) -> String {
  text.to_lowercase()
    .nfd()
    .filter(|c| !is_combining_diacritic(*c))
    .collect::<String>()
    .trim()
    .to_string()
}

/// Every normalized variant of a pinyin/translation field.
pub fn accepted_forms(field: &Variants) -> Result<HashSet<String>, EmptyField> {
  let forms: HashSet<String> = field
    .iter()
    .map(normalize)
    .filter(|s| !s.is_empty())
    .collect();
  if forms.is_empty() { Err(EmptyField) } else { Ok(forms) }
}
