//! Domain models: words, answer variants, quiz direction and level selection.

use std::collections::BTreeSet;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::QuizError;
use crate::normalize::accepted_forms;

/// Level used when the selection is empty.
pub const DEFAULT_LEVEL: u32 = 10;

/// Level buckets offered to the learner.
pub const AVAILABLE_LEVELS: [u32; 6] = [10, 20, 40, 60, 80, 100];

/// Stable identity of a word, used for anti-repeat tracking.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordId(pub String);

impl WordId {
  pub fn generate() -> Self { WordId(Uuid::new_v4().to_string()) }
  pub fn is_empty(&self) -> bool { self.0.trim().is_empty() }
}

impl fmt::Display for WordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for WordId {
  fn from(s: &str) -> Self { WordId(s.to_string()) }
}

/// One or more accepted spellings of a field (pinyin or translation).
///
/// Accepts either a single string or a list on input; a single variant is
/// written back as a plain string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OneOrMany", into = "OneOrMany")]
pub struct Variants(Vec<String>);

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
  One(String),
  Many(Vec<String>),
}

impl From<OneOrMany> for Variants {
  fn from(v: OneOrMany) -> Self {
    match v {
      OneOrMany::One(s) => Variants(vec![s]),
      OneOrMany::Many(list) => Variants(list),
    }
  }
}

impl From<Variants> for OneOrMany {
  fn from(v: Variants) -> Self {
    let mut list = v.0;
    if list.len() == 1 {
      OneOrMany::One(list.remove(0))
    } else {
      OneOrMany::Many(list)
    }
  }
}

impl Variants {
  pub fn iter(&self) -> impl Iterator<Item = &str> { self.0.iter().map(String::as_str) }
  pub fn len(&self) -> usize { self.0.len() }

  /// True when no variant carries any visible text.
  pub fn is_blank(&self) -> bool { self.0.iter().all(|s| s.trim().is_empty()) }

  /// Human readable form, e.g. "hola / buenos días".
  pub fn display(&self) -> String {
    self.iter()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .collect::<Vec<_>>()
      .join(" / ")
  }
}

impl From<&str> for Variants {
  fn from(s: &str) -> Self { Variants(vec![s.to_string()]) }
}

impl<S: Into<String>> FromIterator<S> for Variants {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    Variants(iter.into_iter().map(Into::into).collect())
  }
}

/// A vocabulary entry as stored in the word bank.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
  #[serde(default, alias = "_id", deserialize_with = "null_as_default")]
  pub id: WordId,
  #[serde(default, alias = "chino", deserialize_with = "null_as_default")]
  pub hanzi: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub pinyin: Variants,
  #[serde(default, alias = "español", alias = "espanol", deserialize_with = "null_as_default")]
  pub translation: Variants,
  #[serde(alias = "nivel")]
  pub level: u32,
}

// A null field reads as empty so `validate_for` rejects just that record.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de> + Default,
{
  Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

/// Fields a word can be missing for a given direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WordField {
  Hanzi,
  Pinyin,
  Translation,
}

impl fmt::Display for WordField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      WordField::Hanzi => "hanzi",
      WordField::Pinyin => "pinyin",
      WordField::Translation => "translation",
    })
  }
}

impl Word {
  /// Assign a fresh id if the record came without one.
  pub fn ensure_id(&mut self) {
    if self.id.is_empty() {
      self.id = WordId::generate();
    }
  }

  /// Check that the fields prompted and answered in `direction` are usable.
  pub fn validate_for(&self, direction: Direction) -> Result<(), QuizError> {
    if self.hanzi.trim().is_empty() {
      return Err(QuizError::invalid_word(self, WordField::Hanzi));
    }
    if accepted_forms(&self.translation).is_err() {
      return Err(QuizError::invalid_word(self, WordField::Translation));
    }
    if direction == Direction::TranslationToHanzi && accepted_forms(&self.pinyin).is_err() {
      return Err(QuizError::invalid_word(self, WordField::Pinyin));
    }
    Ok(())
  }
}

/// Which language is shown and which one the learner types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
  /// Hanzi (+ pinyin hint) shown, translation expected.
  #[serde(alias = "chino-espanol")]
  HanziToTranslation,
  /// Translation shown, pinyin or hanzi expected.
  #[serde(alias = "espanol-chino")]
  TranslationToHanzi,
}
impl Default for Direction {
  fn default() -> Self { Direction::HanziToTranslation }
}

/// Ordered set of selected levels.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelSet(BTreeSet<u32>);

impl LevelSet {
  pub fn new() -> Self { Self::default() }
  pub fn single(level: u32) -> Self { Self(BTreeSet::from([level])) }
  pub fn contains(&self, level: u32) -> bool { self.0.contains(&level) }
  pub fn is_empty(&self) -> bool { self.0.is_empty() }
  pub fn iter(&self) -> impl Iterator<Item = u32> + '_ { self.0.iter().copied() }

  /// Add the level if absent, remove it otherwise.
  pub fn toggle(&mut self, level: u32) {
    if !self.0.remove(&level) {
      self.0.insert(level);
    }
  }

  /// Levels to query, substituting `{DEFAULT_LEVEL}` for an empty selection.
  /// The flag is true when the substitution happened.
  pub fn effective(&self) -> (LevelSet, bool) {
    if self.is_empty() {
      (LevelSet::single(DEFAULT_LEVEL), true)
    } else {
      (self.clone(), false)
    }
  }

  /// Query-string form, e.g. "10,20".
  pub fn to_csv(&self) -> String {
    self.iter().map(|l| l.to_string()).collect::<Vec<_>>().join(",")
  }
}

impl FromIterator<u32> for LevelSet {
  fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self { Self(iter.into_iter().collect()) }
}

impl FromStr for LevelSet {
  type Err = ParseIntError;

  /// Parse "10,20, 40"; blank segments are ignored.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    s.split(',')
      .map(str::trim)
      .filter(|p| !p.is_empty())
      .map(str::parse::<u32>)
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn variants_accept_string_or_list() {
    let w: Word = serde_json::from_str(
      r#"{"hanzi":"你好","pinyin":"nǐ hǎo","translation":["hola","buenos días"],"level":10}"#,
    ).unwrap();
    assert_eq!(w.pinyin.len(), 1);
    assert_eq!(w.translation.display(), "hola / buenos días");
    assert!(w.id.is_empty());
  }

  #[test]
  fn legacy_field_names_are_accepted() {
    let w: Word = serde_json::from_str(
      r#"{"_id":"abc","chino":"水","pinyin":"shuǐ","español":"agua","nivel":20}"#,
    ).unwrap();
    assert_eq!(w.id, WordId::from("abc"));
    assert_eq!(w.hanzi, "水");
    assert_eq!(w.level, 20);
    assert_eq!(w.translation, Variants::from("agua"));
  }

  #[test]
  fn null_fields_only_invalidate_their_own_record() {
    let words: Vec<Word> = serde_json::from_str(
      r#"[{"_id":"a","chino":"水","pinyin":"shuǐ","español":"agua","nivel":10},
          {"_id":"b","chino":"猫","pinyin":null,"español":"gato","nivel":10},
          {"_id":null,"chino":null,"pinyin":"chá","español":null,"nivel":10}]"#,
    ).unwrap();
    assert_eq!(words.len(), 3);
    assert!(words[0].validate_for(Direction::TranslationToHanzi).is_ok());

    assert!(words[1].pinyin.is_blank());
    assert!(words[1].validate_for(Direction::HanziToTranslation).is_ok());
    match words[1].validate_for(Direction::TranslationToHanzi) {
      Err(QuizError::InvalidWord { field, .. }) => assert_eq!(field, WordField::Pinyin),
      other => panic!("unexpected: {other:?}"),
    }

    assert!(words[2].id.is_empty());
    match words[2].validate_for(Direction::HanziToTranslation) {
      Err(QuizError::InvalidWord { field, .. }) => assert_eq!(field, WordField::Hanzi),
      other => panic!("unexpected: {other:?}"),
    }
  }

  #[test]
  fn single_variant_serializes_as_string() {
    let w = Word { id: "x".into(), hanzi: "茶".into(), pinyin: "chá".into(), translation: ["té"].into_iter().collect(), level: 10 };
    let json = serde_json::to_value(&w).unwrap();
    assert_eq!(json["pinyin"], "chá");
    assert_eq!(json["translation"], "té");
  }

  #[test]
  fn missing_answer_field_is_reported_per_direction() {
    let w: Word = serde_json::from_str(r#"{"id":"1","hanzi":"猫","translation":"gato","level":10}"#).unwrap();
    assert!(w.validate_for(Direction::HanziToTranslation).is_ok());
    match w.validate_for(Direction::TranslationToHanzi) {
      Err(QuizError::InvalidWord { field, .. }) => assert_eq!(field, WordField::Pinyin),
      other => panic!("unexpected: {other:?}"),
    }
  }

  #[test]
  fn empty_levels_default_to_ten() {
    let (levels, defaulted) = LevelSet::new().effective();
    assert!(defaulted);
    assert_eq!(levels, LevelSet::single(DEFAULT_LEVEL));
  }

  #[test]
  fn level_csv_parsing_and_toggle() {
    let mut levels: LevelSet = "20, 10,,40".parse().unwrap();
    assert_eq!(levels.to_csv(), "10,20,40");
    levels.toggle(20);
    levels.toggle(60);
    assert_eq!(levels.to_csv(), "10,40,60");
    assert!("10,abc".parse::<LevelSet>().is_err());
  }

  #[test]
  fn direction_accepts_original_mode_names() {
    let d: Direction = serde_json::from_str(r#""espanol-chino""#).unwrap();
    assert_eq!(d, Direction::TranslationToHanzi);
    let d: Direction = serde_json::from_str(r#""hanzi_to_translation""#).unwrap();
    assert_eq!(d, Direction::HanziToTranslation);
  }
}
