//! Answer checking for a single prompt.
//!
//! Matching is binary. Alphabetic answers (pinyin, translation) are compared
//! after `normalize`; hanzi must be typed exactly.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::{Direction, Word, WordField};
use crate::error::QuizError;
use crate::normalize::{accepted_forms, normalize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MatchResult {
  pub correct: bool,
  pub reveal_hanzi: bool,
  pub reveal_translation: bool,
  /// The learner typed the hanzi verbatim; showing it again adds nothing,
  /// the pinyin annotation is what's worth revealing.
  pub typed_hanzi: bool,
}

#[instrument(level = "debug", skip(word, raw), fields(id = %word.id, answer_len = raw.len()))]
pub fn check_answer(word: &Word, direction: Direction, raw: &str) -> Result<MatchResult, QuizError> {
  let answer = normalize(raw);
  let result = match direction {
    Direction::HanziToTranslation => {
      let accepted = accepted_forms(&word.translation)
        .map_err(|_| QuizError::invalid_word(word, WordField::Translation))?;
      let correct = accepted.contains(&answer);
      MatchResult { correct, reveal_translation: correct, ..MatchResult::default() }
    }
    Direction::TranslationToHanzi => {
      let accepted = accepted_forms(&word.pinyin)
        .map_err(|_| QuizError::invalid_word(word, WordField::Pinyin))?;
      let hanzi = word.hanzi.trim();
      let typed_hanzi = !hanzi.is_empty() && raw.trim() == hanzi;
      let correct = typed_hanzi || accepted.contains(&answer);
      MatchResult { correct, reveal_hanzi: correct, reveal_translation: false, typed_hanzi }
    }
  };
  debug!(target: "quiz", correct = result.correct, typed_hanzi = result.typed_hanzi, "Answer checked");
  Ok(result)
}
