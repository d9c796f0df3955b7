//! Typed failures returned by the quiz engine.

use thiserror::Error;

use crate::domain::{Word, WordField, WordId};
use crate::session::SessionPhase;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum QuizError {
  /// The word lacks a field required by the active direction.
  #[error("invalid word data: word {id} ({hanzi}) has no usable {field}")]
  InvalidWord { id: WordId, hanzi: String, field: WordField },

  /// The word store could not be queried.
  #[error("could not load words: {0}")]
  Query(String),

  /// The query succeeded but matched no usable words.
  #[error("no words available for the selected levels")]
  EmptyPool,

  /// A refresh response arrived after a newer level selection.
  #[error("discarded response for superseded refresh #{generation}")]
  StaleResponse { generation: u64 },

  /// A reveal timer fired for a prompt that is no longer current.
  #[error("discarded reveal for a superseded prompt")]
  StaleReveal,

  #[error("not accepting this action while {0}")]
  NotReady(SessionPhase),
}

impl QuizError {
  pub fn invalid_word(word: &Word, field: WordField) -> Self {
    QuizError::InvalidWord { id: word.id.clone(), hanzi: word.hanzi.clone(), field }
  }

  /// Whether the learner can recover by re-triggering a refresh.
  pub fn is_retryable(&self) -> bool {
    matches!(self, QuizError::Query(_))
  }
}
