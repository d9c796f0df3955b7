//! Random word selection with an anti-repeat window.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::{Word, WordId};

/// A selected word and whether the anti-repeat window was reset to get it.
#[derive(Debug)]
pub struct Pick<'a> {
  pub word: &'a Word,
  pub wrapped: bool,
}

/// Pick uniformly among words not in `recently_used`.
///
/// Once every word has been used the window is cleared and a new cycle starts;
/// `last` (the word on screen) is kept out of the first pick of that cycle so
/// the same word never shows twice in a row when there is an alternative.
pub fn select_next<'a, R: Rng + ?Sized>(
  pool: &'a [Word],
  recently_used: &mut HashSet<WordId>,
  last: Option<&WordId>,
  rng: &mut R,
) -> Option<Pick<'a>> {
  if pool.is_empty() {
    return None;
  }

  let mut wrapped = false;
  let mut candidates: Vec<&Word> = pool.iter().filter(|w| !recently_used.contains(&w.id)).collect();
  if candidates.is_empty() {
    recently_used.clear();
    wrapped = true;
    candidates = pool.iter().filter(|w| Some(&w.id) != last).collect();
    if candidates.is_empty() {
      candidates = pool.iter().collect();
    }
  }

  let word = candidates.choose(rng).copied()?;
  recently_used.insert(word.id.clone());
  Some(Pick { word, wrapped })
}
