//! Quiz session state machine.
//!
//! The session owns the candidate pool, the word on screen, the anti-repeat
//! window and the selected levels. It performs no I/O: a level change hands
//! out a `RefreshTicket` and the caller feeds the query result back through
//! `complete_refresh`; a correct answer arms a `RevealTicket` that the caller
//! redeems with `finish_reveal` once the reveal delay has elapsed. Tickets
//! carry the generation they were issued for, so anything that arrives after
//! a newer level selection (or a skip) is rejected instead of applied.
//!
//! Phases:
//!   Idle → Loading → Ready ⇄ Revealing
//!            ↓  ↘
//!          Empty  Error

use std::collections::HashSet;
use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::domain::{Direction, LevelSet, Word, WordId, DEFAULT_LEVEL};
use crate::error::QuizError;
use crate::gateway::GatewayError;
use crate::matcher::{check_answer, MatchResult};
use crate::selector::select_next;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Loading,
    Ready,
    Revealing,
    Empty,
    Error,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Loading => "loading",
            SessionPhase::Ready => "ready",
            SessionPhase::Revealing => "revealing",
            SessionPhase::Empty => "empty",
            SessionPhase::Error => "in error",
        })
    }
}

/// Issued when a refresh starts; the levels to query and the generation tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshTicket {
    pub generation: u64,
    pub levels: LevelSet,
    /// The selection was empty and `DEFAULT_LEVEL` is queried instead.
    pub defaulted: bool,
}

/// Issued on a correct answer; redeem after the reveal delay to advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealTicket {
    generation: u64,
    serial: u64,
}

/// What the presentation layer shows for the current word.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub display_text: String,
    pub pronunciation_hint: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Solution {
    pub translation: String,
    pub pinyin: String,
    pub hanzi: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub pool_size: usize,
    pub prompt: Prompt,
}

pub struct QuizSession {
    direction: Direction,
    selected: LevelSet,
    phase: SessionPhase,
    error_message: Option<String>,
    generation: u64,
    pool: Vec<Word>,
    current: Option<Word>,
    recently_used: HashSet<WordId>,
    // Bumped every time `current` changes; invalidates outstanding reveals.
    serial: u64,
    reveal: Option<RevealTicket>,
    invalid: Vec<QuizError>,
    rng: StdRng,
}

impl QuizSession {
    pub fn new(direction: Direction) -> Self {
        Self::with_rng(direction, StdRng::from_entropy())
    }

    pub fn with_rng(direction: Direction, rng: StdRng) -> Self {
        Self {
            direction,
            selected: LevelSet::single(DEFAULT_LEVEL),
            phase: SessionPhase::Idle,
            error_message: None,
            generation: 0,
            pool: Vec::new(),
            current: None,
            recently_used: HashSet::new(),
            serial: 0,
            reveal: None,
            invalid: Vec::new(),
            rng,
        }
    }

    pub fn direction(&self) -> Direction { self.direction }
    pub fn phase(&self) -> SessionPhase { self.phase }
    pub fn generation(&self) -> u64 { self.generation }
    pub fn pool_len(&self) -> usize { self.pool.len() }
    pub fn current_word(&self) -> Option<&Word> { self.current.as_ref() }
    pub fn error_message(&self) -> Option<&str> { self.error_message.as_deref() }

    /// Levels as the learner selected them (possibly empty).
    pub fn selected_levels(&self) -> &LevelSet { &self.selected }

    /// Levels actually queried.
    pub fn effective_levels(&self) -> LevelSet { self.selected.effective().0 }

    /// Query the currently selected levels.
    pub fn start(&mut self) -> RefreshTicket {
        self.begin_refresh()
    }

    pub fn set_levels(&mut self, levels: LevelSet) -> RefreshTicket {
        self.selected = levels;
        self.begin_refresh()
    }

    pub fn toggle_level(&mut self, level: u32) -> RefreshTicket {
        self.selected.toggle(level);
        self.begin_refresh()
    }

    #[instrument(level = "debug", skip(self), fields(generation = self.generation + 1))]
    fn begin_refresh(&mut self) -> RefreshTicket {
        self.generation += 1;
        self.phase = SessionPhase::Loading;
        self.error_message = None;
        self.pool.clear();
        self.recently_used.clear();
        self.set_current(None);

        let (levels, defaulted) = self.selected.effective();
        if defaulted {
            info!(target: "quiz", level = DEFAULT_LEVEL, "No level selected; defaulting to level {}", DEFAULT_LEVEL);
        }
        debug!(target: "quiz", levels = %levels.to_csv(), "Refreshing word pool");
        RefreshTicket { generation: self.generation, levels, defaulted }
    }

    /// Apply the result of the query issued for `generation`.
    ///
    /// Stale responses are rejected with `StaleResponse` and leave the
    /// session untouched; callers are expected to drop them silently.
    #[instrument(level = "debug", skip(self, result), fields(current = self.generation))]
    pub fn complete_refresh(
        &mut self,
        generation: u64,
        result: Result<Vec<Word>, GatewayError>,
    ) -> Result<RefreshOutcome, QuizError> {
        if generation != self.generation || self.phase != SessionPhase::Loading {
            debug!(target: "quiz", generation, "Discarding stale refresh response");
            return Err(QuizError::StaleResponse { generation });
        }

        let words = match result {
            Ok(words) => words,
            Err(e) => {
                warn!(target: "quiz", error = %e, "Word query failed");
                let message = e.to_string();
                self.pool.clear();
                self.phase = SessionPhase::Error;
                self.error_message = Some(message.clone());
                return Err(QuizError::Query(message));
            }
        };

        info!(target: "quiz", generation, pool_size = words.len(), "Word pool refreshed");
        self.pool = words;
        self.recently_used.clear();
        match self.advance() {
            Some(prompt) => Ok(RefreshOutcome { pool_size: self.pool.len(), prompt }),
            None => Err(QuizError::EmptyPool),
        }
    }

    /// The prompt for the word on screen, absent unless a word is active.
    pub fn current_prompt(&self) -> Option<Prompt> {
        if !matches!(self.phase, SessionPhase::Ready | SessionPhase::Revealing) {
            return None;
        }
        let word = self.current.as_ref()?;
        Some(match self.direction {
            Direction::HanziToTranslation => Prompt {
                display_text: word.hanzi.clone(),
                pronunciation_hint: Some(word.pinyin.display()).filter(|p| !p.is_empty()),
            },
            Direction::TranslationToHanzi => Prompt {
                display_text: word.translation.display(),
                pronunciation_hint: None,
            },
        })
    }

    /// Check an answer against the word on screen. A correct answer moves
    /// the session to `Revealing` and arms a reveal ticket.
    #[instrument(level = "info", skip(self, raw), fields(answer_len = raw.len()))]
    pub fn submit_answer(&mut self, raw: &str) -> Result<MatchResult, QuizError> {
        if self.phase != SessionPhase::Ready {
            return Err(QuizError::NotReady(self.phase));
        }
        let word = self.current.as_ref().ok_or(QuizError::NotReady(self.phase))?;
        match check_answer(word, self.direction, raw) {
            Ok(result) => {
                if result.correct {
                    self.phase = SessionPhase::Revealing;
                    self.reveal = Some(RevealTicket { generation: self.generation, serial: self.serial });
                }
                info!(target: "quiz", correct = result.correct, "Answer submitted");
                Ok(result)
            }
            Err(err) => {
                let id = word.id.clone();
                warn!(target: "quiz", error = %err, "Dropping invalid word");
                self.drop_word(&id);
                self.advance();
                Err(err)
            }
        }
    }

    /// Ticket for the reveal armed by the last correct answer, if any.
    pub fn pending_reveal(&self) -> Option<RevealTicket> { self.reveal }

    /// End the reveal and move to the next word.
    pub fn finish_reveal(&mut self, ticket: RevealTicket) -> Result<Option<Prompt>, QuizError> {
        if self.reveal != Some(ticket) || self.phase != SessionPhase::Revealing {
            debug!(target: "quiz", "Discarding stale reveal");
            return Err(QuizError::StaleReveal);
        }
        Ok(self.advance())
    }

    /// Discard the word on screen (cancelling any reveal) and pick another.
    #[instrument(level = "debug", skip(self))]
    pub fn skip(&mut self) -> Result<Option<Prompt>, QuizError> {
        match self.phase {
            SessionPhase::Ready | SessionPhase::Revealing => Ok(self.advance()),
            SessionPhase::Empty => Err(QuizError::EmptyPool),
            phase => Err(QuizError::NotReady(phase)),
        }
    }

    /// Peek at the full answer for the word on screen.
    pub fn reveal_solution(&self) -> Option<Solution> {
        self.current.as_ref().map(|w| Solution {
            translation: w.translation.display(),
            pinyin: w.pinyin.display(),
            hanzi: w.hanzi.clone(),
        })
    }

    /// Drain the invalid words skipped since the last call.
    pub fn take_invalid_words(&mut self) -> Vec<QuizError> {
        std::mem::take(&mut self.invalid)
    }

    fn set_current(&mut self, word: Option<Word>) {
        self.current = word;
        self.serial += 1;
        self.reveal = None;
    }

    fn drop_word(&mut self, id: &WordId) {
        self.pool.retain(|w| &w.id != id);
        self.recently_used.remove(id);
    }

    // Pick the next valid word. Words unusable in this direction are removed
    // from the pool and queued for `take_invalid_words`.
    fn advance(&mut self) -> Option<Prompt> {
        let last = self.current.as_ref().map(|w| w.id.clone());
        loop {
            let picked = select_next(&self.pool, &mut self.recently_used, last.as_ref(), &mut self.rng)
                .map(|pick| (pick.word.clone(), pick.wrapped));
            let Some((word, wrapped)) = picked else {
                self.set_current(None);
                self.phase = SessionPhase::Empty;
                info!(target: "quiz", "No words available");
                return None;
            };
            match word.validate_for(self.direction) {
                Ok(()) => {
                    debug!(target: "quiz", id = %word.id, wrapped, "Next word");
                    self.set_current(Some(word));
                    self.phase = SessionPhase::Ready;
                    return self.current_prompt();
                }
                Err(err) => {
                    warn!(target: "quiz", error = %err, "Skipping invalid word");
                    self.drop_word(&word.id);
                    self.invalid.push(err);
                }
            }
        }
    }
}
