//! In-memory word store: the collection the REST endpoints query.
//!
//! Loaded once at startup from a word bank file (`.toml` with `[[words]]`
//! tables, or a `.json` array) or from the built-in seeds. Entries get a
//! unique id and, when missing, pinyin generated from their hanzi.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::domain::{LevelSet, Variants, Word, WordId};
use crate::gateway::{GatewayError, WordGateway};
use crate::pinyin::to_pinyin_diacritics;
use crate::seeds::seed_words;
use crate::util::is_cjk;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read word bank {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("failed to parse TOML word bank: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse JSON word bank: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported word bank format: {0} (expected .toml or .json)")]
    UnsupportedFormat(String),
}

#[derive(Deserialize)]
struct WordBank {
    #[serde(default)]
    words: Vec<Word>,
}

#[derive(Debug, Default)]
pub struct WordStore {
    words: Vec<Word>,
}

impl WordStore {
    /// Build a store, assigning ids and filling missing pinyin.
    pub fn new(words: Vec<Word>) -> Self {
        let mut seen = HashSet::<WordId>::new();
        let words = words
            .into_iter()
            .map(|mut w| {
                if w.id.is_empty() || seen.contains(&w.id) {
                    w.id = WordId::generate();
                }
                seen.insert(w.id.clone());
                if w.pinyin.is_blank() && w.hanzi.chars().any(is_cjk) {
                    w.pinyin = Variants::from(to_pinyin_diacritics(w.hanzi.trim()).as_str());
                }
                w
            })
            .collect();
        Self { words }
    }

    pub fn seeded() -> Self {
        Self::new(seed_words())
    }

    pub fn from_toml_str(s: &str) -> Result<Self, StoreError> {
        let bank: WordBank = toml::from_str(s)?;
        Ok(Self::new(bank.words))
    }

    pub fn from_json_str(s: &str) -> Result<Self, StoreError> {
        let words: Vec<Word> = serde_json::from_str(s)?;
        Ok(Self::new(words))
    }

    /// Load a word bank file; the format follows the extension.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if ext != "toml" && ext != "json" {
            return Err(StoreError::UnsupportedFormat(ext.to_string()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let store = if ext == "toml" { Self::from_toml_str(&text)? } else { Self::from_json_str(&text)? };
        info!(target: "chinese_quiz", words = store.len(), "Loaded word bank");
        Ok(store)
    }

    /// Bank file if given, built-in seeds otherwise.
    pub fn from_optional_path(path: Option<&str>) -> Result<Self, StoreError> {
        match path {
            Some(p) => Self::load(Path::new(p)),
            None => {
                warn!(target: "chinese_quiz", "No word bank configured; using built-in seed words");
                Ok(Self::seeded())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Every word whose level is in `levels`, in bank order.
    pub fn find_by_levels(&self, levels: &LevelSet) -> Vec<Word> {
        self.words
            .iter()
            .filter(|w| levels.contains(w.level))
            .cloned()
            .collect()
    }

    /// One word drawn uniformly from the matching levels.
    pub fn random_by_levels<R: Rng + ?Sized>(&self, levels: &LevelSet, rng: &mut R) -> Option<Word> {
        let matching: Vec<&Word> = self.words.iter().filter(|w| levels.contains(w.level)).collect();
        matching.choose(rng).map(|w| (*w).clone())
    }

    /// Word count per level, for the startup inventory log.
    pub fn level_counts(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for w in &self.words {
            *counts.entry(w.level).or_insert(0) += 1;
        }
        counts
    }
}

impl WordGateway for WordStore {
    async fn fetch_words(&self, levels: &LevelSet) -> Result<Vec<Word>, GatewayError> {
        Ok(self.find_by_levels(levels))
    }
}
