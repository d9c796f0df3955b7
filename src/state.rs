//! Application state shared by the HTTP and WebSocket handlers.
//!
//! Owns the word store (read-only after startup), the word source quiz
//! sessions query, and the per-session settings each WebSocket quiz is
//! created with.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, instrument};

use crate::config::QuizConfig;
use crate::gateway::{GatewayError, WordSource};
use crate::store::{StoreError, WordStore};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("could not set up the remote word store: {0}")]
    Gateway(#[from] GatewayError),
}

#[derive(Clone)]
pub struct AppState {
    /// Local bank behind the `/api/palabras` endpoints.
    pub store: Arc<WordStore>,
    /// Where quiz sessions fetch their pools.
    pub words: Arc<WordSource>,
    pub reveal_delay: Duration,
    pub static_dir: String,
}

impl AppState {
    /// Build state from config: load the word bank (or seeds), pick the
    /// session word source and log the inventory.
    #[instrument(level = "info", skip_all)]
    pub fn from_config(config: &QuizConfig) -> Result<Self, StartupError> {
        let store = WordStore::from_optional_path(config.store.words_path.as_deref())?;
        let mut state = Self::with_store(store, config);
        state.words = Arc::new(WordSource::from_config(state.store.clone(), &config.gateway)?);
        Ok(state)
    }

    /// State over `store` alone; sessions query it in-process.
    pub fn with_store(store: WordStore, config: &QuizConfig) -> Self {
        for (level, count) in store.level_counts() {
            info!(target: "chinese_quiz", level, words = count, "Startup word inventory");
        }
        let store = Arc::new(store);
        Self {
            words: Arc::new(WordSource::Local(store.clone())),
            store,
            reveal_delay: config.quiz.reveal_delay(),
            static_dir: config.server.static_dir.clone(),
        }
    }
}
