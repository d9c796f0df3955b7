//! HTTP endpoint handlers. Thin wrappers over the word store.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument, warn};

use crate::domain::{LevelSet, AVAILABLE_LEVELS, DEFAULT_LEVEL};
use crate::protocol::*;
use crate::state::AppState;

/// JSON `{ "error": ... }` with a status code.
pub struct ApiError {
  status: StatusCode,
  message: String,
}

impl ApiError {
  fn bad_request(message: impl Into<String>) -> Self {
    Self { status: StatusCode::BAD_REQUEST, message: message.into() }
  }

  fn not_found(message: impl Into<String>) -> Self {
    Self { status: StatusCode::NOT_FOUND, message: message.into() }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.status, Json(ErrorOut { error: self.message })).into_response()
  }
}

/// Requested levels; absent or blank means `[DEFAULT_LEVEL]`.
fn requested_levels(q: &LevelsQuery) -> Result<LevelSet, ApiError> {
  let raw = q.levels.as_deref().unwrap_or("");
  let levels: LevelSet = raw.parse().map_err(|e| {
    warn!(target: "chinese_quiz", levels = %raw, error = %e, "Rejected level list");
    ApiError::bad_request(format!("Invalid levels '{raw}': expected comma-separated integers."))
  })?;
  Ok(levels.effective().0)
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info")]
pub async fn http_get_levels() -> impl IntoResponse {
  Json(LevelsOut { available: AVAILABLE_LEVELS.to_vec(), default: DEFAULT_LEVEL })
}

#[instrument(level = "info", skip(state), fields(levels = ?q.levels))]
pub async fn http_get_words(
  State(state): State<Arc<AppState>>,
  Query(q): Query<LevelsQuery>,
) -> Result<impl IntoResponse, ApiError> {
  let levels = requested_levels(&q)?;
  let words = state.store.find_by_levels(&levels);
  info!(target: "chinese_quiz", levels = %levels.to_csv(), count = words.len(), "HTTP words served");
  Ok(Json(words))
}

#[instrument(level = "info", skip(state), fields(levels = ?q.levels))]
pub async fn http_get_random_word(
  State(state): State<Arc<AppState>>,
  Query(q): Query<LevelsQuery>,
) -> Result<impl IntoResponse, ApiError> {
  let levels = requested_levels(&q)?;
  let word = state
    .store
    .random_by_levels(&levels, &mut rand::thread_rng())
    .ok_or_else(|| ApiError::not_found("No words available for the selected levels."))?;
  info!(target: "chinese_quiz", levels = %levels.to_csv(), id = %word.id, "HTTP random word served");
  Ok(Json(word))
}
