//! Chinese Quiz · vocabulary trainer backend
//!
//! - Axum HTTP + WebSocket API
//! - Word bank from a TOML/JSON file, or built-in seeds
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT              : u16 (default 5000)
//!   WORDS_PATH        : word bank file (.toml or .json)
//!   QUIZ_BACKEND_URL  : remote word store for quiz sessions (default: local bank)
//!   QUIZ_CONFIG_PATH  : path to TOML config
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use chinese_quiz::config::QuizConfig;
use chinese_quiz::routes::build_router;
use chinese_quiz::state::AppState;
use chinese_quiz::telemetry;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = QuizConfig::from_env();

  // Load the word bank once; sessions share it read-only.
  let state = Arc::new(AppState::from_config(&cfg)?);

  let app = build_router(state.clone());

  let addr = SocketAddr::from(([0, 0, 0, 0], cfg.server.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "chinese_quiz", %addr, words = state.store.len(), "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "chinese_quiz", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "chinese_quiz", error = %e, "Failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
}
