//! Word Store Gateway: "give me every word whose level is in this set".
//!
//! `HttpGateway` talks to the REST endpoint (`GET /api/palabras?niveles=...`);
//! `WordStore` implements the same trait in-process. Calls are instrumented and
//! log latencies and sizes, never payloads.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::USER_AGENT;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::config::GatewayConfig;
use crate::store::WordStore;
use crate::domain::{LevelSet, Word};
use crate::util::trunc_for_log;

#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("HTTP {status}: {body}")]
  HttpStatus { status: reqwest::StatusCode, body: String },
  #[error("word store unavailable: {0}")]
  Unavailable(String),
}

pub trait WordGateway: Send + Sync + 'static {
  /// Every word whose level is in `levels`. An empty result is not an error.
  fn fetch_words(&self, levels: &LevelSet) -> impl Future<Output = Result<Vec<Word>, GatewayError>> + Send;
}

#[derive(Clone)]
pub struct HttpGateway {
  client: reqwest::Client,
  base_url: String,
}

impl HttpGateway {
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()?;
    Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
  }

  pub fn base_url(&self) -> &str { &self.base_url }
}

impl WordGateway for HttpGateway {
  #[instrument(level = "info", skip(self), fields(levels = %levels.to_csv()))]
  async fn fetch_words(&self, levels: &LevelSet) -> Result<Vec<Word>, GatewayError> {
    let url = format!("{}/api/palabras", self.base_url);
    let t0 = Instant::now();

    let res = self.client
      .get(&url)
      .header(USER_AGENT, "chinese-quiz/0.1")
      .query(&[("niveles", levels.to_csv())])
      .send()
      .await?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      error!(target: "chinese_quiz", %status, body = %trunc_for_log(&body, 200), "Word query returned an error status");
      return Err(GatewayError::HttpStatus { status, body });
    }

    let mut words: Vec<Word> = res.json().await?;
    words.iter_mut().for_each(Word::ensure_id);
    info!(target: "chinese_quiz", count = words.len(), elapsed_ms = t0.elapsed().as_millis() as u64, "Word query completed");
    Ok(words)
  }
}

/// Word source used by quiz sessions: the local bank, or a remote store
/// when a backend URL is configured.
#[derive(Clone)]
pub enum WordSource {
  Local(Arc<WordStore>),
  Remote(HttpGateway),
}

impl WordSource {
  pub fn from_config(store: Arc<WordStore>, config: &GatewayConfig) -> Result<Self, GatewayError> {
    match config.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
      Some(url) => {
        let gateway = HttpGateway::new(url, config.timeout())?;
        info!(target: "chinese_quiz", base_url = %gateway.base_url(), "Quiz sessions use the remote word store");
        Ok(WordSource::Remote(gateway))
      }
      None => Ok(WordSource::Local(store)),
    }
  }
}

impl WordGateway for WordSource {
  async fn fetch_words(&self, levels: &LevelSet) -> Result<Vec<Word>, GatewayError> {
    match self {
      WordSource::Local(store) => store.fetch_words(levels).await,
      WordSource::Remote(gateway) => gateway.fetch_words(levels).await,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  use tokio::net::TcpListener;

  use crate::config::QuizConfig;
  use crate::domain::Direction;
  use crate::routes::build_router;
  use crate::runner::{QuizRunner, RunnerEvent};
  use crate::session::QuizSession;
  use crate::state::AppState;

  async fn serve() -> String {
    let state = Arc::new(AppState::with_store(WordStore::seeded(), &QuizConfig::default()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, build_router(state)).await.unwrap() });
    format!("http://{addr}/")
  }

  fn gateway(base_url: String) -> HttpGateway {
    HttpGateway::new(&base_url, Duration::from_secs(2)).unwrap()
  }

  #[tokio::test]
  async fn fetches_words_for_all_requested_levels() {
    let gw = gateway(serve().await);
    assert!(!gw.base_url().ends_with('/'));
    let words = gw.fetch_words(&"10,20".parse().unwrap()).await.unwrap();
    assert!(!words.is_empty());
    assert!(words.iter().all(|w| w.level == 10 || w.level == 20));
    assert!(words.iter().any(|w| w.level == 20));
    assert!(words.iter().all(|w| !w.id.is_empty()));
  }

  #[tokio::test]
  async fn unknown_level_is_an_empty_success() {
    let gw = gateway(serve().await);
    let words = gw.fetch_words(&LevelSet::single(999)).await.unwrap();
    assert!(words.is_empty());
  }

  #[tokio::test]
  async fn unreachable_backend_is_a_request_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let gw = gateway(format!("http://{addr}"));
    let err = gw.fetch_words(&LevelSet::single(10)).await.unwrap_err();
    assert!(matches!(err, GatewayError::Request(_)));
  }

  #[test]
  fn source_follows_backend_url() {
    let store = Arc::new(WordStore::seeded());
    let local = WordSource::from_config(store.clone(), &GatewayConfig::default()).unwrap();
    assert!(matches!(local, WordSource::Local(_)));

    let config = GatewayConfig { base_url: Some("http://words:9000/".into()), timeout_ms: 500 };
    match WordSource::from_config(store, &config).unwrap() {
      WordSource::Remote(gw) => assert_eq!(gw.base_url(), "http://words:9000"),
      WordSource::Local(_) => panic!("backend URL ignored"),
    }
  }

  #[tokio::test]
  async fn remote_source_feeds_a_quiz_session() {
    let config = GatewayConfig { base_url: Some(serve().await), timeout_ms: 2_000 };
    let source = WordSource::from_config(Arc::new(WordStore::from_json_str("[]").unwrap()), &config).unwrap();
    let mut runner = QuizRunner::new(
      QuizSession::new(Direction::HanziToTranslation),
      Arc::new(source),
      Duration::from_millis(10),
    );
    runner.start();
    match runner.next_event().await {
      RunnerEvent::Refreshed(Ok(outcome)) => assert_eq!(outcome.pool_size, 10),
      other => panic!("unexpected event: {other:?}"),
    }
  }
}
