//! Loading configuration (server, word bank, quiz timing, gateway) from TOML.
//!
//! Every key is optional. Env overrides are applied on top:
//!   PORT             : server port
//!   WORDS_PATH       : word bank file (.toml / .json)
//!   QUIZ_BACKEND_URL : base URL used by `HttpGateway`

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuizConfig {
  #[serde(default)]
  pub server: ServerConfig,
  #[serde(default)]
  pub store: StoreConfig,
  #[serde(default)]
  pub quiz: SessionConfig,
  #[serde(default)]
  pub gateway: GatewayConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub port: u16,
  pub static_dir: String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self { port: 5000, static_dir: "./static".into() }
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct StoreConfig {
  #[serde(default)] pub words_path: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
  /// How long a correct answer stays on screen before the next word.
  pub reveal_delay_ms: u64,
}

impl Default for SessionConfig {
  fn default() -> Self { Self { reveal_delay_ms: 2_000 } }
}

impl SessionConfig {
  pub fn reveal_delay(&self) -> Duration { Duration::from_millis(self.reveal_delay_ms) }
}

/// Remote word store for quiz sessions. Without `base_url` sessions query the
/// local bank.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
  pub base_url: Option<String>,
  pub timeout_ms: u64,
}

impl Default for GatewayConfig {
  fn default() -> Self {
    Self { base_url: None, timeout_ms: 10_000 }
  }
}

impl GatewayConfig {
  pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_ms) }
}

impl QuizConfig {
  pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(s)
  }

  /// File from QUIZ_CONFIG_PATH (if any) plus env overrides.
  pub fn from_env() -> Self {
    let mut cfg = load_config_from_env().unwrap_or_default();
    cfg.apply_overrides(|key| std::env::var(key).ok());
    cfg
  }

  /// Apply PORT / WORDS_PATH / QUIZ_BACKEND_URL using `lookup`.
  pub fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
    if let Some(port) = lookup("PORT").and_then(|p| p.parse::<u16>().ok()) {
      self.server.port = port;
    }
    if let Some(path) = lookup("WORDS_PATH").filter(|p| !p.is_empty()) {
      self.store.words_path = Some(path);
    }
    if let Some(url) = lookup("QUIZ_BACKEND_URL").filter(|u| !u.is_empty()) {
      self.gateway.base_url = Some(url);
    }
  }
}

/// Attempt to load `QuizConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<QuizConfig> {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match QuizConfig::from_toml_str(&s) {
      Ok(cfg) => {
        info!(target: "chinese_quiz", %path, "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "chinese_quiz", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "chinese_quiz", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
