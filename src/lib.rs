//! Chinese vocabulary quiz: word model, answer matching, the per-session quiz
//! engine and the HTTP/WebSocket service that exposes it.

pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod matcher;
pub mod normalize;
pub mod pinyin;
pub mod protocol;
pub mod routes;
pub mod runner;
pub mod seeds;
pub mod selector;
pub mod session;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod util;
