//! WebSocket quiz session. Each connection owns one `QuizRunner` over the
//! configured word source; client messages drive it and background events
//! (pool refreshed, reveal elapsed) are pushed as they happen.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    Query, State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{LevelSet, DEFAULT_LEVEL};
use crate::gateway::WordSource;
use crate::error::QuizError;
use crate::protocol::{ClientWsMessage, QuizParams, ServerWsMessage};
use crate::runner::{QuizRunner, RunnerEvent};
use crate::session::{QuizSession, RefreshTicket};
use crate::state::AppState;

type SessionRunner = QuizRunner<WordSource>;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(
  ws: WebSocketUpgrade,
  State(state): State<Arc<AppState>>,
  Query(params): Query<QuizParams>,
) -> impl IntoResponse {
  info!(target: "chinese_quiz", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state, params))
}

enum Step {
  Client(Option<Result<Message, axum::Error>>),
  Session(RunnerEvent),
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, params: QuizParams) {
  let mut runner = QuizRunner::new(QuizSession::new(params.direction), state.words.clone(), state.reveal_delay);
  info!(target: "chinese_quiz", direction = ?runner.session().direction(), "Quiz session connected");

  for reply in &open_session(params.levels.as_deref(), &mut runner) {
    if send(&mut socket, reply).await.is_err() {
      return;
    }
  }

  loop {
    let step = tokio::select! {
      msg = socket.recv() => Step::Client(msg),
      event = runner.next_event() => Step::Session(event),
    };

    let replies = match step {
      Step::Client(Some(Ok(Message::Text(txt)))) => match serde_json::from_str::<ClientWsMessage>(&txt) {
        Ok(incoming) => {
          debug!(target: "chinese_quiz", "WS received: {:?}", &incoming);
          handle_client_ws(incoming, &mut runner)
        }
        Err(e) => vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e), retryable: false }],
      },
      Step::Client(Some(Ok(Message::Ping(payload)))) => {
        let _ = socket.send(Message::Pong(payload)).await;
        continue;
      }
      Step::Client(Some(Ok(Message::Close(_)))) | Step::Client(None) => break,
      Step::Client(Some(Err(e))) => {
        error!(target: "chinese_quiz", error = %e, "WS receive error");
        break;
      }
      Step::Client(Some(Ok(_))) => continue,
      Step::Session(event) => session_event(event, &mut runner),
    };

    for reply in &replies {
      if send(&mut socket, reply).await.is_err() {
        return;
      }
    }
  }
  // Dropping the runner aborts any pending query or reveal timer.
  info!(target: "chinese_quiz", "Quiz session disconnected");
}

async fn send(socket: &mut WebSocket, msg: &ServerWsMessage) -> Result<(), axum::Error> {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e), "retryable": false }).to_string()
  });
  socket.send(Message::Text(out)).await.map_err(|e| {
    error!(target: "chinese_quiz", error = %e, "WS send error");
    e
  })
}

// First query of a connection. A malformed `?levels=` is reported before
// falling back to the default level.
fn open_session(levels: Option<&str>, runner: &mut SessionRunner) -> Vec<ServerWsMessage> {
  match levels.map(|raw| (raw, raw.parse::<LevelSet>())) {
    Some((_, Ok(levels))) => vec![loading(&runner.set_levels(levels), runner)],
    Some((raw, Err(e))) => {
      warn!(target: "chinese_quiz", levels = %raw, error = %e, "Malformed initial levels");
      let ticket = runner.start();
      vec![
        ServerWsMessage::Error {
          message: format!("Invalid levels '{}'; using level {} instead.", raw, DEFAULT_LEVEL),
          retryable: false,
        },
        loading(&ticket, runner),
      ]
    }
    None => vec![loading(&runner.start(), runner)],
  }
}

fn loading(ticket: &RefreshTicket, runner: &SessionRunner) -> ServerWsMessage {
  ServerWsMessage::Loading {
    selected: runner.session().selected_levels().clone(),
    levels: ticket.levels.clone(),
    defaulted: ticket.defaulted,
    notice: ticket
      .defaulted
      .then(|| format!("No level selected; defaulting to level {}.", DEFAULT_LEVEL)),
  }
}

fn error_message(err: &QuizError) -> ServerWsMessage {
  match err {
    QuizError::EmptyPool => ServerWsMessage::Empty { message: "No words available for the selected levels.".into() },
    QuizError::InvalidWord { .. } => ServerWsMessage::InvalidWord { message: err.to_string() },
    other => ServerWsMessage::Error { message: other.to_string(), retryable: other.is_retryable() },
  }
}

// Invalid words skipped during selection are reported before the prompt.
fn with_notices(runner: &mut SessionRunner, mut tail: Vec<ServerWsMessage>) -> Vec<ServerWsMessage> {
  let mut out: Vec<ServerWsMessage> = runner.take_invalid_words().iter().map(error_message).collect();
  out.append(&mut tail);
  out
}

fn session_event(event: RunnerEvent, runner: &mut SessionRunner) -> Vec<ServerWsMessage> {
  let tail = match event {
    RunnerEvent::Refreshed(Ok(outcome)) => {
      info!(target: "quiz", generation = runner.session().generation(), pool_size = outcome.pool_size, "Pool ready");
      vec![ServerWsMessage::Prompt { prompt: Some(outcome.prompt) }]
    }
    RunnerEvent::Refreshed(Err(e)) => vec![error_message(&e)],
    RunnerEvent::Advanced(Some(prompt)) => vec![ServerWsMessage::Prompt { prompt: Some(prompt) }],
    RunnerEvent::Advanced(None) => vec![error_message(&QuizError::EmptyPool)],
  };
  with_notices(runner, tail)
}

fn handle_client_ws(msg: ClientWsMessage, runner: &mut SessionRunner) -> Vec<ServerWsMessage> {
  let tail = match msg {
    ClientWsMessage::Ping => vec![ServerWsMessage::Pong],

    ClientWsMessage::GetPrompt => vec![ServerWsMessage::Prompt { prompt: runner.current_prompt() }],

    ClientWsMessage::SetLevels { levels } => {
      let ticket = runner.set_levels(levels.into_iter().collect());
      vec![loading(&ticket, runner)]
    }

    ClientWsMessage::ToggleLevel { level } => {
      let ticket = runner.toggle_level(level);
      vec![loading(&ticket, runner)]
    }

    ClientWsMessage::SubmitAnswer { answer } => match runner.submit_answer(&answer) {
      Ok(result) => {
        info!(target: "quiz", correct = result.correct, "WS submit_answer evaluated");
        vec![ServerWsMessage::answer(result, runner.reveal_solution())]
      }
      Err(e @ QuizError::InvalidWord { .. }) => {
        vec![error_message(&e), ServerWsMessage::Prompt { prompt: runner.current_prompt() }]
      }
      Err(e) => vec![error_message(&e)],
    },

    ClientWsMessage::Skip => match runner.skip() {
      Ok(prompt) => match prompt {
        Some(p) => vec![ServerWsMessage::Prompt { prompt: Some(p) }],
        None => vec![error_message(&QuizError::EmptyPool)],
      },
      Err(e) => vec![error_message(&e)],
    },

    ClientWsMessage::RevealSolution => vec![ServerWsMessage::Solution { solution: runner.reveal_solution() }],
  };
  with_notices(runner, tail)
}
